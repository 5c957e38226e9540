//! Built-in right definitions.
//!
//! This is the fixed set every deployment starts from. A definition file
//! named by `RIGHTS_DEFINITION_PATH` can add to it but never redefine a name.

use crate::models::{AccessMode, RightDefinition, TargetType};

/// Pseudo-right allowed without consulting any grant (globally readable data).
pub const ALWAYS_ALLOW: &str = "alwaysAllow";

pub const GET_GLOBAL_CONFIG: &str = "getGlobalConfig";
pub const MANAGE_VOLUME: &str = "manageVolume";

pub fn builtin_definitions() -> Vec<RightDefinition> {
    use AccessMode::*;
    use TargetType::*;

    vec![
        RightDefinition::preset(
            ALWAYS_ALLOW,
            &TargetType::ALL,
            "pseudo right, always allowed",
        )
        .always_allowed(),
        // global config
        RightDefinition::preset(GET_GLOBAL_CONFIG, &[Config], "view global config")
            .reading_all_attrs(),
        RightDefinition::attr(
            "get.config.zimbraLogLevel",
            Config,
            "zimbraLogLevel",
            Read,
            "view the global log level",
        ),
        RightDefinition::attr(
            "set.config.zimbraLogLevel",
            Config,
            "zimbraLogLevel",
            ReadWrite,
            "view and change the global log level",
        ),
        RightDefinition::attr(
            "set.config.zimbraMtaRelayHost",
            Config,
            "zimbraMtaRelayHost",
            ReadWrite,
            "view and change the MTA relay host",
        ),
        // server
        RightDefinition::preset(MANAGE_VOLUME, &[Server], "manage storage volumes"),
        RightDefinition::preset("flushCache", &[Server], "flush caches on a server"),
        RightDefinition::preset("resetLogger", &[Server], "reset logger configuration"),
        RightDefinition::preset("listServer", &[Server], "list servers"),
        RightDefinition::preset("getServer", &[Server], "view server").reading_all_attrs(),
        RightDefinition::attr(
            "set.server.zimbraServiceEnabled",
            Server,
            "zimbraServiceEnabled",
            ReadWrite,
            "view and change enabled services on a server",
        ),
        // UC service
        RightDefinition::preset("getUCService", &[UcService], "view UC service")
            .reading_all_attrs(),
        RightDefinition::preset("listUCService", &[UcService], "list UC services"),
        // cos
        RightDefinition::preset("getCos", &[Cos], "view class of service").reading_all_attrs(),
        RightDefinition::preset("listCos", &[Cos], "list classes of service"),
        RightDefinition::preset("assignCos", &[Cos], "assign class of service to accounts"),
        // domain
        RightDefinition::preset("getDomain", &[Domain], "view domain").reading_all_attrs(),
        RightDefinition::preset("listDomain", &[Domain], "list domains"),
        RightDefinition::preset("createAccount", &[Domain], "create accounts in a domain"),
        RightDefinition::preset(
            "createDistributionList",
            &[Domain],
            "create distribution lists in a domain",
        ),
        RightDefinition::attr(
            "get.domain.description",
            Domain,
            "description",
            Read,
            "view domain description",
        ),
        RightDefinition::attr(
            "set.domain.description",
            Domain,
            "description",
            ReadWrite,
            "view and change domain description",
        ),
        // distribution list
        RightDefinition::preset(
            "getDistributionList",
            &[DistributionList],
            "view distribution list",
        )
        .reading_all_attrs(),
        RightDefinition::preset(
            "addDistributionListMember",
            &[DistributionList],
            "add members to a distribution list",
        ),
        RightDefinition::preset(
            "removeDistributionListMember",
            &[DistributionList],
            "remove members from a distribution list",
        ),
        // account
        RightDefinition::preset("getAccount", &[Account], "view account").reading_all_attrs(),
        RightDefinition::preset("listAccount", &[Account], "list accounts"),
        RightDefinition::preset("getAccountInfo", &[Account], "view basic account info"),
        RightDefinition::preset("deleteAccount", &[Account], "delete account"),
        RightDefinition::preset("renameAccount", &[Account], "rename account"),
        RightDefinition::preset("adminLoginAs", &[Account], "log in as the account"),
        RightDefinition::preset(
            "manageAccountLogger",
            &[Account],
            "add and remove account loggers",
        ),
        RightDefinition::preset("getCalendarResource", &[CalendarResource], "view resource")
            .reading_all_attrs(),
        RightDefinition::attr(
            "get.account.displayName",
            Account,
            "displayName",
            Read,
            "view account display name",
        ),
        RightDefinition::attr(
            "set.account.displayName",
            Account,
            "displayName",
            ReadWrite,
            "view and change account display name",
        ),
        RightDefinition::attr(
            "get.account.zimbraMailQuota",
            Account,
            "zimbraMailQuota",
            Read,
            "view account mail quota",
        ),
        RightDefinition::attr(
            "set.account.zimbraMailQuota",
            Account,
            "zimbraMailQuota",
            ReadWrite,
            "view and change account mail quota",
        ),
        RightDefinition::attr(
            "set.account.description",
            Account,
            "description",
            ReadWrite,
            "view and change account description",
        ),
        RightDefinition::attr(
            "reset.account.userPassword",
            Account,
            "userPassword",
            Write,
            "set the account password without reading it",
        ),
        // combos
        RightDefinition::combo(
            "domainAdminAccountRights",
            &[
                "getAccountInfo",
                "listAccount",
                "get.account.zimbraMailQuota",
                "set.account.displayName",
                "set.account.description",
                "reset.account.userPassword",
            ],
            "account rights for domain admins",
        ),
        RightDefinition::combo(
            "domainAdminDistributionListRights",
            &[
                "getDistributionList",
                "addDistributionListMember",
                "removeDistributionListMember",
            ],
            "distribution list rights for domain admins",
        ),
        RightDefinition::combo(
            "domainAdminRights",
            &[
                "domainAdminAccountRights",
                "domainAdminDistributionListRights",
                "getDomain",
                "listDomain",
                "createAccount",
                "createDistributionList",
            ],
            "domain admin rights",
        ),
        RightDefinition::combo(
            "adminConsoleServerRights",
            &["getServer", "listServer", "flushCache", MANAGE_VOLUME],
            "server rights for the admin console",
        ),
        RightDefinition::combo(
            "adminConsoleRights",
            &[
                "domainAdminRights",
                "adminConsoleServerRights",
                "getAccount",
                "getCos",
                "listCos",
                GET_GLOBAL_CONFIG,
            ],
            "all admin console rights",
        ),
    ]
}
