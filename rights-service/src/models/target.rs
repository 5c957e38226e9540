//! Target model - the entity a right is checked against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of targets a right can be executed or granted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetType {
    Account,
    CalendarResource,
    Cos,
    DistributionList,
    DynamicGroup,
    Domain,
    Server,
    XmppComponent,
    Zimlet,
    UcService,
    Config,
    Global,
}

impl TargetType {
    pub const ALL: [TargetType; 12] = [
        TargetType::Account,
        TargetType::CalendarResource,
        TargetType::Cos,
        TargetType::DistributionList,
        TargetType::DynamicGroup,
        TargetType::Domain,
        TargetType::Server,
        TargetType::XmppComponent,
        TargetType::Zimlet,
        TargetType::UcService,
        TargetType::Config,
        TargetType::Global,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TargetType::Account => "account",
            TargetType::CalendarResource => "calresource",
            TargetType::Cos => "cos",
            TargetType::DistributionList => "dl",
            TargetType::DynamicGroup => "group",
            TargetType::Domain => "domain",
            TargetType::Server => "server",
            TargetType::XmppComponent => "xmppcomponent",
            TargetType::Zimlet => "zimlet",
            TargetType::UcService => "ucservice",
            TargetType::Config => "config",
            TargetType::Global => "global",
        }
    }

    /// Target types whose grants flow down to `self`, including `self`.
    ///
    /// A grant on a distribution list reaches its member accounts, a grant on
    /// a domain reaches every domained entry, a global grant reaches all.
    pub fn inherited_by(&self) -> &'static [TargetType] {
        use TargetType::*;
        match self {
            Account => &[Account],
            CalendarResource => &[CalendarResource],
            DistributionList => &[Account, CalendarResource, DistributionList],
            DynamicGroup => &[Account, CalendarResource, DynamicGroup],
            Domain => &[Account, CalendarResource, DistributionList, DynamicGroup, Domain],
            Cos => &[Cos],
            Server => &[Server],
            XmppComponent => &[XmppComponent],
            Zimlet => &[Zimlet],
            UcService => &[UcService],
            Config => &[Config],
            Global => &TargetType::ALL,
        }
    }

    /// Returns true if a grant on a `self` target can apply to a `other` target.
    pub fn is_inherited_by(&self, other: TargetType) -> bool {
        self.inherited_by().contains(&other)
    }

    /// Domained entries are named `local@domain` and inherit from that domain.
    pub fn is_domained(&self) -> bool {
        matches!(
            self,
            TargetType::Account
                | TargetType::CalendarResource
                | TargetType::DistributionList
                | TargetType::DynamicGroup
        )
    }

    /// Entries that can be members of a distribution list.
    pub fn can_be_group_member(&self) -> bool {
        matches!(
            self,
            TargetType::Account | TargetType::CalendarResource | TargetType::DistributionList
        )
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetType::ALL
            .iter()
            .find(|tt| tt.code().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown target type: {}", s))
    }
}

/// A concrete target. Two targets of the same type and identity are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum Target {
    Account(String),
    CalendarResource(String),
    Cos(String),
    DistributionList(String),
    DynamicGroup(String),
    Domain(String),
    Server(String),
    XmppComponent(String),
    Zimlet(String),
    UcService(String),
    Config,
    Global,
}

impl Target {
    pub fn target_type(&self) -> TargetType {
        match self {
            Target::Account(_) => TargetType::Account,
            Target::CalendarResource(_) => TargetType::CalendarResource,
            Target::Cos(_) => TargetType::Cos,
            Target::DistributionList(_) => TargetType::DistributionList,
            Target::DynamicGroup(_) => TargetType::DynamicGroup,
            Target::Domain(_) => TargetType::Domain,
            Target::Server(_) => TargetType::Server,
            Target::XmppComponent(_) => TargetType::XmppComponent,
            Target::Zimlet(_) => TargetType::Zimlet,
            Target::UcService(_) => TargetType::UcService,
            Target::Config => TargetType::Config,
            Target::Global => TargetType::Global,
        }
    }

    /// Identity of the target; `None` for the singleton config and global targets.
    pub fn identity(&self) -> Option<&str> {
        match self {
            Target::Account(id)
            | Target::CalendarResource(id)
            | Target::Cos(id)
            | Target::DistributionList(id)
            | Target::DynamicGroup(id)
            | Target::Domain(id)
            | Target::Server(id)
            | Target::XmppComponent(id)
            | Target::Zimlet(id)
            | Target::UcService(id) => Some(id),
            Target::Config | Target::Global => None,
        }
    }

    /// Domain part of a domained target's `local@domain` identity.
    pub fn domain(&self) -> Option<&str> {
        if !self.target_type().is_domained() {
            return None;
        }
        self.identity()
            .and_then(|id| id.rsplit_once('@'))
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity() {
            Some(id) => write!(f, "{}:{}", self.target_type(), id),
            None => write!(f, "{}", self.target_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_of_account() {
        let target = Target::Account("alice@example.com".to_string());
        assert_eq!(target.domain(), Some("example.com"));
        assert_eq!(target.target_type(), TargetType::Account);
    }

    #[test]
    fn test_domain_of_non_domained_target() {
        assert_eq!(Target::Server("mail1".to_string()).domain(), None);
        assert_eq!(Target::Domain("example.com".to_string()).domain(), None);
        assert_eq!(Target::Account("no-domain".to_string()).domain(), None);
    }

    #[test]
    fn test_inheritance_table() {
        assert!(TargetType::Domain.is_inherited_by(TargetType::Account));
        assert!(TargetType::DistributionList.is_inherited_by(TargetType::Account));
        assert!(!TargetType::DynamicGroup.is_inherited_by(TargetType::DistributionList));
        assert!(!TargetType::Account.is_inherited_by(TargetType::Domain));
        for tt in TargetType::ALL {
            assert!(TargetType::Global.is_inherited_by(tt));
            assert!(tt.is_inherited_by(tt));
        }
    }

    #[test]
    fn test_target_type_parse() {
        assert_eq!("dl".parse::<TargetType>(), Ok(TargetType::DistributionList));
        assert_eq!("Config".parse::<TargetType>(), Ok(TargetType::Config));
        assert!("mailbox".parse::<TargetType>().is_err());
    }

    #[test]
    fn test_target_equality() {
        let a = Target::Server("mail1".to_string());
        let b = Target::Server("mail1".to_string());
        assert_eq!(a, b);
        assert_ne!(a, Target::Zimlet("mail1".to_string()));
    }
}
