//! Grantee and actor models.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Who a grant is issued to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum Grantee {
    Admin(String),
    Group(String),
    /// Every authenticated admin.
    AllAdmins,
    /// Everyone, authenticated or not.
    Public,
    /// Every guest (external, non-admin) identity.
    Guest,
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::Admin(id) => write!(f, "usr:{}", id),
            Grantee::Group(id) => write!(f, "grp:{}", id),
            Grantee::AllAdmins => f.write_str("all"),
            Grantee::Public => f.write_str("pub"),
            Grantee::Guest => f.write_str("gst"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Admin,
    Guest,
    Anonymous,
}

/// An already-authenticated identity acting in a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub kind: ActorKind,
    /// Set by the authentication layer; bypasses grant evaluation.
    #[serde(default)]
    pub global_admin: bool,
}

impl Actor {
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ActorKind::Admin,
            global_admin: false,
        }
    }

    pub fn global_admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ActorKind::Admin,
            global_admin: true,
        }
    }

    pub fn guest(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ActorKind::Guest,
            global_admin: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: String::new(),
            kind: ActorKind::Anonymous,
            global_admin: false,
        }
    }

    pub fn is_global_admin(&self) -> bool {
        self.global_admin && self.kind == ActorKind::Admin
    }
}

/// Every grantee a grant may name and still apply to one actor.
#[derive(Debug, Clone, Default)]
pub struct GranteeSet {
    grantees: HashSet<Grantee>,
}

impl GranteeSet {
    /// Expand an actor and the groups it belongs to into matching grantees.
    pub fn for_actor<I>(actor: &Actor, groups: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut grantees = HashSet::new();
        grantees.insert(Grantee::Public);

        match actor.kind {
            ActorKind::Admin => {
                grantees.insert(Grantee::Admin(actor.id.clone()));
                grantees.insert(Grantee::AllAdmins);
                grantees.extend(groups.into_iter().map(Grantee::Group));
            }
            ActorKind::Guest => {
                grantees.insert(Grantee::Guest);
                grantees.extend(groups.into_iter().map(Grantee::Group));
            }
            ActorKind::Anonymous => {}
        }

        Self { grantees }
    }

    pub fn contains(&self, grantee: &Grantee) -> bool {
        self.grantees.contains(grantee)
    }

    pub fn len(&self) -> usize {
        self.grantees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grantees.is_empty()
    }
}
