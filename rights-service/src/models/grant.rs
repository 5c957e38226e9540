//! Grant model - a persisted binding of grantee, target, right and polarity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Grantee, Target};

/// Modifier of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantModifier {
    Positive,
    /// Explicit deny.
    Negative,
    /// Positive grant the grantee may re-grant.
    Delegable,
}

/// Allow or deny side of a modifier. At most one live grant exists per
/// `(grantee, target, right)` and polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Allow,
    Deny,
}

impl GrantModifier {
    pub fn polarity(&self) -> Polarity {
        match self {
            GrantModifier::Positive | GrantModifier::Delegable => Polarity::Allow,
            GrantModifier::Negative => Polarity::Deny,
        }
    }

    pub fn is_deny(&self) -> bool {
        *self == GrantModifier::Negative
    }

    pub fn can_delegate(&self) -> bool {
        *self == GrantModifier::Delegable
    }

    /// Prefix used in the compact `-right` / `+right` notation.
    pub fn marker(&self) -> &'static str {
        match self {
            GrantModifier::Positive => "",
            GrantModifier::Negative => "-",
            GrantModifier::Delegable => "+",
        }
    }
}

/// Uniqueness key of a live grant: the triple plus its polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GrantKey {
    pub grantee: Grantee,
    pub target: Target,
    pub right: String,
    pub polarity: Polarity,
}

/// Grant entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub grant_id: Uuid,
    pub grantee: Grantee,
    pub target: Target,
    pub right: String,
    pub modifier: GrantModifier,
    pub granted_at: DateTime<Utc>,
}

impl Grant {
    /// Create a new grant issued now.
    pub fn new(grantee: Grantee, target: Target, right: String, modifier: GrantModifier) -> Self {
        Self {
            grant_id: Uuid::new_v4(),
            grantee,
            target,
            right,
            modifier,
            granted_at: Utc::now(),
        }
    }

    pub fn key(&self) -> GrantKey {
        GrantKey {
            grantee: self.grantee.clone(),
            target: self.target.clone(),
            right: self.right.clone(),
            polarity: self.polarity(),
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.modifier.polarity()
    }

    pub fn has_key(&self, key: &GrantKey) -> bool {
        self.polarity() == key.polarity
            && self.right == key.right
            && self.grantee == key.grantee
            && self.target == key.target
    }

    /// Same triple and same polarity. Two colliding grants are never live at
    /// once.
    pub fn collides_with(&self, other: &Grant) -> bool {
        self.has_key(&other.key())
    }
}

impl std::fmt::Display for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}{}",
            self.target,
            self.grantee,
            self.modifier.marker(),
            self.right
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(modifier: GrantModifier) -> Grant {
        Grant::new(
            Grantee::Admin("alice".to_string()),
            Target::Domain("example.com".to_string()),
            "getDomain".to_string(),
            modifier,
        )
    }

    #[test]
    fn test_polarity_classes() {
        assert_eq!(GrantModifier::Positive.polarity(), Polarity::Allow);
        assert_eq!(GrantModifier::Delegable.polarity(), Polarity::Allow);
        assert_eq!(GrantModifier::Negative.polarity(), Polarity::Deny);
    }

    #[test]
    fn test_positive_and_delegable_collide() {
        assert!(grant(GrantModifier::Positive).collides_with(&grant(GrantModifier::Delegable)));
        assert!(!grant(GrantModifier::Positive).collides_with(&grant(GrantModifier::Negative)));
    }

    #[test]
    fn test_key_agrees_with_collision() {
        let positive = grant(GrantModifier::Positive);
        let delegable = grant(GrantModifier::Delegable);
        let negative = grant(GrantModifier::Negative);
        assert_eq!(positive.key(), delegable.key());
        assert_ne!(positive.key(), negative.key());
        assert_eq!(negative.key().polarity, Polarity::Deny);
    }

    #[test]
    fn test_display_uses_modifier_marker() {
        let g = grant(GrantModifier::Negative);
        assert_eq!(g.to_string(), "domain:example.com usr:alice -getDomain");
    }
}
