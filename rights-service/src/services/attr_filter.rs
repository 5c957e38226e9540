use serde::Serialize;
use std::collections::HashMap;

use crate::models::{AccessMode, Target};
use crate::services::error::AccessError;

/// How one attribute of a target may be used by the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrAccess {
    Readable,
    Writable,
    ReadWrite,
    Hidden,
}

impl AttrAccess {
    fn from_flags(read: bool, write: bool) -> Self {
        match (read, write) {
            (true, true) => AttrAccess::ReadWrite,
            (true, false) => AttrAccess::Readable,
            (false, true) => AttrAccess::Writable,
            (false, false) => AttrAccess::Hidden,
        }
    }

    pub fn can_read(&self) -> bool {
        matches!(self, AttrAccess::Readable | AttrAccess::ReadWrite)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, AttrAccess::Writable | AttrAccess::ReadWrite)
    }
}

/// Per-attribute access of one actor on one target.
///
/// Built from the ATTR rights the actor holds on the target, plus any held
/// right that makes every attribute readable. Names compare case-insensitively.
#[derive(Debug, Clone)]
pub struct AttributeFilter {
    target: Target,
    full_read: bool,
    /// lower-cased attribute -> (read, write)
    granted: HashMap<String, (bool, bool)>,
}

impl AttributeFilter {
    pub fn new<I>(target: Target, full_read: bool, held: I) -> Self
    where
        I: IntoIterator<Item = (String, AccessMode)>,
    {
        let mut granted: HashMap<String, (bool, bool)> = HashMap::new();
        for (attribute, mode) in held {
            let flags = granted.entry(attribute.to_lowercase()).or_default();
            flags.0 |= mode.can_read();
            flags.1 |= mode.can_write();
        }
        Self {
            target,
            full_read,
            granted,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn classify(&self, attribute: &str) -> AttrAccess {
        let (read, write) = self
            .granted
            .get(&attribute.to_lowercase())
            .copied()
            .unwrap_or_default();
        AttrAccess::from_flags(read || self.full_read, write)
    }

    pub fn can_read(&self, attribute: &str) -> bool {
        self.classify(attribute).can_read()
    }

    pub fn can_write(&self, attribute: &str) -> bool {
        self.classify(attribute).can_write()
    }

    /// Drop every attribute the actor may not read.
    pub fn redact<V, M>(&self, attributes: M) -> M
    where
        M: IntoIterator<Item = (String, V)> + FromIterator<(String, V)>,
    {
        attributes
            .into_iter()
            .filter(|(name, _)| self.can_read(name))
            .collect()
    }

    /// Fail on the first attribute the actor may not write.
    pub fn check_modify<'a, I>(&self, attributes: I) -> Result<(), AccessError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match attributes.into_iter().find(|name| !self.can_write(name)) {
            Some(name) => {
                tracing::debug!(entry = %self.target, attribute = name, "Attribute not writable");
                Err(AccessError::PermissionDenied {
                    right: format!("set.{}.{}", self.target.target_type(), name),
                    target: self.target.to_string(),
                })
            }
            None => Ok(()),
        }
    }
}
