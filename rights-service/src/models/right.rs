//! Right model - immutable capability definitions held by the catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::TargetType;

/// Class of a right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RightClass {
    /// A coarse action, e.g. `manageVolume`.
    Preset,
    /// Control over a single named attribute.
    Attr,
    /// A named bundle of other rights.
    Combo,
}

impl RightClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RightClass::Preset => "PRESET",
            RightClass::Attr => "ATTR",
            RightClass::Combo => "COMBO",
        }
    }
}

impl std::str::FromStr for RightClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PRESET" => Ok(RightClass::Preset),
            "ATTR" => Ok(RightClass::Attr),
            "COMBO" => Ok(RightClass::Combo),
            _ => Err(format!("Invalid right class: {}", s)),
        }
    }
}

/// Access mode of an ATTR right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    pub fn can_read(&self) -> bool {
        matches!(self, AccessMode::Read | AccessMode::ReadWrite)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::ReadWrite)
    }
}

/// The attribute an ATTR right governs, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrSpec {
    /// Lower-cased attribute name.
    pub attribute: String,
    pub mode: AccessMode,
}

/// A resolved right, as served by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Right {
    pub name: String,
    pub class: RightClass,
    pub description: String,
    pub applicable_target_types: BTreeSet<TargetType>,
    /// Present only on ATTR rights.
    pub attr: Option<AttrSpec>,
    /// Direct members of a COMBO right.
    pub members: Vec<String>,
    /// Holding this PRESET/COMBO right makes every attribute of the target readable.
    pub all_attrs_read: bool,
    /// The pseudo-right that is allowed without consulting any grant.
    pub always_allow: bool,
}

impl Right {
    pub fn is_attr(&self) -> bool {
        self.class == RightClass::Attr
    }

    pub fn is_combo(&self) -> bool {
        self.class == RightClass::Combo
    }

    /// Whether the right can be checked against a target of this type.
    pub fn applies_to(&self, target_type: TargetType) -> bool {
        self.applicable_target_types.contains(&target_type)
    }

    /// Whether the right can be granted on a target of this type: the type
    /// itself or any type whose grants flow down to an applicable type.
    pub fn grantable_on(&self, target_type: TargetType) -> bool {
        self.applicable_target_types
            .iter()
            .any(|applicable| target_type.is_inherited_by(*applicable))
    }
}

/// Raw right definition, as written in the built-in table or a definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightDefinition {
    pub name: String,
    pub class: RightClass,
    #[serde(default)]
    pub description: String,
    /// Required for PRESET and ATTR rights. Derived from members for COMBO rights.
    #[serde(default)]
    pub target_types: Vec<TargetType>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub access_mode: Option<AccessMode>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub all_attrs_read: bool,
    #[serde(default)]
    pub always_allow: bool,
}

impl RightDefinition {
    pub fn preset(name: &str, target_types: &[TargetType], description: &str) -> Self {
        Self {
            name: name.to_string(),
            class: RightClass::Preset,
            description: description.to_string(),
            target_types: target_types.to_vec(),
            attribute: None,
            access_mode: None,
            members: Vec::new(),
            all_attrs_read: false,
            always_allow: false,
        }
    }

    pub fn attr(
        name: &str,
        target_type: TargetType,
        attribute: &str,
        mode: AccessMode,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            class: RightClass::Attr,
            description: description.to_string(),
            target_types: vec![target_type],
            attribute: Some(attribute.to_string()),
            access_mode: Some(mode),
            members: Vec::new(),
            all_attrs_read: false,
            always_allow: false,
        }
    }

    pub fn combo(name: &str, members: &[&str], description: &str) -> Self {
        Self {
            name: name.to_string(),
            class: RightClass::Combo,
            description: description.to_string(),
            target_types: Vec::new(),
            attribute: None,
            access_mode: None,
            members: members.iter().map(|m| m.to_string()).collect(),
            all_attrs_read: false,
            always_allow: false,
        }
    }

    pub fn reading_all_attrs(mut self) -> Self {
        self.all_attrs_read = true;
        self
    }

    pub fn always_allowed(mut self) -> Self {
        self.always_allow = true;
        self
    }
}
