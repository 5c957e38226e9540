//! Right catalog - the immutable registry of known rights.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::models::{AttrSpec, Right, RightClass, RightDefinition, TargetType};
use crate::services::definitions::builtin_definitions;
use crate::services::error::{AccessError, CatalogError};

/// Registry of right definitions, built once and read-only afterwards.
///
/// Reloading builds a fresh catalog and swaps it in whole.
#[derive(Debug, Clone)]
pub struct RightCatalog {
    rights: BTreeMap<String, Arc<Right>>,
    /// Right name -> every right whose grant satisfies it, itself included.
    implied_by: HashMap<String, HashSet<String>>,
}

impl RightCatalog {
    /// Build from the built-in definition set.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::build(builtin_definitions())
    }

    /// Build from the built-in set plus an optional JSON definition file.
    pub fn load(extra_definitions: Option<&Path>) -> Result<Self, CatalogError> {
        let mut definitions = builtin_definitions();
        if let Some(path) = extra_definitions {
            let raw = std::fs::read_to_string(path)?;
            let extra: Vec<RightDefinition> = serde_json::from_str(&raw)?;
            tracing::info!(
                path = %path.display(),
                count = extra.len(),
                "Loaded extra right definitions"
            );
            definitions.extend(extra);
        }
        Self::build(definitions)
    }

    pub fn build(definitions: Vec<RightDefinition>) -> Result<Self, CatalogError> {
        let mut by_name: BTreeMap<String, RightDefinition> = BTreeMap::new();
        for def in definitions {
            validate_definition(&def)?;
            if by_name.contains_key(&def.name) {
                return Err(CatalogError::DuplicateRight(def.name));
            }
            by_name.insert(def.name.clone(), def);
        }

        // Flatten combos: every right each combo transitively contains.
        let mut closures: HashMap<String, BTreeSet<String>> = HashMap::new();
        for name in by_name.keys() {
            let mut visiting = HashSet::new();
            expand_members(name, &by_name, &mut closures, &mut visiting)?;
        }

        let mut implied_by: HashMap<String, HashSet<String>> = by_name
            .keys()
            .map(|name| (name.clone(), HashSet::from([name.clone()])))
            .collect();
        for (combo, members) in &closures {
            for member in members {
                if let Some(implying) = implied_by.get_mut(member) {
                    implying.insert(combo.clone());
                }
            }
        }

        let mut rights = BTreeMap::new();
        for (name, def) in &by_name {
            let applicable_target_types = match def.class {
                RightClass::Combo => closures
                    .get(name)
                    .into_iter()
                    .flatten()
                    .filter_map(|member| by_name.get(member))
                    .filter(|member| member.class != RightClass::Combo)
                    .flat_map(|member| member.target_types.iter().copied())
                    .collect(),
                _ => def.target_types.iter().copied().collect(),
            };

            let attr = match (def.class, &def.attribute, def.access_mode) {
                (RightClass::Attr, Some(attribute), Some(mode)) => Some(AttrSpec {
                    attribute: attribute.to_lowercase(),
                    mode,
                }),
                _ => None,
            };

            rights.insert(
                name.clone(),
                Arc::new(Right {
                    name: name.clone(),
                    class: def.class,
                    description: def.description.clone(),
                    applicable_target_types,
                    attr,
                    members: def.members.clone(),
                    all_attrs_read: def.all_attrs_read,
                    always_allow: def.always_allow,
                }),
            );
        }

        tracing::info!(
            rights = rights.len(),
            combos = closures.len(),
            "Right catalog built"
        );

        Ok(Self { rights, implied_by })
    }

    pub fn lookup(&self, name: &str) -> Result<&Arc<Right>, AccessError> {
        self.rights
            .get(name)
            .ok_or_else(|| AccessError::NoSuchRight(name.to_string()))
    }

    /// Rights in stable name order, optionally filtered.
    pub fn list(
        &self,
        target_type: Option<TargetType>,
        class: Option<RightClass>,
    ) -> Vec<Arc<Right>> {
        self.rights
            .values()
            .filter(|r| target_type.is_none_or(|tt| r.applies_to(tt)))
            .filter(|r| class.is_none_or(|c| r.class == c))
            .cloned()
            .collect()
    }

    /// Names of every right whose grant satisfies `name`, including `name`.
    pub fn implying(&self, name: &str) -> Option<&HashSet<String>> {
        self.implied_by.get(name)
    }

    /// ATTR rights governing attributes of the given target type.
    pub fn attr_rights_for(&self, target_type: TargetType) -> impl Iterator<Item = &Arc<Right>> {
        self.rights
            .values()
            .filter(move |r| r.is_attr() && r.applies_to(target_type))
    }

    /// PRESET/COMBO rights that make every attribute of the type readable.
    pub fn full_read_rights_for(
        &self,
        target_type: TargetType,
    ) -> impl Iterator<Item = &Arc<Right>> {
        self.rights
            .values()
            .filter(move |r| r.all_attrs_read && r.applies_to(target_type))
    }

    pub fn len(&self) -> usize {
        self.rights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rights.is_empty()
    }
}

fn validate_definition(def: &RightDefinition) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidDefinition {
        name: def.name.clone(),
        reason: reason.to_string(),
    };

    if def.name.trim().is_empty() {
        return Err(invalid("empty name"));
    }
    if def.always_allow && def.class != RightClass::Preset {
        return Err(invalid("only preset rights may be always allowed"));
    }

    match def.class {
        RightClass::Preset => {
            if def.target_types.is_empty() {
                return Err(invalid("no target types"));
            }
            if def.attribute.is_some() || def.access_mode.is_some() || !def.members.is_empty() {
                return Err(invalid("preset rights take no attribute, access mode or members"));
            }
        }
        RightClass::Attr => {
            if def.target_types.len() != 1 {
                return Err(invalid("attribute rights apply to exactly one target type"));
            }
            if def.attribute.as_deref().is_none_or(|a| a.trim().is_empty()) {
                return Err(invalid("missing attribute"));
            }
            if def.access_mode.is_none() {
                return Err(invalid("missing access mode"));
            }
            if !def.members.is_empty() || def.all_attrs_read {
                return Err(invalid("attribute rights take no members"));
            }
        }
        RightClass::Combo => {
            if def.members.is_empty() {
                return Err(invalid("combo right without members"));
            }
            if !def.target_types.is_empty() {
                return Err(invalid("combo target types are derived from members"));
            }
            if def.attribute.is_some() || def.access_mode.is_some() {
                return Err(invalid("combo rights take no attribute or access mode"));
            }
        }
    }
    Ok(())
}

fn expand_members(
    name: &str,
    by_name: &BTreeMap<String, RightDefinition>,
    closures: &mut HashMap<String, BTreeSet<String>>,
    visiting: &mut HashSet<String>,
) -> Result<BTreeSet<String>, CatalogError> {
    let Some(def) = by_name.get(name) else {
        return Ok(BTreeSet::new());
    };
    if def.class != RightClass::Combo {
        return Ok(BTreeSet::new());
    }
    if let Some(done) = closures.get(name) {
        return Ok(done.clone());
    }
    if !visiting.insert(name.to_string()) {
        return Err(CatalogError::ComboCycle(name.to_string()));
    }

    let mut closure = BTreeSet::new();
    for member in &def.members {
        if !by_name.contains_key(member) {
            return Err(CatalogError::UnknownMember {
                combo: name.to_string(),
                member: member.clone(),
            });
        }
        if member == name {
            return Err(CatalogError::ComboCycle(name.to_string()));
        }
        closure.insert(member.clone());
        closure.extend(expand_members(member, by_name, closures, visiting)?);
    }

    visiting.remove(name);
    closures.insert(name.to_string(), closure.clone());
    Ok(closure)
}
