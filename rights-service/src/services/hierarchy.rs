//! Target hierarchy - the ordered chain of scopes a grant can reach a target from.

use std::collections::BTreeMap;

use crate::models::{Target, TargetType};
use crate::services::directory::GroupMembership;

/// Targets consulted together. Deny-wins applies across every target in a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeLevel {
    pub targets: Vec<Target>,
}

impl ScopeLevel {
    fn single(target: Target) -> Self {
        Self {
            targets: vec![target],
        }
    }
}

/// Scope chain of `target`, narrowest first, always ending with the global scope.
///
/// `memberships` are the groups containing the target; they are ignored for
/// types that cannot be group members.
pub fn scope_chain(target: &Target, memberships: &[GroupMembership]) -> Vec<ScopeLevel> {
    let mut chain = vec![ScopeLevel::single(target.clone())];
    let target_type = target.target_type();

    if target_type == TargetType::Global {
        return chain;
    }

    if target_type.can_be_group_member() {
        let mut by_depth: BTreeMap<u32, Vec<Target>> = BTreeMap::new();
        for membership in memberships {
            // dynamic groups never nest
            if membership.dynamic && membership.depth > 1 {
                continue;
            }
            let group = membership.target();
            if &group == target {
                continue;
            }
            let level = by_depth.entry(membership.depth).or_default();
            if !level.contains(&group) {
                level.push(group);
            }
        }
        chain.extend(
            by_depth
                .into_values()
                .map(|targets| ScopeLevel { targets }),
        );
    }

    if let Some(domain) = target.domain() {
        chain.push(ScopeLevel::single(Target::Domain(domain.to_string())));
    }

    chain.push(ScopeLevel::single(Target::Global));
    chain
}
