use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};

use crate::models::Target;
use crate::services::error::BackendError;

/// One group an entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupMembership {
    pub group_id: String,
    /// 1 for direct membership, +1 per level of static nesting.
    pub depth: u32,
    pub dynamic: bool,
}

impl GroupMembership {
    pub fn direct(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            depth: 1,
            dynamic: false,
        }
    }

    /// The group as a grant scope.
    pub fn target(&self) -> Target {
        if self.dynamic {
            Target::DynamicGroup(self.group_id.clone())
        } else {
            Target::DistributionList(self.group_id.clone())
        }
    }
}

/// Group membership lookup, backed by the external directory.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Every group containing `member`: static groups transitively, dynamic
    /// groups only when `member` is a direct member.
    async fn groups_of(&self, member: &str) -> Result<Vec<GroupMembership>, BackendError>;
}

/// Directory held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    /// member -> static groups it is a direct member of
    static_parents: DashMap<String, HashSet<String>>,
    /// member -> dynamic groups it is a direct member of
    dynamic_parents: DashMap<String, HashSet<String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, group: &str, member: &str) {
        self.static_parents
            .entry(member.to_string())
            .or_default()
            .insert(group.to_string());
    }

    pub fn add_dynamic_member(&self, group: &str, member: &str) {
        self.dynamic_parents
            .entry(member.to_string())
            .or_default()
            .insert(group.to_string());
    }

    pub fn remove_member(&self, group: &str, member: &str) {
        for parents in [&self.static_parents, &self.dynamic_parents] {
            if let Some(mut groups) = parents.get_mut(member) {
                groups.remove(group);
            }
        }
    }

    fn direct_static(&self, member: &str) -> Vec<String> {
        self.static_parents
            .get(member)
            .map(|groups| groups.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GroupDirectory for InMemoryDirectory {
    async fn groups_of(&self, member: &str) -> Result<Vec<GroupMembership>, BackendError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut memberships = Vec::new();

        // Breadth first so each group is recorded at its shortest depth.
        let mut queue: VecDeque<(String, u32)> = self
            .direct_static(member)
            .into_iter()
            .map(|group| (group, 1))
            .collect();
        while let Some((group, depth)) = queue.pop_front() {
            if !seen.insert(group.clone()) {
                continue;
            }
            for parent in self.direct_static(&group) {
                queue.push_back((parent, depth + 1));
            }
            memberships.push(GroupMembership {
                group_id: group,
                depth,
                dynamic: false,
            });
        }

        if let Some(groups) = self.dynamic_parents.get(member) {
            memberships.extend(groups.iter().map(|group| GroupMembership {
                group_id: group.clone(),
                depth: 1,
                dynamic: true,
            }));
        }

        memberships.sort_by(|a, b| a.depth.cmp(&b.depth).then(a.group_id.cmp(&b.group_id)));
        Ok(memberships)
    }
}
