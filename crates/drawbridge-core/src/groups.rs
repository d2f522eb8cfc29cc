//! Group registry.
//!
//! Groups are metadata only: they record element IDs and never touch the
//! element records themselves. Deleting an element does not remove it from
//! any group, so members may refer to elements that no longer exist.

use crate::element::ElementId;
use crate::error::{CommandError, CommandResult};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for groups.
pub type GroupId = String;

/// Mapping from group ID to its ordered member list.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: HashMap<GroupId, Vec<ElementId>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new group. Members are stored verbatim: no dedup and no
    /// existence check.
    pub fn group(&mut self, member_ids: Vec<ElementId>) -> GroupId {
        let group_id = Uuid::new_v4().to_string();
        self.groups.insert(group_id.clone(), member_ids);
        group_id
    }

    /// Dissolve a group and return its former members.
    pub fn ungroup(&mut self, group_id: &str) -> CommandResult<Vec<ElementId>> {
        self.groups
            .remove(group_id)
            .ok_or_else(|| CommandError::group_not_found(group_id))
    }

    /// Get the members of a group.
    pub fn get(&self, group_id: &str) -> Option<&[ElementId]> {
        self.groups.get(group_id).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ElementId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_stores_members_verbatim() {
        let mut registry = GroupRegistry::new();
        let group_id = registry.group(ids(&["a", "b", "a", "ghost"]));
        assert_eq!(registry.get(&group_id), Some(ids(&["a", "b", "a", "ghost"]).as_slice()));
    }

    #[test]
    fn test_ungroup_once() {
        let mut registry = GroupRegistry::new();
        let group_id = registry.group(ids(&["a", "b"]));

        let members = registry.ungroup(&group_id).unwrap();
        assert_eq!(members, ids(&["a", "b"]));
        assert!(registry.is_empty());

        let again = registry.ungroup(&group_id);
        assert!(matches!(again, Err(CommandError::NotFound { kind: "Group", .. })));
    }

    #[test]
    fn test_group_ids_are_unique() {
        let mut registry = GroupRegistry::new();
        let first = registry.group(ids(&["a"]));
        let second = registry.group(ids(&["a"]));
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);

        registry.clear();
        assert!(registry.is_empty());
    }
}
