//! Group membership resolution for the legacy access-policy path

use permit_core::{Group, GroupId};
use std::collections::BTreeSet;

/// Resolves which groups a principal belongs to
///
/// Membership is a single hop: groups never contain other groups.
#[derive(Debug, Clone, Copy)]
pub struct GroupResolver<'a> {
    groups: &'a [Group],
}

impl<'a> GroupResolver<'a> {
    pub fn new(groups: &'a [Group]) -> Self {
        Self { groups }
    }

    /// Ids of every group whose member list contains `principal` verbatim
    pub fn groups_containing(&self, principal: &str) -> BTreeSet<GroupId> {
        self.groups_of(principal).map(|g| g.id).collect()
    }

    pub fn groups_of<'p>(&self, principal: &'p str) -> impl Iterator<Item = &'a Group> + 'p
    where
        'a: 'p,
    {
        let groups: &'a [Group] = self.groups;
        groups
            .iter()
            .filter(move |group| group.contains_member(principal))
    }
}
