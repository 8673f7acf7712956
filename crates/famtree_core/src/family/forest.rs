//! Family forest read model consumed by tree renderers.
//!
//! Traversal helpers and drop are iterative. Derived comparison, cloning and
//! serialization recurse once per generation.

use crate::model::member::{Member, MemberId};
use serde::Serialize;

/// One spouse cluster positioned in the family forest.
///
/// Members are borrowed from the repository snapshot; the forest never owns
/// member records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyGroupNode<'a> {
    /// Bloodline member representing this group's position.
    pub anchor_id: MemberId,
    /// Ordered members; the anchor sits centrally when there are more than two.
    pub members: Vec<&'a Member>,
    /// Groups anchored on children of any member of this group.
    pub children: Vec<FamilyGroupNode<'a>>,
}

impl<'a> FamilyGroupNode<'a> {
    /// Returns member ids in display order.
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|member| member.id).collect()
    }

    /// Returns the anchor member record.
    pub fn anchor(&self) -> Option<&'a Member> {
        self.members
            .iter()
            .copied()
            .find(|member| member.id == self.anchor_id)
    }

    pub fn contains(&self, member_id: MemberId) -> bool {
        self.members.iter().any(|member| member.id == member_id)
    }
}

impl Drop for FamilyGroupNode<'_> {
    // Flattens descendants so dropping a long lineage does not recurse.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Non-fatal data-integrity findings raised during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// A later record reused an id; only the first record is kept.
    DuplicateMember { member_id: MemberId },
    /// `parent_id` points at no member of the snapshot.
    DanglingParent {
        member_id: MemberId,
        parent_id: MemberId,
    },
    /// Declared root also carries a parent link, which is ignored.
    RootWithParent {
        member_id: MemberId,
        parent_id: MemberId,
    },
    /// Attaching this group would make it its own descendant.
    CycleDetected {
        anchor_id: MemberId,
        parent_id: MemberId,
    },
    /// `spouse_id` points at no member of the snapshot.
    UnresolvedSpouse {
        member_id: MemberId,
        spouse_id: MemberId,
    },
    /// Couple without any bloodline link; first member in input order anchors.
    IsolatedCouple {
        anchor_id: MemberId,
        partner_id: MemberId,
    },
}

impl IntegrityWarning {
    /// Stable snake_case name used in logs and serialized output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateMember { .. } => "duplicate_member",
            Self::DanglingParent { .. } => "dangling_parent",
            Self::RootWithParent { .. } => "root_with_parent",
            Self::CycleDetected { .. } => "cycle_detected",
            Self::UnresolvedSpouse { .. } => "unresolved_spouse",
            Self::IsolatedCouple { .. } => "isolated_couple",
        }
    }

    /// Member the warning is about.
    pub fn member_id(&self) -> MemberId {
        match self {
            Self::DuplicateMember { member_id }
            | Self::DanglingParent { member_id, .. }
            | Self::RootWithParent { member_id, .. }
            | Self::UnresolvedSpouse { member_id, .. } => *member_id,
            Self::CycleDetected { anchor_id, .. } | Self::IsolatedCouple { anchor_id, .. } => {
                *anchor_id
            }
        }
    }
}

/// Assembled forest plus accumulated integrity warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyForest<'a> {
    pub roots: Vec<FamilyGroupNode<'a>>,
    pub warnings: Vec<IntegrityWarning>,
}

impl<'a> FamilyForest<'a> {
    /// Pre-order traversal yielding `(depth, node)`; roots have depth 0.
    pub fn walk(&self) -> ForestWalk<'_, 'a> {
        ForestWalk {
            stack: self.roots.iter().rev().map(|node| (0, node)).collect(),
        }
    }

    pub fn group_count(&self) -> usize {
        self.walk().count()
    }

    pub fn member_count(&self) -> usize {
        self.walk().map(|(_, node)| node.members.len()).sum()
    }

    /// Number of generations, counting root groups as the first one.
    pub fn depth(&self) -> usize {
        self.walk().map(|(depth, _)| depth + 1).max().unwrap_or(0)
    }

    /// Finds the group containing `member_id`, anchor or spouse.
    pub fn find_group(&self, member_id: MemberId) -> Option<&FamilyGroupNode<'a>> {
        self.walk()
            .map(|(_, node)| node)
            .find(|node| node.contains(member_id))
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Depth-first iterator over a [`FamilyForest`].
pub struct ForestWalk<'f, 'a> {
    stack: Vec<(usize, &'f FamilyGroupNode<'a>)>,
}

impl<'f, 'a> Iterator for ForestWalk<'f, 'a> {
    type Item = (usize, &'f FamilyGroupNode<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}
