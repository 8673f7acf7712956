//! Spouse-grouped family forest assembly.
//!
//! # Responsibility
//! - Group members into spouse clusters anchored on one bloodline member.
//! - Attach each group under the group holding its anchor's parent.
//!
//! # Invariants
//! - Every distinct member id appears in exactly one group of the forest.
//! - A `root` member's group is always a forest root.
//! - The result is acyclic; cycles in parent links are cut and reported.
//! - Assembly is linear in the snapshot size and does not recurse, whatever
//!   the number of generations.
//! - Output depends only on the snapshot contents and order.

use crate::family::forest::{FamilyForest, FamilyGroupNode, IntegrityWarning};
use crate::model::member::{Member, MemberId};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::iter::once;

/// One spouse cluster before forest attachment, addressed by snapshot position.
struct GroupDraft {
    anchor: usize,
    members: Vec<usize>,
}

/// Assembles a spouse-grouped forest from a flat member snapshot.
///
/// Never fails: dangling links, cycles and ambiguous couples degrade to
/// forest roots and are reported in [`FamilyForest::warnings`].
pub fn assemble(members: &[Member]) -> FamilyForest<'_> {
    let mut warnings = Vec::new();
    let snapshot = dedup_snapshot(members, &mut warnings);
    let index: HashMap<MemberId, usize> = snapshot
        .iter()
        .enumerate()
        .map(|(pos, member)| (member.id, pos))
        .collect();

    let bloodline = bloodline_flags(&snapshot);
    let anchors = resolve_anchors(&snapshot, &index, &bloodline, &mut warnings);
    let drafts = build_groups(&snapshot, &anchors);

    let mut member_group: HashMap<MemberId, usize> = HashMap::with_capacity(snapshot.len());
    for (group_idx, draft) in drafts.iter().enumerate() {
        for &pos in &draft.members {
            member_group.insert(snapshot[pos].id, group_idx);
        }
    }

    let candidates: Vec<Option<usize>> = drafts
        .iter()
        .enumerate()
        .map(|(group_idx, draft)| {
            candidate_parent(
                group_idx,
                snapshot[draft.anchor],
                &member_group,
                &mut warnings,
            )
        })
        .collect();
    let parents = break_cycles(&snapshot, &drafts, candidates, &mut warnings);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); drafts.len()];
    let mut roots = Vec::new();
    for (group_idx, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent_idx) => children[*parent_idx].push(group_idx),
            None => roots.push(group_idx),
        }
    }

    let forest = FamilyForest {
        roots: build_forest(&roots, &snapshot, &drafts, &children),
        warnings,
    };

    for warning in &forest.warnings {
        warn!(
            "event=integrity_warning module=family kind={} member={}",
            warning.kind(),
            warning.member_id()
        );
    }
    debug!(
        "event=forest_assembled module=family members={} groups={} roots={} warnings={}",
        snapshot.len(),
        drafts.len(),
        forest.roots.len(),
        forest.warnings.len()
    );
    forest
}

/// Keeps the first record for every id; later duplicates are dropped.
fn dedup_snapshot<'a>(
    members: &'a [Member],
    warnings: &mut Vec<IntegrityWarning>,
) -> Vec<&'a Member> {
    let mut seen = HashSet::with_capacity(members.len());
    let mut snapshot = Vec::with_capacity(members.len());
    for member in members {
        if seen.insert(member.id) {
            snapshot.push(member);
        } else {
            warnings.push(IntegrityWarning::DuplicateMember {
                member_id: member.id,
            });
        }
    }
    snapshot
}

fn bloodline_flags(snapshot: &[&Member]) -> Vec<bool> {
    let referenced_parents: HashSet<MemberId> = snapshot
        .iter()
        .filter_map(|member| member.parent_id)
        .collect();
    snapshot
        .iter()
        .map(|member| {
            member.parent_id.is_some()
                || member.is_root()
                || referenced_parents.contains(&member.id)
        })
        .collect()
}

/// Resolves the anchor position for every snapshot position.
fn resolve_anchors(
    snapshot: &[&Member],
    index: &HashMap<MemberId, usize>,
    bloodline: &[bool],
    warnings: &mut Vec<IntegrityWarning>,
) -> Vec<usize> {
    for member in snapshot {
        if let Some(spouse_id) = member.spouse_id {
            if !index.contains_key(&spouse_id) {
                warnings.push(IntegrityWarning::UnresolvedSpouse {
                    member_id: member.id,
                    spouse_id,
                });
            }
        }
    }

    // First bloodline member (input order) claiming each spouse id.
    let mut bloodline_claims: HashMap<MemberId, usize> = HashMap::new();
    for (pos, member) in snapshot.iter().enumerate() {
        if let (true, Some(spouse_id)) = (bloodline[pos], member.spouse_id) {
            bloodline_claims.entry(spouse_id).or_insert(pos);
        }
    }

    let mut anchors: Vec<Option<usize>> = snapshot
        .iter()
        .enumerate()
        .map(|(pos, member)| {
            if bloodline[pos] {
                return Some(pos);
            }
            let direct = member
                .spouse_id
                .and_then(|spouse_id| index.get(&spouse_id).copied())
                .filter(|spouse_pos| bloodline[*spouse_pos]);
            direct.or_else(|| bloodline_claims.get(&member.id).copied())
        })
        .collect();

    // Remaining members have no bloodline link; pair them up by spouse links.
    let mut loose_claims: HashMap<MemberId, Vec<usize>> = HashMap::new();
    for (pos, member) in snapshot.iter().enumerate() {
        if let (None, Some(spouse_id)) = (anchors[pos], member.spouse_id) {
            loose_claims.entry(spouse_id).or_default().push(pos);
        }
    }

    for pos in 0..snapshot.len() {
        if anchors[pos].is_some() {
            continue;
        }
        anchors[pos] = Some(pos);
        let member = snapshot[pos];

        let declared = member
            .spouse_id
            .and_then(|spouse_id| index.get(&spouse_id).copied());
        let claimed = loose_claims.get(&member.id).into_iter().flatten().copied();
        for partner in declared.into_iter().chain(claimed) {
            if anchors[partner].is_none() {
                anchors[partner] = Some(pos);
                warnings.push(IntegrityWarning::IsolatedCouple {
                    anchor_id: member.id,
                    partner_id: snapshot[partner].id,
                });
            }
        }
    }

    anchors
        .into_iter()
        .enumerate()
        .map(|(pos, anchor)| anchor.unwrap_or(pos))
        .collect()
}

/// Builds ordered groups; groups follow their anchor's snapshot position.
fn build_groups(snapshot: &[&Member], anchors: &[usize]) -> Vec<GroupDraft> {
    let mut group_of_anchor: HashMap<usize, usize> = HashMap::new();
    let mut spouses: Vec<Vec<usize>> = Vec::new();
    let mut anchor_positions = Vec::new();
    for (pos, anchor) in anchors.iter().enumerate() {
        if *anchor == pos {
            group_of_anchor.insert(pos, anchor_positions.len());
            anchor_positions.push(pos);
            spouses.push(Vec::new());
        }
    }
    for (pos, anchor) in anchors.iter().enumerate() {
        if *anchor != pos {
            if let Some(group_idx) = group_of_anchor.get(anchor) {
                spouses[*group_idx].push(pos);
            }
        }
    }
    debug_assert_eq!(
        anchor_positions.len() + spouses.iter().map(Vec::len).sum::<usize>(),
        snapshot.len()
    );

    anchor_positions
        .into_iter()
        .zip(spouses)
        .map(|(anchor, spouses)| GroupDraft {
            anchor,
            members: arrange_group(anchor, &spouses),
        })
        .collect()
}

/// Places the anchor centrally among its spouses.
///
/// Size 1 and 2 keep the anchor first. Larger groups put the anchor at index
/// `size / 2`, with the first `size / 2` spouses on its left.
fn arrange_group(anchor: usize, spouses: &[usize]) -> Vec<usize> {
    let size = spouses.len() + 1;
    if size <= 2 {
        return once(anchor).chain(spouses.iter().copied()).collect();
    }
    let (left, right) = spouses.split_at(size / 2);
    left.iter()
        .copied()
        .chain(once(anchor))
        .chain(right.iter().copied())
        .collect()
}

fn candidate_parent(
    group_idx: usize,
    anchor: &Member,
    member_group: &HashMap<MemberId, usize>,
    warnings: &mut Vec<IntegrityWarning>,
) -> Option<usize> {
    let parent_id = anchor.parent_id?;
    if anchor.is_root() {
        warnings.push(IntegrityWarning::RootWithParent {
            member_id: anchor.id,
            parent_id,
        });
        return None;
    }
    match member_group.get(&parent_id) {
        Some(&parent_group) if parent_group == group_idx => {
            warnings.push(IntegrityWarning::CycleDetected {
                anchor_id: anchor.id,
                parent_id,
            });
            None
        }
        Some(&parent_group) => Some(parent_group),
        None => {
            warnings.push(IntegrityWarning::DanglingParent {
                member_id: anchor.id,
                parent_id,
            });
            None
        }
    }
}

/// Walk state of one group while cutting cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unseen,
    /// On the chain being walked, at this chain position.
    OnChain(usize),
    Resolved,
}

/// Cuts parent cycles so the first group of each cycle becomes a root.
///
/// Every group is walked once: a chain is resolved when it reaches a root, an
/// already resolved group, or a cycle, which is cut before resolving.
fn break_cycles(
    snapshot: &[&Member],
    drafts: &[GroupDraft],
    mut parents: Vec<Option<usize>>,
    warnings: &mut Vec<IntegrityWarning>,
) -> Vec<Option<usize>> {
    let mut visits = vec![Visit::Unseen; parents.len()];
    let mut chain: Vec<usize> = Vec::new();
    for start in 0..parents.len() {
        if visits[start] != Visit::Unseen {
            continue;
        }

        let mut cursor = Some(start);
        while let Some(current) = cursor {
            match visits[current] {
                Visit::Resolved => break,
                Visit::OnChain(position) => {
                    if let Some(cut) = chain[position..].iter().copied().min() {
                        let anchor = snapshot[drafts[cut].anchor];
                        warnings.push(IntegrityWarning::CycleDetected {
                            anchor_id: anchor.id,
                            parent_id: anchor.parent_id.unwrap_or(anchor.id),
                        });
                        parents[cut] = None;
                    }
                    break;
                }
                Visit::Unseen => {
                    visits[current] = Visit::OnChain(chain.len());
                    chain.push(current);
                    cursor = parents[current];
                }
            }
        }

        for group_idx in chain.drain(..) {
            visits[group_idx] = Visit::Resolved;
        }
    }
    parents
}

/// Builds nodes children-first so deep lineages need no recursion.
fn build_forest<'a>(
    roots: &[usize],
    snapshot: &[&'a Member],
    drafts: &[GroupDraft],
    children: &[Vec<usize>],
) -> Vec<FamilyGroupNode<'a>> {
    let mut pre_order = Vec::with_capacity(drafts.len());
    let mut pending = roots.to_vec();
    while let Some(group_idx) = pending.pop() {
        pre_order.push(group_idx);
        pending.extend(children[group_idx].iter().copied());
    }

    let mut built: Vec<Option<FamilyGroupNode<'a>>> = drafts.iter().map(|_| None).collect();
    for &group_idx in pre_order.iter().rev() {
        let draft = &drafts[group_idx];
        let node = FamilyGroupNode {
            anchor_id: snapshot[draft.anchor].id,
            members: draft.members.iter().map(|pos| snapshot[*pos]).collect(),
            children: children[group_idx]
                .iter()
                .filter_map(|child_idx| built[*child_idx].take())
                .collect(),
        };
        built[group_idx] = Some(node);
    }

    roots
        .iter()
        .filter_map(|group_idx| built[*group_idx].take())
        .collect()
}
