//! Organize pass for the category forest.
//!
//! Categories are stored as flat rows: a global `sort` column and an optional
//! parent id. The forest is only ever two levels deep: parent categories
//! (`allow_discussions = false`) are roots and leaves hang under the nearest
//! parent that precedes them in sort order.
//!
//! [`organize`] takes the rows already sorted by `sort` and returns the
//! layout they must have afterwards. It never re-sorts; callers pass a
//! [`SortedNodes`], whose constructor rejects out-of-order input.
//!
//! When at least one parent exists the resulting `sort` values are dense
//! (`1..=n`). When none exists the pass is a no-op and existing values, gaps
//! included, are kept.

use std::collections::HashMap;
use std::fmt;

use crate::features::categories::models::Category;

/// The part of a category row the organize pass reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub allow_discussions: bool,
    pub sort: i32,
}

impl TreeNode {
    pub fn is_parent(&self) -> bool {
        !self.allow_discussions
    }
}

impl From<&Category> for TreeNode {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_category_id,
            allow_discussions: c.allow_discussions,
            sort: c.sort,
        }
    }
}

/// Rows ordered by `(sort, id)`.
#[derive(Debug, Clone, Copy)]
pub struct SortedNodes<'a>(&'a [TreeNode]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsortedNodes {
    pub position: usize,
}

impl fmt::Display for UnsortedNodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "categories are not ordered by sort at position {}",
            self.position
        )
    }
}

impl std::error::Error for UnsortedNodes {}

impl<'a> SortedNodes<'a> {
    pub fn new(nodes: &'a [TreeNode]) -> Result<Self, UnsortedNodes> {
        match nodes
            .windows(2)
            .position(|w| (w[0].sort, w[0].id) > (w[1].sort, w[1].id))
        {
            Some(i) => Err(UnsortedNodes { position: i + 1 }),
            None => Ok(Self(nodes)),
        }
    }

    pub fn as_slice(&self) -> &'a [TreeNode] {
        self.0
    }
}

/// Final position of one category after an organize pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: i64,
    pub sort: i32,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizePlan {
    /// No parent category exists; nothing is rewritten.
    Flat,
    /// Every category's final placement, in final sort order.
    Layout(Vec<Placement>),
}

impl OrganizePlan {
    pub fn is_flat(&self) -> bool {
        matches!(self, OrganizePlan::Flat)
    }

    pub fn placements(&self) -> &[Placement] {
        match self {
            OrganizePlan::Flat => &[],
            OrganizePlan::Layout(placements) => placements,
        }
    }

    /// Placements that differ from the current rows.
    ///
    /// Writing only these leaves the store in the same final state as
    /// writing the whole layout.
    pub fn changes(&self, current: &[TreeNode]) -> Vec<Placement> {
        let by_id: HashMap<i64, &TreeNode> = current.iter().map(|n| (n.id, n)).collect();
        self.placements()
            .iter()
            .filter(|p| {
                by_id
                    .get(&p.id)
                    .map_or(true, |n| n.sort != p.sort || n.parent_id != p.parent_id)
            })
            .copied()
            .collect()
    }
}

/// Compute the organized layout of the forest.
///
/// Walking in sort order with the most recent parent as `current`:
/// - rows before the first parent are orphans, deferred to the end;
/// - `current` itself and rows already under it keep their parent;
/// - any other row is moved under `current`.
///
/// Each row takes the next dense sort value. Orphans are then appended in
/// their original relative order under the last parent seen.
pub fn organize(nodes: SortedNodes<'_>) -> OrganizePlan {
    let nodes = nodes.as_slice();
    if !nodes.iter().any(TreeNode::is_parent) {
        return OrganizePlan::Flat;
    }

    let mut placements = Vec::with_capacity(nodes.len());
    let mut orphans = Vec::new();
    let mut current: Option<i64> = None;
    let mut next_sort = 0i32;

    for node in nodes {
        if node.is_parent() {
            current = Some(node.id);
        }

        let Some(parent) = current else {
            orphans.push(node);
            continue;
        };

        next_sort += 1;
        let parent_id = if node.id == parent || node.parent_id == Some(parent) {
            node.parent_id
        } else {
            Some(parent)
        };
        placements.push(Placement {
            id: node.id,
            sort: next_sort,
            parent_id,
        });
    }

    // At least one parent exists, so `current` is set by now
    for orphan in orphans {
        next_sort += 1;
        placements.push(Placement {
            id: orphan.id,
            sort: next_sort,
            parent_id: current,
        });
    }

    OrganizePlan::Layout(placements)
}
