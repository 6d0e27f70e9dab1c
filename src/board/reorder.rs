//! Order recomputation for sibling scopes.
//!
//! Pure functions over a scope's collection. They never talk to the store or
//! the remote service; the coordinator wraps them with snapshot/rollback.

use serde::{Deserialize, Serialize};

use super::models::Orderable;

/// How a cross-scope move numbers the two scopes it touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossScopeNumbering {
    /// Only the moved entity's order changes. The source keeps its gap and
    /// the target may hold a duplicate until the next fetch.
    #[default]
    Preserve,
    /// Both scopes are renumbered 1..N by position after the move.
    Densify,
}

impl std::fmt::Display for CrossScopeNumbering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preserve => write!(f, "preserve"),
            Self::Densify => write!(f, "densify"),
        }
    }
}

impl std::str::FromStr for CrossScopeNumbering {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "densify" => Ok(Self::Densify),
            _ => anyhow::bail!(
                "Invalid cross-scope numbering '{}'. Valid values: preserve, densify",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// The entity is not in the collection.
    Stale,
    /// The entity already has the requested order.
    Unchanged,
    Moved { from: u32, to: u32 },
}

/// Move `entity_id` to `target` and shift the siblings in between by one.
///
/// Moving toward the front bumps every sibling in `[target, old - 1]` up by
/// one; moving toward the back drops every sibling in `[old + 1, target]` by
/// one. The collection is re-sorted by order afterwards so iteration order
/// matches the order field. Out-of-range targets are applied as given.
pub fn shift_within<E: Orderable>(siblings: &mut [E], entity_id: &str, target: u32) -> Shift {
    let Some(old) = siblings
        .iter()
        .find(|e| e.id() == entity_id)
        .map(|e| e.order())
    else {
        return Shift::Stale;
    };
    if old == target {
        return Shift::Unchanged;
    }

    let to_front = old > target;
    for sibling in siblings.iter_mut() {
        if sibling.id() == entity_id {
            sibling.set_order(target);
            continue;
        }
        let order = sibling.order();
        if to_front && (target..old).contains(&order) {
            sibling.set_order(order + 1);
        } else if !to_front && (old + 1..=target).contains(&order) {
            sibling.set_order(order - 1);
        }
    }
    siblings.sort_by_key(|e| e.order());

    Shift::Moved {
        from: old,
        to: target,
    }
}

/// Take an entity out of its scope. Remaining siblings keep their orders.
pub fn remove_entity<E: Orderable>(siblings: &mut Vec<E>, entity_id: &str) -> Option<E> {
    let index = siblings.iter().position(|e| e.id() == entity_id)?;
    Some(siblings.remove(index))
}

/// Insert an entity at position `target` (1-based) with array-insertion
/// semantics. Positions past the end append. Only the inserted entity's
/// order is set; displaced siblings keep theirs. Returns the index used.
pub fn insert_at<E: Orderable>(siblings: &mut Vec<E>, mut entity: E, target: u32) -> usize {
    let index = (target.saturating_sub(1) as usize).min(siblings.len());
    entity.set_order(target);
    siblings.insert(index, entity);
    index
}

/// Renumber a collection 1..N following its current iteration order.
pub fn densify<E: Orderable>(siblings: &mut [E]) {
    for (index, sibling) in siblings.iter_mut().enumerate() {
        sibling.set_order(index as u32 + 1);
    }
}

/// Whether the order values form exactly `{1..N}`.
pub fn is_dense<E: Orderable>(siblings: &[E]) -> bool {
    let mut orders: Vec<u32> = siblings.iter().map(|e| e.order()).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order == index as u32 + 1)
}

/// Whether a move turned a dense scope into a non-dense one. A scope that
/// already had gaps or duplicates never counts as losing density.
pub fn density_lost<E: Orderable>(was_dense: bool, siblings: &[E]) -> bool {
    was_dense && !is_dense(siblings)
}
