use serde::Serialize;

use super::models::{Orderable, UpdateRequest};
use super::store::{ScopeSnapshot, StoreHandle};

/// Lifecycle of a single move.
///
/// ```text
/// Idle ──apply──> SpeculativeApplied ──commit───> Committed
///                         │
///                         └──rollback/drop──> RolledBack
/// ```
///
/// A move is `Idle` until its patches land in the store; a [`PendingMove`]
/// only exists from `SpeculativeApplied` onwards. Both terminal states are
/// final: a failed move is never retried, the caller issues a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    Idle,
    SpeculativeApplied,
    Committed,
    RolledBack,
}

impl MoveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SpeculativeApplied => "speculative_applied",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

/// A move whose speculative patches are live in the store.
///
/// Holds the pre-image of every scope it touched. Dropping it before
/// [`commit`](Self::commit) or [`rollback`](Self::rollback) rolls back, so a
/// move abandoned mid-flight never leaves speculative state behind.
#[must_use = "a pending move rolls back when dropped"]
pub struct PendingMove<E: Orderable> {
    store: StoreHandle<E>,
    pre_images: Vec<ScopeSnapshot<E>>,
    request: UpdateRequest<E>,
    state: MoveState,
}

impl<E: Orderable> PendingMove<E> {
    /// Wrap patches that were already applied. `pre_images` must have been
    /// captured before the first patch touched the store.
    pub(crate) fn applied(
        store: StoreHandle<E>,
        pre_images: Vec<ScopeSnapshot<E>>,
        request: UpdateRequest<E>,
    ) -> Self {
        Self {
            store,
            pre_images,
            request,
            state: MoveState::SpeculativeApplied,
        }
    }

    pub fn state(&self) -> MoveState {
        self.state
    }

    pub fn request(&self) -> &UpdateRequest<E> {
        &self.request
    }

    pub fn pre_images(&self) -> &[ScopeSnapshot<E>] {
        &self.pre_images
    }

    /// Keep the speculative state. Returns the final state.
    pub fn commit(mut self) -> MoveState {
        self.pre_images.clear();
        self.state = MoveState::Committed;
        self.state
    }

    /// Restore every touched scope to its pre-image. Returns the final state.
    pub fn rollback(mut self) -> MoveState {
        self.restore_pre_images();
        self.state
    }

    fn restore_pre_images(&mut self) {
        let pre_images = std::mem::take(&mut self.pre_images);
        self.store.with(|store| {
            for snapshot in pre_images.into_iter().rev() {
                store.restore(snapshot);
            }
        });
        self.state = MoveState::RolledBack;
    }
}

impl<E: Orderable> Drop for PendingMove<E> {
    fn drop(&mut self) {
        if self.state == MoveState::SpeculativeApplied {
            tracing::warn!(
                kind = E::KIND.as_str(),
                entity_id = %self.request.id,
                "pending move dropped before settling, rolling back"
            );
            self.restore_pre_images();
        }
    }
}

impl<E: Orderable> std::fmt::Debug for PendingMove<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMove")
            .field("request", &self.request)
            .field("state", &self.state)
            .field("scopes", &self.pre_images.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::{Column, column};

    fn seeded() -> StoreHandle<Column> {
        let store = StoreHandle::default();
        store.populate("b1", vec![column("c1", 1, "b1"), column("c2", 2, "b1")]);
        store
    }

    fn swap(store: &StoreHandle<Column>) -> PendingMove<Column> {
        let pre_image = store.with(|s| s.snapshot("b1"));
        let moved = store.with(|s| {
            let scope = s.scope_mut("b1").unwrap();
            scope[0].order = 2;
            scope[1].order = 1;
            scope.swap(0, 1);
            scope[1].clone()
        });
        PendingMove::applied(
            store.clone(),
            vec![pre_image],
            UpdateRequest::new(moved, "b1", false),
        )
    }

    #[test]
    fn test_commit_keeps_speculative_state() {
        let store = seeded();
        let pending = swap(&store);
        assert_eq!(pending.state(), MoveState::SpeculativeApplied);
        assert_eq!(pending.commit(), MoveState::Committed);
        assert_eq!(store.read_scope("b1").unwrap()[0].id, "c2");
    }

    #[test]
    fn test_rollback_restores_pre_image() {
        let store = seeded();
        let before = store.read_scope("b1");
        let pending = swap(&store);
        assert_eq!(pending.rollback(), MoveState::RolledBack);
        assert_eq!(store.read_scope("b1"), before);
    }

    #[test]
    fn test_drop_without_settling_rolls_back() {
        let store = seeded();
        let before = store.read_scope("b1");
        {
            let _pending = swap(&store);
            assert_ne!(store.read_scope("b1"), before);
        }
        assert_eq!(store.read_scope("b1"), before);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MoveState::Idle.is_terminal());
        assert!(!MoveState::SpeculativeApplied.is_terminal());
        assert!(MoveState::Committed.is_terminal());
        assert!(MoveState::RolledBack.is_terminal());
        assert_eq!(MoveState::RolledBack.as_str(), "rolled_back");
    }
}
