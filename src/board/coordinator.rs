use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::models::{Orderable, UpdateRequest};
use super::pending::{MoveState, PendingMove};
use super::remote::RemoteService;
use super::reorder::{self, CrossScopeNumbering, Shift};
use super::store::StoreHandle;
use crate::errors::{RemoteError, ReorderError};

/// Knobs for edge cases the default behavior leaves open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderOptions {
    pub cross_scope_numbering: CrossScopeNumbering,
    /// Reject targets outside `1..=N` (`1..=N+1` across scopes) before
    /// touching the store. Off by default: out-of-range targets are applied
    /// as given and leave the scope non-dense.
    pub reject_out_of_range: bool,
}

/// Result of applying a move locally, before the remote call.
#[derive(Debug)]
pub enum Attempt<E: Orderable> {
    /// Target equals the current order. Nothing was touched.
    Unchanged,
    /// The entity (or its scope) is not cached. Nothing was touched.
    Stale,
    Pending(PendingMove<E>),
}

/// How a move ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "entity", rename_all = "snake_case")]
pub enum MoveOutcome<E> {
    /// The server accepted the update; carries the entity it returned.
    Committed(E),
    Unchanged,
    Stale,
}

impl<E> MoveOutcome<E> {
    pub fn state(&self) -> MoveState {
        match self {
            Self::Committed(_) => MoveState::Committed,
            Self::Unchanged | Self::Stale => MoveState::Idle,
        }
    }
}

/// Applies moves to the cached scopes optimistically and settles them
/// against the remote service.
///
/// Moves on the same scope are not serialized. If two overlap and the first
/// one fails, its rollback restores the pre-image it captured, which also
/// erases the second move's speculative patch until the next fetch.
pub struct ReorderCoordinator<E: Orderable, R> {
    store: StoreHandle<E>,
    remote: Arc<R>,
    options: ReorderOptions,
}

impl<E: Orderable, R: RemoteService<E>> ReorderCoordinator<E, R> {
    pub fn new(store: StoreHandle<E>, remote: Arc<R>) -> Self {
        Self {
            store,
            remote,
            options: ReorderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReorderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &StoreHandle<E> {
        &self.store
    }

    pub fn options(&self) -> ReorderOptions {
        self.options
    }

    /// Fetch a scope from the remote service and replace the cached copy.
    /// Returns the number of entities loaded.
    pub async fn load_scope(&self, parent_id: &str) -> Result<usize, RemoteError> {
        let entities = self.remote.fetch_scope(parent_id).await?;
        let count = entities.len();
        self.store.populate(parent_id, entities);
        debug!(kind = E::KIND.as_str(), scope = parent_id, count, "scope loaded");
        Ok(count)
    }

    /// Reorder an entity inside its scope and persist the move.
    pub async fn move_within_scope(
        &self,
        scope: &str,
        entity_id: &str,
        target_order: u32,
    ) -> Result<MoveOutcome<E>, ReorderError> {
        let attempt = self.begin_within_scope(scope, entity_id, target_order)?;
        self.drive(attempt).await
    }

    /// Move an entity into another scope and persist the move.
    pub async fn move_across_scopes(
        &self,
        entity_id: &str,
        source_scope: &str,
        target_scope: &str,
        target_order: u32,
    ) -> Result<MoveOutcome<E>, ReorderError> {
        let attempt =
            self.begin_across_scopes(entity_id, source_scope, target_scope, target_order)?;
        self.drive(attempt).await
    }

    /// Apply a within-scope move to the store without contacting the remote.
    pub fn begin_within_scope(
        &self,
        scope: &str,
        entity_id: &str,
        target_order: u32,
    ) -> Result<Attempt<E>, ReorderError> {
        let reject_out_of_range = self.options.reject_out_of_range;
        let applied = self.store.with(|store| {
            let pre_image = store.snapshot(scope);
            let Some(siblings) = store.scope_mut(scope) else {
                return Ok(None);
            };
            if !siblings.iter().any(|e| e.id() == entity_id) {
                return Ok(None);
            }

            let max = siblings.len() as u32;
            if reject_out_of_range && !(1..=max).contains(&target_order) {
                return Err(ReorderError::TargetOutOfRange {
                    entity_id: entity_id.to_string(),
                    target: target_order,
                    max,
                });
            }

            let was_dense = reorder::is_dense(siblings);
            match reorder::shift_within(siblings, entity_id, target_order) {
                Shift::Stale => Ok(None),
                Shift::Unchanged => Ok(Some(None)),
                Shift::Moved { from, to } => {
                    if reorder::density_lost(was_dense, siblings) {
                        warn!(
                            kind = E::KIND.as_str(),
                            scope,
                            entity_id,
                            target_order,
                            "scope is no longer densely ordered after move"
                        );
                    }
                    debug!(kind = E::KIND.as_str(), scope, entity_id, from, to, "applied move");
                    let moved = siblings.iter().find(|e| e.id() == entity_id).cloned();
                    Ok(moved.map(|moved| Some((pre_image, moved))))
                }
            }
        })?;

        Ok(match applied {
            None => {
                debug!(kind = E::KIND.as_str(), scope, entity_id, "stale move ignored");
                Attempt::Stale
            }
            Some(None) => Attempt::Unchanged,
            Some(Some((pre_image, moved))) => Attempt::Pending(PendingMove::applied(
                self.store.clone(),
                vec![pre_image],
                UpdateRequest::new(moved, scope, false),
            )),
        })
    }

    /// Apply a cross-scope move to the store without contacting the remote.
    ///
    /// The entity is removed from `source_scope` and inserted into
    /// `target_scope` at `target_order`. With the default numbering only the
    /// moved entity's order changes; see [`CrossScopeNumbering`].
    pub fn begin_across_scopes(
        &self,
        entity_id: &str,
        source_scope: &str,
        target_scope: &str,
        target_order: u32,
    ) -> Result<Attempt<E>, ReorderError> {
        if source_scope == target_scope {
            return self.begin_within_scope(source_scope, entity_id, target_order);
        }

        let options = self.options;
        let applied = self.store.with(|store| {
            let source_pre = store.snapshot(source_scope);
            let target_pre = store.snapshot(target_scope);
            let target_len = target_pre.entities.as_ref().map(Vec::len);

            let Some(source) = store.scope_mut(source_scope) else {
                return Ok(None);
            };
            if !source.iter().any(|e| e.id() == entity_id) {
                return Ok(None);
            }

            // An uncached target has no known length, so only the lower bound applies.
            let max = target_len.map_or(u32::MAX, |len| len as u32 + 1);
            if options.reject_out_of_range && !(1..=max).contains(&target_order) {
                return Err(ReorderError::TargetOutOfRange {
                    entity_id: entity_id.to_string(),
                    target: target_order,
                    max,
                });
            }

            let Some(mut moved) = reorder::remove_entity(source, entity_id) else {
                return Ok(None);
            };
            if options.cross_scope_numbering == CrossScopeNumbering::Densify {
                reorder::densify(source);
            }
            moved.set_parent_id(target_scope);
            moved.set_order(target_order);

            let mut pre_images = vec![source_pre];
            match store.scope_mut(target_scope) {
                Some(destination) => {
                    let index = reorder::insert_at(destination, moved.clone(), target_order);
                    if options.cross_scope_numbering == CrossScopeNumbering::Densify {
                        reorder::densify(destination);
                        moved.set_order(destination[index].order());
                    }
                    pre_images.push(target_pre);
                }
                None => {
                    debug!(
                        kind = E::KIND.as_str(),
                        scope = target_scope,
                        "target scope not cached, skipping insertion"
                    );
                }
            }
            debug!(
                kind = E::KIND.as_str(),
                entity_id,
                from = source_scope,
                to = target_scope,
                target_order,
                "applied cross-scope move"
            );
            Ok(Some((pre_images, moved)))
        })?;

        Ok(match applied {
            None => {
                debug!(
                    kind = E::KIND.as_str(),
                    scope = source_scope,
                    entity_id,
                    "stale move ignored"
                );
                Attempt::Stale
            }
            Some((pre_images, moved)) => Attempt::Pending(PendingMove::applied(
                self.store.clone(),
                pre_images,
                UpdateRequest::new(moved, source_scope, true),
            )),
        })
    }

    /// Send a pending move to the remote service and commit or roll back on
    /// the outcome.
    pub async fn settle(&self, pending: PendingMove<E>) -> Result<MoveOutcome<E>, ReorderError> {
        match self.remote.update_order(pending.request()).await {
            Ok(entity) => {
                info!(
                    kind = E::KIND.as_str(),
                    entity_id = %pending.request().id,
                    order = pending.request().order,
                    scope = pending.request().destination(),
                    "move committed"
                );
                pending.commit();
                Ok(MoveOutcome::Committed(entity))
            }
            Err(source) => {
                let entity_id = pending.request().id.clone();
                warn!(
                    kind = E::KIND.as_str(),
                    entity_id = %entity_id,
                    error = %source,
                    "move rejected, rolling back"
                );
                pending.rollback();
                Err(ReorderError::RemoteRejected {
                    kind: E::KIND.as_str(),
                    entity_id,
                    source,
                })
            }
        }
    }

    async fn drive(&self, attempt: Attempt<E>) -> Result<MoveOutcome<E>, ReorderError> {
        match attempt {
            Attempt::Pending(pending) => self.settle(pending).await,
            Attempt::Unchanged => Ok(MoveOutcome::Unchanged),
            Attempt::Stale => Ok(MoveOutcome::Stale),
        }
    }
}
