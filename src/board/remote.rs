use async_trait::async_trait;

use super::models::{Orderable, UpdateRequest};
use crate::errors::RemoteError;

/// The server side of a board, as seen by the reorder coordinator.
///
/// Implementations decide how a request reaches the server. The coordinator
/// only cares whether the update settled successfully.
#[async_trait]
pub trait RemoteService<E: Orderable>: Send + Sync {
    /// Fetch every entity of a scope.
    async fn fetch_scope(&self, parent_id: &str) -> Result<Vec<E>, RemoteError>;

    /// Persist the new order (and parent, for cross-scope moves) of a single
    /// entity. Returns the entity as the server stored it.
    async fn update_order(&self, request: &UpdateRequest<E>) -> Result<E, RemoteError>;
}
