//! In-memory remote service.
//!
//! This module provides [`InMemoryRemote`], a [`RemoteService`] that keeps
//! the "server" copy of every scope in process. It is used by the tests and
//! is handy for exercising the coordinator without a board API.
//!
//! ## Behavior
//!
//! - Accepted updates rewrite the server copy the way a real server would:
//!   the destination scope is renumbered 1..N around the moved entity.
//! - [`InMemoryRemote::reject_next`] makes the next N updates fail.
//! - An optional delay makes updates suspend, which lets tests observe the
//!   speculative window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::models::{Orderable, UpdateRequest, sort_by_order};
use super::remote::RemoteService;
use super::reorder;
use crate::errors::RemoteError;

#[derive(Debug)]
pub struct InMemoryRemote<E> {
    scopes: Mutex<HashMap<String, Vec<E>>>,
    reject_remaining: AtomicUsize,
    update_delay: Option<Duration>,
    updates_received: Mutex<Vec<UpdateRequest<E>>>,
}

impl<E: Orderable> Default for InMemoryRemote<E> {
    fn default() -> Self {
        Self {
            scopes: Mutex::new(HashMap::new()),
            reject_remaining: AtomicUsize::new(0),
            update_delay: None,
            updates_received: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Orderable> InMemoryRemote<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend every update for `delay` before answering.
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    /// Seed a scope on the server side.
    pub fn seed(&self, parent_id: &str, mut entities: Vec<E>) {
        for entity in &mut entities {
            entity.set_parent_id(parent_id);
        }
        sort_by_order(&mut entities);
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(parent_id.to_string(), entities);
    }

    /// Fail the next `count` updates.
    pub fn reject_next(&self, count: usize) {
        self.reject_remaining.store(count, Ordering::SeqCst);
    }

    /// Server-side copy of a scope.
    pub fn server_scope(&self, parent_id: &str) -> Option<Vec<E>> {
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(parent_id)
            .cloned()
    }

    /// Every update received so far, accepted or not.
    pub fn updates(&self) -> Vec<UpdateRequest<E>> {
        self.updates_received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take_rejection(&self) -> bool {
        self.reject_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn apply(&self, request: &UpdateRequest<E>) -> Result<E, RemoteError> {
        let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        let source = scopes
            .get_mut(&request.source_parent_id)
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                message: format!("scope {} not found", request.source_parent_id),
            })?;
        let mut entity =
            reorder::remove_entity(source, &request.id).ok_or_else(|| RemoteError::Status {
                status: 404,
                message: format!("{} {} not found", E::KIND, request.id),
            })?;
        reorder::densify(source);

        let destination_id = request.destination().to_string();
        entity.set_parent_id(&destination_id);
        let destination = scopes.entry(destination_id).or_default();
        let index = reorder::insert_at(destination, entity, request.order);
        reorder::densify(destination);
        Ok(destination[index].clone())
    }
}

#[async_trait]
impl<E: Orderable> RemoteService<E> for InMemoryRemote<E> {
    async fn fetch_scope(&self, parent_id: &str) -> Result<Vec<E>, RemoteError> {
        self.server_scope(parent_id).ok_or_else(|| RemoteError::Status {
            status: 404,
            message: format!("scope {} not found", parent_id),
        })
    }

    async fn update_order(&self, request: &UpdateRequest<E>) -> Result<E, RemoteError> {
        self.updates_received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }
        if self.take_rejection() {
            return Err(RemoteError::Rejected(format!(
                "{} {} update refused",
                E::KIND,
                request.id
            )));
        }
        self.apply(request)
    }
}
