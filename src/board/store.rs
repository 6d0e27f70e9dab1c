use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::models::{Orderable, sort_by_order};

/// Cached sibling collections keyed by parent id.
///
/// The store is the only owner of cached scopes. Everything else works on
/// it through a [`StoreHandle`] and keeps at most a [`ScopeSnapshot`].
#[derive(Debug)]
pub struct EntityStore<E> {
    scopes: HashMap<String, Vec<E>>,
}

impl<E> Default for EntityStore<E> {
    fn default() -> Self {
        Self {
            scopes: HashMap::new(),
        }
    }
}

/// Immutable copy of one scope taken before a speculative patch.
///
/// `entities` is `None` when the scope was not cached at snapshot time, in
/// which case restoring it removes whatever the patch created.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSnapshot<E> {
    pub parent_id: String,
    pub entities: Option<Vec<E>>,
}

impl<E: Orderable> EntityStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a scope with freshly fetched entities, sorted by order and
    /// stamped with the scope's parent id.
    pub fn populate(&mut self, parent_id: &str, mut entities: Vec<E>) {
        for entity in &mut entities {
            entity.set_parent_id(parent_id);
        }
        sort_by_order(&mut entities);
        self.scopes.insert(parent_id.to_string(), entities);
    }

    /// Drop a scope, e.g. when its parent was deleted.
    pub fn discard(&mut self, parent_id: &str) -> Option<Vec<E>> {
        self.scopes.remove(parent_id)
    }

    pub fn scope(&self, parent_id: &str) -> Option<&[E]> {
        self.scopes.get(parent_id).map(Vec::as_slice)
    }

    pub fn scope_mut(&mut self, parent_id: &str) -> Option<&mut Vec<E>> {
        self.scopes.get_mut(parent_id)
    }

    pub fn contains_scope(&self, parent_id: &str) -> bool {
        self.scopes.contains_key(parent_id)
    }

    pub fn snapshot(&self, parent_id: &str) -> ScopeSnapshot<E> {
        ScopeSnapshot {
            parent_id: parent_id.to_string(),
            entities: self.scopes.get(parent_id).cloned(),
        }
    }

    pub fn restore(&mut self, snapshot: ScopeSnapshot<E>) {
        match snapshot.entities {
            Some(entities) => {
                self.scopes.insert(snapshot.parent_id, entities);
            }
            None => {
                self.scopes.remove(&snapshot.parent_id);
            }
        }
    }
}

/// Shared handle to an [`EntityStore`].
///
/// Cloning is cheap. The lock is only taken for the duration of a closure
/// and must never be held across an await point.
#[derive(Debug)]
pub struct StoreHandle<E> {
    inner: Arc<Mutex<EntityStore<E>>>,
}

impl<E> Clone for StoreHandle<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Orderable> Default for StoreHandle<E> {
    fn default() -> Self {
        Self::new(EntityStore::new())
    }
}

impl<E: Orderable> StoreHandle<E> {
    pub fn new(store: EntityStore<E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run a closure against the store.
    ///
    /// A poisoned lock is recovered rather than propagated: the store only
    /// holds cached data and rollback must still be able to run during
    /// unwinding.
    pub fn with<R>(&self, f: impl FnOnce(&mut EntityStore<E>) -> R) -> R {
        let mut guard: MutexGuard<'_, EntityStore<E>> =
            self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Owned copy of a scope's current contents.
    pub fn read_scope(&self, parent_id: &str) -> Option<Vec<E>> {
        self.with(|store| store.scope(parent_id).map(<[E]>::to_vec))
    }

    pub fn populate(&self, parent_id: &str, entities: Vec<E>) {
        self.with(|store| store.populate(parent_id, entities));
    }
}
