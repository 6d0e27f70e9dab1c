use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// A record that lives in an ordered sibling scope.
///
/// Columns are ordered within a board and tasks within a column. The
/// coordinator only ever touches entities through this trait, so the same
/// reordering code serves both.
pub trait Orderable: Clone + Debug + PartialEq + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
    fn parent_id(&self) -> &str;
    fn set_parent_id(&mut self, parent_id: &str);
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Column,
    Task,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Board {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A board column. The API does not echo the board id back, so `board_id`
/// is stamped by the store when a scope is populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub title: String,
    pub order: u32,
    #[serde(default)]
    pub board_id: String,
}

impl Orderable for Column {
    const KIND: EntityKind = EntityKind::Column;

    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn parent_id(&self) -> &str {
        &self.board_id
    }

    fn set_parent_id(&mut self, parent_id: &str) {
        self.board_id = parent_id.to_string();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub order: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub board_id: String,
    #[serde(default)]
    pub column_id: String,
}

impl Orderable for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    fn parent_id(&self) -> &str {
        &self.column_id
    }

    fn set_parent_id(&mut self, parent_id: &str) {
        self.column_id = parent_id.to_string();
    }
}

/// The abstract update sent to the remote service for a single move.
///
/// Only the moved entity is described; sibling order changes are never
/// persisted individually.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest<E> {
    pub id: String,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Scope the entity lived in when the move started. REST routes for
    /// tasks are addressed through it.
    #[serde(skip)]
    pub source_parent_id: String,
    /// Post-move image of the entity.
    #[serde(skip)]
    pub entity: E,
}

impl<E: Orderable> UpdateRequest<E> {
    pub fn new(entity: E, source_parent_id: &str, moved_across: bool) -> Self {
        Self {
            id: entity.id().to_string(),
            order: entity.order(),
            parent_id: moved_across.then(|| entity.parent_id().to_string()),
            source_parent_id: source_parent_id.to_string(),
            entity,
        }
    }

    /// Scope the entity belongs to once the update is accepted.
    pub fn destination(&self) -> &str {
        self.parent_id.as_deref().unwrap_or(&self.source_parent_id)
    }
}

/// Sort a fetched collection by its `order` field, keeping the server's
/// relative order for equal values.
pub fn sort_by_order<E: Orderable>(entities: &mut [E]) {
    entities.sort_by_key(|e| e.order());
}

#[cfg(test)]
pub(crate) fn column(id: &str, order: u32, board_id: &str) -> Column {
    Column {
        id: id.to_string(),
        title: format!("Column {}", id),
        order,
        board_id: board_id.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn task(id: &str, order: u32, column_id: &str) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {}", id),
        order,
        description: String::new(),
        user_id: "user-1".to_string(),
        board_id: "board-1".to_string(),
        column_id: column_id.to_string(),
    }
}
