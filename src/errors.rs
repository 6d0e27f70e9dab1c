//! Typed error hierarchy for the board client.
//!
//! Two enums cover the two layers a move passes through:
//! - `RemoteError`: the remote service refused or could not be reached
//! - `ReorderError`: what a caller of the reorder coordinator sees

use thiserror::Error;

/// Failures reported by a remote service implementation.
///
/// The coordinator treats every variant the same way (roll back), so the
/// distinction only matters for logs and CLI output.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Request to board API failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Board API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode board API response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Update rejected: {0}")]
    Rejected(String),
}

/// Errors surfaced by a move.
///
/// A stale reference is not an error: the move exits without mutating
/// anything and reports `MoveOutcome::Stale`.
#[derive(Debug, Error)]
pub enum ReorderError {
    #[error("Moving {kind} {entity_id} failed and local state was restored: {source}")]
    RemoteRejected {
        kind: &'static str,
        entity_id: String,
        #[source]
        source: RemoteError,
    },

    #[error("Target order {target} for {entity_id} is outside 1..={max}")]
    TargetOutOfRange {
        entity_id: String,
        target: u32,
        max: u32,
    },
}

impl ReorderError {
    pub fn entity_id(&self) -> &str {
        match self {
            Self::RemoteRejected { entity_id, .. } | Self::TargetOutOfRange { entity_id, .. } => {
                entity_id
            }
        }
    }
}
