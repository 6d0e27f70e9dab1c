//! Board client: cached scopes and optimistic reordering.
//!
//! ## Overview
//!
//! A board holds columns, a column holds tasks. Both are kept in ordered
//! sibling scopes whose `order` fields run 1..N. When a column or task is
//! dragged somewhere else, the client rewrites the cached scope right away,
//! sends a single update for the moved entity, and puts the scope back the
//! way it was if the server says no.
//!
//! ## Module Map
//!
//! ```text
//! ┌────────────┐ move_*  ┌──────────────────────────────────────────────┐
//! │  CLI / UI  │ ──────> │  coordinator.rs  (ReorderCoordinator)        │
//! └────────────┘         │     │ begin_*: snapshot + patch              │
//!                        │     v                                        │
//!                        │  reorder.rs  (shift / insert / densify)      │
//!                        │     │ applied to                             │
//!                        │     v                                        │
//!                        │  store.rs  (EntityStore, StoreHandle)        │
//!                        │     │                                        │
//!                        │     │ PendingMove::commit() / rollback()     │
//!                        │     v                                        │
//!                        │  pending.rs  (PendingMove, MoveState)        │
//!                        │     │ settle(): RemoteService::update_order  │
//!                        │     v                                        │
//!                        │  remote.rs  ──> http.rs | memory.rs          │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! | Module        | Responsibility                                         |
//! |---------------|--------------------------------------------------------|
//! | `models`      | `Column`, `Task`, `Board`, the `Orderable` trait       |
//! | `reorder`     | Order arithmetic over one scope, no I/O                |
//! | `store`       | Owned map of scopes, snapshot/restore                  |
//! | `pending`     | Speculative move value with commit/rollback            |
//! | `coordinator` | Glues store, reorder and remote into `move_*` calls    |
//! | `remote`      | `RemoteService` trait                                  |
//! | `http`        | REST implementation over `reqwest`                     |
//! | `memory`      | In-process implementation for tests                    |

pub mod coordinator;
pub mod http;
pub mod memory;
pub mod models;
pub mod pending;
pub mod remote;
pub mod reorder;
pub mod store;

pub use coordinator::{Attempt, MoveOutcome, ReorderCoordinator, ReorderOptions};
pub use models::{Board, Column, EntityKind, Orderable, Task, UpdateRequest};
pub use pending::{MoveState, PendingMove};
pub use remote::RemoteService;
pub use store::{EntityStore, ScopeSnapshot, StoreHandle};
