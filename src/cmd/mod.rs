//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                        |
//! |-----------|-----------------------------------------|
//! | `board`   | `Boards`, `Columns`, `Tasks`            |
//! | `reorder` | `MoveColumn`, `MoveTask`                |
//! | `config`  | `Config`                                |

pub mod board;
pub mod config;
pub mod reorder;

pub use board::{cmd_boards, cmd_columns, cmd_tasks};
pub use config::cmd_config;
pub use reorder::{cmd_move_column, cmd_move_task};
