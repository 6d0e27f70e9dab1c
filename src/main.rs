use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kanban::config::{CliOverrides, Settings};

mod cmd;

#[derive(Parser)]
#[command(name = "kanban")]
#[command(version, about = "Kanban board client with optimistic reordering")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding `.kanban/kanban.toml` (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Board API base URL. Overrides kanban.toml and KANBAN_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token. Overrides kanban.toml and KANBAN_TOKEN.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List boards
    Boards,
    /// List the columns of a board
    Columns { board: String },
    /// List the tasks of a column
    Tasks { board: String, column: String },
    /// Move a column to a new position on its board
    MoveColumn {
        board: String,
        column: String,
        /// Target position, 1-based
        #[arg(long)]
        to: u32,
    },
    /// Move a task within its column or into another column
    MoveTask {
        board: String,
        column: String,
        task: String,
        /// Target position, 1-based
        #[arg(long)]
        to: u32,
        /// Destination column (defaults to the task's current column)
        #[arg(long)]
        into: Option<String>,
    },
    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Print resolved settings with the token masked
    Show,
    /// Write a default .kanban/kanban.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let settings = Settings::load(
        &project_dir,
        CliOverrides {
            api_url: cli.api_url.clone(),
            token: cli.token.clone(),
            verbose: cli.verbose,
        },
    )?;
    let _telemetry = kanban::telemetry::init(&settings);

    match &cli.command {
        Commands::Boards => cmd::cmd_boards(&settings, cli.json).await?,
        Commands::Columns { board } => cmd::cmd_columns(&settings, board, cli.json).await?,
        Commands::Tasks { board, column } => {
            cmd::cmd_tasks(&settings, board, column, cli.json).await?
        }
        Commands::MoveColumn { board, column, to } => {
            cmd::cmd_move_column(&settings, board, column, *to, cli.json).await?
        }
        Commands::MoveTask {
            board,
            column,
            task,
            to,
            into,
        } => {
            let target_column = into.as_deref().unwrap_or(column);
            cmd::cmd_move_task(&settings, board, task, column, target_column, *to, cli.json)
                .await?
        }
        Commands::Config { command } => cmd::cmd_config(&settings, command.clone())?,
    }

    Ok(())
}
