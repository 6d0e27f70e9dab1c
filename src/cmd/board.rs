//! Read-only listing commands: `kanban boards`, `columns`, `tasks`.

use anyhow::{Context, Result};
use serde::Serialize;

use kanban::board::http::ApiClient;
use kanban::board::{Board, Column, RemoteService, Task};
use kanban::config::Settings;

/// Build an API client from resolved settings.
pub fn connect(settings: &Settings) -> Result<ApiClient> {
    if settings.token().is_none() {
        tracing::debug!("no API token configured, sending unauthenticated requests");
    }
    ApiClient::new(settings.base_url(), settings.token(), settings.timeout())
}

/// One line of a listing.
pub trait Row {
    fn row(&self) -> String;
}

impl Row for Board {
    fn row(&self) -> String {
        format!("{}  {}", console::style(&self.id).cyan(), self.title)
    }
}

impl Row for Column {
    fn row(&self) -> String {
        format!(
            "{:>3}  {}  {}",
            self.order,
            console::style(&self.id).cyan(),
            self.title
        )
    }
}

impl Row for Task {
    fn row(&self) -> String {
        let mut line = format!(
            "{:>3}  {}  {}",
            self.order,
            console::style(&self.id).cyan(),
            self.title
        );
        if !self.description.is_empty() {
            line.push_str(&format!("  {}", console::style(&self.description).dim()));
        }
        line
    }
}

pub fn print_rows<T: Row + Serialize>(heading: &str, rows: &[T], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    println!("{}", console::style(heading).bold());
    if rows.is_empty() {
        println!("  {}", console::style("(empty)").dim());
    }
    for row in rows {
        println!("  {}", row.row());
    }
    Ok(())
}

pub async fn cmd_boards(settings: &Settings, json: bool) -> Result<()> {
    let boards = connect(settings)?
        .list_boards()
        .await
        .context("Failed to list boards")?;
    print_rows("Boards", &boards, json)
}

pub async fn cmd_columns(settings: &Settings, board_id: &str, json: bool) -> Result<()> {
    let api = connect(settings)?.board(board_id);
    let mut columns = RemoteService::<Column>::fetch_scope(&api, board_id)
        .await
        .with_context(|| format!("Failed to list columns of board {}", board_id))?;
    columns.sort_by_key(|c| c.order);
    print_rows(&format!("Columns of {}", board_id), &columns, json)
}

pub async fn cmd_tasks(settings: &Settings, board_id: &str, column_id: &str, json: bool) -> Result<()> {
    let api = connect(settings)?.board(board_id);
    let mut tasks = RemoteService::<Task>::fetch_scope(&api, column_id)
        .await
        .with_context(|| format!("Failed to list tasks of column {}", column_id))?;
    tasks.sort_by_key(|t| t.order);
    print_rows(&format!("Tasks in {}", column_id), &tasks, json)
}
