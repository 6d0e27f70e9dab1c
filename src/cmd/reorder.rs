//! Move commands: `kanban move-column`, `kanban move-task`.
//!
//! Each command loads the scopes it touches, runs the move through a
//! [`ReorderCoordinator`] and prints the cached scopes afterwards. When the
//! server refuses the move the restored scopes are printed before the error
//! is returned.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use kanban::board::http::BoardApi;
use kanban::board::{
    Column, MoveOutcome, Orderable, ReorderCoordinator, RemoteService, StoreHandle, Task,
};
use kanban::config::Settings;
use kanban::errors::ReorderError;

use super::board::{Row, connect, print_rows};

pub async fn cmd_move_column(
    settings: &Settings,
    board_id: &str,
    column_id: &str,
    target_order: u32,
    json: bool,
) -> Result<()> {
    let api = Arc::new(connect(settings)?.board(board_id));
    let coordinator: ReorderCoordinator<Column, BoardApi> =
        ReorderCoordinator::new(StoreHandle::default(), api)
            .with_options(settings.reorder_options());

    load(&coordinator, board_id).await?;
    let result = coordinator
        .move_within_scope(board_id, column_id, target_order)
        .await;
    report(&coordinator, &[board_id], result, json)
}

pub async fn cmd_move_task(
    settings: &Settings,
    board_id: &str,
    task_id: &str,
    source_column: &str,
    target_column: &str,
    target_order: u32,
    json: bool,
) -> Result<()> {
    let api = Arc::new(connect(settings)?.board(board_id));
    let coordinator: ReorderCoordinator<Task, BoardApi> =
        ReorderCoordinator::new(StoreHandle::default(), api)
            .with_options(settings.reorder_options());

    let mut scopes = vec![source_column];
    if target_column != source_column {
        scopes.push(target_column);
    }
    for scope in &scopes {
        load(&coordinator, scope).await?;
    }

    let result = coordinator
        .move_across_scopes(task_id, source_column, target_column, target_order)
        .await;
    report(&coordinator, &scopes, result, json)
}

async fn load<E, R>(coordinator: &ReorderCoordinator<E, R>, scope: &str) -> Result<()>
where
    E: Orderable,
    R: RemoteService<E>,
{
    coordinator
        .load_scope(scope)
        .await
        .with_context(|| format!("Failed to load {}s of {}", E::KIND, scope))?;
    Ok(())
}

fn report<E, R>(
    coordinator: &ReorderCoordinator<E, R>,
    scopes: &[&str],
    result: Result<MoveOutcome<E>, ReorderError>,
    json: bool,
) -> Result<()>
where
    E: Orderable + Row + Serialize,
    R: RemoteService<E>,
{
    let store = coordinator.store();
    if json {
        let cached: serde_json::Map<String, serde_json::Value> = scopes
            .iter()
            .map(|scope| {
                let entities = store.read_scope(scope).unwrap_or_default();
                Ok((scope.to_string(), serde_json::to_value(entities)?))
            })
            .collect::<Result<_>>()?;
        let body = match &result {
            Ok(outcome) => json!({ "result": outcome, "scopes": cached }),
            Err(err) => json!({
                "result": { "outcome": "rolled_back", "error": err.to_string() },
                "scopes": cached,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        match &result {
            Ok(MoveOutcome::Committed(entity)) => println!(
                "{} {} {} now at position {}",
                console::style("Moved").green().bold(),
                E::KIND,
                entity.id(),
                entity.order()
            ),
            Ok(MoveOutcome::Unchanged) => println!(
                "{}",
                console::style("Already at that position, nothing to do").dim()
            ),
            Ok(MoveOutcome::Stale) => println!(
                "{}",
                console::style(format!("{} not found in the loaded scope", E::KIND)).yellow()
            ),
            Err(ReorderError::RemoteRejected { .. }) => eprintln!(
                "{}",
                console::style("Move rejected by the server, local order restored").red()
            ),
            Err(ReorderError::TargetOutOfRange { .. }) => {}
        }
        for scope in scopes {
            let entities = store.read_scope(scope).unwrap_or_default();
            println!();
            print_rows(scope, &entities, false)?;
        }
    }

    result.map(|_| ()).map_err(anyhow::Error::from)
}
