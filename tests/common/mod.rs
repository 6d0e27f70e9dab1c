//! Fake board API shared by the integration tests.
//!
//! Serves the same routes as the real API on an ephemeral port, records
//! every PUT body and `Authorization` header, and can be told to fail the
//! next N updates with a 500.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::Json;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use kanban::board::reorder;
use kanban::board::{Board, Column, Orderable, Task};

#[derive(Default)]
pub struct FakeApi {
    pub boards: Mutex<Vec<Board>>,
    pub columns: Mutex<HashMap<String, Vec<Column>>>,
    pub tasks: Mutex<HashMap<String, Vec<Task>>>,
    pub updates: Mutex<Vec<(String, Value)>>,
    pub auth_headers: Mutex<Vec<Option<String>>>,
    fail_remaining: AtomicUsize,
}

impl FakeApi {
    pub fn fail_next(&self, count: usize) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }

    pub fn column_ids(&self, board_id: &str) -> Vec<String> {
        self.columns.lock().unwrap()[board_id]
            .iter()
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn task_ids(&self, column_id: &str) -> Vec<String> {
        self.tasks.lock().unwrap()[column_id]
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    fn record(&self, path: String, headers: &HeaderMap, body: &Value) {
        self.auth_headers.lock().unwrap().push(
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
        self.updates.lock().unwrap().push((path, body.clone()));
    }

    fn should_fail(&self) -> bool {
        self.fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

pub fn column(id: &str, order: u32) -> Column {
    Column {
        id: id.to_string(),
        title: format!("Column {}", id),
        order,
        board_id: String::new(),
    }
}

pub fn task(id: &str, order: u32) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {}", id),
        order,
        description: String::new(),
        user_id: "user-1".to_string(),
        board_id: "b1".to_string(),
        column_id: String::new(),
    }
}

/// Board `b1` with columns c1..c3, where c1 holds t1..t3 and c2 holds u1.
pub fn seeded() -> Arc<FakeApi> {
    let api = FakeApi::default();
    api.boards.lock().unwrap().push(Board {
        id: "b1".to_string(),
        title: "Roadmap".to_string(),
        description: String::new(),
    });
    api.columns.lock().unwrap().insert(
        "b1".to_string(),
        vec![column("c1", 1), column("c2", 2), column("c3", 3)],
    );
    let mut tasks = api.tasks.lock().unwrap();
    tasks.insert(
        "c1".to_string(),
        vec![task("t1", 1), task("t2", 2), task("t3", 3)],
    );
    tasks.insert("c2".to_string(), vec![task("u1", 1)]);
    drop(tasks);
    Arc::new(api)
}

/// Start serving `api` on 127.0.0.1 and return its base URL.
pub async fn serve(api: Arc<FakeApi>) -> String {
    let app = Router::new()
        .route("/boards", get(list_boards))
        .route("/boards/{board}/columns", get(list_columns))
        .route("/boards/{board}/columns/{column}", put(update_column))
        .route("/boards/{board}/columns/{column}/tasks", get(list_tasks))
        .route(
            "/boards/{board}/columns/{column}/tasks/{task}",
            put(update_task),
        )
        .with_state(api);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "statusCode": 404, "message": format!("{} not found", what) })),
    )
        .into_response()
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "statusCode": 500, "message": "database unavailable" })),
    )
        .into_response()
}

async fn list_boards(State(api): State<Arc<FakeApi>>) -> Json<Vec<Board>> {
    Json(api.boards.lock().unwrap().clone())
}

async fn list_columns(
    State(api): State<Arc<FakeApi>>,
    Path(board): Path<String>,
) -> Response {
    match api.columns.lock().unwrap().get(&board) {
        Some(columns) => Json(columns.clone()).into_response(),
        None => not_found(&board),
    }
}

async fn list_tasks(
    State(api): State<Arc<FakeApi>>,
    Path((_board, column)): Path<(String, String)>,
) -> Response {
    match api.tasks.lock().unwrap().get(&column) {
        Some(tasks) => Json(tasks.clone()).into_response(),
        None => not_found(&column),
    }
}

async fn update_column(
    State(api): State<Arc<FakeApi>>,
    Path((board, column)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record(format!("boards/{}/columns/{}", board, column), &headers, &body);
    if api.should_fail() {
        return server_error();
    }
    let order = body["order"].as_u64().unwrap_or(0) as u32;

    let mut columns = api.columns.lock().unwrap();
    let Some(scope) = columns.get_mut(&board) else {
        return not_found(&board);
    };
    let Some(moved) = reorder::remove_entity(scope, &column) else {
        return not_found(&column);
    };
    let index = reorder::insert_at(scope, moved, order);
    reorder::densify(scope);
    Json(scope[index].clone()).into_response()
}

async fn update_task(
    State(api): State<Arc<FakeApi>>,
    Path((board, column, task)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record(
        format!("boards/{}/columns/{}/tasks/{}", board, column, task),
        &headers,
        &body,
    );
    if api.should_fail() {
        return server_error();
    }
    let order = body["order"].as_u64().unwrap_or(0) as u32;
    let destination = body["columnId"].as_str().unwrap_or(&column).to_string();

    let mut tasks = api.tasks.lock().unwrap();
    let Some(source) = tasks.get_mut(&column) else {
        return not_found(&column);
    };
    let Some(mut moved) = reorder::remove_entity(source, &task) else {
        return not_found(&task);
    };
    reorder::densify(source);
    moved.set_parent_id(&destination);
    let scope = tasks.entry(destination).or_default();
    let index = reorder::insert_at(scope, moved, order);
    reorder::densify(scope);
    Json(scope[index].clone()).into_response()
}
