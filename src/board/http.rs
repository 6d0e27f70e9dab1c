use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::models::{Board, Column, Task, UpdateRequest};
use super::remote::RemoteService;
use crate::errors::RemoteError;

const USER_AGENT: &str = concat!("kanban/", env!("CARGO_PKG_VERSION"));

/// Thin client for the board REST API.
///
/// Every request carries `Authorization: Bearer <token>` when a token is
/// configured. Any non-success status is surfaced as [`RemoteError::Status`]
/// with the server's `message` field when it sent one. Ids are sent as
/// percent-encoded path segments.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid board API URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Board API URL cannot hold a path: {}", base_url);
        }
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Scope this client to one board.
    pub fn board(&self, board_id: &str) -> BoardApi {
        BoardApi {
            client: self.clone(),
            board_id: board_id.to_string(),
        }
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>, RemoteError> {
        self.get_json(&["boards"]).await
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(segments))
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, RemoteError> {
        let resp = self
            .request(Method::GET, segments)
            .send()
            .await
            .map_err(RemoteError::Transport)?;
        decode(resp).await
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, RemoteError> {
        let resp = self
            .request(Method::PUT, segments)
            .json(body)
            .send()
            .await
            .map_err(RemoteError::Transport)?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, RemoteError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RemoteError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    resp.json::<T>().await.map_err(RemoteError::Decode)
}

/// Pull `message` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Board API scoped to a single board. Implements the remote service for
/// both columns (scope = board) and tasks (scope = column).
#[derive(Debug, Clone)]
pub struct BoardApi {
    client: ApiClient,
    board_id: String,
}

#[derive(Serialize)]
struct ColumnBody<'a> {
    title: &'a str,
    order: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskBody<'a> {
    title: &'a str,
    order: u32,
    description: &'a str,
    user_id: &'a str,
    board_id: &'a str,
    column_id: &'a str,
}

impl BoardApi {
    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    fn column_path<'a>(&'a self, column_id: &'a str) -> [&'a str; 4] {
        ["boards", &self.board_id, "columns", column_id]
    }

    fn tasks_path<'a>(&'a self, column_id: &'a str) -> [&'a str; 5] {
        ["boards", &self.board_id, "columns", column_id, "tasks"]
    }
}

#[async_trait]
impl RemoteService<Column> for BoardApi {
    async fn fetch_scope(&self, board_id: &str) -> Result<Vec<Column>, RemoteError> {
        self.client
            .get_json(&["boards", board_id, "columns"])
            .await
    }

    async fn update_order(&self, request: &UpdateRequest<Column>) -> Result<Column, RemoteError> {
        // The column route has no board field, so a board change cannot be expressed.
        if let Some(board_id) = request
            .parent_id
            .as_deref()
            .filter(|board_id| *board_id != self.board_id)
        {
            return Err(RemoteError::Rejected(format!(
                "column {} cannot move from board {} to board {}",
                request.id, self.board_id, board_id
            )));
        }
        let body = ColumnBody {
            title: &request.entity.title,
            order: request.order,
        };
        self.client
            .put_json(&self.column_path(&request.id), &body)
            .await
    }
}

#[async_trait]
impl RemoteService<Task> for BoardApi {
    async fn fetch_scope(&self, column_id: &str) -> Result<Vec<Task>, RemoteError> {
        self.client.get_json(&self.tasks_path(column_id)).await
    }

    async fn update_order(&self, request: &UpdateRequest<Task>) -> Result<Task, RemoteError> {
        let task = &request.entity;
        let body = TaskBody {
            title: &task.title,
            order: request.order,
            description: &task.description,
            user_id: &task.user_id,
            board_id: &self.board_id,
            column_id: request.destination(),
        };
        // Tasks are addressed through the column they are leaving.
        let [boards, board_id, columns, column_id, tasks] =
            self.tasks_path(&request.source_parent_id);
        self.client
            .put_json(
                &[boards, board_id, columns, column_id, tasks, request.id.as_str()],
                &body,
            )
            .await
    }
}
