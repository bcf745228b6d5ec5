//! Agent-to-Agent Task Server
//!
//! Exposes a [`Runner`] over HTTP using the agent-to-agent task shape: peers
//! discover the agent through its card at `/.well-known/agent.json`, then
//! `POST /tasks` with a message and receive the finished task back: id,
//! ordered status history (`submitted`, `working`, then `completed` or
//! `failed`), and a text artifact named `"response"`.
//!
//! Each task runs one turn of a server-held session. The session is keyed by
//! the request's `contextId`, so a peer that reuses a context id continues
//! the same conversation; without one, the task id is used and the
//! conversation is one-shot.
//!
//! # Example
//!
//! ```rust,ignore
//! use finagent::a2a_server::{AgentCard, AgentSkill, TaskServerBuilder};
//!
//! let card = AgentCard::new(
//!     "Technical Analyst Agent",
//!     "Main agent for stock screening based on technical indicators.",
//!     "http://localhost:9999/",
//!     "1.0.0",
//! )
//! .with_skill(
//!     AgentSkill::new(
//!         "technical_stock_signals",
//!         "Returns technical signals for a stock",
//!         "Performs technical analysis on a stock and provides its technical signals",
//!     )
//!     .with_examples(["Run technical analysis for stock TSLA"]),
//! );
//!
//! let server = TaskServerBuilder::new(runner, card)
//!     .with_bearer_token("my-secret-token")
//!     .start_on(9999)
//!     .await?;
//! println!("Serving at {}", server.addr());
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::finagent::runner::{Runner, TurnOutcome};
use crate::finagent::server_auth::AuthConfig;

/// Path peers fetch the agent card from.
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Content types the task surface accepts and produces.
pub const SUPPORTED_CONTENT_TYPES: [&str; 3] = ["text", "text/plain", "application/json"];

/// User id recorded on sessions created through the task surface.
pub const A2A_USER_ID: &str = "a2a_user";

const WORKING_MESSAGE: &str = "Processing request...";
const RESPONSE_ARTIFACT: &str = "response";

// ---- Wire types ------------------------------------------------------------

/// One advertised capability of the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl AgentSkill {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            examples: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }
}

/// Transport capabilities advertised on the card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCapabilities {
    /// This surface is request/response; tasks are returned finished.
    #[serde(default)]
    pub streaming: bool,
}

/// Public description of the agent, served at [`AGENT_CARD_PATH`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Create a card with the default content modes and no skills.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let modes: Vec<String> = SUPPORTED_CONTENT_TYPES.iter().map(|m| m.to_string()).collect();
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            version: version.into(),
            capabilities: AgentCapabilities::default(),
            default_input_modes: modes.clone(),
            default_output_modes: modes,
            skills: Vec::new(),
        }
    }

    /// Advertise a skill on the card.
    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }
}

/// Lifecycle states a task moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Failed,
}

/// One entry in a task's status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One piece of message or artifact content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    pub kind: String,
    pub text: String,
}

impl MessagePart {
    /// Build a `"text"` part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// The message a peer submits with a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl IncomingMessage {
    /// The first non-empty `"text"` part, which is the task's user input.
    pub fn user_input(&self) -> Option<&str> {
        self.parts
            .iter()
            .find(|part| part.kind == "text" && !part.text.is_empty())
            .map(|part| part.text.as_str())
    }
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub message: IncomingMessage,
    /// Session to continue; omitted means a fresh one-shot conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

/// A named collection of result parts attached to a finished task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub parts: Vec<MessagePart>,
}

/// The finished task returned to the peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub context_id: String,
    /// Current (terminal) status.
    pub status: TaskStatus,
    /// Every status the task moved through, in order.
    pub status_history: Vec<TaskStatus>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl Task {
    fn new(id: String, context_id: String) -> Self {
        let submitted = TaskStatus {
            state: TaskState::Submitted,
            message: None,
            timestamp: Utc::now(),
        };
        Self {
            id,
            context_id,
            status: submitted.clone(),
            status_history: vec![submitted],
            artifacts: Vec::new(),
        }
    }

    fn advance(&mut self, state: TaskState, message: Option<String>) {
        let status = TaskStatus {
            state,
            message,
            timestamp: Utc::now(),
        };
        self.status_history.push(status.clone());
        self.status = status;
    }
}

// ---- Server ----------------------------------------------------------------

/// Shared state behind the task routes.
pub struct TaskServerState {
    pub runner: Runner,
    pub card: AgentCard,
    pub auth: AuthConfig,
}

/// Builder for a task server around a [`Runner`] and an [`AgentCard`].
pub struct TaskServerBuilder {
    runner: Runner,
    card: AgentCard,
    auth: AuthConfig,
}

impl TaskServerBuilder {
    /// Create a builder with no authentication.
    pub fn new(runner: Runner, card: AgentCard) -> Self {
        Self {
            runner,
            card,
            auth: AuthConfig::None,
        }
    }

    /// Require `Authorization: Bearer <token>` on `POST /tasks`.
    ///
    /// The agent card stays public; discovery does not need the token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthConfig::bearer(token);
        self
    }

    /// Start the server on `127.0.0.1:<port>`.
    pub async fn start_on(
        self,
        port: u16,
    ) -> Result<TaskServerInstance, Box<dyn Error + Send + Sync>> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        self.start_at(addr).await
    }

    /// Start the server at the given address.
    pub async fn start_at(
        self,
        addr: SocketAddr,
    ) -> Result<TaskServerInstance, Box<dyn Error + Send + Sync>> {
        let state = Arc::new(TaskServerState {
            runner: self.runner,
            card: self.card,
            auth: self.auth,
        });
        let app = build_app(state);

        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("task server listening on {}", addr);

        let handle = tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(TaskServerInstance { addr, handle })
    }
}

/// A running task server.
pub struct TaskServerInstance {
    addr: SocketAddr,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TaskServerInstance {
    /// The address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop serving.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Build the task routes around shared state.
///
/// Factored out of [`TaskServerBuilder::start_at`] so tests can drive the
/// router without binding a socket.
pub fn build_app(state: Arc<TaskServerState>) -> Router {
    let card_state = Arc::clone(&state);
    Router::new()
        .route(
            AGENT_CARD_PATH,
            get(move || {
                let state = Arc::clone(&card_state);
                async move { Json(state.card.clone()) }
            }),
        )
        .route(
            "/tasks",
            post(
                move |headers: HeaderMap, Json(request): Json<TaskRequest>| {
                    let state = Arc::clone(&state);
                    async move { handle_task(state, headers, request).await }
                },
            ),
        )
}

async fn handle_task(
    state: Arc<TaskServerState>,
    headers: HeaderMap,
    request: TaskRequest,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !state.auth.validate(authorization) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Unauthorized"})),
        )
            .into_response();
    }

    let Some(query) = request.message.user_input().map(str::to_string) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "message carries no text part"})),
        )
            .into_response();
    };

    let task_id = Uuid::new_v4().to_string();
    let context_id = request.context_id.unwrap_or_else(|| task_id.clone());
    debug!("task {} (context {})", task_id, context_id);

    let mut task = Task::new(task_id, context_id.clone());
    task.advance(TaskState::Working, Some(WORKING_MESSAGE.to_string()));

    let outcome = state
        .runner
        .ask(&state.card.name, A2A_USER_ID, &context_id, &query)
        .await;

    match outcome {
        Ok(TurnOutcome::Answered(text)) => {
            task.artifacts.push(Artifact {
                name: RESPONSE_ARTIFACT.to_string(),
                parts: vec![MessagePart::text(text)],
            });
            task.advance(TaskState::Completed, None);
        }
        Ok(TurnOutcome::Failed(reason)) => {
            task.advance(TaskState::Failed, Some(format!("Error: {}", reason)));
        }
        Ok(TurnOutcome::Incomplete) => {
            task.advance(
                TaskState::Failed,
                Some("Error: no final response produced".to_string()),
            );
        }
        Err(e) => {
            task.advance(TaskState::Failed, Some(format!("Error: {}", e)));
        }
    }

    (StatusCode::OK, Json(task)).into_response()
}
