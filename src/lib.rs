//! # FinAgent
//!
//! FinAgent is a Rust toolkit for building financial LLM agents: agents that
//! answer stock-market questions by calling analysis tools over MCP-style
//! JSON-RPC endpoints, keep per-conversation history, and can serve other
//! agents over HTTP.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Agents with Tools**: [`Agent`] connects a hosted LLM to a unified
//!   [`tool_protocol::ToolRegistry`] holding local Rust closures and tools
//!   imported from remote catalogs
//! * **Tool Relay**: [`relay::relay`] executes the first tool call of a model
//!   response, in-process or over HTTP, and hands back a uniform outcome
//! * **Stateful Conversations**: [`session::SessionStore`] plus [`Runner`]
//!   drive complete turns over per-conversation history held in a bounded store
//! * **Agent-to-Agent Serving**: `TaskServerBuilder` (available on the
//!   `a2a-server` feature) publishes a runner as an HTTP task endpoint with a
//!   discoverable agent card
//! * **Provider Abstraction**: the [`ClientWrapper`] trait keeps the pipeline
//!   independent of the hosted model API; [`clients::gemini::GeminiClient`]
//!   is the bundled implementation
//!
//! ## Core Concepts
//!
//! ### Agent: A Model Plus Its Tools
//!
//! [`Agent`] pairs a model client with a tool registry. Every agent starts
//! with the built-in clock tool; remote catalogs are imported with
//! [`Agent::register_remote_tools`]:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use finagent::Agent;
//! use finagent::clients::gemini::{GeminiClient, Model};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(GeminiClient::new_with_model_enum(
//!         &std::env::var("GOOGLE_API_KEY")?,
//!         Model::Gemini25Flash,
//!     ));
//!
//!     let agent = Agent::new("assistant", client)
//!         .with_instruction("You are a financial assistant.");
//!
//!     let response = agent.run("What time is it right now?").await?;
//!     println!("{}", response.text.unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ### Relaying Tool Calls
//!
//! The model never executes anything. When a response carries a tool call,
//! [`relay::relay`] routes it through the registry to a local handler or a
//! remote endpoint and returns the result:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use finagent::clients::gemini::{GeminiClient, Model};
//! use finagent::relay::relay;
//! use finagent::{Agent, McpClientProtocol};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(GeminiClient::new_with_model_enum(
//!     &std::env::var("GOOGLE_API_KEY")?,
//!     Model::Gemini25Flash,
//! ));
//! let mcp = McpClientProtocol::new();
//!
//! let mut agent = Agent::new("screener", client);
//! agent
//!     .register_remote_tools(&mcp, "http://localhost:8000/mcp")
//!     .await?;
//!
//! let response = agent.run("Give me the gross margins for AAPL").await?;
//! let outcome = relay(&response, agent.registry(), &mcp).await?;
//! println!("{}", outcome.text());
//! # Ok(())
//! # }
//! ```
//!
//! ### Sessions and the Runner
//!
//! [`Runner`] owns a [`session::SessionStore`] and runs whole turns: append
//! the user message, generate, relay any tool call, append the answer. The
//! turn is observable as an event stream or collapsed to a [`TurnOutcome`]:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use finagent::clients::gemini::{GeminiClient, Model};
//! use finagent::{Agent, McpClientProtocol, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(GeminiClient::new_with_model_enum(
//!     &std::env::var("GOOGLE_API_KEY")?,
//!     Model::Gemini25Flash,
//! ));
//! let agent = Agent::new("assistant", client);
//! let runner = Runner::new(Arc::new(agent), Arc::new(McpClientProtocol::new()));
//!
//! let outcome = runner
//!     .ask("my_app", "user-1", "session-1", "Is AAPL bullish?")
//!     .await?;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! Reusing the same `(app, user, session_id)` key continues the conversation;
//! the store evicts the oldest session once it reaches capacity.
//!
//! ### Serving Agents to Agents
//!
//! With the `a2a-server` feature, `TaskServerBuilder` wraps a runner in an
//! HTTP task surface: peers fetch the agent card from
//! `/.well-known/agent.json` and submit work with `POST /tasks`. See the
//! `demos/a2a_server.rs` demo for a complete technical-analyst deployment.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use finagent::clients::gemini::{GeminiClient, Model};
//! use finagent::config::AgentConfig;
//! use finagent::relay::relay;
//! use finagent::{Agent, McpClientProtocol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     finagent::init_logger();
//!
//!     let config = AgentConfig::load("env.toml")?;
//!     let client = Arc::new(GeminiClient::new_with_model_enum(
//!         &config.google_api_key,
//!         Model::Gemini25Flash,
//!     ));
//!
//!     let mut agent = Agent::new("stock_screener_agent", client)
//!         .with_instruction("You are a financial assistant.");
//!
//!     let mcp = McpClientProtocol::new();
//!     agent.register_catalogs_from_config(&mcp, &config).await?;
//!
//!     let response = agent.run("Give me the gross margins for Apple (AAPL)?").await?;
//!     let outcome = relay(&response, agent.registry(), &mcp).await?;
//!     println!("{}", outcome.text());
//!     Ok(())
//! }
//! ```
//!
//! Continue exploring the modules re-exported from the crate root for
//! progressively richer interaction patterns.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding
/// FinAgent can opt-in to simple `RUST_LOG` driven diagnostics without having
/// to choose a specific logging backend upfront.
///
/// ```rust
/// finagent::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `finagent` module.
pub mod finagent;

// Re-exporting key items for easier external access.
pub use finagent::agent::{Agent, RegistrationError};
pub use finagent::client_wrapper;
pub use finagent::client_wrapper::{
    AgentResponse, ClientWrapper, FunctionCall, GenerationError, Message, Role,
};
pub use finagent::clients;
pub use finagent::config;
pub use finagent::config::AgentConfig;
pub use finagent::event;
pub use finagent::event::{ContentPart, TurnEvent, TurnStream};
pub use finagent::relay;
pub use finagent::relay::{RelayError, RelayOutcome};
pub use finagent::runner;
pub use finagent::runner::{collect_final, Runner, TurnOutcome};
pub use finagent::server_auth;
pub use finagent::server_auth::AuthConfig;
pub use finagent::session;
pub use finagent::session::{Session, SessionKey, SessionLookupError, SessionStore, SharedSession};
pub use finagent::tool_protocol;
pub use finagent::tool_protocol::{DeclaredTool, RegisteredTool, ToolRegistry};
pub use finagent::tool_protocols;
pub use finagent::tool_protocols::McpClientProtocol;
pub use finagent::tools;

#[cfg(feature = "a2a-server")]
pub use finagent::a2a_server;
