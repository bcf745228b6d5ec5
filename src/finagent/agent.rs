//! Agent
//!
//! This module provides the [`Agent`] struct: a model client handle, an
//! optional instruction (system prompt), and an ordered [`ToolRegistry`]
//! holding both local handlers and tools adapted from remote catalogs.
//!
//! # Core Components
//!
//! - **Agent**: owns the client, the instruction, and the registry
//! - **Registration**: [`register_remote_tools`](Agent::register_remote_tools)
//!   fetches a catalog over a [`ToolTransport`] and appends `Remote` entries;
//!   [`register_local_tool`](Agent::register_local_tool) appends `Local`
//!   entries through the same path
//! - **Generation**: [`run`](Agent::run) and [`respond`](Agent::respond) issue
//!   exactly one generation request; tool calls in the response are returned
//!   to the caller, never executed here (the relay does that)
//!
//! # Example
//!
//! ```rust,no_run
//! use finagent::{Agent, McpClientProtocol};
//! use finagent::clients::gemini::{GeminiClient, Model};
//! use std::sync::Arc;
//!
//! # async {
//! let client = Arc::new(GeminiClient::new_with_model_enum("key", Model::Gemini25Flash));
//! let mut agent = Agent::new("screener", client)
//!     .with_instruction("You are a financial assistant.")
//!     .with_tool_filter(["get_gross_margins", "screen_stocks"]);
//!
//! let transport = McpClientProtocol::new();
//! agent
//!     .register_remote_tools(&transport, "http://localhost:8000/mcp")
//!     .await?;
//!
//! let response = agent.run("Give me the gross margins for Apple (AAPL)?").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # };
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::finagent::client_wrapper::{
    AgentResponse, ClientWrapper, GenerationError, Message, Role,
};
use crate::finagent::config::AgentConfig;
use crate::finagent::tool_protocol::{
    adapt, DeclaredTool, LocalToolFn, RegisteredTool, RemoteToolError, SchemaAdaptationError,
    ToolRegistry, ToolTransport,
};
use crate::finagent::tools;

/// Sampling temperature for every generation request the agent issues.
///
/// Tool selection is kept deterministic; callers that want creative output
/// should talk to the model client directly.
const RUN_TEMPERATURE: f32 = 0.0;

/// An LLM agent wired to a set of local and remote tools.
///
/// The registry is owned exclusively by the agent: append-only while tools are
/// registered, read-only once generation starts. Wrap the finished agent in an
/// `Arc` to share it with a [`Runner`](crate::runner::Runner) or task server.
pub struct Agent {
    /// Display name used in logs and the agent card.
    pub name: String,
    instruction: Option<String>,
    client: Arc<dyn ClientWrapper>,
    registry: ToolRegistry,
    tool_filter: Option<Vec<String>>,
}

impl Agent {
    /// Create an agent with the given name and model client.
    ///
    /// The built-in clock tool (`get_current_datetime`) is installed
    /// immediately, so a freshly built agent is usable with zero remote
    /// catalogs registered.
    pub fn new(name: impl Into<String>, client: Arc<dyn ClientWrapper>) -> Self {
        let mut agent = Self {
            name: name.into(),
            instruction: None,
            client,
            registry: ToolRegistry::new(),
            tool_filter: None,
        };
        agent.register_local_tool(tools::clock_declaration(), tools::clock_handler());
        agent
    }

    /// Attach an instruction sent as the system prompt on every request.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Restrict which catalog tools are registered, by name.
    ///
    /// Applies only to [`register_remote_tools`](Agent::register_remote_tools);
    /// local tools are always kept. Without a filter, every cataloged tool is
    /// registered.
    pub fn with_tool_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tool_filter = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Append a local tool entry to the registry.
    pub fn register_local_tool(&mut self, declaration: DeclaredTool, handler: LocalToolFn) {
        self.registry.register(RegisteredTool::Local {
            decl: declaration,
            handler,
        });
    }

    /// Fetch the catalog at `endpoint` and register its tools as `Remote`
    /// entries.
    ///
    /// Each descriptor passes through the tool-name filter (if any) and the
    /// schema adapter before registration. Returns the number of tools
    /// registered from this catalog. Re-registering a name that already exists
    /// appends a duplicate entry; lookup stays "first entry wins".
    ///
    /// # Errors
    ///
    /// Fails with [`RegistrationError::Catalog`] when the endpoint cannot be
    /// listed, or [`RegistrationError::Schema`] when a kept descriptor carries
    /// no usable parameter schema. A schema failure aborts the whole pass; the
    /// registry keeps whatever was appended before the bad descriptor.
    pub async fn register_remote_tools(
        &mut self,
        transport: &dyn ToolTransport,
        endpoint: &str,
    ) -> Result<usize, RegistrationError> {
        let catalog = transport.list_tools(endpoint).await?;
        let mut registered = 0;
        for descriptor in &catalog {
            if !self.filter_allows(&descriptor.name) {
                debug!("{}: skipping tool '{}' (not in filter)", endpoint, descriptor.name);
                continue;
            }
            let declaration = adapt(descriptor)?;
            self.registry.register(RegisteredTool::Remote {
                decl: declaration,
                endpoint: endpoint.to_string(),
            });
            registered += 1;
        }
        Ok(registered)
    }

    /// Register every catalog named in the configuration's `mcp-urls` table.
    ///
    /// Catalogs are visited in the table's order; the first failure aborts the
    /// pass. Returns the total number of tools registered.
    pub async fn register_catalogs_from_config(
        &mut self,
        transport: &dyn ToolTransport,
        config: &AgentConfig,
    ) -> Result<usize, RegistrationError> {
        let mut registered = 0;
        for (name, endpoint) in &config.mcp_urls {
            debug!("registering catalog '{}' at {}", name, endpoint);
            registered += self.register_remote_tools(transport, endpoint).await?;
        }
        Ok(registered)
    }

    /// Issue a single generation request for a one-shot query.
    ///
    /// The request carries the agent's instruction, the query as the sole user
    /// message, the full declaration list, and temperature 0.0. Tool calls in
    /// the response are returned for the relay to dispatch; nothing here
    /// executes them, and no retry is performed.
    pub async fn run(&self, query: &str) -> Result<AgentResponse, GenerationError> {
        let history = [Message {
            role: Role::User,
            content: query.to_string(),
        }];
        self.respond(&history).await
    }

    /// Issue a single generation request over an accumulated history.
    ///
    /// Multi-turn form of [`run`](Agent::run), used by the
    /// [`Runner`](crate::runner::Runner): same contract, same temperature pin.
    pub async fn respond(&self, history: &[Message]) -> Result<AgentResponse, GenerationError> {
        self.client
            .generate(
                self.instruction.as_deref(),
                history,
                &self.registry.declarations(),
                RUN_TEMPERATURE,
            )
            .await
    }

    /// Borrow the tool registry (for the relay's routing lookups).
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The instruction sent as the system prompt, if one was attached.
    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    /// Borrow the underlying model client.
    pub fn client(&self) -> &Arc<dyn ClientWrapper> {
        &self.client
    }

    /// Names of every registered tool, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.registry.tool_names()
    }

    fn filter_allows(&self, name: &str) -> bool {
        self.tool_filter
            .as_ref()
            .map(|filter| filter.iter().any(|kept| kept == name))
            .unwrap_or(true)
    }
}

/// Error registering tools from a remote catalog.
#[derive(Debug)]
pub enum RegistrationError {
    /// The catalog could not be fetched or the call transport failed.
    Catalog(RemoteToolError),
    /// A cataloged descriptor could not be adapted into a declaration.
    Schema(SchemaAdaptationError),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Catalog(e) => write!(f, "catalog registration failed: {}", e),
            RegistrationError::Schema(e) => write!(f, "catalog registration failed: {}", e),
        }
    }
}

impl Error for RegistrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegistrationError::Catalog(e) => Some(e),
            RegistrationError::Schema(e) => Some(e),
        }
    }
}

impl From<RemoteToolError> for RegistrationError {
    fn from(e: RemoteToolError) -> Self {
        RegistrationError::Catalog(e)
    }
}

impl From<SchemaAdaptationError> for RegistrationError {
    fn from(e: SchemaAdaptationError) -> Self {
        RegistrationError::Schema(e)
    }
}
