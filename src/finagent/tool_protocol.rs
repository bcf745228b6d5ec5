//! Tool Model and Transport Seam
//!
//! This module defines the tool vocabulary shared by the whole pipeline:
//!
//! - **ToolDescriptor**: what a remote catalog says about one of its tools
//! - **DeclaredTool**: the model-facing declaration derived from a descriptor
//!   via [`adapt`]
//! - **RegisteredTool** / **ToolRegistry**: an agent's ordered tool set, with
//!   local and remote entries registered through one path
//! - **ToolTransport**: the trait boundary to a remote tool-protocol endpoint,
//!   implemented by [`McpClientProtocol`](crate::finagent::tool_protocols::McpClientProtocol)
//!   and by mocks in tests
//!
//! Descriptors and declarations are created once during the registration pass
//! at agent startup and never mutated afterwards.
//!
//! # Adapting a catalog entry
//!
//! ```rust
//! use finagent::tool_protocol::{adapt, ToolDescriptor};
//!
//! let descriptor = ToolDescriptor {
//!     name: "get_gross_margins".into(),
//!     description: "Gross margins for a ticker".into(),
//!     input_schema: Some(serde_json::json!({
//!         "type": "object",
//!         "properties": { "ticker": { "type": "string" } },
//!         "additionalProperties": false
//!     })),
//! };
//!
//! let declared = adapt(&descriptor).unwrap();
//! assert_eq!(declared.name, "get_gross_margins");
//! assert!(!declared.parameters.contains_key("additionalProperties"));
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Schema keys that describe the wire protocol rather than the tool's inputs.
/// They are meaningless to the model and are removed during adaptation.
const PROTOCOL_ONLY_KEYS: [&str; 2] = ["additionalProperties", "$schema"];

/// A tool as described by a remote catalog.
///
/// Mirrors the `tools/list` wire entry: `name`, `description`, `inputSchema`.
/// Immutable once fetched; a missing or malformed `input_schema` is surfaced
/// by [`adapt`], not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: Option<JsonValue>,
}

/// The model-facing declaration derived from a [`ToolDescriptor`].
///
/// `parameters` is the descriptor's schema object with protocol metadata keys
/// removed; remaining keys keep their original order. Serialized verbatim into
/// the generation request's `functionDeclarations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredTool {
    pub name: String,
    pub description: String,
    pub parameters: Map<String, JsonValue>,
}

impl DeclaredTool {
    /// Build a declaration by hand, for local tools that never had a wire
    /// descriptor.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Map::new(),
        }
    }

    /// Replace the parameter schema object.
    pub fn with_parameters(mut self, parameters: Map<String, JsonValue>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Raised when a catalog descriptor cannot be turned into a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaAdaptationError {
    /// The descriptor carries no input schema at all.
    MissingSchema { tool: String },
    /// The input schema is present but is not a JSON object.
    NotAMapping { tool: String },
}

impl fmt::Display for SchemaAdaptationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaAdaptationError::MissingSchema { tool } => {
                write!(f, "tool '{}': descriptor has no input schema", tool)
            }
            SchemaAdaptationError::NotAMapping { tool } => {
                write!(f, "tool '{}': input schema is not a mapping", tool)
            }
        }
    }
}

impl Error for SchemaAdaptationError {}

/// Convert a catalog descriptor into a model-facing declaration.
///
/// Copies `name` and `description` verbatim and copies the schema object into
/// `parameters`, dropping only the keys `additionalProperties` and `$schema`.
/// All other keys and values pass through unchanged, in order. No JSON-schema
/// validation happens here; a malformed nested schema will surface later as a
/// generation-time rejection from the model service.
pub fn adapt(descriptor: &ToolDescriptor) -> Result<DeclaredTool, SchemaAdaptationError> {
    let schema = descriptor
        .input_schema
        .as_ref()
        .ok_or_else(|| SchemaAdaptationError::MissingSchema {
            tool: descriptor.name.clone(),
        })?;

    let fields = schema
        .as_object()
        .ok_or_else(|| SchemaAdaptationError::NotAMapping {
            tool: descriptor.name.clone(),
        })?;

    let mut parameters = Map::new();
    for (key, value) in fields {
        if PROTOCOL_ONLY_KEYS.contains(&key.as_str()) {
            continue;
        }
        parameters.insert(key.clone(), value.clone());
    }

    Ok(DeclaredTool {
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        parameters,
    })
}

/// Signature for tools implemented as in-process Rust functions.
pub type LocalToolFn =
    Arc<dyn Fn(JsonValue) -> Result<JsonValue, Box<dyn Error + Send + Sync>> + Send + Sync>;

/// One registry entry. Local and remote tools share a declaration but differ
/// in how a call to them is carried out, so the execution half is a tag rather
/// than a runtime type check.
#[derive(Clone)]
pub enum RegisteredTool {
    /// An in-process function tool.
    Local {
        decl: DeclaredTool,
        handler: LocalToolFn,
    },
    /// A tool adapted from a remote catalog; `endpoint` is the catalog it
    /// came from and is where calls to it are routed.
    Remote { decl: DeclaredTool, endpoint: String },
}

impl RegisteredTool {
    /// The model-facing declaration for this entry.
    pub fn declaration(&self) -> &DeclaredTool {
        match self {
            RegisteredTool::Local { decl, .. } => decl,
            RegisteredTool::Remote { decl, .. } => decl,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration().name
    }
}

/// Where a named tool call should be carried out, resolved against a
/// [`ToolRegistry`].
#[derive(Clone)]
pub enum ToolRoute {
    /// Run the handler in-process.
    Local(LocalToolFn),
    /// Invoke the tool on this remote endpoint.
    Remote(String),
}

/// An agent's ordered tool set.
///
/// Append-only during the registration phase and read-only during generation.
/// Duplicate names are permitted; lookups resolve to the earliest entry, so
/// re-registering a name never changes existing routing. Insertion order is
/// preserved for the declaration list and for diagnostics.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry. This is the single registration path for both local
    /// and remote tools; duplicates are allowed and kept.
    pub fn register(&mut self, tool: RegisteredTool) {
        log::debug!(
            "registered {} tool '{}'",
            match tool {
                RegisteredTool::Local { .. } => "local",
                RegisteredTool::Remote { .. } => "remote",
            },
            tool.name()
        );
        self.entries.push(tool);
    }

    /// The declarations to send with a generation request, in registration
    /// order.
    pub fn declarations(&self) -> Vec<DeclaredTool> {
        self.entries.iter().map(|t| t.declaration().clone()).collect()
    }

    /// Resolve a tool name to its execution route. The first matching entry
    /// wins; `None` means the name was never registered.
    pub fn route(&self, name: &str) -> Option<ToolRoute> {
        self.entries.iter().find(|t| t.name() == name).map(|t| match t {
            RegisteredTool::Local { handler, .. } => ToolRoute::Local(handler.clone()),
            RegisteredTool::Remote { endpoint, .. } => ToolRoute::Remote(endpoint.clone()),
        })
    }

    /// Registered names in insertion order, duplicates included.
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Opaque payload returned by a remote tool invocation.
///
/// Passed through to the caller unmodified; [`RemoteCallResult::text`] is a
/// display rendering only and implies nothing about the payload's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCallResult {
    content: JsonValue,
}

impl RemoteCallResult {
    pub fn new(content: JsonValue) -> Self {
        Self { content }
    }

    /// The raw result payload.
    pub fn content(&self) -> &JsonValue {
        &self.content
    }

    pub fn into_content(self) -> JsonValue {
        self.content
    }

    /// Render the payload for display surfaces.
    ///
    /// Tool-protocol results usually arrive as a list of typed content items;
    /// the text items are joined with newlines. Anything else falls back to
    /// compact JSON.
    pub fn text(&self) -> String {
        match &self.content {
            JsonValue::String(s) => s.clone(),
            JsonValue::Array(items) => {
                let texts: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
                    .collect();
                if texts.is_empty() {
                    self.content.to_string()
                } else {
                    texts.join("\n")
                }
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for RemoteCallResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Failure talking to a remote tool endpoint. Every variant names the
/// endpoint so multi-catalog setups stay diagnosable.
#[derive(Debug)]
pub enum RemoteToolError {
    /// The request never completed: connection refused, deadline exceeded,
    /// malformed HTTP, and similar.
    Transport {
        endpoint: String,
        source: Box<dyn Error + Send + Sync>,
    },
    /// The endpoint answered, but not with a usable tool-protocol payload.
    Protocol { endpoint: String, message: String },
    /// The endpoint executed the tool and reported an application failure.
    ToolFailure {
        endpoint: String,
        tool: String,
        message: String,
    },
}

impl RemoteToolError {
    pub fn transport(endpoint: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        RemoteToolError::Transport {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    pub fn protocol(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteToolError::Protocol {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn tool_failure(
        endpoint: impl Into<String>,
        tool: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RemoteToolError::ToolFailure {
            endpoint: endpoint.into(),
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// The endpoint this failure came from.
    pub fn endpoint(&self) -> &str {
        match self {
            RemoteToolError::Transport { endpoint, .. } => endpoint,
            RemoteToolError::Protocol { endpoint, .. } => endpoint,
            RemoteToolError::ToolFailure { endpoint, .. } => endpoint,
        }
    }
}

impl fmt::Display for RemoteToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteToolError::Transport { endpoint, source } => {
                write!(f, "transport error against {}: {}", endpoint, source)
            }
            RemoteToolError::Protocol { endpoint, message } => {
                write!(f, "protocol error against {}: {}", endpoint, message)
            }
            RemoteToolError::ToolFailure {
                endpoint,
                tool,
                message,
            } => write!(f, "tool '{}' failed on {}: {}", tool, endpoint, message),
        }
    }
}

impl Error for RemoteToolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RemoteToolError::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Boundary to a remote tool-protocol endpoint.
///
/// The pipeline treats the endpoint as an opaque RPC stub reachable by URL:
/// `list_tools` fetches its catalog, `call_tool` invokes one tool on it.
/// Production uses [`McpClientProtocol`](crate::finagent::tool_protocols::McpClientProtocol);
/// tests substitute recording mocks.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Fetch the endpoint's tool catalog.
    async fn list_tools(&self, endpoint: &str) -> Result<Vec<ToolDescriptor>, RemoteToolError>;

    /// Invoke `name` on the endpoint with the given argument mapping.
    async fn call_tool(
        &self,
        endpoint: &str,
        name: &str,
        args: &JsonValue,
    ) -> Result<RemoteCallResult, RemoteToolError>;
}
