//! Response Relay
//!
//! The relay sits between the model client and the caller. An
//! [`AgentResponse`] either carries plain text or one or more tool-call
//! requests; the relay turns it into the turn's final answer:
//!
//! - no tool calls: the model text passes through untouched, and no remote
//!   call is made;
//! - tool calls present: the **first** call is resolved through the registry
//!   and dispatched (over the [`ToolTransport`] for `Remote` entries,
//!   in-process for `Local` ones), and the raw result is the answer for the
//!   turn. Any additional calls are logged and discarded.
//!
//! There is no second model round-trip: the tool result is not fed back for a
//! natural-language summary. One hop, not a ReAct loop.

use std::error::Error;
use std::fmt;

use log::{debug, warn};

use crate::finagent::client_wrapper::AgentResponse;
use crate::finagent::tool_protocol::{
    RemoteCallResult, RemoteToolError, ToolRegistry, ToolRoute, ToolTransport,
};

/// The final answer for one model turn.
#[derive(Debug)]
pub enum RelayOutcome {
    /// The model answered in prose; no tool was involved.
    Text(String),
    /// A tool was called; this is its raw result.
    Tool(RemoteCallResult),
}

impl RelayOutcome {
    /// Render the outcome for a display surface.
    pub fn text(&self) -> String {
        match self {
            RelayOutcome::Text(s) => s.clone(),
            RelayOutcome::Tool(result) => result.text(),
        }
    }
}

impl fmt::Display for RelayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayOutcome::Text(s) => f.write_str(s),
            RelayOutcome::Tool(result) => write!(f, "{}", result),
        }
    }
}

/// Error produced while relaying a model response.
#[derive(Debug)]
pub enum RelayError {
    /// The model called a tool name the registry has no entry for.
    ToolRouting { tool: String },
    /// The remote invocation failed.
    Remote(RemoteToolError),
    /// A local handler returned an error.
    LocalExecution { tool: String, message: String },
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::ToolRouting { tool } => {
                write!(f, "no registered tool matches call '{}'", tool)
            }
            RelayError::Remote(e) => write!(f, "{}", e),
            RelayError::LocalExecution { tool, message } => {
                write!(f, "local tool '{}' failed: {}", tool, message)
            }
        }
    }
}

impl Error for RelayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RelayError::Remote(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RemoteToolError> for RelayError {
    fn from(e: RemoteToolError) -> Self {
        RelayError::Remote(e)
    }
}

/// Resolve a model response into the turn's final answer.
///
/// Processes at most the first tool call; see the module docs for the full
/// contract. The model-produced text is discarded whenever a tool call is
/// present; the tool result is the answer.
///
/// # Errors
///
/// [`RelayError::ToolRouting`] when the called name resolves to no registry
/// entry, [`RelayError::Remote`] when the remote invocation fails, and
/// [`RelayError::LocalExecution`] when an in-process handler returns an error.
pub async fn relay(
    response: &AgentResponse,
    registry: &ToolRegistry,
    transport: &dyn ToolTransport,
) -> Result<RelayOutcome, RelayError> {
    let Some(call) = response.function_calls.first() else {
        return Ok(RelayOutcome::Text(
            response.text.clone().unwrap_or_default(),
        ));
    };

    if response.function_calls.len() > 1 {
        warn!(
            "response carried {} tool calls; relaying '{}' and discarding the rest",
            response.function_calls.len(),
            call.name
        );
    }

    match registry.route(&call.name) {
        None => Err(RelayError::ToolRouting {
            tool: call.name.clone(),
        }),
        Some(ToolRoute::Remote(endpoint)) => {
            debug!("dispatching '{}' to {}", call.name, endpoint);
            let result = transport.call_tool(&endpoint, &call.name, &call.args).await?;
            Ok(RelayOutcome::Tool(result))
        }
        Some(ToolRoute::Local(handler)) => {
            debug!("dispatching '{}' in-process", call.name);
            let value = handler(call.args.clone()).map_err(|e| RelayError::LocalExecution {
                tool: call.name.clone(),
                message: e.to_string(),
            })?;
            Ok(RelayOutcome::Tool(RemoteCallResult::new(value)))
        }
    }
}
