//! Model Client Seam
//!
//! A `ClientWrapper` is a wrapper around a hosted LLM generation service. It
//! exposes exactly one capability: a single content-generation request carrying
//! an optional system instruction, a message history, a tool declaration list,
//! and a sampling temperature. The wrapper never executes tool calls; when the
//! model requests one it comes back in [`AgentResponse::function_calls`] for
//! the relay to act on.
//!
//! Conversation state lives elsewhere (see
//! [`Session`](crate::finagent::session::Session)); wrappers are stateless apart
//! from token-usage accounting.

use crate::finagent::tool_protocol::DeclaredTool;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt;
use std::sync::Mutex;

/// Represents the possible roles for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Set by the developer to steer the model's responses.
    System,
    /// A message sent by a human user (or app user).
    User,
    /// Content the model generated as a response to a user message.
    Assistant,
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, Default)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// A generic message exchanged with an LLM.
#[derive(Clone, Debug)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCall {
    /// Declared tool name the model wants invoked.
    pub name: String,
    /// Argument mapping, as produced by the model.
    pub args: JsonValue,
}

/// One model turn: text, requested function calls, or (rarely) both.
///
/// Which half is populated is the upstream model's contract, not something
/// enforced here; the relay checks `function_calls` first.
#[derive(Clone, Debug, Default)]
pub struct AgentResponse {
    pub text: Option<String>,
    pub function_calls: Vec<FunctionCall>,
    pub usage: Option<TokenUsage>,
}

impl AgentResponse {
    /// A plain text turn.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A turn consisting of tool-call requests.
    pub fn function_calls(calls: Vec<FunctionCall>) -> Self {
        Self {
            function_calls: calls,
            ..Self::default()
        }
    }

    pub fn has_function_calls(&self) -> bool {
        !self.function_calls.is_empty()
    }
}

/// Upstream model call failure. Single-shot: nothing in this crate retries a
/// failed generation.
#[derive(Debug)]
pub enum GenerationError {
    /// The request never completed (connection, deadline, malformed HTTP).
    Transport {
        model: String,
        source: Box<dyn Error + Send + Sync>,
    },
    /// The service answered with a non-success status.
    Api {
        model: String,
        status: u16,
        message: String,
    },
    /// The service answered 200 with a body this crate cannot interpret.
    MalformedResponse { model: String, message: String },
}

impl GenerationError {
    pub fn transport(model: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        GenerationError::Transport {
            model: model.into(),
            source: Box::new(source),
        }
    }

    pub fn api(model: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        GenerationError::Api {
            model: model.into(),
            status,
            message: message.into(),
        }
    }

    pub fn malformed(model: impl Into<String>, message: impl Into<String>) -> Self {
        GenerationError::MalformedResponse {
            model: model.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Transport { model, source } => {
                write!(f, "generation transport error ({}): {}", model, source)
            }
            GenerationError::Api {
                model,
                status,
                message,
            } => write!(f, "generation API error ({}, status {}): {}", model, status, message),
            GenerationError::MalformedResponse { model, message } => {
                write!(f, "malformed generation response ({}): {}", model, message)
            }
        }
    }
}

impl Error for GenerationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GenerationError::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Trait defining the interface to a hosted LLM generation service.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// The model identifier requests are issued against.
    fn model_name(&self) -> &str;

    /// Issue one generation request.
    ///
    /// - `instruction`: optional system instruction, sent out-of-band from the
    ///   conversation contents.
    /// - `contents`: the conversation so far, oldest first.
    /// - `tools`: declarations the model may call; an empty slice means plain
    ///   text generation.
    /// - `temperature`: sampling temperature; the pipeline pins this to 0.0.
    async fn generate(
        &self,
        instruction: Option<&str>,
        contents: &[Message],
        tools: &[DeclaredTool],
        temperature: f32,
    ) -> Result<AgentResponse, GenerationError>;

    /// Hook to retrieve usage from the *last* generate() call.
    /// Default impl returns None so wrappers without tracking don't break.
    fn get_last_usage(&self) -> Option<TokenUsage> {
        self.usage_slot()
            .and_then(|slot| slot.lock().ok().and_then(|u| u.clone()))
    }

    /// Wrappers that track token usage override this to expose their slot.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        None
    }
}
