//! Session/Event Driver
//!
//! The [`Runner`] drives multi-turn conversations: it holds the shared
//! [`Agent`], the [`ToolTransport`] used for remote dispatch, and a
//! [`SessionStore`]. One turn appends the user message to the session,
//! issues a generation request, relays any tool call, appends the answer
//! back to the session, and reports progress as a [`TurnStream`].
//!
//! Two consumption styles are offered:
//!
//! - [`run_turn`](Runner::run_turn) hands back the raw event stream for
//!   callers that want to observe progress as it happens;
//! - [`turn`](Runner::turn) folds the stream into a [`TurnOutcome`], the
//!   common case for request/response surfaces.
//!
//! Turns on one session serialize on the session's mutex; turns on different
//! sessions proceed concurrently.

use std::fmt;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use log::debug;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::finagent::agent::Agent;
use crate::finagent::client_wrapper::{Message, Role};
use crate::finagent::event::{TurnEvent, TurnStream};
use crate::finagent::relay::relay;
use crate::finagent::session::{SessionLookupError, SessionStore, SharedSession};
use crate::finagent::tool_protocol::ToolTransport;

/// Fallback reason when an escalation event carries no message.
const ESCALATION_FALLBACK: &str = "No specific message.";

/// How one turn of a session ended.
///
/// An exhausted event stream with no final event yields [`Incomplete`], never
/// an empty `Answered`; "no answer" stays distinguishable from a
/// legitimately empty answer.
///
/// [`Incomplete`]: TurnOutcome::Incomplete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn produced an answer (tool result or model prose).
    Answered(String),
    /// The turn escalated; the payload is the reason.
    Failed(String),
    /// The event stream ended without a final event.
    Incomplete,
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnOutcome::Answered(text) => f.write_str(text),
            TurnOutcome::Failed(reason) => write!(f, "Agent escalated: {}", reason),
            TurnOutcome::Incomplete => f.write_str("No final response produced."),
        }
    }
}

/// Drives turns against a shared agent, relaying tool calls as they appear.
///
/// Cloning is cheap; clones share the agent, transport, and session store.
#[derive(Clone)]
pub struct Runner {
    agent: Arc<Agent>,
    transport: Arc<dyn ToolTransport>,
    store: SessionStore,
}

impl Runner {
    /// Create a runner with a fresh, default-capacity session store.
    pub fn new(agent: Arc<Agent>, transport: Arc<dyn ToolTransport>) -> Self {
        Self {
            agent,
            transport,
            store: SessionStore::new(),
        }
    }

    /// Use an existing session store (shared or custom-bounded).
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = store;
        self
    }

    /// Borrow the session store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Borrow the shared agent.
    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// Run one turn and return its event stream.
    ///
    /// The returned stream yields zero or more non-final
    /// [`TurnEvent::Content`] events (the model's prose when it also called a
    /// tool), then exactly one final content event or one escalation. The
    /// user message and the final answer are appended to the session history,
    /// so later turns see both. The session stays locked for the whole turn.
    pub fn run_turn(&self, session: SharedSession, user_text: &str) -> TurnStream {
        let (tx, rx) = mpsc::channel(8);
        let agent = Arc::clone(&self.agent);
        let transport = Arc::clone(&self.transport);
        let user_text = user_text.to_string();

        tokio::spawn(async move {
            let mut session = session.lock().await;
            debug!(
                "turn for session '{}' ({} prior messages)",
                session.id,
                session.history.len()
            );
            session.history.push(Message {
                role: Role::User,
                content: user_text,
            });
            session.touch();

            let response = match agent.respond(&session.history).await {
                Ok(response) => response,
                Err(e) => {
                    let _ = tx
                        .send(TurnEvent::Escalation {
                            message: Some(e.to_string()),
                        })
                        .await;
                    return;
                }
            };

            // Prose accompanying a tool call is progress, not the answer.
            if response.has_function_calls() {
                if let Some(text) = response.text.as_deref().filter(|t| !t.is_empty()) {
                    let _ = tx.send(TurnEvent::content_text(text, false)).await;
                }
            }

            match relay(&response, agent.registry(), transport.as_ref()).await {
                Ok(outcome) => {
                    let answer = outcome.text();
                    session.history.push(Message {
                        role: Role::Assistant,
                        content: answer.clone(),
                    });
                    session.touch();
                    let _ = tx.send(TurnEvent::content_text(answer, true)).await;
                }
                Err(e) => {
                    let _ = tx
                        .send(TurnEvent::Escalation {
                            message: Some(e.to_string()),
                        })
                        .await;
                }
            }
        });

        ReceiverStream::new(rx)
    }

    /// Run one turn and fold its event stream into a [`TurnOutcome`].
    pub async fn turn(&self, session: SharedSession, user_text: &str) -> TurnOutcome {
        collect_final(self.run_turn(session, user_text)).await
    }

    /// Convenience: get-or-create the session, then run one turn on it.
    ///
    /// # Errors
    ///
    /// [`SessionLookupError::InvalidKey`] when a key component is empty.
    pub async fn ask(
        &self,
        app: &str,
        user: &str,
        session_id: &str,
        user_text: &str,
    ) -> Result<TurnOutcome, SessionLookupError> {
        let session = self.store.get_or_create(app, user, session_id).await?;
        Ok(self.turn(session, user_text).await)
    }
}

/// Consume a turn's events in arrival order and produce the outcome.
///
/// The text parts of the final content event are newline-joined. An
/// escalation short-circuits with [`TurnOutcome::Failed`], substituting a
/// fixed fallback reason when the event carries none. A stream that ends
/// without a final event yields [`TurnOutcome::Incomplete`].
pub async fn collect_final<S>(mut events: S) -> TurnOutcome
where
    S: Stream<Item = TurnEvent> + Unpin,
{
    while let Some(event) = events.next().await {
        match event {
            TurnEvent::Content {
                parts,
                is_final: true,
            } => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n");
                return TurnOutcome::Answered(text);
            }
            TurnEvent::Content { .. } => {}
            TurnEvent::Escalation { message } => {
                return TurnOutcome::Failed(
                    message.unwrap_or_else(|| ESCALATION_FALLBACK.to_string()),
                );
            }
        }
    }
    TurnOutcome::Incomplete
}
