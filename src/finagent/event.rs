//! Turn event stream.
//!
//! A [`Runner`](crate::finagent::runner::Runner) turn produces an ordered
//! sequence of [`TurnEvent`]s over a channel: zero or more non-final content
//! events, closed by either a content event marked final (the answer) or an
//! [`Escalation`](TurnEvent::Escalation). Consumers read the stream in
//! arrival order; [`Runner::turn`](crate::finagent::runner::Runner::turn)
//! folds it into a [`TurnOutcome`](crate::finagent::runner::TurnOutcome).

use tokio_stream::wrappers::ReceiverStream;

/// One piece of content inside a [`TurnEvent::Content`] event.
///
/// Only text parts are produced today; the `Option` leaves room for parts
/// that carry no text at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPart {
    pub text: Option<String>,
}

/// Events emitted while driving one turn of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// Model output for this turn. `is_final: false` events are progress
    /// (e.g. the model's prose alongside a tool call); the event with
    /// `is_final: true` carries the turn's answer.
    Content {
        parts: Vec<ContentPart>,
        is_final: bool,
    },
    /// The turn failed; `message` explains why when one is available.
    Escalation { message: Option<String> },
}

impl TurnEvent {
    /// Build a content event holding a single text part.
    pub fn content_text(text: impl Into<String>, is_final: bool) -> Self {
        TurnEvent::Content {
            parts: vec![ContentPart {
                text: Some(text.into()),
            }],
            is_final,
        }
    }
}

/// Ordered stream of the events of one turn.
pub type TurnStream = ReceiverStream<TurnEvent>;
