//! Server-held conversation sessions.
//!
//! A [`Session`] is one conversation: its message history, a free-form state
//! map, and timestamps. Sessions live in a [`SessionStore`] keyed by the
//! composite `(app, user, session_id)` and are handed out as
//! [`SharedSession`] handles, so turns on different conversations proceed
//! independently while turns on the same conversation serialize on the
//! session's own mutex.
//!
//! [`SessionStore::get_or_create`] performs lookup and creation under a single
//! lock: two concurrent callers racing on a brand-new key always observe the
//! same session. The store is bounded (default
//! [`DEFAULT_MAX_SESSIONS`] entries); inserting past the bound evicts the
//! oldest-created session.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::{Map, Value as JsonValue};
use tokio::sync::Mutex;

use crate::finagent::client_wrapper::Message;

/// Default capacity of a [`SessionStore`].
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Composite lookup key for a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app: String,
    pub user: String,
    pub session_id: String,
}

/// One server-held conversation.
#[derive(Clone, Debug)]
pub struct Session {
    /// Caller-chosen session identifier.
    pub id: String,
    pub user_id: String,
    pub app_name: String,
    /// Accumulated messages, oldest first.
    pub history: Vec<Message>,
    /// Free-form per-conversation state.
    pub state: Map<String, JsonValue>,
    pub created_utc: DateTime<Utc>,
    pub last_active_utc: DateTime<Utc>,
}

impl Session {
    /// Create an empty session stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            app_name: app_name.into(),
            history: Vec::new(),
            state: Map::new(),
            created_utc: now,
            last_active_utc: now,
        }
    }

    /// Refresh the last-active timestamp.
    pub fn touch(&mut self) {
        self.last_active_utc = Utc::now();
    }
}

/// Shared handle to a session. Lock it for the duration of a turn.
pub type SharedSession = Arc<Mutex<Session>>;

struct StoredSession {
    // Creation time is duplicated out of the session so eviction can scan
    // without locking every session.
    created_utc: DateTime<Utc>,
    session: SharedSession,
}

/// Bounded, concurrency-safe map of live sessions.
///
/// Cloning the store clones the handle; all clones see the same sessions.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<SessionKey, StoredSession>>>,
    max_sessions: usize,
}

impl SessionStore {
    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    /// Create a store that holds at most `max_sessions` sessions.
    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_sessions,
        }
    }

    /// Look up the session for `(app, user, session_id)`, creating it on a
    /// miss.
    ///
    /// Lookup and creation happen under one lock, so concurrent callers for
    /// the same new key converge on a single session. When the store is at
    /// capacity, the oldest-created session is evicted to make room.
    ///
    /// # Errors
    ///
    /// [`SessionLookupError::InvalidKey`] when any key component is empty.
    pub async fn get_or_create(
        &self,
        app: &str,
        user: &str,
        session_id: &str,
    ) -> Result<SharedSession, SessionLookupError> {
        let key = Self::key(app, user, session_id)?;
        let mut sessions = self.inner.lock().await;

        if let Some(stored) = sessions.get(&key) {
            return Ok(Arc::clone(&stored.session));
        }

        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, stored)| stored.created_utc)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                warn!(
                    "session store at capacity ({}); evicting oldest session '{}'",
                    self.max_sessions, oldest.session_id
                );
                sessions.remove(&oldest);
            }
        }

        let session: SharedSession = Arc::new(Mutex::new(Session::new(session_id, user, app)));
        sessions.insert(
            key,
            StoredSession {
                created_utc: Utc::now(),
                session: Arc::clone(&session),
            },
        );
        Ok(session)
    }

    /// Look up an existing session without creating one.
    ///
    /// # Errors
    ///
    /// [`SessionLookupError::InvalidKey`] when any key component is empty,
    /// [`SessionLookupError::NotFound`] when no session exists for the key.
    pub async fn get(
        &self,
        app: &str,
        user: &str,
        session_id: &str,
    ) -> Result<SharedSession, SessionLookupError> {
        let key = Self::key(app, user, session_id)?;
        let sessions = self.inner.lock().await;
        sessions
            .get(&key)
            .map(|stored| Arc::clone(&stored.session))
            .ok_or(SessionLookupError::NotFound { key })
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    fn key(app: &str, user: &str, session_id: &str) -> Result<SessionKey, SessionLookupError> {
        for (component, value) in [("app", app), ("user", user), ("session_id", session_id)] {
            if value.is_empty() {
                return Err(SessionLookupError::InvalidKey { component });
            }
        }
        Ok(SessionKey {
            app: app.to_string(),
            user: user.to_string(),
            session_id: session_id.to_string(),
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Error looking up a session.
#[derive(Debug)]
pub enum SessionLookupError {
    /// A component of the composite key was empty.
    InvalidKey { component: &'static str },
    /// No session exists for the key (returned by [`SessionStore::get`] only;
    /// `get_or_create` never misses).
    NotFound { key: SessionKey },
}

impl fmt::Display for SessionLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionLookupError::InvalidKey { component } => {
                write!(f, "session key component '{}' is empty", component)
            }
            SessionLookupError::NotFound { key } => write!(
                f,
                "no session for app '{}', user '{}', id '{}'",
                key.app, key.user, key.session_id
            ),
        }
    }
}

impl Error for SessionLookupError {}
