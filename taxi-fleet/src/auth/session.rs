//! Server-side sessions
//!
//! The browser only holds a random [`SessionId`] in a cookie; everything else
//! lives in [`SessionData`] inside the process-wide [`SessionStore`].
//!
//! Logging in or out cycles the id: the middleware moves the data to a fresh
//! id and forgets the old one, so an id obtained before login never becomes
//! an authenticated session.

use crate::middleware::csrf;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Random session identifier, the value of the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session ID
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the session ID as a string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(|_| Self(s.to_string()))
            .map_err(|_| SessionError::InvalidSessionId)
    }
}

/// Per-session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// When this session expires unless used again
    pub expires_at: DateTime<Utc>,
    /// Logged-in driver
    pub user_id: Option<i64>,
    /// Arbitrary values, e.g. the visit counter
    pub data: HashMap<String, serde_json::Value>,
    /// Flash messages queued for the next rendered page
    pub flash_messages: Vec<FlashMessage>,
    /// Token expected back from forms of this session
    pub csrf_token: Option<String>,
    #[serde(skip)]
    cycle_key: bool,
}

impl SessionData {
    /// Empty session valid for `lifetime`
    #[must_use]
    pub fn with_expiration(lifetime: Duration) -> Self {
        Self {
            expires_at: Utc::now() + lifetime,
            user_id: None,
            data: HashMap::new(),
            flash_messages: Vec::new(),
            csrf_token: None,
            cycle_key: false,
        }
    }

    /// Check if session is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Nothing worth keeping a session for
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.data.is_empty()
            && self.flash_messages.is_empty()
            && self.csrf_token.is_none()
    }

    /// Get a value from session data
    #[must_use]
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value in session data
    ///
    /// # Errors
    ///
    /// Returns error if value cannot be serialized to JSON
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), SessionError> {
        let json_value = serde_json::to_value(value)?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Queue a flash message
    pub fn add_flash(&mut self, message: FlashMessage) {
        self.flash_messages.push(message);
    }

    /// Take all queued flash messages
    pub fn take_flashes(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.flash_messages)
    }

    /// The session's CSRF token, created on first use
    pub fn csrf_token(&mut self) -> &str {
        self.csrf_token.get_or_insert_with(csrf::generate_token)
    }

    /// Log a driver in under a new session id and CSRF token
    pub fn login(&mut self, user_id: i64) {
        self.user_id = Some(user_id);
        self.csrf_token = None;
        self.cycle_key = true;
    }

    /// Drop everything and continue under a new session id
    pub fn logout(&mut self) {
        self.user_id = None;
        self.data.clear();
        self.flash_messages.clear();
        self.csrf_token = None;
        self.cycle_key = true;
    }

    /// Whether the id must be replaced on save; clears the request
    pub(crate) fn take_cycle_key(&mut self) -> bool {
        std::mem::take(&mut self.cycle_key)
    }
}

impl Default for SessionData {
    fn default() -> Self {
        Self::with_expiration(Duration::weeks(2))
    }
}

/// Flash message for one-time display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashMessage {
    /// Message level
    pub level: FlashLevel,
    /// Message text
    pub message: String,
}

impl FlashMessage {
    /// Create a success flash message
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    /// Create an info flash message
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    /// CSS class for this message
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "flash-success",
            FlashLevel::Info => "flash-info",
        }
    }
}

/// Flash message severity level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    /// A change was saved
    Success,
    /// Neutral notice, e.g. after logout
    Info,
}

/// Session-related errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid session ID format
    #[error("Invalid session ID")]
    InvalidSessionId,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Minimum time between two sweeps of the store
const SWEEP_INTERVAL_SECS: i64 = 60;

#[derive(Debug)]
struct StoreInner {
    sessions: HashMap<SessionId, SessionData>,
    next_sweep: DateTime<Utc>,
}

/// In-memory session storage shared by all requests
///
/// Holds one entry per live session. Expired entries are dropped by a full
/// scan, run from [`SessionStore::save`] at most once per sweep interval.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<StoreInner>>,
    max_age: Duration,
}

impl SessionStore {
    /// Create an empty store whose sessions live for `max_age` after last use
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                sessions: HashMap::new(),
                next_sweep: Utc::now() + Duration::seconds(SWEEP_INTERVAL_SECS),
            })),
            max_age,
        }
    }

    /// Fresh session data using this store's lifetime
    #[must_use]
    pub fn new_session(&self) -> SessionData {
        SessionData::with_expiration(self.max_age)
    }

    /// Load a live session, extending its lifetime
    #[must_use]
    pub fn load(&self, session_id: &SessionId) -> Option<SessionData> {
        let mut data = self.inner.read().sessions.get(session_id).cloned()?;
        if data.is_expired() {
            return None;
        }
        data.expires_at = Utc::now() + self.max_age;
        Some(data)
    }

    /// Save (insert or replace) a session
    pub fn save(&self, session_id: SessionId, mut data: SessionData) {
        data.cycle_key = false;
        let mut inner = self.inner.write();
        let now = Utc::now();
        if now >= inner.next_sweep {
            Self::retain_live(&mut inner.sessions);
            inner.next_sweep = now + Duration::seconds(SWEEP_INTERVAL_SECS);
        }
        inner.sessions.insert(session_id, data);
    }

    /// Forget a session
    pub fn delete(&self, session_id: &SessionId) {
        self.inner.write().sessions.remove(session_id);
    }

    /// Drop every expired session now, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        Self::retain_live(&mut self.inner.write().sessions)
    }

    /// Number of stored sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    /// Whether the store holds no sessions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn retain_live(sessions: &mut HashMap<SessionId, SessionData>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, data| !data.is_expired());
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, "expired sessions swept");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().parse::<SessionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_data_get_set() {
        let mut data = SessionData::default();
        data.set("num_visits", 3_u32).unwrap();
        assert_eq!(data.get::<u32>("num_visits"), Some(3));
        assert_eq!(data.get::<u32>("missing"), None);
    }

    #[test]
    fn test_take_flashes_clears_queue() {
        let mut data = SessionData::default();
        data.add_flash(FlashMessage::success("Car created"));
        let flashes = data.take_flashes();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].css_class(), "flash-success");
        assert!(data.flash_messages.is_empty());
    }

    #[test]
    fn test_csrf_token_is_stable_until_login() {
        let mut data = SessionData::default();
        let first = data.csrf_token().to_string();
        assert_eq!(data.csrf_token(), first);

        data.login(3);
        assert!(data.csrf_token.is_none());
        assert_ne!(data.csrf_token(), first);
    }

    #[test]
    fn test_login_and_logout_cycle_key_once() {
        let mut data = SessionData::default();
        assert!(!data.take_cycle_key());

        data.login(42);
        assert!(data.take_cycle_key());
        assert!(!data.take_cycle_key());

        data.set("num_visits", 1).unwrap();
        data.logout();
        assert!(data.take_cycle_key());
        assert!(data.user_id.is_none());
        assert!(data.is_empty());
    }

    #[test]
    fn test_store_roundtrip_and_delete() {
        let store = SessionStore::new(Duration::hours(1));
        let id = SessionId::generate();
        let mut data = store.new_session();
        data.login(7);
        store.save(id.clone(), data);

        assert_eq!(store.load(&id).unwrap().user_id, Some(7));

        store.delete(&id);
        assert!(store.load(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_rejects_expired_sessions() {
        let store = SessionStore::new(Duration::hours(1));
        let id = SessionId::generate();
        store.save(id.clone(), SessionData::with_expiration(Duration::seconds(-1)));
        assert!(store.load(&id).is_none());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let store = SessionStore::new(Duration::hours(1));
        store.save(
            SessionId::generate(),
            SessionData::with_expiration(Duration::seconds(-1)),
        );
        store.save(SessionId::generate(), store.new_session());

        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_repeated_saves_keep_one_entry_per_session() {
        let store = SessionStore::new(Duration::hours(1));
        let id = SessionId::generate();
        store.save(id.clone(), store.new_session());

        for _ in 0..10_000 {
            let data = store.load(&id).unwrap();
            store.save(id.clone(), data);
        }

        assert_eq!(store.len(), 1);
        assert_eq!(store.inner.read().sessions.len(), 1);
    }
}
