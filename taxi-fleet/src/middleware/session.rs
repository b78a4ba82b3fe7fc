//! Session middleware for automatic session management
//!
//! Extracts the session cookie, loads the session from the [`SessionStore`],
//! places it in the request extensions and persists whatever the handler
//! hands back through the response extensions.
//!
//! A request without a session only gets a cookie (and a store entry) once
//! something was put into its session. After a login or logout the data
//! moves to a new id and the old id is deleted.

use crate::auth::session::{SessionData, SessionId, SessionStore};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::Request,
    http::header::{COOKIE, SET_COOKIE},
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Session cookie name
pub const SESSION_COOKIE_NAME: &str = "taxi_session";

/// Session configuration for middleware
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Cookie name for session ID
    pub cookie_name: String,
    /// Cookie path
    pub cookie_path: String,
    /// HTTP-only cookie
    pub http_only: bool,
    /// Secure cookie (HTTPS only)
    pub secure: bool,
    /// SameSite policy
    pub same_site: SameSite,
    /// Session TTL in seconds
    pub max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            cookie_path: "/".to_string(),
            http_only: true,
            secure: !cfg!(debug_assertions),
            same_site: SameSite::Lax,
            max_age_secs: 1_209_600,
        }
    }
}

impl SessionConfig {
    /// Derive cookie settings from the application's security settings
    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        let security = &state.config().security;
        Self {
            secure: security.secure_cookies,
            same_site: security.same_site,
            max_age_secs: security.session_max_age_secs,
            ..Self::default()
        }
    }
}

/// SameSite cookie policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Strict same-site policy
    Strict,
    /// Lax same-site policy
    #[default]
    Lax,
    /// No same-site restriction (requires Secure)
    None,
}

impl SameSite {
    /// Convert to cookie attribute string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Layer for session middleware
#[derive(Clone, Debug)]
pub struct SessionLayer {
    config: SessionConfig,
    store: SessionStore,
}

impl SessionLayer {
    /// Create session layer with settings and store taken from state
    #[must_use]
    pub fn new(state: &AppState) -> Self {
        Self {
            config: SessionConfig::from_state(state),
            store: state.sessions().clone(),
        }
    }

    /// Create session layer with custom configuration
    #[must_use]
    pub const fn with_config(store: SessionStore, config: SessionConfig) -> Self {
        Self { config, store }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            config: Arc::new(self.config.clone()),
            store: self.store.clone(),
        }
    }
}

/// Session middleware that handles cookie-based sessions
#[derive(Clone, Debug)]
pub struct SessionMiddleware<S> {
    inner: S,
    config: Arc<SessionConfig>,
    store: SessionStore,
}

impl<S> Service<Request> for SessionMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let config = self.config.clone();
        let store = self.store.clone();
        // Take the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let existing = extract_session_id(&req, &config.cookie_name)
                .and_then(|id| store.load(&id).map(|data| (id, data)));

            let (session_id, session_data) = match existing {
                Some((id, data)) => (Some(id), data),
                None => (None, store.new_session()),
            };

            req.extensions_mut().insert(session_data.clone());

            let mut response = inner.call(req).await?;

            // Handlers hand modified session data back through the response
            let mut final_session_data = response
                .extensions_mut()
                .remove::<SessionData>()
                .unwrap_or(session_data);

            match session_id {
                Some(old_id) if final_session_data.take_cycle_key() => {
                    store.delete(&old_id);
                    let new_id = SessionId::generate();
                    store.save(new_id.clone(), final_session_data);
                    set_session_cookie(&mut response, &new_id, &config);
                }
                Some(id) => store.save(id, final_session_data),
                None if final_session_data.take_cycle_key() || !final_session_data.is_empty() => {
                    let new_id = SessionId::generate();
                    store.save(new_id.clone(), final_session_data);
                    set_session_cookie(&mut response, &new_id, &config);
                }
                None => {}
            }

            Ok(response)
        })
    }
}

/// Extract session ID from request cookies
fn extract_session_id(req: &Request, cookie_name: &str) -> Option<SessionId> {
    let cookie_str = req.headers().get(COOKIE)?.to_str().ok()?;

    cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| name.trim() == cookie_name)
        .and_then(|(_, value)| SessionId::from_str(value.trim()).ok())
}

/// Build the `Set-Cookie` value for a session
#[must_use]
pub fn session_cookie(session_id: &SessionId, config: &SessionConfig) -> String {
    let mut cookie_value = format!(
        "{}={}; Path={}; Max-Age={}; SameSite={}",
        config.cookie_name,
        session_id.as_str(),
        config.cookie_path,
        config.max_age_secs,
        config.same_site.as_str()
    );

    if config.http_only {
        cookie_value.push_str("; HttpOnly");
    }

    if config.secure {
        cookie_value.push_str("; Secure");
    }

    cookie_value
}

fn set_session_cookie(response: &mut Response<Body>, session_id: &SessionId, config: &SessionConfig) {
    if let Ok(header_value) = session_cookie(session_id, config).parse() {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
}
