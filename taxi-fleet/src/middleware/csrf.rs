//! CSRF protection for state-changing requests
//!
//! Each session carries one random token ([`SessionData::csrf_token`]) that
//! every rendered form embeds as a hidden `_csrf_token` field. POST, PUT,
//! PATCH and DELETE requests must send it back, either in that form field or
//! in the `X-CSRF-Token` header (set on `<body>` for HTMX requests). Anything
//! else is refused with 403 before it reaches a handler.
//!
//! The layer must run inside [`SessionLayer`](super::SessionLayer), which
//! puts the session into the request extensions.

use crate::auth::SessionData;
use crate::error::TaxiError;
use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use std::sync::Arc;
use std::task::{Context, Poll};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};

/// CSRF token header name
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// CSRF token form field name
pub const CSRF_FORM_FIELD: &str = "_csrf_token";

/// New random token: 32 bytes, base64url without padding
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Constant-time token comparison
#[must_use]
pub fn tokens_match(expected: &str, submitted: &str) -> bool {
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}

/// CSRF configuration for middleware
#[derive(Clone, Debug)]
pub struct CsrfConfig {
    /// Header name for the token
    pub header_name: String,
    /// Form field name for the token
    pub form_field: String,
    /// Largest form body buffered while looking for the token
    pub max_body_bytes: usize,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            header_name: CSRF_HEADER_NAME.to_string(),
            form_field: CSRF_FORM_FIELD.to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Layer for CSRF middleware
#[derive(Clone, Debug, Default)]
pub struct CsrfLayer {
    config: CsrfConfig,
}

impl CsrfLayer {
    /// Layer buffering at most `max_body_bytes` of form data
    #[must_use]
    pub fn new(max_body_bytes: usize) -> Self {
        Self {
            config: CsrfConfig {
                max_body_bytes,
                ..CsrfConfig::default()
            },
        }
    }
}

impl<S> Layer<S> for CsrfLayer {
    type Service = CsrfMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CsrfMiddleware {
            inner,
            config: Arc::new(self.config.clone()),
        }
    }
}

/// Middleware that validates tokens on state-changing requests
#[derive(Clone, Debug)]
pub struct CsrfMiddleware<S> {
    inner: S,
    config: Arc<CsrfConfig>,
}

impl<S> Service<Request> for CsrfMiddleware<S>
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

    fn call(&mut self, req: Request) -> Self::Future {
        let config = self.config.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            if is_method_safe(req.method()) {
                return inner.call(req).await;
            }

            let path = req.uri().path().to_string();
            let expected = req
                .extensions()
                .get::<SessionData>()
                .and_then(|session| session.csrf_token.clone());

            let Some(expected) = expected else {
                tracing::warn!(%path, "CSRF token missing from session");
                return Ok(csrf_rejection());
            };

            let (req, submitted) = match submitted_token(req, &config).await {
                Ok(found) => found,
                Err(response) => return Ok(response),
            };

            if submitted.is_some_and(|token| tokens_match(&expected, &token)) {
                inner.call(req).await
            } else {
                tracing::warn!(%path, "CSRF token missing or incorrect");
                Ok(csrf_rejection())
            }
        })
    }
}

/// Check if HTTP method is considered safe (doesn't modify state)
const fn is_method_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Token from the header, or from an urlencoded body
///
/// The body is buffered and put back so the handler can still read it.
async fn submitted_token(
    req: Request,
    config: &CsrfConfig,
) -> Result<(Request, Option<String>), Response> {
    let from_header = req
        .headers()
        .get(config.header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    if from_header.is_some() {
        return Ok((req, from_header));
    }

    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return Ok((req, None));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, config.max_body_bytes)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE.into_response())?;

    let token = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
        .ok()
        .and_then(|pairs| {
            pairs
                .into_iter()
                .find(|(key, _)| *key == config.form_field)
                .map(|(_, value)| value)
        });

    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

fn csrf_rejection() -> Response {
    TaxiError::Forbidden("CSRF verification failed. Request aborted.".into()).into_response()
}
