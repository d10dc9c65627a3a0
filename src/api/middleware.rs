//! Caller resolution for the editor and API routes.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::auth::Principal;
use crate::config::EditorConfig;

/// Name given to the caller when no API key is configured.
const LOCAL_ADMIN: &str = "local-admin";

#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// Bearer key identifying the administrator. `None` runs in local mode,
    /// where every caller is the administrator.
    pub api_key: Option<String>,
}

impl SecurityConfig {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
        }
    }

    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }
}

/// The resolved caller of a request, inserted as a request extension.
#[derive(Clone, Debug, Default)]
pub struct Caller(pub Option<Principal>);

/// Resolve the caller from the `Authorization` header.
///
/// Requests are never rejected here; handlers decide what an anonymous
/// caller may do.
pub async fn resolve_caller(
    State(config): State<SecurityConfig>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let caller = match &config.api_key {
        None => Caller(Some(Principal::administrator(LOCAL_ADMIN))),
        Some(expected) => {
            let auth_header = request
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok());

            match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
                Some(token) if token == expected.as_str() => {
                    Caller(Some(Principal::administrator("api-key")))
                }
                Some(_) => {
                    tracing::warn!("Invalid API key provided");
                    Caller(None)
                }
                None => Caller(None),
            }
        }
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}
