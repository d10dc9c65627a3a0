use axum::{
    extract::{Query, RawQuery, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde::Deserialize;

use super::middleware::Caller;
use super::page::EditorPage;
use super::EDITOR_PATH;
use crate::app::AppState;
use crate::auth::{AuthContext, Capability, TokenAction};
use crate::editor::EditorError;
use crate::models::*;

/// Query parameters consumed by the reset action.
const ACTION_PARAMS: &[&str] = &["edd-action", "token"];

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn require_admin(caller: &Caller) -> Result<(), (StatusCode, String)> {
    AuthContext::new(None, caller.0.clone())
        .require(Capability::ManageShopSettings)
        .map(|_| ())
        .map_err(|e| {
            tracing::warn!("Editor access denied: {}", e);
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        })
}

/// `path` with the reset action parameters removed from `query`.
pub fn clean_url(path: &str, query: Option<&str>) -> String {
    let kept: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !pair.is_empty() && !ACTION_PARAMS.contains(&key)
        })
        .collect();

    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, kept.join("&"))
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Editor
// ============================================================

#[derive(Debug, Deserialize)]
pub struct EditorQuery {
    #[serde(rename = "edd-action")]
    pub action: Option<String>,
    pub token: Option<String>,
}

pub async fn editor_page(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<EditorQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, (StatusCode, String)> {
    if query.action.as_deref() == Some(TokenAction::ResetRules.as_str()) {
        let auth = AuthContext::new(query.token, caller.0);
        match state.editor.reset(&auth) {
            // Rejected resets are silent; the redirect is the same either way
            Ok(()) | Err(EditorError::Auth(_)) => {}
            Err(e) => return Err(internal_error(e)),
        }
        let target = clean_url(EDITOR_PATH, raw_query.as_deref());
        return Ok(Redirect::to(&target).into_response());
    }

    require_admin(&caller)?;

    let content = state.editor.display_content().map_err(internal_error)?;
    let save_token = state.editor.issue_token(TokenAction::SaveRules);
    let reset_token = state.editor.issue_token(TokenAction::ResetRules);

    let page = EditorPage {
        content: &content,
        save_token: &save_token,
        reset_token: &reset_token,
        server_supported: state.server.is_apache(),
    };
    Ok(Html(page.render()).into_response())
}

pub async fn save_rules(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Form(form): Form<SaveRulesForm>,
) -> Result<Redirect, (StatusCode, String)> {
    if form.edd_action.as_deref() != Some(TokenAction::SaveRules.as_str()) {
        tracing::debug!("Ignoring editor post with action {:?}", form.edd_action);
        return Ok(Redirect::to(EDITOR_PATH));
    }

    let auth = AuthContext::new(form.edd_save_htaccess_nonce, caller.0);
    match state.editor.save(&form.htaccess_contents, &auth) {
        // Rejected saves are silent; nothing was written
        Ok(()) | Err(EditorError::Auth(_)) => Ok(Redirect::to(EDITOR_PATH)),
        Err(e) => Err(internal_error(e)),
    }
}

// ============================================================
// JSON API
// ============================================================

pub async fn get_override(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<OverrideResponse>, (StatusCode, String)> {
    require_admin(&caller)?;

    state
        .editor
        .current_override()
        .map(|content| Json(OverrideResponse { content }))
        .map_err(internal_error)
}

#[derive(Debug, Deserialize)]
pub struct RulesQuery {
    pub method: Option<String>,
}

pub async fn get_rules(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<RulesQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // The rules carry the override text, so they are as private as the override
    require_admin(&caller)?;

    let method = query
        .method
        .as_deref()
        .map(DownloadMethod::parse)
        .unwrap_or_else(|| state.method());

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.pipeline.rules(method),
    ))
}
