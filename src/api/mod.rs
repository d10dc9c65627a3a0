mod handlers;
mod middleware;
pub mod page;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub use handlers::clean_url;
pub use middleware::{Caller, SecurityConfig};

/// Path of the editor page; also the target of its form and reset link.
pub const EDITOR_PATH: &str = "/tools/htaccess";

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/override", get(handlers::get_override))
        .route("/rules", get(handlers::get_rules))
        .route("/health", get(handlers::health));

    Router::new()
        .route(
            EDITOR_PATH,
            get(handlers::editor_page).post(handlers::save_rules),
        )
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn_with_state(
                    state.security.clone(),
                    middleware::resolve_caller,
                )),
        )
        .with_state(state)
}
