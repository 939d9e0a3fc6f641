use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::ServerState};

/// Builds the application router over `state`.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let api = Router::new().route("/wallet", get(handlers::get_wallet)).with_state(state.clone());

    Router::new()
        .route("/", get(handlers::get_home))
        .route("/account", get(handlers::get_account))
        .route("/user-wallet", post(handlers::post_user_wallet))
        .nest("/api", api)
        .with_state(state)
}
