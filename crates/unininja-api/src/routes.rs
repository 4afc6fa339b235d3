//! API route definitions

use axum::{
    routing::{any, get},
    Router,
};

use crate::handlers::{redirect_home, serve_graphql, GatewayState};

/// Build the gateway router.
///
/// Every method and sub-path under `/v0` reaches the GraphQL pipeline;
/// method and body handling is left to the GraphQL stage.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(redirect_home))
        .route("/v0", any(serve_graphql))
        .route("/v0/", any(serve_graphql))
        .route("/v0/{*rest}", any(serve_graphql))
        .with_state(state)
}
