//! UniNinja API Layer
//!
//! This crate provides the HTTP surface of the UniNinja gateway using Axum:
//! a single GraphQL endpoint guarded by API-key authentication, plus a
//! redirect from the bare root to the public website.
//!
//! # Architecture
//!
//! - **Auth**: Basic-credential API keys checked against the document store
//! - **GraphQL**: the read-only schema and its resolvers
//! - **Proxy**: buffered responses replayed onto the real one
//! - **Handlers**: the per-request pipeline that ties the three together
//! - **Middleware**: request IDs, tracing and CORS
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use unininja_api::{build_gateway, build_schema, GatewayState, MiddlewareConfig};
//! use unininja_db::MemoryDocumentStore;
//! use unininja_service::ServiceRegistry;
//!
//! # fn example(services: ServiceRegistry) {
//! let schema = build_schema(Arc::new(services));
//! let store = MemoryDocumentStore::new().with_api_key("my-key");
//! let state = GatewayState::new(schema, Arc::new(store));
//!
//! let app = build_gateway(state, MiddlewareConfig::default());
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod graphql;
pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod routes;

// Re-export main types for convenience
pub use auth::{authorize, parse_basic_credential, ApiKey, AuthError};
pub use error::{ApiError, ApiResult, ErrorMessage, ErrorResponse};
pub use graphql::{build_schema, execute_into, GatewaySchema, Query as GraphQLQuery};
pub use handlers::{GatewaySettings, GatewayState, RequestContext};
pub use middleware::{CorsConfig, MiddlewareConfig, UuidRequestIdGenerator};
pub use proxy::{flush, BufferedResponse, LiveResponse, PendingResponse, ProxyError, ResponseSink};
pub use routes::build_router;

use axum::Router;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

/// Build the gateway router with its middleware stack
pub fn build_gateway(state: GatewayState, middleware_config: MiddlewareConfig) -> Router {
    let mut router = build_router(state).layer(middleware_config.cors.into_layer());

    if middleware_config.enable_tracing {
        router = router.layer(middleware::trace_layer());
    }

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestIdGenerator))
}
