//! Request handlers
//!
//! `/v0` requests go through a fixed sequence: open a store session,
//! authorise the API key, execute GraphQL into a buffer, close the session,
//! then replay the buffer to the client. The session is closed exactly once
//! on every path past the first step.

use axum::{
    extract::{Request, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use unininja_db::{DocumentStore, SharedSession};

use crate::{
    auth::authorize,
    error::{ApiError, ApiResult},
    graphql::{execute_into, GatewaySchema},
    proxy::{flush, BufferedResponse},
};

/// Gateway settings that are fixed at startup
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Target of `GET /`
    pub redirect_url: String,

    /// Realm advertised in Basic challenges
    pub realm: String,

    /// Serve GraphiQL to browsers on the GraphQL endpoint
    pub graphiql: bool,

    /// Path the GraphQL endpoint is mounted on
    pub endpoint: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            redirect_url: "https://uni.ninja".to_string(),
            realm: "UniNinja API".to_string(),
            graphiql: true,
            endpoint: "/v0".to_string(),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct GatewayState {
    pub schema: GatewaySchema,
    pub store: Arc<dyn DocumentStore>,
    pub settings: Arc<GatewaySettings>,
}

impl GatewayState {
    /// Create new application state
    pub fn new(schema: GatewaySchema, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            schema,
            store,
            settings: Arc::new(GatewaySettings::default()),
        }
    }

    /// Replace the default settings
    pub fn with_settings(mut self, settings: GatewaySettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }
}

/// Store session owned by one request.
///
/// A context dropped without [`RequestContext::close`] (the client went away
/// mid-request) closes its session from a background task.
pub struct RequestContext {
    session: SharedSession,
    closed: bool,
}

impl RequestContext {
    /// Open the request's store session.
    ///
    /// Failure to reach the store becomes a 503.
    pub async fn open(store: &dyn DocumentStore) -> ApiResult<Self> {
        let session = store
            .open_session()
            .await
            .map_err(ApiError::service_unavailable)?;

        Ok(Self {
            session,
            closed: false,
        })
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Close the session; consuming the context makes a second close impossible
    pub async fn close(mut self) {
        self.closed = true;
        self.session.close().await;
        debug!("store session released");
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        warn!("request abandoned before its store session was closed");
        let session = self.session.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    session.close().await;
                    debug!("abandoned store session released");
                });
            }
            Err(_) => error!("no runtime to close an abandoned store session on"),
        }
    }
}

/// Serve the GraphQL endpoint
pub async fn serve_graphql(State(state): State<GatewayState>, request: Request) -> Response {
    let span = info_span!(
        "graphql",
        method = %request.method(),
        path = %request.uri().path(),
    );

    handle_graphql(state, request).instrument(span).await
}

async fn handle_graphql(state: GatewayState, request: Request) -> Response {
    let context = match RequestContext::open(state.store.as_ref()).await {
        Ok(context) => context,
        Err(e) => return e.into_response(),
    };

    if let Err(e) = authorize(context.session().as_ref(), request.headers()).await {
        if e.is_rejection() {
            info!(reason = %e, "request rejected");
        }
        context.close().await;
        return e.into_api_error(&state.settings.realm).into_response();
    }

    let graphiql = state
        .settings
        .graphiql
        .then_some(state.settings.endpoint.as_str());

    let mut buffer = BufferedResponse::new();
    let executed = execute_into(
        &state.schema,
        context.session().clone(),
        request,
        graphiql,
        &mut buffer,
    )
    .await;

    context.close().await;

    match executed {
        Ok(()) => flush(buffer).await,
        Err(e) => {
            error!(error = %e, "GraphQL stage failed to write its response");
            ApiError::internal_server_error("Failed to produce a response").into_response()
        }
    }
}

/// Redirect the bare root to the public website
pub async fn redirect_home(State(state): State<GatewayState>) -> Response {
    (
        StatusCode::FOUND,
        [(LOCATION, state.settings.redirect_url.clone())],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use unininja_db::{DbError, DbResult, MemoryDocumentStore};

    struct UnreachableStore;

    #[async_trait]
    impl DocumentStore for UnreachableStore {
        async fn open_session(&self) -> DbResult<SharedSession> {
            Err(DbError::Connection("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_context_open_failure_is_unavailable() {
        let err = RequestContext::open(&UnreachableStore).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_context_close_releases_session() {
        let store = MemoryDocumentStore::new().with_api_key("k");
        let context = RequestContext::open(&store).await.unwrap();
        let session = context.session().clone();

        context.close().await;

        assert!(matches!(
            session.find_api_key("k").await,
            Err(DbError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn test_dropped_context_closes_session() {
        let store = MemoryDocumentStore::new().with_api_key("k");
        let context = RequestContext::open(&store).await.unwrap();
        let session = context.session().clone();

        drop(context);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(matches!(
            session.find_api_key("k").await,
            Err(DbError::SessionClosed)
        ));
    }

    #[test]
    fn test_default_settings() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.redirect_url, "https://uni.ninja");
        assert_eq!(settings.realm, "UniNinja API");
        assert_eq!(settings.endpoint, "/v0");
        assert!(settings.graphiql);
    }
}
