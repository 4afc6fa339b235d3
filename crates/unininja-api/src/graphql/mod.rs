//! GraphQL API implementation
//!
//! The schema is read-only: four root queries over Unistats, with
//! universities enriched from the document store. Execution writes into a
//! [`ResponseSink`] rather than returning a response, so the pipeline can
//! close the request's store session before anything reaches the client.

pub mod query;
pub mod types;

use async_graphql::{
    http::GraphiQLSource, Context, EmptyMutation, EmptySubscription, ErrorExtensions, Schema,
};
use async_graphql_axum::{rejection::GraphQLRejection, GraphQLRequest};
use axum::{
    extract::{FromRequest, Request},
    http::{
        header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};
use unininja_db::SharedSession;
use unininja_service::{ServiceError, ServiceRegistry};

use crate::error::ApiError;
use crate::proxy::{ProxyError, ResponseSink};

pub use query::Query;
pub use types::{GqlCourse, GqlUniversity};

/// GraphQL schema type
pub type GatewaySchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Build the GraphQL schema
pub fn build_schema(services: Arc<ServiceRegistry>) -> GatewaySchema {
    Schema::build(Query, EmptyMutation, EmptySubscription)
        .data(services)
        .finish()
}

pub(crate) fn services<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a ServiceRegistry> {
    ctx.data::<Arc<ServiceRegistry>>().map(|s| s.as_ref())
}

pub(crate) fn session<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a SharedSession> {
    ctx.data::<SharedSession>()
}

/// Turn a service failure into a field error carrying a stable `code` extension
pub(crate) fn to_field_error(err: ServiceError) -> async_graphql::Error {
    let code = err.code();
    warn!(error = %err, code, "field resolution failed");
    async_graphql::Error::new(err.public_message()).extend_with(|_, e| e.set("code", code))
}

/// Whether a request is a browser asking for the interactive explorer
fn wants_graphiql(request: &Request) -> bool {
    if request.method() != Method::GET {
        return false;
    }

    let has_query = request
        .uri()
        .query()
        .is_some_and(|q| q.split('&').any(|pair| pair.starts_with("query=")));

    let accepts_html = request
        .headers()
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));

    !has_query && accepts_html
}

/// GraphiQL page for `endpoint`
pub fn graphiql_page(endpoint: &str) -> String {
    GraphiQLSource::build()
        .endpoint(endpoint)
        .title("UniNinja API")
        .finish()
}

/// Execute one HTTP GraphQL request and write the full response into `sink`.
///
/// `session` is made available to resolvers for the duration of the call.
/// When `graphiql_endpoint` is set, browser GETs without a query receive the
/// explorer page instead.
pub async fn execute_into<S>(
    schema: &GatewaySchema,
    session: SharedSession,
    request: Request,
    graphiql_endpoint: Option<&str>,
    sink: &mut S,
) -> Result<(), ProxyError>
where
    S: ResponseSink + ?Sized,
{
    if let Some(endpoint) = graphiql_endpoint {
        if wants_graphiql(&request) {
            sink.set_header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            )?;
            sink.write(Bytes::from(graphiql_page(endpoint))).await?;
            return sink.end().await;
        }
    }

    let graphql_request =
        match GraphQLRequest::<GraphQLRejection>::from_request(request, &()).await {
            Ok(req) => req.into_inner(),
            Err(rejection) => {
                debug!(error = %rejection.0, "unparseable GraphQL request");
                return ApiError::bad_request(rejection.0.to_string())
                    .write_into(sink)
                    .await;
            }
        };

    let response = schema.execute(graphql_request.data(session)).await;

    if response.is_err() {
        debug!(errors = response.errors.len(), "GraphQL response carries errors");
    }

    let body = match serde_json::to_vec(&response) {
        Ok(body) => body,
        Err(e) => {
            return ApiError::internal_server_error(format!("Failed to encode response: {}", e))
                .write_into(sink)
                .await;
        }
    };

    sink.set_status(StatusCode::OK)?;
    sink.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))?;
    if let Some(value) = response
        .cache_control
        .value()
        .and_then(|v| HeaderValue::from_str(&v).ok())
    {
        sink.set_header(CACHE_CONTROL, value)?;
    }
    sink.write(Bytes::from(body)).await?;
    sink.end().await
}
