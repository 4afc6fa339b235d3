//! API error handling
//!
//! Every error the gateway itself produces (as opposed to GraphQL field
//! errors) is rendered as `{"errors": [{"message": ...}]}` so that clients
//! can parse one envelope shape regardless of where a request failed.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

use crate::proxy::{ProxyError, ResponseSink};

/// Message returned with every 401
pub const UNAUTHORISED_MESSAGE: &str = "You must be authorised to use the UniNinja API.";

/// Message returned with every 503
pub const UNAVAILABLE_MESSAGE: &str =
    "An internal server error occurred whilst using the UniNinja API. Please try again later.";

/// API error type that can be converted to HTTP responses
#[derive(Debug)]
pub struct ApiError {
    status_code: StatusCode,
    message: String,
    challenge: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            challenge: None,
        }
    }

    /// Create a bad request error (400)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create an unauthorized error (401) with a Basic challenge for `realm`
    pub fn unauthorized(realm: &str) -> Self {
        Self {
            status_code: StatusCode::UNAUTHORIZED,
            message: UNAUTHORISED_MESSAGE.to_string(),
            challenge: Some(format!("Basic realm='{}'", realm)),
        }
    }

    /// Create a service unavailable error (503).
    ///
    /// `detail` is logged, the client only sees the generic message.
    pub fn service_unavailable(detail: impl fmt::Display) -> Self {
        error!(detail = %detail, "request failed with 503");
        Self::new(StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE)
    }

    /// Create an internal server error (500)
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn envelope(&self) -> ErrorResponse {
        ErrorResponse::single(self.message.clone())
    }

    /// Write this error into a response sink instead of returning it directly
    pub async fn write_into<S>(self, sink: &mut S) -> Result<(), ProxyError>
    where
        S: ResponseSink + ?Sized,
    {
        let body = serde_json::to_vec(&self.envelope()).unwrap_or_default();

        sink.set_status(self.status_code)?;
        sink.set_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )?;
        sink.write(Bytes::from(body)).await?;
        sink.end().await
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error envelope JSON structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorMessage>,
}

/// One entry of the error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorResponse {
    /// Envelope holding a single message
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![ErrorMessage {
                message: message.into(),
            }],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        let mut response = (self.status_code, Json(envelope)).into_response();

        if let Some(challenge) = self.challenge {
            match HeaderValue::from_str(&challenge) {
                Ok(value) => {
                    response
                        .headers_mut()
                        .insert(header::WWW_AUTHENTICATE, value);
                }
                Err(e) => error!(error = %e, "invalid authentication challenge"),
            }
        }

        response
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
