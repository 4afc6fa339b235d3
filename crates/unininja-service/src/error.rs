//! Service-layer error types
//!
//! Resolvers receive these instead of silently empty results so that a
//! failing upstream call shows up in the GraphQL `errors` array for the
//! affected field only.

use thiserror::Error;
use unininja_core::DomainError;
use unininja_db::DbError;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Service-layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Unistats could not be reached, answered with an error status, or sent something other than JSON
    #[error("Unistats request to {endpoint} failed: {reason}")]
    UpstreamUnavailable { endpoint: String, reason: String },

    /// The document store failed while resolving a field
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    /// A query argument was missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An upstream record lacked a field the gateway cannot do without
    #[error("Incomplete upstream record: {0}")]
    Incomplete(String),
}

impl ServiceError {
    /// Build an upstream failure for an endpoint
    pub fn upstream(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        ServiceError::UpstreamUnavailable {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable, client-safe code for this error
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            ServiceError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ServiceError::InvalidArgument(_) => "BAD_USER_INPUT",
            ServiceError::Incomplete(_) => "RESOLUTION_INCOMPLETE",
        }
    }

    /// Message safe to show to API clients; carries no hosts or internal detail
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::UpstreamUnavailable { .. } => {
                "The Unistats API is currently unavailable. Please try again later.".to_string()
            }
            ServiceError::StoreUnavailable(_) => {
                "The UniNinja database is currently unavailable. Please try again later."
                    .to_string()
            }
            ServiceError::InvalidArgument(msg) => msg.clone(),
            ServiceError::Incomplete(_) => {
                "Unistats returned an incomplete record for this request.".to_string()
            }
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        ServiceError::StoreUnavailable(err.to_string())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidIdentifier(_) => ServiceError::InvalidArgument(err.to_string()),
            DomainError::MissingField { .. } => ServiceError::Incomplete(err.to_string()),
        }
    }
}
