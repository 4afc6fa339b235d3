//! API key authentication
//!
//! Clients authenticate with HTTP Basic credentials whose username is a
//! UniNinja API key; the password part is ignored. Keys are checked against
//! the store's keys collection through the request's own session.

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};
use unininja_db::{DbError, StoreSession};

use crate::error::ApiError;

/// An API key taken from a Basic credential
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Reasons a request is not allowed through
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no Authorization header")]
    MissingCredential,

    #[error("Authorization header is not a usable Basic credential")]
    MalformedCredential,

    #[error("API key is not registered")]
    UnknownKey,

    #[error("API key lookup failed: {0}")]
    Store(#[from] DbError),
}

impl AuthError {
    /// Whether the client is at fault, as opposed to the store
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AuthError::Store(_))
    }

    /// Convert into the HTTP error sent to the client
    pub fn into_api_error(self, realm: &str) -> ApiError {
        match self {
            AuthError::Store(e) => ApiError::service_unavailable(e),
            _ => ApiError::unauthorized(realm),
        }
    }
}

/// Extract the API key from a `Basic` Authorization header value.
///
/// The scheme is matched case-insensitively. The decoded credential is cut
/// at its first `:`; a credential without one is taken whole.
pub fn parse_basic_credential(value: &HeaderValue) -> Result<ApiKey, AuthError> {
    let value = value.to_str().map_err(|_| AuthError::MalformedCredential)?;

    let (scheme, encoded) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedCredential)?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::MalformedCredential);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::MalformedCredential)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredential)?;

    let key = decoded
        .split_once(':')
        .map(|(user, _)| user)
        .unwrap_or(&decoded);

    if key.is_empty() {
        return Err(AuthError::MalformedCredential);
    }

    Ok(ApiKey(key.to_string()))
}

/// Authorise a request against the keys collection
pub async fn authorize(session: &dyn StoreSession, headers: &HeaderMap) -> Result<ApiKey, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;

    let key = parse_basic_credential(header)?;

    if !session.find_api_key(key.as_str()).await? {
        warn!("request rejected: unknown API key");
        return Err(AuthError::UnknownKey);
    }

    debug!("request authorised");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use unininja_db::{DocumentStore, MemoryDocumentStore};

    fn basic(credential: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(credential))).unwrap()
    }

    fn headers_with(value: HeaderValue) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        headers
    }

    #[test]
    fn test_parse_ignores_password() {
        let key = parse_basic_credential(&basic("abc123:whatever")).unwrap();
        assert_eq!(key.as_str(), "abc123");
    }

    #[test]
    fn test_parse_without_colon_takes_whole_credential() {
        let key = parse_basic_credential(&basic("abc123")).unwrap();
        assert_eq!(key.as_str(), "abc123");
    }

    #[test]
    fn test_parse_splits_on_first_colon_only() {
        let key = parse_basic_credential(&basic("abc:def:ghi")).unwrap();
        assert_eq!(key.as_str(), "abc");
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        let bearer = HeaderValue::from_static("Bearer abc123");
        assert!(matches!(
            parse_basic_credential(&bearer),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        let value = HeaderValue::from_static("Basic !!!not-base64!!!");
        assert!(matches!(
            parse_basic_credential(&value),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn test_parse_rejects_empty_key() {
        assert!(matches!(
            parse_basic_credential(&basic(":secret")),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = parse_basic_credential(&basic("abc123:x")).unwrap();
        assert!(!format!("{:?}", key).contains("abc123"));
    }

    #[tokio::test]
    async fn test_authorize_known_key() {
        let store = MemoryDocumentStore::new().with_api_key("abc123");
        let session = store.open_session().await.unwrap();

        let key = authorize(session.as_ref(), &headers_with(basic("abc123:")))
            .await
            .unwrap();
        assert_eq!(key.as_str(), "abc123");
    }

    #[tokio::test]
    async fn test_authorize_unknown_key() {
        let store = MemoryDocumentStore::new().with_api_key("abc123");
        let session = store.open_session().await.unwrap();

        let err = authorize(session.as_ref(), &headers_with(basic("nope:")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownKey));
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_authorize_missing_header() {
        let store = MemoryDocumentStore::new().with_api_key("abc123");
        let session = store.open_session().await.unwrap();

        let err = authorize(session.as_ref(), &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let store = MemoryDocumentStore::new().with_api_key("abc123");
        let session = store.open_session().await.unwrap();
        session.close().await;

        let err = authorize(session.as_ref(), &headers_with(basic("abc123:")))
            .await
            .unwrap_err();
        assert!(!err.is_rejection());
        assert_eq!(
            err.into_api_error("UniNinja API").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
