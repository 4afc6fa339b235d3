//! Store trait abstractions
//!
//! [`DocumentStore`] hands out one [`StoreSession`] per inbound request. The
//! session is the only way to read documents, and it is closed exactly once
//! when the request's GraphQL execution is over.

use async_trait::async_trait;
use std::sync::Arc;
use unininja_core::{Pubukprn, UniversitySupplement};

use crate::error::DbResult;

/// Session shared between the pipeline and the GraphQL resolvers of one request
pub type SharedSession = Arc<dyn StoreSession>;

/// Factory for per-request store sessions
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Acquire a session for one request.
    ///
    /// Fails with a connection or pool error when the store is unreachable.
    async fn open_session(&self) -> DbResult<SharedSession>;
}

/// Per-request view of the document store
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Look up the supplement document for a university.
    ///
    /// Returns `Ok(None)` when no document matches; only connection and
    /// decoding failures are errors.
    async fn find_university_supplement(
        &self,
        pubukprn: &Pubukprn,
    ) -> DbResult<Option<UniversitySupplement>>;

    /// Exact-match membership test against the keys collection
    async fn find_api_key(&self, key: &str) -> DbResult<bool>;

    /// Release the underlying connection.
    ///
    /// Later queries on this session fail with `DbError::SessionClosed`.
    async fn close(&self);
}
