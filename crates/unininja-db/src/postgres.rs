//! PostgreSQL implementation of the document store
//!
//! Supplements are stored as JSONB documents in the `uni` table so that the
//! store keeps the free-form shape of the original document collection.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use unininja_core::{Pubukprn, UniversitySupplement};

use crate::error::{DbError, DbResult};
use crate::store::{DocumentStore, SharedSession, StoreSession};

/// PostgreSQL-backed document store
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Create a new store over a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn open_session(&self) -> DbResult<SharedSession> {
        let conn = self.pool.acquire().await?;

        debug!("store session opened");
        Ok(Arc::new(PostgresSession {
            conn: Mutex::new(Some(conn)),
        }))
    }
}

/// One pooled connection, held for the lifetime of a request
#[derive(Debug)]
pub struct PostgresSession {
    conn: Mutex<Option<PoolConnection<Postgres>>>,
}

#[async_trait]
impl StoreSession for PostgresSession {
    #[instrument(skip_all, fields(pubukprn = %pubukprn))]
    async fn find_university_supplement(
        &self,
        pubukprn: &Pubukprn,
    ) -> DbResult<Option<UniversitySupplement>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DbError::SessionClosed)?;

        let document = sqlx::query_scalar::<_, Json<UniversitySupplement>>(
            r#"
            SELECT document
            FROM uni
            WHERE pubukprn = $1
            LIMIT 1
            "#,
        )
        .bind(pubukprn.as_str())
        .fetch_optional(&mut **conn)
        .await?;

        debug!(found = document.is_some(), "supplement lookup finished");
        Ok(document.map(|Json(doc)| doc))
    }

    #[instrument(skip(self, key))]
    async fn find_api_key(&self, key: &str) -> DbResult<bool> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(DbError::SessionClosed)?;

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM keys WHERE key = $1)
            "#,
        )
        .bind(key)
        .fetch_one(&mut **conn)
        .await?;

        Ok(exists)
    }

    async fn close(&self) {
        // Dropping the pooled connection hands it back to the pool.
        if self.conn.lock().await.take().is_some() {
            debug!("store session closed");
        }
    }
}
