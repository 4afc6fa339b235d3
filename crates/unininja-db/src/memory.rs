//! In-memory document store
//!
//! Used for local development without a database and as the store behind the
//! gateway's tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use unininja_core::{Pubukprn, UniversitySupplement};

use crate::error::{DbError, DbResult};
use crate::store::{DocumentStore, SharedSession, StoreSession};

/// Immutable in-memory collections
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    supplements: Arc<HashMap<Pubukprn, UniversitySupplement>>,
    keys: Arc<HashSet<String>>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.keys).insert(key.into());
        self
    }

    /// Add a supplement document for a university
    pub fn with_supplement(mut self, pubukprn: Pubukprn, supplement: UniversitySupplement) -> Self {
        Arc::make_mut(&mut self.supplements).insert(pubukprn, supplement);
        self
    }

    /// Load supplement documents from a JSON array.
    ///
    /// Each element must carry a `pubukprn`; the remaining fields form the
    /// supplement, in the same layout as the `uni` collection.
    pub fn with_supplement_documents(mut self, documents: &str) -> DbResult<Self> {
        #[derive(serde::Deserialize)]
        struct Document {
            pubukprn: Pubukprn,
            #[serde(flatten)]
            supplement: UniversitySupplement,
        }

        let documents: Vec<Document> = serde_json::from_str(documents)?;
        let supplements = Arc::make_mut(&mut self.supplements);
        for document in documents {
            supplements.insert(document.pubukprn, document.supplement);
        }
        Ok(self)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn open_session(&self) -> DbResult<SharedSession> {
        Ok(Arc::new(MemorySession {
            store: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// Session over a [`MemoryDocumentStore`]
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryDocumentStore,
    closed: AtomicBool,
}

impl MemorySession {
    fn ensure_open(&self) -> DbResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(DbError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn find_university_supplement(
        &self,
        pubukprn: &Pubukprn,
    ) -> DbResult<Option<UniversitySupplement>> {
        self.ensure_open()?;
        Ok(self.store.supplements.get(pubukprn).cloned())
    }

    async fn find_api_key(&self, key: &str) -> DbResult<bool> {
        self.ensure_open()?;
        Ok(self.store.keys.contains(key))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
