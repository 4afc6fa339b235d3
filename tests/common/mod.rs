//! Common test utilities and helpers
//!
//! Integration tests run the real gateway on a random port, with Unistats
//! faked by a wiremock server and the document store by an in-memory store
//! that records every call made through its sessions.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use unininja_api::{build_gateway, build_schema, GatewayState, MiddlewareConfig};
use unininja_core::{Pubukprn, UniversitySupplement};
use unininja_db::{
    DbError, DbResult, DocumentStore, MemoryDocumentStore, SharedSession, StoreSession,
};
use unininja_service::{ServiceRegistry, UnistatsClient, UnistatsConfig};
use wiremock::MockServer;

pub mod fixtures;

/// API key registered in every test store
pub const TEST_KEY: &str = "test-key";

/// One call observed on the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Opened,
    KeyLookup(String),
    SupplementLookup(String),
    Closed,
}

/// Shared, ordered log of store calls
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<StoreEvent>>>);

impl EventLog {
    fn push(&self, event: StoreEvent) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &StoreEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Document store wrapper that records sessions and queries
pub struct RecordingStore {
    inner: MemoryDocumentStore,
    log: EventLog,
    reachable: bool,
}

impl RecordingStore {
    pub fn new(inner: MemoryDocumentStore) -> Self {
        Self {
            inner,
            log: EventLog::default(),
            reachable: true,
        }
    }

    /// A store whose sessions cannot be opened
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(MemoryDocumentStore::new())
        }
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn open_session(&self) -> DbResult<SharedSession> {
        if !self.reachable {
            return Err(DbError::Connection(
                "connection refused (store.internal:5432)".to_string(),
            ));
        }

        let inner = self.inner.open_session().await?;
        self.log.push(StoreEvent::Opened);
        Ok(Arc::new(RecordingSession {
            inner,
            log: self.log.clone(),
        }))
    }
}

struct RecordingSession {
    inner: SharedSession,
    log: EventLog,
}

#[async_trait]
impl StoreSession for RecordingSession {
    async fn find_university_supplement(
        &self,
        pubukprn: &Pubukprn,
    ) -> DbResult<Option<UniversitySupplement>> {
        self.log
            .push(StoreEvent::SupplementLookup(pubukprn.to_string()));
        self.inner.find_university_supplement(pubukprn).await
    }

    async fn find_api_key(&self, key: &str) -> DbResult<bool> {
        self.log.push(StoreEvent::KeyLookup(key.to_string()));
        self.inner.find_api_key(key).await
    }

    async fn close(&self) {
        self.log.push(StoreEvent::Closed);
        self.inner.close().await;
    }
}

/// Store with the test key and the Sussex supplement document
pub fn seeded_store() -> RecordingStore {
    let inner = MemoryDocumentStore::new()
        .with_api_key(TEST_KEY)
        .with_supplement_documents(&fixtures::supplement_documents().to_string())
        .unwrap();
    RecordingStore::new(inner)
}

/// Test application
pub struct TestApp {
    pub address: String,
    pub store_log: EventLog,
    pub unistats: MockServer,
}

impl TestApp {
    /// Start a gateway over `store`, with an empty Unistats mock
    pub async fn spawn(store: RecordingStore) -> Self {
        let unistats = MockServer::start().await;
        let store_log = store.log();

        let config = UnistatsConfig::new(SecretString::new(fixtures::UNISTATS_AUTH.to_string()))
            .with_base_url(unistats.uri())
            .with_timeout(Duration::from_secs(2));
        let client = UnistatsClient::new(config).expect("Failed to create Unistats client");
        let schema = build_schema(Arc::new(ServiceRegistry::from_client(client)));

        let state = GatewayState::new(schema, Arc::new(store));
        let app = build_gateway(state, MiddlewareConfig::new().with_tracing(false));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to start test server");
        });

        Self {
            address: format!("http://{}", address),
            store_log,
            unistats,
        }
    }

    /// Start a gateway over the seeded store
    pub async fn seeded() -> Self {
        Self::spawn(seeded_store()).await
    }

    pub fn url(&self) -> &str {
        &self.address
    }

    /// HTTP client that does not follow redirects
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build client")
    }

    /// POST a GraphQL query to `/v0`, authenticated with `key` when given
    pub async fn graphql(&self, key: Option<&str>, query: &str) -> reqwest::Response {
        let mut request = self
            .client()
            .post(format!("{}/v0", self.url()))
            .json(&json!({ "query": query }));

        if let Some(key) = key {
            request = request.header("Authorization", basic(key));
        }

        request.send().await.expect("Failed to send request")
    }
}

/// Basic Authorization header value for an API key
pub fn basic(key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:", key)))
}

/// Parse JSON response
pub async fn parse_json(response: reqwest::Response) -> Value {
    response
        .json::<Value>()
        .await
        .expect("Failed to parse JSON response")
}

/// Assert response status
pub fn assert_status(response: &reqwest::Response, expected: reqwest::StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}
