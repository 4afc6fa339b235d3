//! Document store access for the UniNinja gateway
//!
//! The gateway owns none of this data; it only reads it. Two collections
//! are consulted:
//!
//! - `keys`: API keys allowed to use the GraphQL endpoint
//! - `uni`: supplementary university fields keyed by `pubukprn`
//!
//! Access goes through a [`StoreSession`] opened at the start of each request
//! and closed once GraphQL execution has finished.
//!
//! # Example
//!
//! ```rust,no_run
//! use unininja_db::{create_pool, DocumentStore, PoolConfig, PostgresDocumentStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PoolConfig::new("postgres://localhost/uni").max_connections(10);
//! let pool = create_pool(&config).await?;
//! let store = PostgresDocumentStore::new(pool);
//!
//! let session = store.open_session().await?;
//! let allowed = session.find_api_key("my-key").await?;
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod store;

pub use error::{DbError, DbResult};
pub use memory::MemoryDocumentStore;
pub use pool::{close_pool, create_pool, run_migrations, PoolConfig};
pub use postgres::PostgresDocumentStore;
pub use store::{DocumentStore, SharedSession, StoreSession};
