//! Service layer for the UniNinja gateway
//!
//! This crate sits between the GraphQL API and the two data sources:
//!
//! - **UnistatsClient**: authenticated reads from the Unistats KIS API
//! - **CatalogueService**: merges Unistats records with store supplements
//!
//! # Example
//!
//! ```rust,no_run
//! use secrecy::SecretString;
//! use unininja_service::{ServiceRegistry, UnistatsClient, UnistatsConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UnistatsConfig::new(SecretString::new("dXNlcjpwYXNz".to_string()));
//! let services = ServiceRegistry::from_client(UnistatsClient::new(config)?);
//! # Ok(())
//! # }
//! ```

pub mod catalogue;
pub mod error;
pub mod unistats;

pub use catalogue::CatalogueService;
pub use error::{ServiceError, ServiceResult};
pub use unistats::{UnistatsApi, UnistatsClient, UnistatsConfig};

use std::sync::Arc;

/// Services shared by every request
#[derive(Clone)]
pub struct ServiceRegistry {
    catalogue: CatalogueService,
}

impl ServiceRegistry {
    /// Create the registry over any Unistats implementation
    pub fn new(unistats: Arc<dyn UnistatsApi>) -> Self {
        Self {
            catalogue: CatalogueService::new(unistats),
        }
    }

    /// Create the registry over the HTTP client
    pub fn from_client(client: UnistatsClient) -> Self {
        Self::new(Arc::new(client))
    }

    /// Get the catalogue service
    pub fn catalogue(&self) -> &CatalogueService {
        &self.catalogue
    }
}
