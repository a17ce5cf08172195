//! Service wiring.
//!
//! [`Services::assemble`] builds every service from an explicit store handle
//! and fetcher configuration. The [`ServiceRegistry`] is a read-only name
//! lookup over those same instances for callers that only know a name.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use stock_common::{RegistryError, Result};
use stock_store::{CategoryService, DocumentStore, SessionService};

use crate::fetcher::{FetcherConfig, QuoteFetcher};

/// Registry name of the [`SessionService`].
pub const SESSION_SERVICE: &str = "sessionService";
/// Registry name of the [`CategoryService`].
pub const CATEGORY_SERVICE: &str = "categoryService";
/// Registry name of the [`QuoteFetcher`].
pub const QUOTE_SERVICE: &str = "quoteService";

type Entry = Arc<dyn Any + Send + Sync>;

/// Collects services before freezing them into a [`ServiceRegistry`].
#[derive(Default)]
pub struct ServiceRegistryBuilder {
    services: HashMap<String, Entry>,
}

impl ServiceRegistryBuilder {
    /// Registers `service` under `name`, replacing any earlier entry.
    pub fn register<T: Any + Send + Sync>(mut self, name: &str, service: Arc<T>) -> Self {
        debug!("Registering {} as {}", type_name::<T>(), name);
        self.services.insert(name.to_string(), service);
        self
    }

    /// Freezes the registry.
    pub fn build(self) -> ServiceRegistry {
        ServiceRegistry {
            services: self.services,
        }
    }
}

/// Read-only name-to-service lookup table.
pub struct ServiceRegistry {
    services: HashMap<String, Entry>,
}

impl ServiceRegistry {
    /// Starts an empty builder.
    pub fn builder() -> ServiceRegistryBuilder {
        ServiceRegistryBuilder::default()
    }

    /// Resolves `name` as a `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        let entry = self
            .services
            .get(name)
            .ok_or_else(|| RegistryError::ServiceNotFound(name.to_string()))?;
        Arc::clone(entry)
            .downcast::<T>()
            .map_err(|_| RegistryError::ServiceTypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Every service of the application, wired by hand.
pub struct Services {
    /// Session-audit service.
    pub sessions: Arc<SessionService>,
    /// Category service.
    pub categories: Arc<CategoryService>,
    /// Quote fetcher.
    pub quotes: Arc<QuoteFetcher>,
}

impl Services {
    /// Builds all services over `store` and a fetcher for `fetcher_config`.
    pub fn assemble(store: Arc<dyn DocumentStore>, fetcher_config: FetcherConfig) -> Result<Self> {
        Ok(Self {
            sessions: Arc::new(SessionService::new(Arc::clone(&store))?),
            categories: Arc::new(CategoryService::new(store)?),
            quotes: Arc::new(QuoteFetcher::new(fetcher_config)?),
        })
    }

    /// Lookup table over the assembled instances.
    pub fn registry(&self) -> ServiceRegistry {
        ServiceRegistry::builder()
            .register(SESSION_SERVICE, Arc::clone(&self.sessions))
            .register(CATEGORY_SERVICE, Arc::clone(&self.categories))
            .register(QUOTE_SERVICE, Arc::clone(&self.quotes))
            .build()
    }
}
