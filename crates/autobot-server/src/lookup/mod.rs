//! Remote vehicle lookup
//!
//! When a vehicle is not in the store, the API can ask an external service
//! for it. Services register with a [`LookupRegistry`] and are picked by the
//! registration country they support.

pub mod nrplade;

use crate::config::AppConfig;
use crate::error::LookupError;
use async_trait::async_trait;
use autobot_common::vehicle::{RegCountry, Vehicle};
use std::sync::Arc;
use tracing::{debug, info};

pub use nrplade::NrpladeService;

#[async_trait]
pub trait LookupService: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, country: RegCountry) -> bool;

    async fn lookup_by_vin(&self, vin: &str) -> Result<Vehicle, LookupError>;

    async fn lookup_by_registration(&self, reg_nr: &str) -> Result<Vehicle, LookupError>;
}

/// Lookup services in registration order.
#[derive(Default, Clone)]
pub struct LookupRegistry {
    services: Vec<Arc<dyn LookupService>>,
}

impl LookupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Services for every provider with `lookup_supported` set.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        for (name, provider) in &config.providers {
            if provider.lookup_supported {
                debug!(provider = %name, host = %provider.lookup_host, "Registering lookup service");
                registry.register(Arc::new(NrpladeService::new(provider)));
            }
        }
        registry
    }

    /// Add a service. A service whose name is already registered is ignored.
    pub fn register(&mut self, service: Arc<dyn LookupService>) -> bool {
        if self.services.iter().any(|s| s.name() == service.name()) {
            info!(service = service.name(), "Lookup service already registered");
            return false;
        }
        self.services.push(service);
        true
    }

    /// First registered service supporting `country`.
    pub fn find_by_country(&self, country: RegCountry) -> Option<Arc<dyn LookupService>> {
        self.services
            .iter()
            .find(|s| s.supports(country))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
