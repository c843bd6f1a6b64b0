//! Provider registry.
//!
//! This module handles:
//! - The [`Provider`] capability
//! - A concurrent, name-keyed [`Registry`] the HTTP layer lists from

pub mod provider;

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::RegistryError;

pub use provider::{Provider, StaticProvider};

/// Concurrent registry of providers keyed by name.
#[derive(Debug, Default)]
pub struct Registry {
    providers: DashMap<String, Arc<dyn Provider>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name.
    ///
    /// Names are unique; registering a second provider with a taken name fails
    /// and leaves the first one in place.
    pub fn register(&self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        let name = provider.name().to_string();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        match self.providers.entry(name.clone()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered { name }),
            Entry::Vacant(slot) => {
                slot.insert(provider);
                info!(provider = %name, "Registered provider");
                Ok(())
            }
        }
    }

    /// Remove a provider, returning it if it was registered.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let removed = self.providers.remove(name).map(|(_, provider)| provider);
        if removed.is_some() {
            debug!(provider = %name, "Unregistered provider");
        }
        removed
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of all registered providers, ordered by name.
    pub fn list(&self) -> Vec<Arc<dyn Provider>> {
        let mut providers: Vec<Arc<dyn Provider>> = self
            .providers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        providers.sort_by(|a, b| a.name().cmp(b.name()));
        providers
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
