//! Configuration manager holding the current system configuration snapshot.

use std::sync::{Arc, RwLock};

use tracing::info;

/// Immutable snapshot of system configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// Deployed system version.
    pub version: String,
}

impl SystemConfig {
    /// Create a snapshot for the given version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

/// Shares the current [`SystemConfig`] between readers.
///
/// Readers get a cheap `Arc` clone of whatever snapshot is current; `update`
/// swaps in a new snapshot without disturbing readers holding the old one.
#[derive(Debug)]
pub struct ConfigManager {
    current: RwLock<Arc<SystemConfig>>,
}

impl ConfigManager {
    /// Create a manager seeded with an initial snapshot.
    pub fn new(initial: SystemConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Current configuration snapshot.
    pub fn get(&self) -> Arc<SystemConfig> {
        // A poisoned lock still guards a fully written Arc.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the current snapshot, returning the previous one.
    pub fn update(&self, next: SystemConfig) -> Arc<SystemConfig> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        info!(from = %guard.version, to = %next.version, "Configuration updated");
        std::mem::replace(&mut *guard, Arc::new(next))
    }
}
