//! Provider capability and the name-only provider used by the binary.

use std::fmt;

/// A component registered in the gateway by name.
///
/// Provider internals are owned by whoever implements this trait; the gateway
/// only ever asks for the name.
pub trait Provider: Send + Sync + fmt::Debug {
    /// Unique provider name.
    fn name(&self) -> &str;
}

/// Provider that carries nothing but its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProvider {
    name: String,
}

impl StaticProvider {
    /// Create a provider with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Provider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_provider_reports_its_name() {
        let provider = StaticProvider::new("alpha");
        assert_eq!(provider.name(), "alpha");
    }
}
