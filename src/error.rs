//! Unified error types for the provider gateway.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Unified error type for the provider gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Registry operation error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// HTTP server lifecycle error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}

/// Provider registry errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A provider with the same name is already registered.
    #[error("provider {name} is already registered")]
    AlreadyRegistered {
        /// The conflicting provider name.
        name: String,
    },

    /// Provider names must not be blank.
    #[error("provider name must not be empty")]
    EmptyName,
}

/// HTTP server lifecycle errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// `start` was called while the listener is already running.
    #[error("server is already running on {addr}")]
    AlreadyRunning {
        /// Address the running listener is bound to.
        addr: SocketAddr,
    },

    /// In-flight requests did not drain before the deadline.
    #[error("graceful shutdown did not complete within {waited:?}")]
    ShutdownTimeout {
        /// How long shutdown waited before abandoning the listener.
        waited: Duration,
    },

    /// The serve task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_errors_convert_into_gateway_errors() {
        let err: GatewayError = RegistryError::AlreadyRegistered {
            name: "alpha".to_string(),
        }
        .into();

        assert!(matches!(err, GatewayError::Registry(_)));
        assert_eq!(
            err.to_string(),
            "registry error: provider alpha is already registered"
        );
    }

    #[test]
    fn shutdown_timeout_message_names_the_wait() {
        let err = ServerError::ShutdownTimeout {
            waited: Duration::from_secs(3),
        };
        assert_eq!(
            err.to_string(),
            "graceful shutdown did not complete within 3s"
        );

        let err: GatewayError = err.into();
        assert!(matches!(err, GatewayError::Server(_)));
    }
}
