//! HTTP gateway over a provider registry and a configuration manager.
//!
//! The gateway serves three read-only JSON endpoints:
//!
//! ```text
//! GET /health            -> {"status":"healthy","message":...,"time":...}
//! GET /api/v1/providers  -> {"status":"success","count":N,"providers":[...]}
//! GET /api/v1/status     -> {"status":"ok","version":...,"uptime_seconds":...}
//! ```
//!
//! Any other method on these paths gets a 405.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`registry`]: Provider trait and registry
//! - [`manager`]: System configuration snapshots
//! - [`api`]: HTTP handlers, routes, and server lifecycle
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, Result};
