//! HTTP API module for health, provider listing, and status endpoints.

pub mod handlers;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::Server;
