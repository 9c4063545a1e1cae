//! Minimal users API: CRUD over an in-memory user store behind token
//! authentication, per-route request counting, fixed-window rate limiting
//! and request logging.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod users;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
