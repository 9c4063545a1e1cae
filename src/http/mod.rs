//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http request id + trace layers)
//!     → pipeline.rs (fault translation, counting, auth, rate limiting, logging)
//!     → routes.rs (per-route access policy and partition)
//!     → handlers (users::handlers, handlers.rs)
//!     → error.rs (typed failures → status codes)
//! ```

pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use pipeline::{Pipeline, TraceId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
