//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → counter.rs (per-route request counts, served by /metrics)
//!     → logging.rs (one access line per request, error blocks on faults)
//!     → metrics.rs (Prometheus mirror of counts and rejections)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → daily files under the log directory
//!     → Prometheus scrape (optional)
//! ```
//!
//! # Design Decisions
//! - Counting is lock-free on the hot path (atomic increments)
//! - File writes happen off the request path
//! - Log sink failures are reported, never surfaced to clients

pub mod counter;
pub mod logging;
pub mod metrics;

pub use counter::RequestCounter;
pub use logging::{FileLogSink, RequestLogger};
