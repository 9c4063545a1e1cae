//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → token.rs (bearer token verification, protected routes only)
//!     → rate_limit.rs (global partition, then the route's named partition)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: any failed check short-circuits the request
//! - A valid token authorizes every protected route; role is not inspected

pub mod rate_limit;
pub mod token;

pub use rate_limit::{FixedWindowLimiter, WindowPolicy, FIXED_PARTITION, GLOBAL_PARTITION};
pub use token::{Principal, TokenError, TokenService};
