//! User records subsystem.
//!
//! # Data Flow
//! ```text
//! JSON payload
//!     → model.rs (User, ListFilter)
//!     → validation.rs (structural checks, first failure wins)
//!     → store.rs (concurrent map, CAS updates)
//!     → handlers.rs (typed results mapped to HTTP)
//! ```
//!
//! # Design Decisions
//! - The store owns every record; callers only ever see clones
//! - Updates are optimistic: a stale expected value is a conflict
//! - Listing never sorts

pub mod handlers;
pub mod model;
pub mod store;
pub mod validation;

pub use model::{ListFilter, User};
pub use store::UserStore;
pub use validation::{validate, ValidationError};
