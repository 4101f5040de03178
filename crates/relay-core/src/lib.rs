//! Shared request-scoped types for Relay
//!
//! Kept free of axum so feature crates can be exercised without an HTTP
//! server in front of them.

mod context;
mod error;

pub use context::RequestContext;
pub use error::HttpError;
