//! Middleware module
//!
//! Request authentication and the file-server hit counter.

mod authenticated;
mod metrics;

pub use authenticated::AuthenticatedUser;
pub use metrics::{ApiMetrics, FileserverHits};
