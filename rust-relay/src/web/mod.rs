//! Web server module for the relay endpoint.
//!
//! The server acknowledges every webhook delivery immediately and leaves the
//! collector round trips to background tasks, so the upstream platform never
//! sees a timeout caused by a slow collector.

pub mod handlers;
pub mod router;

pub use handlers::{handle, AppState, OK_BODY};
pub use router::build_router;
