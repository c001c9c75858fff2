//! LINE relay - fast-acknowledging webhook forwarder.
//!
//! This library provides the modules behind the `line-relay-web` binary:
//! - `web`: axum surface that acknowledges probes and deliveries
//! - `relay`: background delivery with manual redirect handling
//!
//! ## Architecture
//!
//! ```text
//! LINE platform → handle() → 200 OK
//!                    └─→ BackgroundTasks → Forwarder → collector (≤ 4 redirects)
//! ```

pub mod config;
pub mod error;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{DeliveryError, RelayError};
pub use relay::{BackgroundTasks, ForwardAttempt, Forwarder, InboundRequest, RelayOutcome};
pub use web::{build_router, AppState};
