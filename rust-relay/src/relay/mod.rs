//! Webhook delivery to the downstream collector.
//!
//! ## Flow
//!
//! ```text
//! InboundRequest → ForwardAttempt → Forwarder::deliver() → RelayOutcome
//!                                   (runs on BackgroundTasks)
//! ```

pub mod background;
pub mod forwarder;
pub mod types;

pub use background::BackgroundTasks;
pub use forwarder::Forwarder;
pub use types::{ForwardAttempt, InboundRequest, RelayOutcome, DEFAULT_CONTENT_TYPE};
