//! Reverse proxy route.
//!
//! # Data Flow
//! ```text
//! ANY /wisp/<rest>
//!     → forwarder.rs (URL rewrite, header filtering, body buffering)
//!     → upstream call
//!     → status + content-type + body relayed
//! ```

pub mod forwarder;

pub use forwarder::ReverseProxyForwarder;
