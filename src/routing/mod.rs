//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: Asset | Proxy | Fallback
//!
//! Asset requests:
//!     → upstream.rs (prefix → origin URL)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;
pub mod upstream;

pub use router::{RequestRouter, RouteTarget};
pub use upstream::UpstreamMap;
