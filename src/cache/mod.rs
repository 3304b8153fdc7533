//! Asset cache subsystem.
//!
//! # Data Flow
//! ```text
//! Asset request (inbound path)
//!     → store.rs (TTL lookup, lazy expiry)
//!     → hit: payload + content-type
//!     → miss: single_flight.rs (optional per-key lock) → upstream fetch → store.rs put
//! ```
//!
//! # Design Decisions
//! - Keyed by the gateway's own path, not the upstream URL
//! - Expired entries are removed when next read; no sweeper task
//! - Unbounded by default; `cache_capacity` turns on LRU eviction
//! - Clock is injected so expiry is testable without sleeping

pub mod clock;
pub mod single_flight;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use single_flight::{FlightGuard, SingleFlight};
pub use store::{AssetCache, AssetStore, CacheEntry};
