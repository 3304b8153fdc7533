//! Asset route: cached fetches from versioned upstream origins.
//!
//! # Data Flow
//! ```text
//! GET /e/<n>/<rest>
//!     → handler.rs (cache check)
//!     → routing::upstream (prefix → origin URL)
//!     → upstream GET
//!     → content_type.rs (extension → content-type)
//!     → cache put → 200
//! ```
//!
//! # Design Decisions
//! - Non-2xx upstream answers collapse to 404; upstream error pages never leak
//! - Transport failures are 500 and are never cached
//! - No retries

pub mod content_type;
pub mod handler;

pub use content_type::ContentTypeResolver;
pub use handler::{Asset, AssetFetchHandler};
