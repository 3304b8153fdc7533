//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (add request ID)
//!     → middleware/basic_auth.rs (optional credential gate)
//!     → routing layer decides: asset | proxy | fallback
//!     → client.rs (shared upstream client) or fallback.rs (static files)
//!     → Send to client
//! ```

pub mod client;
pub mod fallback;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
