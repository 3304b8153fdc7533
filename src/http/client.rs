//! Outbound HTTP client shared by the asset fetcher and the forwarder.
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` per process
//! - Connect and total timeouts bound every upstream call
//! - Redirects are followed (reqwest default, at most 10 hops)
//! - Proxy environment variables are ignored
//! - gzip, brotli and deflate replies are decoded before anyone sees them

use std::time::Duration;

use crate::config::TimeoutConfig;

pub fn build_upstream_client(timeouts: &TimeoutConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.upstream_secs))
        .no_proxy()
        .user_agent(concat!("asset-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
}
