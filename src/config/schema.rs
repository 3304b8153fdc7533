//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Asset route: upstream origins and cache behaviour.
    pub assets: AssetConfig,

    /// Reverse proxy route.
    pub proxy: ProxyConfig,

    /// Static file fallback.
    pub static_files: StaticFilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// HTTP Basic authentication gate.
    pub auth: AuthConfig,

    /// CORS namespace.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request size limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single asset origin, selected by literal path prefix.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Path prefix to match, including the trailing slash (e.g. "/e/1/").
    pub prefix: String,

    /// Base URL the remainder of the path is appended to.
    pub origin: String,
}

impl UpstreamConfig {
    pub fn new(prefix: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            origin: origin.into(),
        }
    }
}

/// Asset route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Path namespace served by the asset handler.
    pub prefix: String,

    /// Origins, tested in declaration order. First match wins.
    pub upstreams: Vec<UpstreamConfig>,

    /// Time-to-live of a cached asset in seconds.
    pub cache_ttl_secs: u64,

    /// Maximum number of cached assets (0 = unbounded).
    pub cache_capacity: usize,

    /// Collapse concurrent misses on the same path into one upstream fetch.
    pub single_flight: bool,

    /// Extension (without dot) to content-type overrides.
    pub content_type_overrides: BTreeMap<String, String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        let mut content_type_overrides = BTreeMap::new();
        content_type_overrides.insert(
            "unityweb".to_string(),
            "application/octet-stream".to_string(),
        );

        Self {
            prefix: "/e/".to_string(),
            upstreams: vec![
                UpstreamConfig::new("/e/1/", "https://raw.githubusercontent.com/qrs/x/fixy/"),
                UpstreamConfig::new("/e/2/", "https://raw.githubusercontent.com/3v1/V5-Assets/main/"),
                UpstreamConfig::new("/e/3/", "https://raw.githubusercontent.com/3v1/V5-Retro/master/"),
            ],
            cache_ttl_secs: 30 * 24 * 60 * 60, // 30 days
            cache_capacity: 0,
            single_flight: false,
            content_type_overrides,
        }
    }
}

/// Reverse proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Path namespace forwarded upstream.
    pub prefix: String,

    /// Fixed upstream origin. The path after `prefix` is appended verbatim.
    pub target: String,

    /// Require JSON request bodies to parse before forwarding them.
    pub parse_json_body: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: "/wisp/".to_string(),
            target: "https://wisp.mercurywork.shop/".to_string(),
            parse_json_body: false,
        }
    }
}

/// Static file fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory served for every path no route claims.
    pub root: String,

    /// File (relative to `root`) returned with a 404 status.
    pub not_found_page: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "mango".to_string(),
            not_found_page: "404.html".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one upstream call, body included, in seconds.
    pub upstream_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// HTTP Basic authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Gate every request behind Basic auth.
    pub enabled: bool,

    /// Realm sent in the `WWW-Authenticate` challenge.
    pub realm: String,

    /// Username to password.
    pub users: BTreeMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            realm: "asset-gateway".to_string(),
            users: BTreeMap::new(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Apply permissive CORS headers to `path_prefix`.
    pub enabled: bool,

    /// Namespace receiving CORS headers.
    pub path_prefix: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_prefix: "/fq".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
