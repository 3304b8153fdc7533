//! Asset prefix to origin resolution.

use crate::config::UpstreamConfig;
use crate::error::GatewayError;

/// Ordered (prefix, origin) pairs. The first prefix that matches wins;
/// validation rejects entries an earlier prefix would shadow.
#[derive(Debug, Clone, Default)]
pub struct UpstreamMap {
    entries: Vec<UpstreamConfig>,
}

impl UpstreamMap {
    pub fn new(entries: Vec<UpstreamConfig>) -> Self {
        Self { entries }
    }

    /// Resolve an inbound path to `origin + path[prefix.len()..]`.
    pub fn resolve(&self, path: &str) -> Result<String, GatewayError> {
        self.entries
            .iter()
            .find_map(|e| {
                path.strip_prefix(e.prefix.as_str())
                    .map(|rest| format!("{}{}", e.origin, rest))
            })
            .ok_or_else(|| GatewayError::RouteNotFound {
                path: path.to_string(),
            })
    }

    pub fn entries(&self) -> &[UpstreamConfig] {
        &self.entries
    }
}
