//! Gateway error taxonomy and its mapping to HTTP responses.
//!
//! Every failure is logged once where it is detected; by the time a
//! `GatewayError` reaches `into_response` only the status and a short
//! plain-text body are left.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Which outbound call failed, used to pick the 500 body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    Asset,
    Proxy,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Inbound path matches no configured prefix.
    #[error("no upstream configured for {path}")]
    RouteNotFound { path: String },

    /// Upstream answered an asset fetch with a non-success status.
    #[error("upstream rejected asset request with {status}")]
    UpstreamRejected { status: StatusCode },

    /// Transport-level failure talking to an upstream.
    #[error("upstream unreachable: {source}")]
    UpstreamUnreachable {
        kind: UpstreamKind,
        #[source]
        source: reqwest::Error,
    },

    /// Request body exceeded `security.max_body_size`.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// `parse_json_body` is on and the body is not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJsonBody(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound { .. } | GatewayError::UpstreamRejected { .. } => {
                StatusCode::NOT_FOUND
            }
            GatewayError::UpstreamUnreachable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::InvalidJsonBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            GatewayError::RouteNotFound { .. } | GatewayError::UpstreamRejected { .. } => {
                "Not found"
            }
            GatewayError::UpstreamUnreachable { kind: UpstreamKind::Asset, .. } => {
                "Error fetching asset"
            }
            GatewayError::UpstreamUnreachable { kind: UpstreamKind::Proxy, .. } => {
                "Error proxying request"
            }
            GatewayError::BodyTooLarge { .. } => "Payload too large",
            GatewayError::InvalidJsonBody(_) => "Invalid JSON body",
        }
    }

    /// Metric label for the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::RouteNotFound { .. } => "route_not_found",
            GatewayError::UpstreamRejected { .. } => "upstream_rejected",
            GatewayError::UpstreamUnreachable { .. } => "upstream_unreachable",
            GatewayError::BodyTooLarge { .. } => "body_too_large",
            GatewayError::InvalidJsonBody(_) => "invalid_json_body",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}
