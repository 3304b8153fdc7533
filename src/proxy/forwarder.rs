//! Request forwarding to the fixed proxy target.
//!
//! # Responsibilities
//! - Rewrite `<prefix><rest>` to `<target><rest>`, query string included
//! - Forward method and end-to-end headers
//! - Buffer and forward the body for methods that carry one
//! - Relay upstream status, content-type and body
//!
//! # Design Decisions
//! - `Host` is dropped; the client derives it from the target URL
//! - Hop-by-hop headers are dropped in both directions
//! - Upstream status is relayed verbatim, errors included
//! - Transport failure is a 500 with a generic body, never retried
//! - `Accept-Encoding` is dropped; the relayed body is always decoded

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::response::IntoResponse;

use crate::config::ProxyConfig;
use crate::error::{GatewayError, UpstreamKind};
use crate::observability::metrics;

/// Content-type relayed when upstream sends none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Request headers that never leave the gateway, hop-by-hop ones included.
/// The client negotiates its own encoding and hands back decoded bodies.
const STRIPPED_HEADERS: &[&str] = &[
    "host",
    "accept-encoding",
    "connection",
    "content-length",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "proxy-authorization",
    "proxy-authenticate",
    "keep-alive",
    "proxy-connection",
];

#[derive(Debug, Clone)]
pub struct ReverseProxyForwarder {
    prefix: String,
    target: String,
    parse_json_body: bool,
    max_body_size: usize,
    client: reqwest::Client,
}

impl ReverseProxyForwarder {
    pub fn new(config: &ProxyConfig, max_body_size: usize, client: reqwest::Client) -> Self {
        Self {
            prefix: config.prefix.clone(),
            target: config.target.clone(),
            parse_json_body: config.parse_json_body,
            max_body_size,
            client,
        }
    }

    /// Upstream URL for an inbound path-and-query.
    pub fn target_url(&self, path_and_query: &str) -> String {
        let rest = path_and_query
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(path_and_query.trim_start_matches('/'));
        format!("{}{}", self.target, rest)
    }

    pub async fn handle(&self, request: Request<Body>, request_id: &str) -> Response<Body> {
        match self.forward(request, request_id).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    pub async fn forward(
        &self,
        request: Request<Body>,
        request_id: &str,
    ) -> Result<Response<Body>, GatewayError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.target_url(path_and_query);

        let body = if carries_body(&parts.method) {
            Some(self.read_body(body, &parts.headers, request_id).await?)
        } else {
            None
        };

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            url = %url,
            body_bytes = body.as_ref().map(Bytes::len).unwrap_or(0),
            "Forwarding request"
        );

        let mut outbound = self
            .client
            .request(parts.method.clone(), &url)
            .headers(forwarded_headers(&parts.headers));
        if let Some(body) = body {
            outbound = outbound.body(body);
        }

        let upstream = outbound.send().await.map_err(|e| unreachable(e, &url, request_id))?;

        let status = upstream.status();
        let content_type = upstream
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        let payload = upstream.bytes().await.map_err(|e| unreachable(e, &url, request_id))?;

        tracing::debug!(
            request_id = %request_id,
            url = %url,
            status = %status,
            body_bytes = payload.len(),
            "Upstream responded"
        );

        Ok(relay(status, content_type, payload))
    }

    async fn read_body(
        &self,
        body: Body,
        headers: &HeaderMap,
        request_id: &str,
    ) -> Result<Bytes, GatewayError> {
        let bytes = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| {
                tracing::warn!(request_id = %request_id, error = %e, limit = self.max_body_size, "Request body rejected");
                GatewayError::BodyTooLarge {
                    limit: self.max_body_size,
                }
            })?;

        if self.parse_json_body && is_json(headers) && !bytes.is_empty() {
            let value: serde_json::Value = serde_json::from_slice(&bytes).inspect_err(|e| {
                tracing::warn!(request_id = %request_id, error = %e, "Malformed JSON body");
            })?;
            return Ok(Bytes::from(serde_json::to_vec(&value)?));
        }

        Ok(bytes)
    }
}

/// GET and HEAD never forward a body.
pub fn carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// Inbound headers minus `Host`, hop-by-hop headers, and anything listed
/// in the request's own `Connection` header.
pub fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<String> = inbound
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if STRIPPED_HEADERS.contains(&name.as_str())
            || connection_listed.iter().any(|c| c == name.as_str())
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn unreachable(e: reqwest::Error, url: &str, request_id: &str) -> GatewayError {
    tracing::error!(request_id = %request_id, url = %url, error = %e, "Proxy upstream unreachable");
    metrics::record_upstream_error("proxy_unreachable");
    GatewayError::UpstreamUnreachable {
        kind: UpstreamKind::Proxy,
        source: e,
    }
}

fn relay(status: StatusCode, content_type: HeaderValue, payload: Bytes) -> Response<Body> {
    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    response
}
