//! Asset fetch orchestration: cache check, resolve, fetch, store, respond.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;

use crate::assets::content_type::ContentTypeResolver;
use crate::cache::{AssetStore, CacheEntry, SingleFlight};
use crate::config::AssetConfig;
use crate::error::{GatewayError, UpstreamKind};
use crate::observability::metrics;
use crate::routing::UpstreamMap;

/// Sent when the content-type could not be inferred.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Payload ready to send, from the cache or a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub payload: Bytes,
    pub content_type: Option<String>,
}

impl From<CacheEntry> for Asset {
    fn from(entry: CacheEntry) -> Self {
        Self {
            payload: entry.payload,
            content_type: entry.content_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetFetchHandler {
    store: Arc<dyn AssetStore>,
    upstreams: UpstreamMap,
    content_types: ContentTypeResolver,
    client: reqwest::Client,
    flights: Option<SingleFlight>,
}

impl AssetFetchHandler {
    pub fn new(
        config: &AssetConfig,
        store: Arc<dyn AssetStore>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            store,
            upstreams: UpstreamMap::new(config.upstreams.clone()),
            content_types: ContentTypeResolver::new(&config.content_type_overrides),
            client,
            flights: config.single_flight.then(SingleFlight::new),
        }
    }

    /// Serve the asset at `path` (no query string).
    pub async fn handle(&self, path: &str, request_id: &str) -> Response<Body> {
        match self.load(path, request_id).await {
            Ok(asset) => asset_response(asset),
            Err(e) => e.into_response(),
        }
    }

    /// Return the asset for `path`, fetching and caching it on a miss.
    pub async fn load(&self, path: &str, request_id: &str) -> Result<Asset, GatewayError> {
        if let Some(entry) = self.lookup(path) {
            return Ok(entry.into());
        }

        // Resolve before taking a flight slot so unmapped paths never wait.
        let target = self.upstreams.resolve(path).inspect_err(|_| {
            tracing::debug!(request_id = %request_id, path = %path, "No asset upstream matched");
        })?;

        let _flight = match &self.flights {
            Some(flights) => {
                let guard = flights.acquire(path).await;
                // Another request may have filled the cache while we waited.
                if let Some(entry) = self.lookup(path) {
                    return Ok(entry.into());
                }
                Some(guard)
            }
            None => None,
        };

        let payload = self.fetch(&target, request_id).await?;
        let content_type = self.content_types.resolve(&target);

        self.store.put(path, payload.clone(), content_type.clone());
        tracing::info!(
            request_id = %request_id,
            path = %path,
            target = %target,
            bytes = payload.len(),
            content_type = content_type.as_deref().unwrap_or("-"),
            "Asset cached"
        );

        Ok(Asset {
            payload,
            content_type,
        })
    }

    fn lookup(&self, path: &str) -> Option<CacheEntry> {
        let entry = self.store.get(path);
        metrics::record_cache_lookup(entry.is_some());
        entry
    }

    async fn fetch(&self, target: &str, request_id: &str) -> Result<Bytes, GatewayError> {
        let response = self.client.get(target).send().await.map_err(|e| {
            tracing::error!(request_id = %request_id, target = %target, error = %e, "Asset upstream unreachable");
            metrics::record_upstream_error("asset_unreachable");
            GatewayError::UpstreamUnreachable { kind: UpstreamKind::Asset, source: e }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(request_id = %request_id, target = %target, status = %status, "Asset upstream rejected request");
            metrics::record_upstream_error("asset_rejected");
            return Err(GatewayError::UpstreamRejected { status });
        }

        response.bytes().await.map_err(|e| {
            tracing::error!(request_id = %request_id, target = %target, error = %e, "Asset body read failed");
            metrics::record_upstream_error("asset_unreachable");
            GatewayError::UpstreamUnreachable { kind: UpstreamKind::Asset, source: e }
        })
    }
}

fn asset_response(asset: Asset) -> Response<Body> {
    let content_type = asset
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], asset.payload).into_response()
}
