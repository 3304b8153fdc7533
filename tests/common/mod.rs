//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use asset_gateway::cache::AssetStore;
use asset_gateway::config::{GatewayConfig, UpstreamConfig};
use asset_gateway::{HttpServer, Shutdown};
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request};
use axum::response::Response;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;

/// What a mock upstream saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn all(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests.lock().last().cloned().expect("no request recorded")
    }

    fn push(&self, request: RecordedRequest) {
        self.requests.lock().push(request);
    }
}

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Recorder)
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder = Recorder::default();

    let rec = recorder.clone();
    let f = Arc::new(f);
    let app = Router::new().fallback(move |request: Request<Body>| {
        let rec = rec.clone();
        let f = f.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            let recorded = RecordedRequest {
                method: parts.method,
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body,
            };
            rec.push(recorded.clone());
            f(recorded).await
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, recorder)
}

/// Start a mock upstream that always answers `status` with `body`.
pub async fn start_mock_backend(status: u16, body: &'static [u8]) -> (SocketAddr, Recorder) {
    start_programmable_backend(move |_| async move {
        Response::builder()
            .status(status)
            .body(Body::from(body))
            .unwrap()
    })
    .await
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway config pointing every route at `upstream`.
///
/// `/e/1/` → `http://upstream/one/`, `/e/2/` → `http://upstream/two/`,
/// `/wisp/` → `http://upstream/`.
pub fn test_config(upstream: SocketAddr, static_root: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.assets.upstreams = vec![
        UpstreamConfig::new("/e/1/", format!("http://{}/one/", upstream)),
        UpstreamConfig::new("/e/2/", format!("http://{}/two/", upstream)),
    ];
    config.proxy.target = format!("http://{}/", upstream);
    config.static_files.root = static_root.to_string_lossy().into_owned();
    config.timeouts.connect_secs = 2;
    config.timeouts.upstream_secs = 5;
    config
}

/// Run the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    serve(server).await
}

/// Run the gateway around a caller-supplied store.
pub async fn start_gateway_with_store(
    config: GatewayConfig,
    store: Arc<dyn AssetStore>,
) -> (SocketAddr, Shutdown) {
    let server = HttpServer::with_store(config, store).unwrap();
    serve(server).await
}

async fn serve(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A client that leaves response bodies exactly as sent.
pub fn raw_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .no_gzip()
        .no_brotli()
        .no_deflate()
        .build()
        .unwrap()
}
