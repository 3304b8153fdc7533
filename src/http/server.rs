//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (tracing, timeout, request ID, basic auth)
//! - Bind server to listener
//! - Dispatch requests to the asset handler, the forwarder or static files

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::assets::AssetFetchHandler;
use crate::cache::{AssetCache, AssetStore};
use crate::config::GatewayConfig;
use crate::http::client::build_upstream_client;
use crate::http::fallback::StaticFallback;
use crate::http::middleware::basic_auth::{basic_auth_middleware, BasicAuth};
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::proxy::ReverseProxyForwarder;
use crate::routing::{RequestRouter, RouteTarget};

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub router: Arc<RequestRouter>,
    pub assets: AssetFetchHandler,
    pub proxy: ReverseProxyForwarder,
    pub fallback: StaticFallback,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with an in-memory asset cache.
    pub fn new(config: GatewayConfig) -> reqwest::Result<Self> {
        let store = Arc::new(AssetCache::new(
            Duration::from_secs(config.assets.cache_ttl_secs),
            config.assets.cache_capacity,
        ));
        Self::with_store(config, store)
    }

    /// Create a server around an existing asset store.
    pub fn with_store(config: GatewayConfig, store: Arc<dyn AssetStore>) -> reqwest::Result<Self> {
        let client = build_upstream_client(&config.timeouts)?;

        let state = AppState {
            router: Arc::new(RequestRouter::from_config(&config)),
            assets: AssetFetchHandler::new(&config.assets, store, client.clone()),
            proxy: ReverseProxyForwarder::new(&config.proxy, config.security.max_body_size, client),
            fallback: StaticFallback::new(&config.static_files, &config.cors),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state);

        if config.auth.enabled {
            let auth = Arc::new(BasicAuth::new(&config.auth));
            for user in auth.usernames() {
                tracing::info!(username = %user, "Basic auth user configured");
            }
            router = router.layer(middleware::from_fn_with_state(auth, basic_auth_middleware));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            asset_prefix = %self.config.assets.prefix,
            proxy_prefix = %self.config.proxy.prefix,
            proxy_target = %self.config.proxy.target,
            static_root = %self.config.static_files.root,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for serving without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main gateway handler.
/// Looks up the route and hands the request to its owner.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id();
    let target = state.router.dispatch(request.method(), request.uri().path());

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        route = target.as_str(),
        "Dispatching request"
    );

    let response = match target {
        RouteTarget::Asset => {
            let path = request.uri().path().to_string();
            state.assets.handle(&path, &request_id).await
        }
        RouteTarget::Proxy => state.proxy.handle(request, &request_id).await,
        RouteTarget::Fallback => state.fallback.serve(request).await,
    };

    metrics::record_request(target.as_str(), response.status().as_u16(), start_time);
    response
}
