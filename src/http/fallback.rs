//! Static file fallback for paths no route claims.
//!
//! # Responsibilities
//! - Serve files under `static_files.root`
//! - Answer misses with `not_found_page` and a 404 status
//! - Add permissive CORS headers inside the configured namespace

use std::convert::Infallible;
use std::path::Path;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use tower::util::BoxCloneSyncService;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::config::{CorsConfig, StaticFilesConfig};

type StaticService = BoxCloneSyncService<Request<Body>, Response<Body>, Infallible>;

#[derive(Clone)]
pub struct StaticFallback {
    files: StaticService,
    cors: Option<(String, StaticService)>,
}

impl StaticFallback {
    pub fn new(config: &StaticFilesConfig, cors: &CorsConfig) -> Self {
        let root = Path::new(&config.root);
        let not_found = ServeFile::new(root.join(&config.not_found_page));
        let serve_dir = ServeDir::new(root)
            .call_fallback_on_method_not_allowed(true)
            .not_found_service(not_found);

        let files = BoxCloneSyncService::new(
            ServiceBuilder::new()
                .map_response(|r: Response<_>| r.map(Body::new))
                .service(serve_dir),
        );

        let cors = cors.enabled.then(|| {
            let layer = CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_methods([
                    Method::GET,
                    Method::HEAD,
                    Method::PUT,
                    Method::PATCH,
                    Method::POST,
                    Method::DELETE,
                ]);
            let service = BoxCloneSyncService::new(
                ServiceBuilder::new().layer(layer).service(files.clone()),
            );
            (cors.path_prefix.trim_end_matches('/').to_string(), service)
        });

        Self { files, cors }
    }

    pub async fn serve(&self, request: Request<Body>) -> Response<Body> {
        let service = match &self.cors {
            Some((prefix, service)) if in_namespace(prefix, request.uri().path()) => service,
            _ => &self.files,
        };
        service
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {})
    }
}

impl std::fmt::Debug for StaticFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFallback")
            .field("cors_namespace", &self.cors.as_ref().map(|(p, _)| p))
            .finish()
    }
}

/// `/fq` covers `/fq` and `/fq/...` but not `/fqx`.
fn in_namespace(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(dir.path().join("404.html"), "<h1>missing</h1>").unwrap();
        std::fs::create_dir(dir.path().join("fq")).unwrap();
        std::fs::write(dir.path().join("fq").join("data.txt"), "fq data").unwrap();
        dir
    }

    fn fallback(dir: &tempfile::TempDir) -> StaticFallback {
        let config = StaticFilesConfig {
            root: dir.path().to_string_lossy().into_owned(),
            not_found_page: "404.html".into(),
        };
        StaticFallback::new(&config, &CorsConfig::default())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::ORIGIN, "https://app.example")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_in_namespace() {
        assert!(in_namespace("/fq", "/fq"));
        assert!(in_namespace("/fq", "/fq/x"));
        assert!(!in_namespace("/fq", "/fqx"));
        assert!(!in_namespace("/fq", "/index.html"));
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let dir = fixture();
        let response = fallback(&dir).serve(get("/index.html")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(body_string(response).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_missing_file_serves_404_page() {
        let dir = fixture();
        let response = fallback(&dir).serve(get("/nope.html")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "<h1>missing</h1>");
    }

    #[tokio::test]
    async fn test_cors_namespace_mirrors_origin() {
        let dir = fixture();
        let response = fallback(&dir).serve(get("/fq/data.txt")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example"
        );
        assert_eq!(body_string(response).await, "fq data");
    }
}
