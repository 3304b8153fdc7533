//! HTTP Basic authentication gate.
//! Runs ahead of routing when `auth.enabled` is set.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::config::AuthConfig;
use crate::http::request::RequestIdExt;

/// Credentials checked by [`basic_auth_middleware`].
#[derive(Debug, Clone)]
pub struct BasicAuth {
    users: BTreeMap<String, String>,
    challenge: HeaderValue,
}

impl BasicAuth {
    pub fn new(config: &AuthConfig) -> Self {
        let realm = config.realm.replace('"', "");
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
            .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
        Self {
            users: config.users.clone(),
            challenge,
        }
    }

    /// Check an `Authorization` header value.
    pub fn verify(&self, authorization: &str) -> bool {
        let Some(encoded) = authorization
            .strip_prefix("Basic ")
            .or_else(|| authorization.strip_prefix("basic "))
        else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(credentials) = String::from_utf8(decoded) else {
            return false;
        };
        let Some((user, password)) = credentials.split_once(':') else {
            return false;
        };

        self.users
            .get(user)
            .map(|expected| constant_time_eq(expected.as_bytes(), password.as_bytes()))
            .unwrap_or(false)
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    fn challenge(&self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, self.challenge.clone())],
            "Unauthorized",
        )
            .into_response()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn basic_auth_middleware(
    State(auth): State<Arc<BasicAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|value| auth.verify(value))
        .unwrap_or(false);

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(
        request_id = %request.request_id(),
        path = %request.uri().path(),
        "Rejected request without valid credentials"
    );
    auth.challenge()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> BasicAuth {
        let mut config = AuthConfig::default();
        config.enabled = true;
        config.users.insert("admin".into(), "secret".into());
        BasicAuth::new(&config)
    }

    fn header_for(credentials: &str) -> String {
        format!("Basic {}", STANDARD.encode(credentials))
    }

    #[test]
    fn test_verify() {
        let auth = auth();
        assert!(auth.verify(&header_for("admin:secret")));
        assert!(!auth.verify(&header_for("admin:WRONG")));
        assert!(!auth.verify(&header_for("nobody:secret")));
        assert!(!auth.verify(&header_for("adminsecret")));
        assert!(!auth.verify("Bearer abc"));
        assert!(!auth.verify("Basic !!!not-base64"));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let mut config = AuthConfig::default();
        config.users.insert("u".into(), "a:b".into());
        let auth = BasicAuth::new(&config);
        assert!(auth.verify(&header_for("u:a:b")));
    }

    #[test]
    fn test_challenge_header() {
        let response = auth().challenge();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"asset-gateway\""
        );
    }
}
