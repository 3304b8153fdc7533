//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Decide which handler owns a request
//! - Fall through explicitly when nothing matches
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan over a fixed, tiny route table
//! - Asset route claims only GET/HEAD; other methods fall through

use axum::http::Method;

use crate::config::GatewayConfig;
use crate::routing::matcher::{AndMatcher, Matcher, MethodMatcher, PathPrefixMatcher};

/// Handler chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Asset,
    Proxy,
    Fallback,
}

impl RouteTarget {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteTarget::Asset => "asset",
            RouteTarget::Proxy => "proxy",
            RouteTarget::Fallback => "static",
        }
    }
}

#[derive(Debug)]
struct Route {
    target: RouteTarget,
    matcher: Box<dyn Matcher>,
}

#[derive(Debug)]
pub struct RequestRouter {
    routes: Vec<Route>,
}

impl RequestRouter {
    pub fn new(asset_prefix: &str, proxy_prefix: &str) -> Self {
        let routes = vec![
            Route {
                target: RouteTarget::Asset,
                matcher: Box::new(AndMatcher::new(vec![
                    Box::new(PathPrefixMatcher::new(asset_prefix)),
                    Box::new(MethodMatcher::new([Method::GET, Method::HEAD])),
                ])),
            },
            Route {
                target: RouteTarget::Proxy,
                matcher: Box::new(PathPrefixMatcher::new(proxy_prefix)),
            },
        ];
        Self { routes }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(&config.assets.prefix, &config.proxy.prefix)
    }

    /// First matching route, or `Fallback`.
    pub fn dispatch(&self, method: &Method, path: &str) -> RouteTarget {
        self.routes
            .iter()
            .find(|r| r.matcher.matches(method, path))
            .map(|r| r.target)
            .unwrap_or(RouteTarget::Fallback)
    }
}
