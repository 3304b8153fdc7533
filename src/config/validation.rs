//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream origins and the proxy target as URLs
//! - Detect asset prefixes shadowed by an earlier entry
//! - Detect route namespaces that overlap
//! - Validate value ranges (TTL and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL {value:?}")]
    InvalidUrl { field: String, value: String },

    #[error("{field}: prefix {value:?} must start and end with '/'")]
    InvalidPrefix { field: String, value: String },

    #[error("assets.upstreams: prefix {value:?} is outside the asset namespace {namespace:?}")]
    OutsideNamespace { value: String, namespace: String },

    #[error("assets.upstreams: prefix {shadowed:?} can never match, {earlier:?} is checked first")]
    ShadowedPrefix { shadowed: String, earlier: String },

    #[error("route prefixes {first:?} and {second:?} overlap")]
    OverlappingRoutes { first: String, second: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("auth.users must not be empty when auth is enabled")]
    NoUsers,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_prefix("assets.prefix", &config.assets.prefix, &mut errors);
    check_prefix("proxy.prefix", &config.proxy.prefix, &mut errors);

    let (a, p) = (&config.assets.prefix, &config.proxy.prefix);
    if a.starts_with(p.as_str()) || p.starts_with(a.as_str()) {
        errors.push(ValidationError::OverlappingRoutes {
            first: a.clone(),
            second: p.clone(),
        });
    }

    for (i, upstream) in config.assets.upstreams.iter().enumerate() {
        let field = format!("assets.upstreams[{}]", i);
        check_prefix(&field, &upstream.prefix, &mut errors);
        check_url(&field, &upstream.origin, &mut errors);

        if !upstream.prefix.starts_with(a.as_str()) {
            errors.push(ValidationError::OutsideNamespace {
                value: upstream.prefix.clone(),
                namespace: a.clone(),
            });
        }

        if let Some(earlier) = config.assets.upstreams[..i]
            .iter()
            .find(|e| upstream.prefix.starts_with(e.prefix.as_str()))
        {
            errors.push(ValidationError::ShadowedPrefix {
                shadowed: upstream.prefix.clone(),
                earlier: earlier.prefix.clone(),
            });
        }
    }

    check_url("proxy.target", &config.proxy.target, &mut errors);

    if config.assets.cache_ttl_secs == 0 {
        errors.push(ValidationError::Zero { field: "assets.cache_ttl_secs" });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_secs" });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.upstream_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "security.max_body_size" });
    }

    if config.auth.enabled && config.auth.users.is_empty() {
        errors.push(ValidationError::NoUsers);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_prefix(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if !value.starts_with('/') || !value.ends_with('/') {
        errors.push(ValidationError::InvalidPrefix {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_url(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    let valid = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UpstreamConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_shadowed_prefix_rejected() {
        let mut config = GatewayConfig::default();
        config.assets.upstreams = vec![
            UpstreamConfig::new("/e/1/", "http://a.example/"),
            UpstreamConfig::new("/e/1/beta/", "http://b.example/"),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ShadowedPrefix {
                shadowed: "/e/1/beta/".into(),
                earlier: "/e/1/".into(),
            }]
        );
    }

    #[test]
    fn test_more_specific_prefix_first_is_accepted() {
        let mut config = GatewayConfig::default();
        config.assets.upstreams = vec![
            UpstreamConfig::new("/e/1/beta/", "http://b.example/"),
            UpstreamConfig::new("/e/1/", "http://a.example/"),
        ];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.assets.upstreams = vec![UpstreamConfig::new("/x/", "not a url")];
        config.proxy.target = "ftp://example.com/".into();
        config.assets.cache_ttl_secs = 0;
        config.auth.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::OutsideNamespace {
            value: "/x/".into(),
            namespace: "/e/".into(),
        }));
        assert!(errors.contains(&ValidationError::InvalidUrl {
            field: "assets.upstreams[0]".into(),
            value: "not a url".into(),
        }));
        assert!(errors.contains(&ValidationError::InvalidUrl {
            field: "proxy.target".into(),
            value: "ftp://example.com/".into(),
        }));
        assert!(errors.contains(&ValidationError::Zero { field: "assets.cache_ttl_secs" }));
        assert!(errors.contains(&ValidationError::NoUsers));
    }

    #[test]
    fn test_overlapping_routes_rejected() {
        let mut config = GatewayConfig::default();
        config.proxy.prefix = "/e/wisp/".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::OverlappingRoutes {
            first: "/e/".into(),
            second: "/e/wisp/".into(),
        }));
    }
}
