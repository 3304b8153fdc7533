//! Content-type inference from an upstream URL's file extension.

use std::collections::BTreeMap;

use url::Url;

/// Extension → content-type lookup with an override table consulted first.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeResolver {
    overrides: BTreeMap<String, String>,
}

impl ContentTypeResolver {
    pub fn new(overrides: &BTreeMap<String, String>) -> Self {
        let overrides = overrides
            .iter()
            .map(|(ext, ct)| (ext.trim_start_matches('.').to_ascii_lowercase(), ct.clone()))
            .collect();
        Self { overrides }
    }

    /// Content-type for `url`, or `None` when the extension is unknown.
    pub fn resolve(&self, url: &str) -> Option<String> {
        let ext = extension(url)?.to_ascii_lowercase();
        if let Some(ct) = self.overrides.get(&ext) {
            return Some(ct.clone());
        }
        mime_guess::from_ext(&ext).first_raw().map(str::to_string)
    }
}

/// Text after the last dot of the last path segment. Dotfiles have none.
fn extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(u) => u.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let segment = path.rsplit('/').next()?;
    match segment.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < segment.len() => Some(segment[idx + 1..].to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;

    fn resolver() -> ContentTypeResolver {
        ContentTypeResolver::new(&AssetConfig::default().content_type_overrides)
    }

    #[test]
    fn test_standard_types() {
        let r = resolver();
        assert_eq!(r.resolve("https://cdn.example/a/foo.png").as_deref(), Some("image/png"));
        assert_eq!(r.resolve("https://cdn.example/index.html").as_deref(), Some("text/html"));
        assert_eq!(r.resolve("https://cdn.example/data.json").as_deref(), Some("application/json"));
        assert_eq!(r.resolve("https://cdn.example/FOO.PNG").as_deref(), Some("image/png"));
    }

    #[test]
    fn test_unityweb_override() {
        let r = resolver();
        assert_eq!(
            r.resolve("https://cdn.example/Build/model.unityweb").as_deref(),
            Some("application/octet-stream")
        );
        assert_eq!(
            r.resolve("https://cdn.example/Build/model.UnityWeb").as_deref(),
            Some("application/octet-stream")
        );
    }

    #[test]
    fn test_configured_override_beats_table() {
        let mut overrides = BTreeMap::new();
        overrides.insert(".png".to_string(), "application/x-custom".to_string());
        let r = ContentTypeResolver::new(&overrides);
        assert_eq!(r.resolve("http://x/a.png").as_deref(), Some("application/x-custom"));
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        let r = resolver();
        assert_eq!(r.resolve("https://cdn.example/blob.zzqqxx"), None);
        assert_eq!(r.resolve("https://cdn.example/README"), None);
        assert_eq!(r.resolve("https://cdn.example/.hidden"), None);
        assert_eq!(r.resolve("https://cdn.example/dir.d/"), None);
    }

    #[test]
    fn test_query_is_not_extension() {
        let r = resolver();
        assert_eq!(r.resolve("https://cdn.example/a.png?v=1.2").as_deref(), Some("image/png"));
    }
}
