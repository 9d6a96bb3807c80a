//! Browser script generation.

use crate::service_worker::patterns::SwrPatterns;

const TEMPLATE: &str = include_str!("sw.js");

/// Render the service worker for `cache_name` and `patterns`.
pub fn render(cache_name: &str, patterns: &SwrPatterns) -> String {
    let regexes = patterns
        .iter()
        .map(|pattern| format!("new RegExp({})", js_string(pattern.source())))
        .collect::<Vec<_>>()
        .join(",\n  ");

    TEMPLATE
        .replace("__CACHE_NAME__", &js_string(cache_name))
        .replace("__SWR_PATHS__", &format!("[\n  {regexes}\n]"))
}

/// A JSON string literal is a valid JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let patterns = SwrPatterns::new("/dataset").unwrap();
        let script = render("gpx-sad-v1", &patterns);

        assert!(script.contains(r#"const CACHE = "gpx-sad-v1";"#));
        assert!(script.contains(r#"new RegExp("^https?://[^/]+/dataset/")"#));
        assert!(script.contains(r#"new RegExp("^https?://[a-d]\\.basemaps\\.cartocdn\\.com/")"#));
        assert!(script.contains(r#"new RegExp("^https?://.*tile\\.openstreetmap\\.org/")"#));
        assert!(script.contains("self.skipWaiting()"));
        assert!(script.contains("self.clients.claim()"));
        assert!(script.contains("ignoreVary: true"));
        assert!(!script.contains("__"));
    }

    #[test]
    fn test_cache_name_is_quoted() {
        let patterns = SwrPatterns::new("/dataset").unwrap();
        let script = render("v2\"; alert(1); \"", &patterns);
        assert!(script.contains(r#"const CACHE = "v2\"; alert(1); \"";"#));
    }
}
