//! Request path matching for static mounts.
//!
//! # Responsibilities
//! - Match a mount prefix on segment boundaries (`/dataset` matches
//!   `/dataset` and `/dataset/x`, never `/datasets`)
//! - Strip the prefix to get the path relative to the mount root
//! - Reject dotfile segments, which are never served
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Matching runs on the raw (still percent-encoded) path; decoding and
//!   traversal checks belong to the file service

/// Matches a URL prefix and yields the remainder.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new prefix matcher. An empty prefix or `/` matches every path.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches('/').to_string();
        Self { prefix }
    }

    /// The path below the prefix, always starting with `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// True when any segment names a dotfile (`/.env`, `/a/.git/config`).
pub fn has_dotfile_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        segment.starts_with('.') || segment.to_ascii_lowercase().starts_with("%2e")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix() {
        let matcher = PathPrefixMatcher::new("/dataset");

        assert_eq!(matcher.strip("/dataset/uc.geojson"), Some("/uc.geojson"));
        assert_eq!(matcher.strip("/dataset/sad/a.csv"), Some("/sad/a.csv"));
        assert_eq!(matcher.strip("/dataset"), Some("/"));
        assert_eq!(matcher.strip("/dataset/"), Some("/"));
        assert_eq!(matcher.strip("/datasets/a.csv"), None);
        assert_eq!(matcher.strip("/img/a.png"), None);
    }

    #[test]
    fn test_case_sensitive() {
        let matcher = PathPrefixMatcher::new("/dataset");
        assert_eq!(matcher.strip("/DATASET/a.csv"), None);
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let matcher = PathPrefixMatcher::new("/");
        assert_eq!(matcher.strip("/index.html"), Some("/index.html"));
        assert_eq!(matcher.strip("/"), Some("/"));
    }

    #[test]
    fn test_dotfiles() {
        assert!(has_dotfile_segment("/.env"));
        assert!(has_dotfile_segment("/a/.git/config"));
        assert!(has_dotfile_segment("/%2Egit/HEAD"));
        assert!(!has_dotfile_segment("/dataset/uc.geojson"));
        assert!(!has_dotfile_segment("/"));
    }
}
