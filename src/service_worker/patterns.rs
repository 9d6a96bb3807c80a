//! URL patterns the service worker caches with stale-while-revalidate.
//!
//! The same regex sources drive the Rust model and are embedded in the
//! generated browser script, so both sides classify URLs identically.

use regex::Regex;

/// Lettered Carto basemap subdomains (`a` to `d`).
pub const CARTO_BASEMAPS: &str = r"^https?://[a-d]\.basemaps\.cartocdn\.com/";

/// OpenStreetMap tile servers (`a.tile.`, `tile.` ...).
pub const OSM_TILES: &str = r"^https?://.*tile\.openstreetmap\.org/";

#[derive(Debug, Clone)]
pub struct SwrPattern {
    name: &'static str,
    regex: Regex,
}

impl SwrPattern {
    fn new(name: &'static str, source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(source)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The regex source, valid both for `regex` and JavaScript `RegExp`.
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }
}

/// The tracked pattern set: dataset files on any origin plus map tiles.
#[derive(Debug, Clone)]
pub struct SwrPatterns {
    patterns: Vec<SwrPattern>,
}

impl SwrPatterns {
    pub fn new(dataset_prefix: &str) -> Result<Self, regex::Error> {
        let dataset = format!(
            "^https?://[^/]+{}/",
            regex::escape(dataset_prefix.trim_end_matches('/'))
        );

        Ok(Self {
            patterns: vec![
                SwrPattern::new("dataset", &dataset)?,
                SwrPattern::new("carto", CARTO_BASEMAPS)?,
                SwrPattern::new("osm", OSM_TILES)?,
            ],
        })
    }

    /// Name of the first pattern matching `url`.
    pub fn classify(&self, url: &str) -> Option<&'static str> {
        self.patterns
            .iter()
            .find(|pattern| pattern.regex.is_match(url))
            .map(SwrPattern::name)
    }

    pub fn matches(&self, url: &str) -> bool {
        self.classify(url).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SwrPattern> {
        self.patterns.iter()
    }
}
