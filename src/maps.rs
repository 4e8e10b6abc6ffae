//! Per-map metadata: heatmap scale factors and display names.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Metadata for one map, as carried in `maps.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapInfo {
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub scale: f64,
}

/// Lookup of map name to scale and display name.
///
/// An unknown map has scale zero, which the decoder treats as "position
/// data untrustworthy" and disables heatmap bucketing for the round.
#[derive(Debug, Clone, Default)]
pub struct MapRegistry {
    maps: IndexMap<String, MapInfo>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let maps: IndexMap<String, MapInfo> =
            serde_json::from_str(data).map_err(|e| Error::MalformedStats(e.to_string()))?;
        Ok(Self { maps })
    }

    /// Load from disk; a missing or unreadable file yields an empty
    /// registry so parsing can proceed without heatmaps.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path).map_err(Error::from).and_then(|s| Self::from_json(&s)) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "map registry unavailable");
                Self::new()
            }
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, info: MapInfo) {
        self.maps.insert(name.into(), info);
    }

    pub fn scale(&self, map: &str) -> f64 {
        self.maps.get(map).map(|m| m.scale).unwrap_or(0.0)
    }

    pub fn display_name<'a>(&'a self, map: &'a str) -> &'a str {
        self.maps
            .get(map)
            .and_then(|m| m.display_name.as_deref())
            .unwrap_or(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let registry = MapRegistry::from_json(
            r#"{
                "Muttrah_City": { "displayName": "Muttrah City", "scale": 2 },
                "Kashan_Desert": { "scale": 4 }
            }"#,
        )
        .unwrap();

        assert_eq!(registry.scale("Muttrah_City"), 2.0);
        assert_eq!(registry.display_name("Muttrah_City"), "Muttrah City");
        assert_eq!(registry.display_name("Kashan_Desert"), "Kashan_Desert");
    }

    #[test]
    fn test_unknown_map_defaults() {
        let registry = MapRegistry::new();
        assert_eq!(registry.scale("nowhere"), 0.0);
        assert_eq!(registry.display_name("nowhere"), "nowhere");
    }
}
