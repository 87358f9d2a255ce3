use crate::error::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Highest zoom level a basemap or the settings may ask for.
pub const MAX_ZOOM_LEVEL: u8 = 20;

/// Initial view and basemap choices for a map element.
///
/// Keys are camelCase on disk so a settings file reads like the
/// `mapSettings` object a host page would hand to the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: u8,
    #[serde(default)]
    pub basemaps: Vec<Basemap>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basemap {
    pub url: String,
    #[serde(default)]
    pub min_zoom: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<u8>,
    #[serde(default)]
    pub attribution: String,
    pub name: String,
}

impl MapSettings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: MapSettings =
            serde_json::from_str(json).map_err(|e| MapError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    pub fn validate(&self) -> Result<()> {
        let [lat, lon] = self.center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(MapError::Settings(format!(
                "center [{lat}, {lon}] is outside [-90..90, -180..180]"
            )));
        }
        if self.zoom > MAX_ZOOM_LEVEL {
            return Err(MapError::Settings(format!(
                "zoom {} exceeds {MAX_ZOOM_LEVEL}",
                self.zoom
            )));
        }
        for basemap in &self.basemaps {
            if let Some(max) = basemap.max_zoom {
                if max < basemap.min_zoom {
                    return Err(MapError::Settings(format!(
                        "basemap {:?} has maxZoom {max} below minZoom {}",
                        basemap.name, basemap.min_zoom
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: [52.505, -0.09],
            zoom: 13,
            basemaps: vec![
                Basemap {
                    url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
                    min_zoom: 4,
                    max_zoom: None,
                    attribution: "&copy; <a href=\"http://www.openstreetmap.org/copyright\">OpenStreetMap</a>".to_string(),
                    name: "Straatkaart".to_string(),
                },
                Basemap {
                    url: "https://cartodb-basemaps-{s}.global.ssl.fastly.net/light_all/{z}/{x}/{y}.png".to_string(),
                    min_zoom: 4,
                    max_zoom: Some(20),
                    attribution: "&copy; <a href=\"http://www.openstreetmap.org/copyright\">OpenStreetMap</a>, &copy;<a href=\"https://carto.com/attribution\">CARTO</a>".to_string(),
                    name: "Grijze kaart".to_string(),
                },
            ],
        }
    }
}

impl Basemap {
    /// Attribution with markup stripped, for the status bar.
    pub fn plain_attribution(&self) -> String {
        let mut out = String::with_capacity(self.attribution.len());
        let mut in_tag = false;
        for ch in self.attribution.chars() {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => out.push(ch),
                _ => {}
            }
        }
        out.replace("&copy;", "©")
    }

    /// Clamp a zoom level into this basemap's range
    pub fn clamp_zoom(&self, level: u8) -> u8 {
        let max = self.max_zoom.unwrap_or(MAX_ZOOM_LEVEL);
        level.clamp(self.min_zoom.min(max), max)
    }
}
