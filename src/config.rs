//! Map configuration.
//!
//! Every setting has a default so the map works without a config file. A TOML
//! file can override any subset of fields, and a few fields can be overridden
//! again from the command line.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Published spreadsheet with the documentation points
pub const DEFAULT_POINTS_URL: &str =
    "https://docs.google.com/spreadsheets/d/1X55II1fEv9rnCIw9vZxN2x187o3k9irraoikggUFDo0/pub?output=csv";

/// Carto Positron basemap
pub const DEFAULT_TILE_URL: &str =
    "https://cartodb-basemaps-{s}.global.ssl.fastly.net/light_all/{z}/{x}/{y}{r}.png";

/// Upper bound for `markers.radius`, in metres or dots depending on style
pub const MAX_MARKER_RADIUS: f64 = 1e7;

/// Screen corner for overlay controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

/// Side of the screen the sidebar slides out from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Left,
    #[default]
    Right,
}

/// Basemap tile layer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Whether to fetch basemap tiles at all
    pub enabled: bool,
    /// URL template with `{s}`, `{z}`, `{x}`, `{y}` and `{r}` placeholders
    pub url_template: String,
    pub attribution: String,
    /// One subdomain per character, e.g. "abcd"
    pub subdomains: String,
    pub max_zoom: u8,
    /// Request high-density tiles (`{r}` becomes "@2x")
    pub retina: bool,
    /// Greyscale difference that counts as a visible edge
    pub edge_threshold: u8,
    pub max_cached_tiles: usize,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url_template: DEFAULT_TILE_URL.to_string(),
            attribution: "© OpenStreetMap © CartoDB".to_string(),
            subdomains: "abcd".to_string(),
            max_zoom: 19,
            retina: false,
            edge_threshold: 24,
            max_cached_tiles: 256,
        }
    }
}

/// Marker appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// "marker", "circleMarker" or "circle" (case-sensitive, falls back to "marker")
    pub style: String,
    /// Dots for "circleMarker", metres for "circle", ignored for "marker"
    pub radius: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            style: "marker".to_string(),
            radius: 100.0,
        }
    }
}

/// Detail sidebar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    pub panel_id: String,
    /// Title shown before any marker has been selected
    pub initial_title: String,
    pub position: Side,
    /// Panel width in terminal columns
    pub width: u16,
    pub close_button: bool,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            panel_id: "my-info-panel".to_string(),
            initial_title: "Ingen dokumentation vald".to_string(),
            position: Side::Right,
            width: 42,
            close_button: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    /// CSV export of the point spreadsheet
    pub points_url: String,
    pub request_timeout_secs: u64,
    /// Initial map centre as [latitude, longitude]
    pub center: [f64; 2],
    pub zoom: f64,
    pub zoom_control: Corner,
    pub tiles: TileConfig,
    pub markers: MarkerConfig,
    pub sidebar: SidebarConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: "Dokumentationskarta".to_string(),
            points_url: DEFAULT_POINTS_URL.to_string(),
            request_timeout_secs: 30,
            center: [62.5, 16.5],
            zoom: 6.0,
            zoom_control: Corner::BottomLeft,
            tiles: TileConfig::default(),
            markers: MarkerConfig::default(),
            sidebar: SidebarConfig::default(),
        }
    }
}

impl MapConfig {
    /// Platform config directory for this application.
    ///
    /// - Linux: `~/.config/tui-sheetmap/`
    /// - macOS: `~/Library/Application Support/tui-sheetmap/`
    /// - Windows: `%APPDATA%\tui-sheetmap\`
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tui-sheetmap"))
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration without validating it, so command line overrides
    /// can still be applied. Call [`MapConfig::validate`] afterwards.
    ///
    /// An explicit path must exist. Without one, the platform config file is
    /// used when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse a TOML config file without validating it
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Reject settings the map cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points_url.trim().is_empty() {
            return Err(ConfigError::Invalid("points_url must not be empty".into()));
        }
        if self.tiles.url_template.contains("{s}") && self.tiles.subdomains.is_empty() {
            return Err(ConfigError::Invalid(
                "tiles.subdomains must not be empty when the template uses {s}".into(),
            ));
        }
        if self.tiles.max_zoom > 24 {
            return Err(ConfigError::Invalid(format!(
                "tiles.max_zoom {} is above 24",
                self.tiles.max_zoom
            )));
        }
        if !self.center.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid("center must be finite".into()));
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(ConfigError::Invalid("zoom must be a positive number".into()));
        }
        let radius = self.markers.radius;
        if !(radius.is_finite() && radius > 0.0 && radius <= MAX_MARKER_RADIUS) {
            return Err(ConfigError::Invalid(format!(
                "markers.radius must be above 0 and at most {MAX_MARKER_RADIUS}"
            )));
        }
        if self.sidebar.width < 16 {
            return Err(ConfigError::Invalid(format!(
                "sidebar.width {} is below 16 columns",
                self.sidebar.width
            )));
        }
        Ok(())
    }
}
