//! Error types for dataset ingestion, basemap tiles and configuration

use thiserror::Error;

/// Failure to obtain the point dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Transport failure, including timeouts
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("server responded with {0}")]
    Status(reqwest::StatusCode),

    /// Body was not readable CSV
    #[error("malformed CSV: {0}")]
    Parse(#[from] csv::Error),
}

/// Failure to obtain one basemap tile
#[derive(Error, Debug)]
pub enum TileError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("tile server responded with {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to decode tile: {0}")]
    Decode(#[from] image::ImageError),
}

/// Invalid or unreadable configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
