//! Error types for every fallible component.
//!
//! Each component returns its own enum so callers can tell a missing marker
//! from a broken bracket span or a failed geocode without string matching.

use std::path::PathBuf;

/// Failures while pulling a payload out of page text.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("marker not found: {marker}")]
    NotFound { marker: String },

    #[error("malformed input after {marker}: {reason}")]
    Malformed { marker: String, reason: String },

    #[error("parse error after {marker}: {reason}")]
    Parse { marker: String, reason: String },
}

/// Failures reading or writing a snapshot file.
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot json error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid snapshot key: {0}")]
    InvalidKey(String),
}

/// Failures of one fetch attempt.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("http request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Failures of inventory operations.
#[derive(thiserror::Error, Debug)]
pub enum InventoryError {
    #[error("index {index} out of range for inventory of {len} entries")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("cannot scan inventory directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("update failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Failures of the geocode cache and geocoders.
#[derive(thiserror::Error, Debug)]
pub enum GeocodeError {
    #[error("lookup failed for {place}: {reason}")]
    LookupFailed { place: String, reason: String },

    #[error("geocode cache io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("geocode cache json error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures loading the configuration file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid duration {value:?} for {field}: {reason}")]
    Duration {
        field: &'static str,
        value: String,
        reason: String,
    },
}
