//! Snapshot fetcher.
//!
//! One fetch pulls the page text from a [`Source`], resolves the capture
//! time, extracts the area statistics and writes a new snapshot file.

pub mod source;

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{ExtractError, FetchError};
use crate::extract::{self, AREA_STAT_MARKER, TIMESTAMP_MARKER, TIMESTAMP_TERMINATOR};
use crate::snapshot::{self, RawStatRecord, SnapshotKey};
pub use source::{HttpSource, Source, StaticSource};

/// Where a snapshot's capture time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureClock {
    /// Declared by the page.
    Page,
    /// Page timestamp unusable, local clock at fetch time. Approximate.
    WallClock,
}

#[derive(Debug)]
pub struct Fetched {
    pub key: SnapshotKey,
    pub path: PathBuf,
    pub records: Vec<RawStatRecord>,
    pub clock: CaptureClock,
}

pub struct Fetcher<S> {
    source: S,
    dir: PathBuf,
}

impl<S: Source> Fetcher<S> {
    pub fn new(source: S, dir: impl Into<PathBuf>) -> Self {
        Fetcher {
            source,
            dir: dir.into(),
        }
    }

    pub fn fetch_snapshot(&self) -> Result<Fetched, FetchError> {
        info!("fetching {}", self.source.name());
        let text = self.source.fetch_text()?;
        let (key, clock) = resolve_key(&text);

        let span = extract::extract_object_array(&text, AREA_STAT_MARKER)?;
        let records: Vec<RawStatRecord> =
            serde_json::from_str(span).map_err(|e| ExtractError::Parse {
                marker: AREA_STAT_MARKER.to_string(),
                reason: e.to_string(),
            })?;

        let path = snapshot::write_snapshot(&self.dir, &key, &records)?;
        info!(
            "saved snapshot {key} with {} records to {}",
            records.len(),
            path.display()
        );

        Ok(Fetched {
            key,
            path,
            records,
            clock,
        })
    }
}

fn resolve_key(text: &str) -> (SnapshotKey, CaptureClock) {
    let declared = extract::extract_timestamp(text, TIMESTAMP_MARKER, TIMESTAMP_TERMINATOR)
        .map_err(|e| e.to_string())
        .and_then(|secs| SnapshotKey::from_epoch_secs(secs).map_err(|e| e.to_string()));

    match declared {
        Ok(key) => {
            info!("timestamp read from page: {key}");
            (key, CaptureClock::Page)
        }
        Err(reason) => {
            let key = SnapshotKey::now();
            warn!("timestamp unusable ({reason}), using current time {key}");
            (key, CaptureClock::WallClock)
        }
    }
}
