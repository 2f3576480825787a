use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SnapshotError;

/// File name prefix shared by every snapshot in an inventory directory.
pub const FILE_PREFIX: &str = "ncov_counts_";

const FILE_EXT: &str = ".json";
const KEY_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One row of the published area statistics.
///
/// Province rows carry `provinceName` and a nested `cities` list; city rows
/// carry `cityName` only. Counters missing from the source read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province_short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(default)]
    pub confirmed_count: u64,
    #[serde(default)]
    pub suspected_count: u64,
    #[serde(default)]
    pub cured_count: u64,
    #[serde(default)]
    pub dead_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cities: Vec<RawStatRecord>,
}

impl RawStatRecord {
    /// Display name of the region this row describes.
    pub fn name(&self) -> &str {
        self.city_name
            .as_deref()
            .or(self.province_name.as_deref())
            .unwrap_or("")
    }
}

/// Sum of `confirmedCount` over top-level rows.
pub fn confirmed_total(records: &[RawStatRecord]) -> u64 {
    records
        .iter()
        .fold(0u64, |total, r| total.saturating_add(r.confirmed_count))
}

/// Second-granularity capture time, rendered as `YYYYMMDD-HHMMSS` local time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey(String);

impl SnapshotKey {
    /// Truncates `secs` to whole seconds and formats it in local time.
    pub fn from_epoch_secs(secs: f64) -> Result<Self, SnapshotError> {
        let whole = secs.floor();
        if !whole.is_finite() || whole < i64::MIN as f64 || whole > i64::MAX as f64 {
            return Err(SnapshotError::InvalidKey(format!("epoch {secs} out of range")));
        }
        let utc = DateTime::from_timestamp(whole as i64, 0)
            .ok_or_else(|| SnapshotError::InvalidKey(format!("epoch {secs} out of range")))?;
        let key = Self::from_datetime(&utc.with_timezone(&Local));
        // years past 9999 format with a sign and extra digits
        if !is_key_shaped(key.as_str()) {
            return Err(SnapshotError::InvalidKey(format!(
                "epoch {secs} formats as {key}, outside YYYYMMDD-HHMMSS"
            )));
        }
        Ok(key)
    }

    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        SnapshotKey(dt.format(KEY_FORMAT).to_string())
    }

    pub fn parse(s: &str) -> Result<Self, SnapshotError> {
        NaiveDateTime::parse_from_str(s, KEY_FORMAT)
            .map_err(|e| SnapshotError::InvalidKey(format!("{s:?}: {e}")))?;
        Ok(SnapshotKey(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `YYYYMMDD` component.
    pub fn date(&self) -> &str {
        &self.0[..8]
    }

    pub fn file_name(&self) -> String {
        format!("{FILE_PREFIX}{}{FILE_EXT}", self.0)
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_key_shaped(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'-'
        && bytes[..8].iter().chain(&bytes[9..]).all(u8::is_ascii_digit)
}

/// Splits a snapshot file name into its date and key components.
///
/// Returns `None` unless the name is the prefix followed by eight ASCII
/// digits and ends in `.json`. The key is everything between prefix and
/// extension, which is not required to be a well formed [`SnapshotKey`].
pub fn parse_file_name(name: &str) -> Option<(String, String)> {
    let rest = name.strip_prefix(FILE_PREFIX)?;
    let stem = rest.strip_suffix(FILE_EXT)?;
    let date = stem.get(..8)?;
    if !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((date.to_string(), stem.to_string()))
}

/// Writes `records` to `dir`, replacing any snapshot with the same key.
pub fn write_snapshot(
    dir: &Path,
    key: &SnapshotKey,
    records: &[RawStatRecord],
) -> Result<PathBuf, SnapshotError> {
    let path = dir.join(key.file_name());
    let body = serde_json::to_string_pretty(records).map_err(|source| SnapshotError::Json {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, body).map_err(|source| SnapshotError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn read_snapshot(path: &Path) -> Result<Vec<RawStatRecord>, SnapshotError> {
    let body = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })
}
