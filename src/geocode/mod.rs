//! Place name to coordinate lookup with a persisted cache.
//!
//! The in-memory table is authoritative for a session. Disk is read once by
//! [`GeocodeCache::load`] and rewritten whole by [`GeocodeCache::persist`],
//! which callers run once after a batch of lookups.

pub mod baidu;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::GeocodeError;
pub use baidu::BaiduGeocoder;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// An external service resolving place names.
pub trait Geocoder {
    fn lookup(&self, place: &str) -> Result<Coordinates, GeocodeError>;
}

/// Cache key for a city: province and city display names joined by a space.
pub fn place_key(province: &str, city: &str) -> String {
    format!("{province} {city}")
}

pub struct GeocodeCache<G> {
    path: PathBuf,
    table: BTreeMap<String, Coordinates>,
    geocoder: G,
    dirty: bool,
}

impl<G: Geocoder> GeocodeCache<G> {
    /// Reads the cache file. Missing or corrupt files give an empty cache.
    pub fn load(path: impl Into<PathBuf>, geocoder: G) -> Self {
        let path = path.into();
        let table = match read_table(&path) {
            Ok(Some(table)) => {
                info!("geocode cache loaded {} places from {}", table.len(), path.display());
                table
            }
            Ok(None) => {
                warn!("geocode cache {} not found, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("geocode cache unusable, starting empty: {e}");
                BTreeMap::new()
            }
        };

        GeocodeCache {
            path,
            table,
            geocoder,
            dirty: false,
        }
    }

    /// Cached coordinates for `place`, or one lookup on a miss.
    /// `None` means unresolved; nothing is cached for it.
    pub fn resolve(&mut self, place: &str) -> Option<Coordinates> {
        if let Some(coords) = self.table.get(place) {
            return Some(*coords);
        }

        info!("search online: {place}");
        match self.geocoder.lookup(place) {
            Ok(coords) => {
                self.table.insert(place.to_string(), coords);
                self.dirty = true;
                Some(coords)
            }
            Err(e) => {
                error!("geocode {place}: {e}");
                None
            }
        }
    }

    pub fn get(&self, place: &str) -> Option<Coordinates> {
        self.table.get(place).copied()
    }

    /// Writes the whole table, replacing the previous file.
    pub fn persist(&mut self) -> Result<(), GeocodeError> {
        let body = serde_json::to_string_pretty(&self.table).map_err(|source| GeocodeError::Json {
            path: self.path.clone(),
            source,
        })?;
        let io_err = |source: std::io::Error| GeocodeError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        info!("geocode cache saved {} places to {}", self.table.len(), self.path.display());
        self.dirty = false;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// True when lookups have added entries since the last load or persist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn places(&self) -> impl Iterator<Item = (&str, Coordinates)> {
        self.table.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

fn read_table(path: &Path) -> Result<Option<BTreeMap<String, Coordinates>>, GeocodeError> {
    let body = match std::fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(GeocodeError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|source| GeocodeError::Json {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counting {
        calls: Cell<usize>,
        fail: bool,
    }

    impl Counting {
        fn ok() -> Self {
            Counting { calls: Cell::new(0), fail: false }
        }

        fn failing() -> Self {
            Counting { calls: Cell::new(0), fail: true }
        }
    }

    impl Geocoder for &Counting {
        fn lookup(&self, place: &str) -> Result<Coordinates, GeocodeError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(GeocodeError::LookupFailed {
                    place: place.to_string(),
                    reason: "quota exceeded".to_string(),
                });
            }
            Ok(Coordinates { latitude: 30.5, longitude: 114.3 })
        }
    }

    #[test]
    fn second_resolve_is_a_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let geocoder = Counting::ok();
        let mut cache = GeocodeCache::load(dir.path().join("memory.json"), &geocoder);

        let first = cache.resolve("湖北省 武汉");
        let second = cache.resolve("湖北省 武汉");

        assert_eq!(first, second);
        assert_eq!(geocoder.calls.get(), 1);
        assert!(cache.is_dirty());
    }

    #[test]
    fn failed_lookup_caches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let geocoder = Counting::failing();
        let mut cache = GeocodeCache::load(dir.path().join("memory.json"), &geocoder);

        assert_eq!(cache.resolve("nowhere"), None);
        assert!(cache.is_empty());
        assert!(!cache.is_dirty());

        assert_eq!(cache.resolve("nowhere"), None);
        assert_eq!(geocoder.calls.get(), 2);
    }

    #[test]
    fn persist_then_load_serves_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo").join("memory.json");

        let geocoder = Counting::ok();
        let mut cache = GeocodeCache::load(&path, &geocoder);
        cache.resolve("浙江省 杭州");
        cache.persist().unwrap();
        assert!(!cache.is_dirty());

        let reloaded_geocoder = Counting::failing();
        let mut reloaded = GeocodeCache::load(&path, &reloaded_geocoder);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.resolve("浙江省 杭州"),
            Some(Coordinates { latitude: 30.5, longitude: 114.3 })
        );
        assert_eq!(reloaded_geocoder.calls.get(), 0);
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "{ broken").unwrap();

        let geocoder = Counting::ok();
        let cache = GeocodeCache::load(&path, &geocoder);
        assert!(cache.is_empty());

        let err = read_table(&path).unwrap_err();
        assert!(matches!(&err, GeocodeError::Json { path: p, .. } if p == &path));
        assert!(err.to_string().contains("memory.json"));
    }

    #[test]
    fn places_lists_table_in_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(
            &path,
            r#"{"b c": {"latitude": 2.0, "longitude": 3.0}, "a b": {"latitude": 1.0, "longitude": 2.0}}"#,
        )
        .unwrap();

        let geocoder = Counting::failing();
        let cache = GeocodeCache::load(&path, &geocoder);
        let names: Vec<_> = cache.places().map(|(place, _)| place).collect();
        assert_eq!(names, ["a b", "b c"]);
        assert_eq!(cache.path(), path.as_path());
    }

    #[test]
    fn file_format_is_place_to_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, r#"{"a b": {"latitude": 1.5, "longitude": 2.5}}"#).unwrap();

        let geocoder = Counting::failing();
        let cache = GeocodeCache::load(&path, &geocoder);
        assert_eq!(cache.get("a b"), Some(Coordinates { latitude: 1.5, longitude: 2.5 }));
    }

    #[test]
    fn place_key_joins_with_space() {
        assert_eq!(place_key("湖北省", "武汉"), "湖北省 武汉");
    }
}
