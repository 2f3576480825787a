//! Dashboard data for one snapshot.
//!
//! Turns raw records into the tables a presentation layer draws from:
//! - a country table with one row per province
//! - one city table per province that publishes cities, with coordinates

pub mod json;
pub mod table;

use serde::Serialize;
use tracing::info;

use crate::error::GeocodeError;
use crate::geocode::{self, Coordinates, GeocodeCache, Geocoder};
use crate::snapshot::{self, RawStatRecord};

pub const COUNTRY_NAME: &str = "全国";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Counts {
    pub confirmed: u64,
    pub suspected: u64,
    pub cured: u64,
    pub dead: u64,
}

impl From<&RawStatRecord> for Counts {
    fn from(r: &RawStatRecord) -> Self {
        Counts {
            confirmed: r.confirmed_count,
            suspected: r.suspected_count,
            cured: r.cured_count,
            dead: r.dead_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvinceRow {
    pub province: String,
    #[serde(flatten)]
    pub counts: Counts,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityRow {
    pub city: String,
    #[serde(flatten)]
    pub counts: Counts,
    /// `None` when geocoding did not resolve the place.
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvinceCities {
    pub province: String,
    pub confirmed_total: u64,
    pub cities: Vec<CityRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub snapshot: String,
    pub country: String,
    pub confirmed_total: u64,
    pub provinces: Vec<ProvinceRow>,
    pub cities: Vec<ProvinceCities>,
}

/// Builds the tables. Coordinates are left unresolved.
pub fn prepare(snapshot_key: &str, records: &[RawStatRecord]) -> Dashboard {
    let provinces = records
        .iter()
        .map(|r| ProvinceRow {
            province: r.name().to_string(),
            counts: Counts::from(r),
        })
        .collect();

    let cities = records
        .iter()
        .filter(|r| !r.cities.is_empty())
        .map(|r| ProvinceCities {
            province: r.name().to_string(),
            confirmed_total: snapshot::confirmed_total(&r.cities),
            cities: r
                .cities
                .iter()
                .map(|c| CityRow {
                    city: c.name().to_string(),
                    counts: Counts::from(c),
                    coordinates: None,
                })
                .collect(),
        })
        .collect();

    Dashboard {
        snapshot: snapshot_key.to_string(),
        country: COUNTRY_NAME.to_string(),
        confirmed_total: snapshot::confirmed_total(records),
        provinces,
        cities,
    }
}

/// Resolves every city through `cache`, then persists the cache once.
/// Returns how many cities stayed unresolved.
pub fn attach_coordinates<G: Geocoder>(
    dashboard: &mut Dashboard,
    cache: &mut GeocodeCache<G>,
) -> Result<usize, GeocodeError> {
    let mut unresolved = 0;
    for province in &mut dashboard.cities {
        for city in &mut province.cities {
            city.coordinates = cache.resolve(&geocode::place_key(&province.province, &city.city));
            if city.coordinates.is_none() {
                unresolved += 1;
            }
        }
    }

    if cache.is_dirty() {
        cache.persist()?;
    }
    if unresolved > 0 {
        info!("{unresolved} cities without coordinates");
    }
    Ok(unresolved)
}

/// Mean position of resolved cities, the natural map center.
pub fn map_center(dashboard: &Dashboard) -> Option<Coordinates> {
    let resolved: Vec<Coordinates> = dashboard
        .cities
        .iter()
        .flat_map(|p| p.cities.iter())
        .filter_map(|c| c.coordinates)
        .collect();

    if resolved.is_empty() {
        return None;
    }
    let n = resolved.len() as f64;
    Some(Coordinates {
        latitude: resolved.iter().map(|c| c.latitude).sum::<f64>() / n,
        longitude: resolved.iter().map(|c| c.longitude).sum::<f64>() / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<&'static str, Coordinates>);

    impl Geocoder for Fixed {
        fn lookup(&self, place: &str) -> Result<Coordinates, GeocodeError> {
            self.0.get(place).copied().ok_or_else(|| GeocodeError::LookupFailed {
                place: place.to_string(),
                reason: "no match".to_string(),
            })
        }
    }

    fn records() -> Vec<RawStatRecord> {
        serde_json::from_str(
            r#"[
            {"provinceName":"湖北省","confirmedCount":30,"curedCount":2,"deadCount":1,
             "cities":[{"cityName":"武汉","confirmedCount":20},{"cityName":"黄冈","confirmedCount":10}]},
            {"provinceName":"西藏自治区","confirmedCount":1}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn country_table_has_every_province() {
        let dashboard = prepare("20200201-080000", &records());
        assert_eq!(dashboard.provinces.len(), 2);
        assert_eq!(dashboard.confirmed_total, 31);
        assert_eq!(dashboard.provinces[0].counts.dead, 1);
    }

    #[test]
    fn provinces_without_cities_are_skipped() {
        let dashboard = prepare("20200201-080000", &records());
        assert_eq!(dashboard.cities.len(), 1);
        assert_eq!(dashboard.cities[0].province, "湖北省");
        assert_eq!(dashboard.cities[0].confirmed_total, 30);
    }

    #[test]
    fn unresolved_cities_stay_none_and_cache_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        let geocoder = Fixed(HashMap::from([(
            "湖北省 武汉",
            Coordinates { latitude: 30.0, longitude: 114.0 },
        )]));
        let mut cache = GeocodeCache::load(&path, geocoder);
        let mut dashboard = prepare("20200201-080000", &records());

        let unresolved = attach_coordinates(&mut dashboard, &mut cache).unwrap();

        assert_eq!(unresolved, 1);
        let cities = &dashboard.cities[0].cities;
        assert!(cities[0].coordinates.is_some());
        assert!(cities[1].coordinates.is_none());
        assert!(path.exists());
        assert_eq!(map_center(&dashboard), Some(Coordinates { latitude: 30.0, longitude: 114.0 }));
    }

    #[test]
    fn no_coordinates_no_center() {
        assert!(map_center(&prepare("k", &records())).is_none());
    }
}
