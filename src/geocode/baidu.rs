//! Baidu Maps geocoding v3 client.
//!
//! `GET {endpoint}?address=<place>&output=json&ak=<key>` answers
//! `{"status": 0, "result": {"location": {"lng": .., "lat": ..}}}`.
//! Any non-zero status (bad key, quota, no match) is a failed lookup.

use serde::Deserialize;
use tracing::debug;

use super::{Coordinates, Geocoder};
use crate::config::GeocodeConfig;
use crate::error::GeocodeError;
use crate::net;

pub struct BaiduGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    retries: u32,
}

#[derive(Deserialize)]
struct Reply {
    status: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    result: Option<ReplyResult>,
}

#[derive(Deserialize)]
struct ReplyResult {
    location: Option<Location>,
}

#[derive(Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl BaiduGeocoder {
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let client = net::client(config.timeout).map_err(|e| GeocodeError::LookupFailed {
            place: String::new(),
            reason: format!("cannot build http client: {e}"),
        })?;
        Ok(BaiduGeocoder {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            retries: config.retries,
        })
    }
}

impl Geocoder for BaiduGeocoder {
    fn lookup(&self, place: &str) -> Result<Coordinates, GeocodeError> {
        let failed = |reason: String| GeocodeError::LookupFailed {
            place: place.to_string(),
            reason,
        };

        if self.api_key.is_empty() {
            return Err(failed("no geocode api_key configured".to_string()));
        }

        let response = net::with_retry(place, self.retries, || {
            self.client
                .get(&self.endpoint)
                .query(&[("address", place), ("output", "json"), ("ak", self.api_key.as_str())])
                .send()
        })
        .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("http status {}", status.as_u16())));
        }

        let reply: Reply = response.json().map_err(|e| failed(e.to_string()))?;
        debug!("geocode {place}: status {}", reply.status);
        coordinates_from(reply).map_err(failed)
    }
}

fn coordinates_from(reply: Reply) -> Result<Coordinates, String> {
    if reply.status != 0 {
        let detail = reply.message.or(reply.msg).unwrap_or_default();
        return Err(format!("service status {} {detail}", reply.status).trim_end().to_string());
    }
    let location = reply
        .result
        .and_then(|r| r.location)
        .ok_or_else(|| "no location in reply".to_string())?;
    Ok(Coordinates {
        latitude: location.lat,
        longitude: location.lng,
    })
}
