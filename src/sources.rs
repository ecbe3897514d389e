//! Payload shapes of the upstream air-quality feeds.
//!
//! Field names follow the external JSON exactly. Numeric fields that are
//! missing deserialize to 0 and strings to empty, so a partial record never
//! fails the whole batch.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OpenAqCoordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OpenAqDate {
    #[serde(default)]
    pub utc: String,
    #[serde(default)]
    pub local: String,
}

/// One pollutant reading from OpenAQ `/measurements`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAqMeasurement {
    #[serde(default)]
    pub location_id: i64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub parameter: String,
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub coordinates: Option<OpenAqCoordinates>,
    pub date: Option<OpenAqDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAqResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// One location from OpenAQ `/latest`, carrying its own measurement list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpenAqLatestResult {
    pub id: Option<i64>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<OpenAqCoordinates>,
    #[serde(default)]
    pub measurements: Vec<OpenAqLatestMeasurement>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAqLatestMeasurement {
    #[serde(default)]
    pub parameter: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AirNowCategory {
    #[serde(rename = "Number", default)]
    pub number: i32,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// One reporting-area observation from EPA AirNow.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AirNowObservation {
    #[serde(default)]
    pub date_observed: String,
    #[serde(default)]
    pub hour_observed: i32,
    #[serde(default)]
    pub local_time_zone: String,
    #[serde(default)]
    pub reporting_area: String,
    #[serde(default)]
    pub state_code: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub parameter_name: String,
    #[serde(rename = "AQI", default)]
    pub aqi: i32,
    #[serde(default)]
    pub category_name: String,
    /// The live API nests the category; older payloads flatten it into `CategoryName`.
    pub category: Option<AirNowCategory>,
}

impl AirNowObservation {
    /// Reported category label, `None` if the payload carried none.
    pub fn reported_category(&self) -> Option<&str> {
        if !self.category_name.is_empty() {
            return Some(&self.category_name);
        }
        self.category
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// A TolNet site: total ozone column in Dobson units and NO2 column in molecules/cm².
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TolNetSite {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub ozone_column: f64,
    #[serde(default)]
    pub no2_column: f64,
}

struct TolNetSeed {
    site: &'static str,
    latitude: f64,
    longitude: f64,
    ozone_base: f64,
    ozone_spread: f64,
    no2_base: f64,
    no2_spread: f64,
}

const TOLNET_SITES: [TolNetSeed; 4] = [
    TolNetSeed {
        site: "GSFC",
        latitude: 38.9967,
        longitude: -76.8397,
        ozone_base: 320.0,
        ozone_spread: 40.0,
        no2_base: 2.1,
        no2_spread: 0.5,
    },
    TolNetSeed {
        site: "JPL",
        latitude: 34.2048,
        longitude: -118.1712,
        ozone_base: 310.0,
        ozone_spread: 30.0,
        no2_base: 1.8,
        no2_spread: 0.4,
    },
    TolNetSeed {
        site: "Huntsville",
        latitude: 34.7304,
        longitude: -86.5861,
        ozone_base: 315.0,
        ozone_spread: 35.0,
        no2_base: 1.9,
        no2_spread: 0.3,
    },
    TolNetSeed {
        site: "Boulder",
        latitude: 40.0150,
        longitude: -105.2705,
        ozone_base: 325.0,
        ozone_spread: 25.0,
        no2_base: 2.0,
        no2_spread: 0.6,
    },
];

/// The TolNet feed is simulated: fixed sites with randomized column values.
pub fn simulated_tolnet_sites(now: DateTime<Utc>) -> Vec<TolNetSite> {
    let mut rng = rand::thread_rng();
    let date = now.to_rfc3339();

    TOLNET_SITES
        .iter()
        .map(|seed| TolNetSite {
            site: seed.site.to_string(),
            latitude: seed.latitude,
            longitude: seed.longitude,
            date: date.clone(),
            ozone_column: seed.ozone_base + rng.gen::<f64>() * seed.ozone_spread,
            no2_column: (seed.no2_base + rng.gen::<f64>() * seed.no2_spread) * 1e15,
        })
        .collect()
}
