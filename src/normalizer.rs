use crate::aqi::{linear_approximation_aqi, satellite_proxy_aqi, AqiMethod};
use crate::category::category;
use crate::model::{Coordinates, Pollutant, PollutantReading, Station, WeatherSnapshot};
use crate::sources::{
    AirNowObservation, OpenAqCoordinates, OpenAqDate, OpenAqLatestResult, OpenAqMeasurement,
    TolNetSite,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Fractions of the reported AQI used as pollutant placeholders for AirNow
/// stations, ordered pm25, pm10, o3, no2, so2, co. These are estimates, not
/// measurements.
const AIRNOW_PLACEHOLDER_FRACTIONS: [f64; 6] = [0.4, 0.6, 0.5, 0.3, 0.2, 0.01];

const TOLNET_OZONE_DIVISOR: f64 = 10.0;
const TOLNET_NO2_DIVISOR: f64 = 1e13;

/// Per-source caps applied when merging feeds into one station list.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MergeLimits {
    #[serde(default = "default_openaq_limit")]
    pub openaq: usize,
    #[serde(default = "default_airnow_limit")]
    pub airnow: usize,
    #[serde(default)]
    pub tolnet: Option<usize>,
}

fn default_openaq_limit() -> usize {
    15
}

fn default_airnow_limit() -> usize {
    10
}

impl Default for MergeLimits {
    fn default() -> Self {
        Self {
            openaq: default_openaq_limit(),
            airnow: default_airnow_limit(),
            tolnet: None,
        }
    }
}

/// Raw payloads from one refresh, before normalization.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub openaq: Vec<OpenAqMeasurement>,
    pub airnow: Vec<AirNowObservation>,
    pub tolnet: Vec<TolNetSite>,
}

impl SourceBatch {
    pub fn is_empty(&self) -> bool {
        self.openaq.is_empty() && self.airnow.is_empty() && self.tolnet.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeStats {
    pub total_records: usize,
    pub stations: usize,
    pub skipped_no_coordinates: usize,
    pub unknown_parameters: usize,
}

/// Groups OpenAQ measurements into stations keyed by (location, latitude, longitude).
pub fn from_openaq(measurements: &[OpenAqMeasurement]) -> Vec<Station> {
    from_openaq_with_stats(measurements).0
}

pub fn from_openaq_with_stats(measurements: &[OpenAqMeasurement]) -> (Vec<Station>, NormalizeStats) {
    let mut stats = NormalizeStats {
        total_records: measurements.len(),
        ..Default::default()
    };
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stations: Vec<Station> = Vec::new();

    for m in measurements {
        let Some((lat, lon)) = usable_coordinates(m.coordinates.as_ref()) else {
            stats.skipped_no_coordinates += 1;
            continue;
        };

        let key = format!("{}-{}-{}", m.location, lat, lon);
        let slot = *index.entry(key).or_insert_with(|| {
            stations.push(new_openaq_station(m, lat, lon));
            stations.len() - 1
        });

        match m.parameter.parse::<Pollutant>() {
            Ok(pollutant) => stations[slot]
                .pollutants
                .set(pollutant, m.value.unwrap_or(0.0)),
            Err(e) => {
                stats.unknown_parameters += 1;
                debug!("Ignoring measurement at {}: {}", m.location, e);
            }
        }
    }

    for station in &mut stations {
        station.aqi = linear_approximation_aqi(&station.pollutants);
        station.level = category(station.aqi).to_string();
    }

    stats.stations = stations.len();
    debug!(
        "Normalized {} OpenAQ records into {} stations ({} without coordinates, {} unknown parameters)",
        stats.total_records, stats.stations, stats.skipped_no_coordinates, stats.unknown_parameters
    );
    (stations, stats)
}

/// Latitude and longitude must both be present, finite and non-zero.
fn usable_coordinates(coordinates: Option<&OpenAqCoordinates>) -> Option<(f64, f64)> {
    let c = coordinates?;
    let lat = c.latitude.filter(|v| v.is_finite() && *v != 0.0)?;
    let lon = c.longitude.filter(|v| v.is_finite() && *v != 0.0)?;
    Some((lat, lon))
}

fn new_openaq_station(m: &OpenAqMeasurement, lat: f64, lon: f64) -> Station {
    let name = if m.location.is_empty() {
        "Unknown Station".to_string()
    } else {
        m.location.clone()
    };
    let city = non_empty(m.city.as_deref()).unwrap_or("Unknown");
    let country = non_empty(m.country.as_deref()).unwrap_or("US");

    Station {
        id: m.location_id.to_string(),
        name,
        location: format!("{}, {}", city, country),
        coordinates: Coordinates(lat, lon),
        pollutants: PollutantReading::default(),
        aqi: 0,
        level: String::new(),
        weather: WeatherSnapshot::default(),
        method: AqiMethod::LinearApproximation,
        last_updated: m.date.as_ref().and_then(|d| parse_timestamp(&d.utc)),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Placeholder breakdown derived from a reported AQI.
pub fn placeholder_from_reported_aqi(aqi: i32) -> PollutantReading {
    let aqi = f64::from(aqi);
    let [pm25, pm10, o3, no2, so2, co] = AIRNOW_PLACEHOLDER_FRACTIONS.map(|f| aqi * f);
    PollutantReading {
        pm25,
        pm10,
        o3,
        no2,
        so2,
        co,
    }
}

/// AirNow observations carry their own AQI and category; both pass through.
pub fn from_airnow(observations: &[AirNowObservation]) -> Vec<Station> {
    observations
        .iter()
        .enumerate()
        .map(|(idx, obs)| Station {
            id: format!("epa-{}", idx),
            name: obs.reporting_area.clone(),
            location: format!("{}, {}", obs.reporting_area, obs.state_code),
            coordinates: Coordinates(obs.latitude, obs.longitude),
            pollutants: placeholder_from_reported_aqi(obs.aqi),
            aqi: obs.aqi,
            level: obs
                .reported_category()
                .unwrap_or_else(|| category(obs.aqi))
                .to_string(),
            weather: WeatherSnapshot::default(),
            method: AqiMethod::Reported,
            last_updated: None,
        })
        .collect()
}

/// TolNet column densities converted with fixed proxy divisors.
pub fn from_tolnet(sites: &[TolNetSite]) -> Vec<Station> {
    sites
        .iter()
        .enumerate()
        .map(|(idx, site)| {
            let aqi = satellite_proxy_aqi(site.ozone_column);
            Station {
                id: format!("tolnet-{}", idx),
                name: format!("NASA TolNet {}", site.site),
                location: format!("{} Observatory", site.site),
                coordinates: Coordinates(site.latitude, site.longitude),
                pollutants: PollutantReading {
                    o3: site.ozone_column / TOLNET_OZONE_DIVISOR,
                    no2: site.no2_column / TOLNET_NO2_DIVISOR,
                    ..Default::default()
                },
                aqi,
                level: category(aqi).to_string(),
                weather: WeatherSnapshot::default(),
                method: AqiMethod::SatelliteProxy,
                last_updated: parse_timestamp(&site.date),
            }
        })
        .collect()
}

/// Concatenates the sources in order, each truncated to its cap. Stations at
/// the same coordinates from different feeds are all kept. An empty result
/// falls back to the built-in list.
pub fn merge_sources(
    openaq: Vec<Station>,
    airnow: Vec<Station>,
    tolnet: Vec<Station>,
    limits: &MergeLimits,
) -> Vec<Station> {
    let tolnet_cap = limits.tolnet.unwrap_or(usize::MAX);
    let merged: Vec<Station> = openaq
        .into_iter()
        .take(limits.openaq)
        .chain(airnow.into_iter().take(limits.airnow))
        .chain(tolnet.into_iter().take(tolnet_cap))
        .collect();

    if merged.is_empty() {
        info!("No live stations available, using built-in station list");
        return crate::stations::builtin_stations();
    }

    info!("Merged {} live stations", merged.len());
    merged
}

pub fn normalize_batch(batch: &SourceBatch, limits: &MergeLimits) -> Vec<Station> {
    merge_sources(
        from_openaq(&batch.openaq),
        from_airnow(&batch.airnow),
        from_tolnet(&batch.tolnet),
        limits,
    )
}

/// Flattens OpenAQ `/latest` results into one record per measurement.
pub fn flatten_latest(results: &[OpenAqLatestResult], now: DateTime<Utc>) -> Vec<OpenAqMeasurement> {
    let fallback_date = now.to_rfc3339();
    let mut flattened = Vec::new();

    for r in results {
        for m in &r.measurements {
            let location = non_empty(r.location.as_deref())
                .or_else(|| non_empty(Some(m.parameter.as_str())))
                .unwrap_or("Unknown");
            let date = m
                .last_updated
                .clone()
                .unwrap_or_else(|| fallback_date.clone());

            flattened.push(OpenAqMeasurement {
                location_id: r.id.unwrap_or(0),
                location: location.to_string(),
                parameter: m.parameter.clone(),
                value: m.value,
                unit: m.unit.clone().unwrap_or_default(),
                country: Some(
                    non_empty(r.country.as_deref())
                        .unwrap_or("US")
                        .to_string(),
                ),
                city: Some(r.city.clone().unwrap_or_default()),
                coordinates: Some(r.coordinates.clone().unwrap_or(OpenAqCoordinates {
                    latitude: Some(0.0),
                    longitude: Some(0.0),
                })),
                date: Some(OpenAqDate {
                    utc: date.clone(),
                    local: date,
                }),
            });
        }
    }

    flattened
}
