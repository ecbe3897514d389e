//! Regional and country aggregation.
//!
//! Two aggregation variants compute their AQI differently and are kept that
//! way: bounding-box regions average the member stations' AQI values, while
//! the country report recomputes the index from averaged concentrations with
//! the breakpoint tables.

use crate::aqi::{overall_aqi, station_mean_aqi, AqiMethod};
use crate::category::category;
use crate::model::{
    non_negative, round_to, Coordinates, CountrySummary, Pollutant, PollutantReading,
    RegionSummary, Station, WeatherSnapshot,
};
use crate::sources::OpenAqMeasurement;
use std::collections::HashMap;
use tracing::debug;

/// AQI reported for a region with no member stations. A display default, not a measurement.
pub const DEFAULT_REGION_AQI: i32 = 63;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Inclusive on every edge.
    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        let (lat, lon) = (coordinates.latitude(), coordinates.longitude());
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub bounds: BoundingBox,
    /// Representative point used to place the region on a map.
    pub coordinates: Coordinates,
}

/// Continental US regions. Boxes overlap; a station belongs to the first box
/// that contains it, in this order.
pub const REGIONS: [Region; 4] = [
    Region {
        name: "West",
        bounds: BoundingBox {
            lat_min: 32.0,
            lat_max: 49.0,
            lon_min: -125.0,
            lon_max: -102.0,
        },
        coordinates: Coordinates(37.7749, -122.4194),
    },
    Region {
        name: "Midwest",
        bounds: BoundingBox {
            lat_min: 36.0,
            lat_max: 49.0,
            lon_min: -103.0,
            lon_max: -84.0,
        },
        coordinates: Coordinates(41.8781, -87.6298),
    },
    Region {
        name: "Northeast",
        bounds: BoundingBox {
            lat_min: 40.0,
            lat_max: 47.0,
            lon_min: -80.0,
            lon_max: -66.0,
        },
        coordinates: Coordinates(40.7128, -74.0060),
    },
    Region {
        name: "South",
        bounds: BoundingBox {
            lat_min: 24.0,
            lat_max: 37.5,
            lon_min: -100.0,
            lon_max: -75.0,
        },
        coordinates: Coordinates(29.7604, -95.3698),
    },
];

/// Index into `regions` of the first box containing the point. Non-finite
/// coordinates belong to no region.
pub fn region_index(regions: &[Region], coordinates: &Coordinates) -> Option<usize> {
    if !coordinates.is_finite() {
        return None;
    }
    regions.iter().position(|r| r.bounds.contains(coordinates))
}

pub fn region_for(coordinates: &Coordinates) -> Option<&'static Region> {
    region_index(&REGIONS, coordinates).map(|idx| &REGIONS[idx])
}

#[derive(Debug, Default)]
struct RegionAccumulator {
    aqi: Vec<i32>,
    pollutants: PollutantReading,
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
}

impl RegionAccumulator {
    fn add(&mut self, station: &Station) {
        self.aqi.push(station.aqi);
        for pollutant in Pollutant::ALL {
            let sum = self.pollutants.get(pollutant) + station.pollutants.get(pollutant);
            self.pollutants.set(pollutant, sum);
        }
        self.temperature += station.weather.temperature;
        self.humidity += station.weather.humidity;
        self.wind_speed += station.weather.wind_speed;
    }

    fn summarize(self, region: &Region) -> RegionSummary {
        let count = self.aqi.len();
        let Some(aqi) = station_mean_aqi(&self.aqi) else {
            return RegionSummary {
                name: region.name.to_string(),
                coordinates: region.coordinates,
                count: 0,
                pollutants: PollutantReading::default(),
                weather: WeatherSnapshot::default(),
                aqi: DEFAULT_REGION_AQI,
                level: category(DEFAULT_REGION_AQI).to_string(),
                method: AqiMethod::StationMean,
            };
        };

        let n = count as f64;
        let mut pollutants = PollutantReading::default();
        for pollutant in Pollutant::ALL {
            pollutants.set(pollutant, round_to(self.pollutants.get(pollutant) / n, 2));
        }

        RegionSummary {
            name: region.name.to_string(),
            coordinates: region.coordinates,
            count,
            pollutants,
            weather: WeatherSnapshot {
                temperature: round_to(self.temperature / n, 1),
                humidity: round_to(self.humidity / n, 0),
                wind_speed: round_to(self.wind_speed / n, 1),
            },
            aqi,
            level: category(aqi).to_string(),
            method: AqiMethod::StationMean,
        }
    }
}

/// One summary per entry in [`REGIONS`], in declaration order.
pub fn compute_region_summaries(stations: &[Station]) -> Vec<RegionSummary> {
    compute_summaries_for(&REGIONS, stations)
}

/// Aggregates stations into caller-supplied regions. Stations outside every
/// box, or with non-finite coordinates, are left out.
pub fn compute_summaries_for(regions: &[Region], stations: &[Station]) -> Vec<RegionSummary> {
    let mut accumulators: Vec<RegionAccumulator> =
        regions.iter().map(|_| RegionAccumulator::default()).collect();
    let mut unassigned = 0usize;

    for station in stations {
        match region_index(regions, &station.coordinates) {
            Some(idx) => accumulators[idx].add(station),
            None => unassigned += 1,
        }
    }

    if unassigned > 0 {
        debug!("{} stations fall outside every region", unassigned);
    }

    accumulators
        .into_iter()
        .zip(regions)
        .map(|(acc, region)| acc.summarize(region))
        .collect()
}

#[derive(Debug, Default)]
struct CountryAccumulator {
    count: usize,
    pm25: f64,
    pm10: f64,
    o3: f64,
    no2: f64,
}

/// Country report built from raw OpenAQ measurements.
///
/// `count` is the number of measurements for the country, across all
/// parameters, and each pollutant average divides that pollutant's sum by
/// `count`. The AQI is recomputed from the unrounded averages with the
/// breakpoint tables. Results are sorted worst-first.
pub fn compute_country_summaries(measurements: &[OpenAqMeasurement]) -> Vec<CountrySummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut countries: Vec<(String, CountryAccumulator)> = Vec::new();

    for m in measurements {
        let country = m
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Unknown")
            .to_uppercase();

        let slot = *index.entry(country.clone()).or_insert_with(|| {
            countries.push((country, CountryAccumulator::default()));
            countries.len() - 1
        });

        let entry = &mut countries[slot].1;
        entry.count += 1;
        let value = non_negative(m.value.unwrap_or(0.0));
        match m.parameter.parse::<Pollutant>() {
            Ok(Pollutant::Pm25) => entry.pm25 += value,
            Ok(Pollutant::Pm10) => entry.pm10 += value,
            Ok(Pollutant::O3) => entry.o3 += value,
            Ok(Pollutant::No2) => entry.no2 += value,
            _ => {}
        }
    }

    let mut summaries: Vec<CountrySummary> = countries
        .into_iter()
        .map(|(country, acc)| {
            let n = acc.count as f64;
            let averages = PollutantReading {
                pm25: acc.pm25 / n,
                pm10: acc.pm10 / n,
                o3: acc.o3 / n,
                no2: acc.no2 / n,
                ..Default::default()
            };
            let aqi = overall_aqi(&averages);

            CountrySummary {
                country,
                count: acc.count,
                avg_pm25: round_to(averages.pm25, 2),
                avg_pm10: round_to(averages.pm10, 2),
                avg_o3: round_to(averages.o3, 2),
                avg_no2: round_to(averages.no2, 2),
                aqi,
                level: category(aqi).to_string(),
                method: AqiMethod::Breakpoint,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.aqi.cmp(&a.aqi));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::builtin_stations;

    fn station_at(lat: f64, lon: f64, aqi: i32, pm25: f64) -> Station {
        let mut s = builtin_stations().remove(0);
        s.coordinates = Coordinates(lat, lon);
        s.aqi = aqi;
        s.pollutants = PollutantReading {
            pm25,
            ..Default::default()
        };
        s
    }

    #[test]
    fn test_box_edges_inclusive() {
        let west = &REGIONS[0].bounds;
        assert!(west.contains(&Coordinates(32.0, -125.0)));
        assert!(west.contains(&Coordinates(49.0, -102.0)));
        assert!(!west.contains(&Coordinates(49.01, -110.0)));
    }

    #[test]
    fn test_first_matching_region_wins() {
        // Inside both West (lon <= -102) and Midwest (lon >= -103).
        let overlap = Coordinates(40.0, -102.5);
        assert_eq!(region_for(&overlap).unwrap().name, "West");

        // Inside both Midwest (lat >= 36) and South (lat <= 37.5).
        let overlap = Coordinates(37.0, -90.0);
        assert_eq!(region_for(&overlap).unwrap().name, "Midwest");

        assert_eq!(region_for(&Coordinates(37.0, -78.0)).unwrap().name, "South");
        assert_eq!(region_for(&Coordinates(40.5, -77.0)).unwrap().name, "Northeast");
    }

    #[test]
    fn test_non_finite_coordinates_excluded() {
        assert!(region_for(&Coordinates(f64::NAN, -100.0)).is_none());
        let summaries = compute_region_summaries(&[station_at(f64::INFINITY, -90.0, 200, 50.0)]);
        assert!(summaries.iter().all(|s| s.count == 0));
    }

    #[test]
    fn test_outside_all_regions_is_not_counted() {
        let summaries = compute_region_summaries(&[station_at(21.3, -157.8, 30, 4.0)]);
        assert_eq!(summaries.iter().map(|s| s.count).sum::<usize>(), 0);
    }

    #[test]
    fn test_country_ordering_and_case() {
        let m = |country: &str, parameter: &str, value: f64| OpenAqMeasurement {
            country: Some(country.to_string()),
            parameter: parameter.to_string(),
            value: Some(value),
            ..Default::default()
        };
        let summaries = compute_country_summaries(&[
            m("de", "pm25", 5.0),
            m("IN", "pm25", 120.0),
            m("De", "no2", 10.0),
        ]);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].country, "IN");
        assert_eq!(summaries[1].country, "DE");
        assert_eq!(summaries[1].count, 2);
        assert_eq!(summaries[1].avg_pm25, 2.5);
        assert_eq!(summaries[1].avg_no2, 5.0);
        assert!(summaries.iter().all(|s| s.method == AqiMethod::Breakpoint));
    }
}
