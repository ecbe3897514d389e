//! Built-in station list
//!
//! Eight US cities with baked-in readings. Used whenever the live feeds fail
//! or return nothing, so building it touches no I/O and cannot fail.

use crate::aqi::AqiMethod;
use crate::category::category;
use crate::model::{Coordinates, PollutantReading, Station, WeatherSnapshot};

struct BuiltinStation {
    id: &'static str,
    name: &'static str,
    location: &'static str,
    coordinates: (f64, f64),
    aqi: i32,
    pollutants: [f64; 6],
    weather: (f64, f64, f64),
}

/// Pollutants are ordered pm25, pm10, o3, no2, so2, co.
static BUILTIN_STATIONS: [BuiltinStation; 8] = [
    BuiltinStation {
        id: "1",
        name: "NYC Central",
        location: "New York City, NY",
        coordinates: (40.7128, -74.0060),
        aqi: 68,
        pollutants: [20.5, 45.2, 42.5, 25.3, 8.5, 0.8],
        weather: (22.5, 65.0, 3.2),
    },
    BuiltinStation {
        id: "2",
        name: "LA Downtown",
        location: "Los Angeles, CA",
        coordinates: (34.0522, -118.2437),
        aqi: 102,
        pollutants: [35.2, 68.5, 58.3, 38.5, 12.3, 1.2],
        weather: (26.8, 55.0, 2.8),
    },
    BuiltinStation {
        id: "3",
        name: "Chicago Loop",
        location: "Chicago, IL",
        coordinates: (41.8781, -87.6298),
        aqi: 45,
        pollutants: [12.8, 28.3, 35.2, 18.2, 6.5, 0.5],
        weather: (18.3, 72.0, 4.5),
    },
    BuiltinStation {
        id: "4",
        name: "Houston Central",
        location: "Houston, TX",
        coordinates: (29.7604, -95.3698),
        aqi: 58,
        pollutants: [18.3, 38.7, 48.7, 28.7, 9.8, 0.9],
        weather: (28.2, 78.0, 2.3),
    },
    BuiltinStation {
        id: "5",
        name: "Phoenix Metro",
        location: "Phoenix, AZ",
        coordinates: (33.4484, -112.0740),
        aqi: 89,
        pollutants: [28.7, 55.2, 52.8, 32.4, 8.9, 1.0],
        weather: (32.5, 25.0, 3.8),
    },
    BuiltinStation {
        id: "6",
        name: "Denver Mile High",
        location: "Denver, CO",
        coordinates: (39.7392, -104.9903),
        aqi: 52,
        pollutants: [15.4, 32.8, 38.5, 22.8, 7.2, 0.7],
        weather: (20.8, 45.0, 5.2),
    },
    BuiltinStation {
        id: "7",
        name: "Seattle Downtown",
        location: "Seattle, WA",
        coordinates: (47.6062, -122.3321),
        aqi: 38,
        pollutants: [10.2, 22.5, 28.3, 15.2, 5.8, 0.4],
        weather: (16.5, 82.0, 3.5),
    },
    BuiltinStation {
        id: "8",
        name: "SF Bay Area",
        location: "San Francisco, CA",
        coordinates: (37.7749, -122.4194),
        aqi: 55,
        pollutants: [16.8, 35.4, 32.7, 18.9, 6.8, 0.6],
        weather: (19.2, 68.0, 4.2),
    },
];

pub fn builtin_station_count() -> usize {
    BUILTIN_STATIONS.len()
}

pub fn builtin_stations() -> Vec<Station> {
    BUILTIN_STATIONS
        .iter()
        .map(|s| {
            let [pm25, pm10, o3, no2, so2, co] = s.pollutants;
            Station {
                id: s.id.to_string(),
                name: s.name.to_string(),
                location: s.location.to_string(),
                coordinates: Coordinates(s.coordinates.0, s.coordinates.1),
                pollutants: PollutantReading {
                    pm25,
                    pm10,
                    o3,
                    no2,
                    so2,
                    co,
                },
                aqi: s.aqi,
                level: category(s.aqi).to_string(),
                weather: WeatherSnapshot {
                    temperature: s.weather.0,
                    humidity: s.weather.1,
                    wind_speed: s.weather.2,
                },
                method: AqiMethod::Reported,
                last_updated: None,
            }
        })
        .collect()
}
