//! Synthetic hourly forecast.
//!
//! This is a bounded random walk around the current AQI for display, not a
//! predictive model. Output is intentionally not reproducible: there is no
//! seed, and two calls with the same input will differ.

use crate::aqi::MAX_AQI;
use crate::model::ForecastPoint;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::{Distribution, Uniform};

pub const FORECAST_HOURS: i64 = 24;

const VARIANCE_LIMIT: f64 = 10.0;

pub fn generate_forecast(current_aqi: i32) -> Vec<ForecastPoint> {
    generate_forecast_from(current_aqi, Utc::now())
}

/// Same as [`generate_forecast`] with the clock supplied by the caller.
/// Point `i` (1-based) is stamped `now + i` hours.
pub fn generate_forecast_from(current_aqi: i32, now: DateTime<Utc>) -> Vec<ForecastPoint> {
    let mut rng = rand::thread_rng();
    let variance_dist = Uniform::new(-VARIANCE_LIMIT, VARIANCE_LIMIT);
    let current = f64::from(current_aqi);

    (1..=FORECAST_HOURS)
        .map(|hour| {
            let variance = variance_dist.sample(&mut rng);
            let aqi = ((current + variance).round() as i32).clamp(0, MAX_AQI);

            ForecastPoint {
                timestamp: now + Duration::hours(hour),
                aqi,
                pm25: (current * 0.3 + variance * 0.5).max(0.0),
                o3: (current * 0.4 + variance * 0.3).max(0.0),
                no2: (current * 0.25 + variance * 0.4).max(0.0),
            }
        })
        .collect()
}
