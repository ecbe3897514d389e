//! PM2.5 alert evaluation.
//!
//! A station raises an alert when its current PM2.5 is above the threshold
//! (nowcast) or when any synthetic forecast point inside the window is. Alert
//! delivery is left to the caller.

use crate::category::AqiCategory;
use crate::forecast::generate_forecast_from;
use crate::model::Station;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AlertThresholds {
    #[serde(default = "default_pm25_threshold")]
    pub pm25: f64,
    #[serde(default = "default_forecast_window_hours")]
    pub forecast_window_hours: i64,
}

fn default_pm25_threshold() -> f64 {
    35.0
}

fn default_forecast_window_hours() -> i64 {
    24
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            pm25: default_pm25_threshold(),
            forecast_window_hours: default_forecast_window_hours(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTrigger {
    Nowcast,
    Forecast,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub station_id: String,
    pub station_name: String,
    pub aqi: i32,
    pub level: String,
    pub trigger: AlertTrigger,
    pub raised_at: DateTime<Utc>,
    pub actions: Vec<String>,
}

pub fn evaluate_station(
    station: &Station,
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> Option<Alert> {
    let trigger = if station.pollutants.pm25 > thresholds.pm25 {
        AlertTrigger::Nowcast
    } else {
        let window_end = now + Duration::hours(thresholds.forecast_window_hours);
        let exceeds = generate_forecast_from(station.aqi, now)
            .iter()
            .any(|p| p.timestamp <= window_end && p.pm25 > thresholds.pm25);
        if !exceeds {
            return None;
        }
        AlertTrigger::Forecast
    };

    Some(Alert {
        station_id: station.id.clone(),
        station_name: station.name.clone(),
        aqi: station.aqi,
        level: station.level.clone(),
        trigger,
        raised_at: now,
        actions: AqiCategory::from_aqi(station.aqi)
            .recommended_actions()
            .iter()
            .map(|a| a.to_string())
            .collect(),
    })
}

/// Evaluates every station. Alerts are keyed by station name; a later
/// station with the same name replaces the earlier alert in place.
pub fn evaluate_alerts(
    stations: &[Station],
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut alerts: Vec<Alert> = Vec::new();

    for alert in stations
        .iter()
        .filter_map(|s| evaluate_station(s, thresholds, now))
    {
        match index.get(&alert.station_name) {
            Some(&idx) => alerts[idx] = alert,
            None => {
                index.insert(alert.station_name.clone(), alerts.len());
                alerts.push(alert);
            }
        }
    }

    alerts
}
