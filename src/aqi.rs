//! AQI computation.
//!
//! Several AQI pathways exist because each data source carries different
//! information. They are kept as separate named functions and every
//! [`Station`](crate::model::Station) records which one produced its index
//! through [`AqiMethod`].

use crate::model::{Pollutant, PollutantReading};
use serde::Serialize;

/// Highest index defined by the EPA tables.
pub const MAX_AQI: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: i32,
    pub i_high: i32,
}

const fn bp(c_low: f64, c_high: f64, i_low: i32, i_high: i32) -> Breakpoint {
    Breakpoint {
        c_low,
        c_high,
        i_low,
        i_high,
    }
}

/// PM2.5, 24-hour, µg/m³.
pub const PM25_BREAKPOINTS: &[Breakpoint] = &[
    bp(0.0, 12.0, 0, 50),
    bp(12.1, 35.4, 51, 100),
    bp(35.5, 55.4, 101, 150),
    bp(55.5, 150.4, 151, 200),
    bp(150.5, 250.4, 201, 300),
    bp(250.5, 350.4, 301, 400),
    bp(350.5, 500.4, 401, 500),
];

/// PM10, 24-hour, µg/m³.
pub const PM10_BREAKPOINTS: &[Breakpoint] = &[
    bp(0.0, 54.0, 0, 50),
    bp(55.0, 154.0, 51, 100),
    bp(155.0, 254.0, 101, 150),
    bp(255.0, 354.0, 151, 200),
    bp(355.0, 424.0, 201, 300),
    bp(425.0, 504.0, 301, 400),
    bp(505.0, 604.0, 401, 500),
];

/// O3 in ppb. 8-hour brackets up to 300, 1-hour brackets above.
pub const O3_BREAKPOINTS: &[Breakpoint] = &[
    bp(0.0, 54.0, 0, 50),
    bp(55.0, 70.0, 51, 100),
    bp(71.0, 85.0, 101, 150),
    bp(86.0, 105.0, 151, 200),
    bp(106.0, 200.0, 201, 300),
    bp(405.0, 504.0, 301, 400),
    bp(505.0, 604.0, 401, 500),
];

/// NO2, 1-hour, ppb.
pub const NO2_BREAKPOINTS: &[Breakpoint] = &[
    bp(0.0, 53.0, 0, 50),
    bp(54.0, 100.0, 51, 100),
    bp(101.0, 360.0, 101, 150),
    bp(361.0, 649.0, 151, 200),
    bp(650.0, 1249.0, 201, 300),
    bp(1250.0, 1649.0, 301, 400),
    bp(1650.0, 2049.0, 401, 500),
];

/// SO2, 1-hour, ppb.
pub const SO2_BREAKPOINTS: &[Breakpoint] = &[
    bp(0.0, 35.0, 0, 50),
    bp(36.0, 75.0, 51, 100),
    bp(76.0, 185.0, 101, 150),
    bp(186.0, 304.0, 151, 200),
    bp(305.0, 604.0, 201, 300),
    bp(605.0, 804.0, 301, 400),
    bp(805.0, 1004.0, 401, 500),
];

/// CO, 8-hour, ppm.
pub const CO_BREAKPOINTS: &[Breakpoint] = &[
    bp(0.0, 4.4, 0, 50),
    bp(4.5, 9.4, 51, 100),
    bp(9.5, 12.4, 101, 150),
    bp(12.5, 15.4, 151, 200),
    bp(15.5, 30.4, 201, 300),
    bp(30.5, 40.4, 301, 400),
    bp(40.5, 50.4, 401, 500),
];

pub fn breakpoints_for(pollutant: Pollutant) -> &'static [Breakpoint] {
    match pollutant {
        Pollutant::Pm25 => PM25_BREAKPOINTS,
        Pollutant::Pm10 => PM10_BREAKPOINTS,
        Pollutant::O3 => O3_BREAKPOINTS,
        Pollutant::No2 => NO2_BREAKPOINTS,
        Pollutant::So2 => SO2_BREAKPOINTS,
        Pollutant::Co => CO_BREAKPOINTS,
    }
}

/// Which computation produced a station's AQI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiMethod {
    /// EPA breakpoint interpolation over measured concentrations.
    Breakpoint,
    /// Linear scaling of raw OpenAQ concentrations, see [`linear_approximation_aqi`].
    LinearApproximation,
    /// Index reported directly by the upstream agency.
    Reported,
    /// Ozone column proxy, see [`satellite_proxy_aqi`].
    SatelliteProxy,
    /// Mean of member station indices.
    StationMean,
}

/// Piecewise-linear interpolation of one concentration into a sub-index.
///
/// Concentrations above the last bracket are capped at [`MAX_AQI`]. A value
/// that falls in the gap between two published brackets (e.g. 12.05 µg/m³
/// PM2.5) maps to the lower edge of the next bracket, which keeps the
/// function monotone.
pub fn sub_index(concentration: f64, table: &[Breakpoint]) -> i32 {
    let c = if concentration.is_finite() {
        concentration.max(0.0)
    } else {
        0.0
    };

    for b in table {
        if c <= b.c_high {
            let c = c.max(b.c_low);
            let slope = f64::from(b.i_high - b.i_low) / (b.c_high - b.c_low);
            let index = (slope * (c - b.c_low) + f64::from(b.i_low)).round() as i32;
            return index.clamp(b.i_low, b.i_high);
        }
    }

    MAX_AQI
}

pub fn pollutant_sub_index(reading: &PollutantReading, pollutant: Pollutant) -> i32 {
    sub_index(reading.get(pollutant), breakpoints_for(pollutant))
}

/// Overall station AQI from PM2.5 and PM10: the worst pollutant wins.
pub fn overall_aqi(reading: &PollutantReading) -> i32 {
    pollutant_sub_index(reading, Pollutant::Pm25).max(pollutant_sub_index(reading, Pollutant::Pm10))
}

/// Like [`overall_aqi`] but over all six pollutant tables.
pub fn overall_aqi_extended(reading: &PollutantReading) -> i32 {
    dominant_pollutant(reading).1
}

/// Pollutant with the highest sub-index and that index. Ties go to the
/// pollutant listed first in [`Pollutant::ALL`].
pub fn dominant_pollutant(reading: &PollutantReading) -> (Pollutant, i32) {
    let mut worst = (Pollutant::Pm25, pollutant_sub_index(reading, Pollutant::Pm25));
    for pollutant in Pollutant::ALL.iter().skip(1) {
        let index = pollutant_sub_index(reading, *pollutant);
        if index > worst.1 {
            worst = (*pollutant, index);
        }
    }
    worst
}

const LINEAR_PM25_FACTOR: f64 = 4.17;
const LINEAR_O3_FACTOR: f64 = 1.28;
const LINEAR_NO2_FACTOR: f64 = 0.53;

/// Cheap approximation used for OpenAQ measurement batches.
///
/// Calibrated differently from [`overall_aqi`]; the result is clamped to [1, 500].
pub fn linear_approximation_aqi(reading: &PollutantReading) -> i32 {
    let estimate = (reading.pm25 * LINEAR_PM25_FACTOR)
        .max(reading.o3 * LINEAR_O3_FACTOR)
        .max(reading.no2 * LINEAR_NO2_FACTOR)
        .max(1.0);
    (estimate.round() as i32).clamp(1, MAX_AQI)
}

/// Rounds halves toward positive infinity, so -2.5 becomes -2.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Rough surface AQI from a total ozone column (Dobson units).
///
/// Not a validated retrieval; the result is not clamped.
pub fn satellite_proxy_aqi(ozone_column: f64) -> i32 {
    round_half_up((ozone_column - 250.0) / 2.0)
}

/// Rounded mean of station indices; `None` for an empty set.
pub fn station_mean_aqi(indices: &[i32]) -> Option<i32> {
    if indices.is_empty() {
        return None;
    }
    let sum: f64 = indices.iter().map(|&aqi| f64::from(aqi)).sum();
    Some(round_half_up(sum / indices.len() as f64))
}
