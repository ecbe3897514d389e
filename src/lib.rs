//! Air quality index engine: EPA breakpoint AQI, feed normalization for
//! OpenAQ, EPA AirNow and TolNet, regional and country aggregation, synthetic
//! forecasts and PM2.5 alerts.

pub mod alerts;
pub mod aqi;
pub mod category;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod model;
pub mod normalizer;
pub mod sources;
pub mod spatial;
pub mod stations;
