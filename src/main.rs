use airq_engine::alerts::{evaluate_alerts, Alert};
use airq_engine::config::Config;
use airq_engine::fetcher::{fetch_stations, Fetcher};
use airq_engine::forecast::generate_forecast_from;
use airq_engine::model::{CountrySummary, ForecastPoint, RegionSummary, Station};
use airq_engine::spatial::{compute_country_summaries, compute_region_summaries};
use airq_engine::stations::builtin_stations;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    generated_at: DateTime<Utc>,
    stations: Vec<Station>,
    regions: Vec<RegionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    countries: Option<Vec<CountrySummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<StationForecast>,
    alerts: Vec<Alert>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StationForecast {
    station_id: String,
    station_name: String,
    points: Vec<ForecastPoint>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,airq_engine=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path =
        std::env::var("AIRQ_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = Config::load(&config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration from {}: {}\n\n\
             Make sure:\n\
             1. The config file exists (or set AIRQ_CONFIG)\n\
             2. All required environment variables are set (check .env.example)\n\
             3. Create a .env file if needed",
            config_path,
            e
        )
    })?;
    info!("Configuration loaded from {}", config_path);

    let now = Utc::now();

    let stations = if config.report.offline {
        info!("Offline mode, using built-in stations");
        builtin_stations()
    } else {
        fetch_stations(&config).await
    };
    info!("Reporting on {} stations", stations.len());

    let regions = compute_region_summaries(&stations);

    let countries = if config.report.include_country_report && !config.report.offline {
        Some(country_report(&config).await)
    } else {
        None
    };

    let forecast = stations.iter().max_by_key(|s| s.aqi).map(|worst| {
        info!("Forecasting for {} (AQI {})", worst.name, worst.aqi);
        StationForecast {
            station_id: worst.id.clone(),
            station_name: worst.name.clone(),
            points: generate_forecast_from(worst.aqi, now),
        }
    });

    let alerts = evaluate_alerts(&stations, &config.alerts, now);
    if !alerts.is_empty() {
        warn!("{} stations exceed the PM2.5 alert threshold", alerts.len());
    }

    let report = Report {
        generated_at: now,
        stations,
        regions,
        countries,
        forecast,
        alerts,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn country_report(config: &Config) -> Vec<CountrySummary> {
    let fetcher = match Fetcher::new(&config.sources) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            warn!("Failed to build HTTP client for country report: {}", e);
            return Vec::new();
        }
    };

    match fetcher.fetch_openaq_latest(config.report.global_limit).await {
        Ok(measurements) => {
            let summaries = compute_country_summaries(&measurements);
            info!("Country report covers {} countries", summaries.len());
            summaries
        }
        Err(e) => {
            warn!("Global OpenAQ fetch failed, skipping country report: {}", e);
            Vec::new()
        }
    }
}
