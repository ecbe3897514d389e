use crate::config::{Config, SourceConfig};
use crate::error::{AppError, Result};
use crate::model::Station;
use crate::normalizer::{flatten_latest, normalize_batch, SourceBatch};
use crate::sources::{
    simulated_tolnet_sites, AirNowObservation, OpenAqLatestResult, OpenAqMeasurement,
    OpenAqResponse,
};
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

const MEASUREMENT_PARAMETERS: &str = "pm25,pm10,o3,no2";
const LATEST_PARAMETERS: &str = "pm25,pm10,o3,no2,so2,co";

pub struct Fetcher {
    client: Client,
    openaq_base_url: String,
    airnow_base_url: String,
    zip_codes: Vec<String>,
    airnow_distance_miles: u32,
}

impl Fetcher {
    pub fn new(source: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("airq-engine/0.1.0")
            .timeout(Duration::from_secs(source.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            openaq_base_url: source.openaq_base_url.trim_end_matches('/').to_string(),
            airnow_base_url: source.airnow_base_url.trim_end_matches('/').to_string(),
            zip_codes: source.zip_codes.clone(),
            airnow_distance_miles: source.airnow_distance_miles,
        })
    }

    /// Latest measurements for one country from OpenAQ `/measurements`.
    pub async fn fetch_openaq_measurements(
        &self,
        country: &str,
        limit: u32,
    ) -> Result<Vec<OpenAqMeasurement>> {
        let url = format!(
            "{}/measurements?country={}&limit={}&order_by=datetime&sort=desc&parameter={}",
            self.openaq_base_url, country, limit, MEASUREMENT_PARAMETERS
        );
        debug!("Fetching OpenAQ measurements from {}", url);

        let response: OpenAqResponse<OpenAqMeasurement> =
            retry_with_backoff(3, || self.get_json(&url)).await?;
        info!("OpenAQ returned {} measurements", response.results.len());
        Ok(response.results)
    }

    /// Global snapshot from OpenAQ `/latest`, flattened to one record per measurement.
    pub async fn fetch_openaq_latest(&self, limit: u32) -> Result<Vec<OpenAqMeasurement>> {
        let url = format!(
            "{}/latest?limit={}&order_by=lastUpdated&sort=desc&parameter={}",
            self.openaq_base_url, limit, LATEST_PARAMETERS
        );
        debug!("Fetching OpenAQ latest from {}", url);

        let response: OpenAqResponse<OpenAqLatestResult> =
            retry_with_backoff(3, || self.get_json(&url)).await?;
        let flattened = flatten_latest(&response.results, Utc::now());
        info!(
            "OpenAQ latest returned {} locations, {} measurements",
            response.results.len(),
            flattened.len()
        );
        Ok(flattened)
    }

    /// Current observations around each configured ZIP code. A ZIP that
    /// fails is logged and skipped.
    pub async fn fetch_airnow(&self, api_key: Option<&str>) -> Vec<AirNowObservation> {
        let Some(key) = api_key else {
            warn!("EPA AirNow API key not configured, skipping AirNow");
            return Vec::new();
        };

        let mut observations = Vec::new();
        for zip in &self.zip_codes {
            let url = format!(
                "{}/observation/zipCode/current/?format=application/json&zipCode={}&distance={}&API_KEY={}",
                self.airnow_base_url, zip, self.airnow_distance_miles, key
            );

            match retry_with_backoff(3, || self.get_json::<Vec<AirNowObservation>>(&url)).await {
                Ok(mut batch) => {
                    debug!("AirNow returned {} observations for ZIP {}", batch.len(), zip);
                    observations.append(&mut batch);
                }
                Err(e) => warn!("AirNow request for ZIP {} failed: {}", zip, e),
            }
        }

        info!("AirNow returned {} observations", observations.len());
        observations
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Fetches every configured source and normalizes the result. Failures are
/// logged and degrade to the built-in station list; this never errors.
pub async fn fetch_stations(config: &Config) -> Vec<Station> {
    let batch = match Fetcher::new(&config.sources) {
        Ok(fetcher) => fetch_batch(&fetcher, config).await,
        Err(e) => {
            warn!("Failed to build HTTP client: {}", e);
            SourceBatch::default()
        }
    };

    normalize_batch(&batch, &config.merge)
}

pub async fn fetch_batch(fetcher: &Fetcher, config: &Config) -> SourceBatch {
    let source = &config.sources;
    info!("Fetching real-time data from OpenAQ, EPA AirNow and TolNet");

    let (openaq, airnow) = tokio::join!(
        fetcher.fetch_openaq_measurements(&source.country, source.measurement_limit),
        fetcher.fetch_airnow(source.airnow_api_key.as_deref()),
    );

    let openaq = openaq.unwrap_or_else(|e| {
        warn!("OpenAQ fetch failed: {}", e);
        Vec::new()
    });

    let tolnet = if source.simulate_tolnet {
        simulated_tolnet_sites(Utc::now())
    } else {
        Vec::new()
    };

    SourceBatch {
        openaq,
        airnow,
        tolnet,
    }
}

/// Retry a future with exponential backoff
async fn retry_with_backoff<F, Fut, T>(max_retries: u32, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                retries += 1;

                if retries > max_retries {
                    return Err(e);
                }

                // Check if error is transient (retryable)
                let should_retry = match &e {
                    AppError::Http(reqwest_err) => {
                        // Retry on connection errors, timeouts, server errors (5xx)
                        reqwest_err.is_timeout()
                            || reqwest_err.is_connect()
                            || reqwest_err
                                .status()
                                .map(|s| s.is_server_error())
                                .unwrap_or(false)
                    }
                    AppError::Io(_) => true,
                    _ => false, // Don't retry JSON errors or 4xx responses
                };

                if !should_retry {
                    return Err(e);
                }

                let delay = backoff_delay(retries);
                warn!(
                    "Request failed (attempt {}/{}): {}. Retrying in {:?}...",
                    retries, max_retries, e, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(not(test))]
fn backoff_delay(retries: u32) -> Duration {
    Duration::from_secs(2u64.pow(retries.saturating_sub(1)))
}

#[cfg(test)]
fn backoff_delay(_retries: u32) -> Duration {
    Duration::from_millis(1)
}
