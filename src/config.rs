use crate::alerts::AlertThresholds;
use crate::error::{AppError, Result};
use crate::normalizer::MergeLimits;
use serde::{Deserialize, Deserializer};
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub sources: SourceConfig,
    #[serde(default)]
    pub merge: MergeLimits,
    #[serde(default)]
    pub alerts: AlertThresholds,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_openaq_base_url")]
    pub openaq_base_url: String,
    #[serde(default = "default_airnow_base_url")]
    pub airnow_base_url: String,
    /// AirNow is skipped when no key is configured.
    #[serde(default)]
    pub airnow_api_key: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_measurement_limit", deserialize_with = "deserialize_limit")]
    pub measurement_limit: u32,
    #[serde(default = "default_zip_codes")]
    pub zip_codes: Vec<String>,
    #[serde(default = "default_airnow_distance_miles")]
    pub airnow_distance_miles: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub simulate_tolnet: bool,
}

fn default_openaq_base_url() -> String {
    "https://api.openaq.org/v2".to_string()
}

fn default_airnow_base_url() -> String {
    "https://www.airnowapi.org/aq".to_string()
}

fn default_country() -> String {
    "US".to_string()
}

fn default_measurement_limit() -> u32 {
    100
}

fn default_zip_codes() -> Vec<String> {
    ["10001", "90210", "60601", "77001", "85001"]
        .iter()
        .map(|z| z.to_string())
        .collect()
}

fn default_airnow_distance_miles() -> u32 {
    50
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Custom deserializer that handles limits as both number and string
///
/// Accepts:
/// - `measurement_limit: 100` (number)
/// - `measurement_limit: "100"` (string that parses to number)
/// - `measurement_limit: ${OPENAQ_LIMIT}` (env var substituted to either)
fn deserialize_limit<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LimitValue {
        Number(u32),
        String(String),
    }

    match LimitValue::deserialize(deserializer)? {
        LimitValue::Number(n) => Ok(n),
        LimitValue::String(s) => s
            .parse::<u32>()
            .map_err(|_| serde::de::Error::custom(format!("Invalid limit: '{}'", s))),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Skip the network and report on the built-in stations.
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub include_country_report: bool,
    #[serde(default = "default_global_limit")]
    pub global_limit: u32,
}

fn default_global_limit() -> u32 {
    1000
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            offline: false,
            include_country_report: false,
            global_limit: default_global_limit(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let expanded = expand_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Checks for:
    /// - Valid HTTPS base URLs
    /// - Two-letter country code
    /// - Non-zero limits and timeout
    /// - Non-negative alert thresholds
    fn validate(&self) -> Result<()> {
        for (field_name, value) in [
            ("openaq_base_url", &self.sources.openaq_base_url),
            ("airnow_base_url", &self.sources.airnow_base_url),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                AppError::Config(format!("Invalid {} '{}': {}", field_name, value, e))
            })?;
            if parsed.scheme() != "https" {
                return Err(AppError::Config(format!(
                    "{} must use HTTPS, got: {}",
                    field_name,
                    parsed.scheme()
                )));
            }
        }

        if let Some(key) = &self.sources.airnow_api_key {
            if key.trim().is_empty() {
                return Err(AppError::Config(
                    "airnow_api_key is set but empty; remove it to skip AirNow".to_string(),
                ));
            }
        }

        if self.sources.country.len() != 2 {
            return Err(AppError::Config(format!(
                "Country code '{}' must be exactly 2 characters (e.g., 'US', 'DE')",
                self.sources.country
            )));
        }

        if self.sources.measurement_limit == 0 {
            return Err(AppError::Config(
                "measurement_limit must be greater than 0".to_string(),
            ));
        }

        if self.sources.timeout_seconds == 0 {
            return Err(AppError::Config(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.sources.measurement_limit > 10_000 {
            tracing::warn!(
                "measurement_limit of {} is very large, OpenAQ may throttle the request",
                self.sources.measurement_limit
            );
        }

        if !self.alerts.pm25.is_finite() || self.alerts.pm25 < 0.0 {
            return Err(AppError::Config(format!(
                "Alert pm25 threshold must be a non-negative number, got {}",
                self.alerts.pm25
            )));
        }

        if self.alerts.forecast_window_hours < 0 {
            return Err(AppError::Config(format!(
                "forecast_window_hours cannot be negative, got {}",
                self.alerts.forecast_window_hours
            )));
        }

        Ok(())
    }
}

/// Substitutes `${VAR}` references. Full-line YAML comments are copied
/// through untouched.
fn expand_env_vars(content: &str) -> Result<String> {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| AppError::Config(format!("Invalid env var pattern: {}", e)))?;

    let mut missing_vars: Vec<String> = Vec::new();
    let mut lines = Vec::new();

    for line in content.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut expanded = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    expanded = expanded.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(expanded);
    }

    let result = lines.join("\n");

    if !missing_vars.is_empty() {
        return Err(AppError::Config(format!(
            "Missing required environment variable{}: {}\n\n\
             To fix this:\n\
             1. Create a .env file in the project root (copy .env.example)\n\
             2. Set the missing variable{}: export {}=<value>\n\
             3. Or remove the reference from the config file",
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars.join(", "),
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars[0],
        )));
    }

    Ok(result)
}
