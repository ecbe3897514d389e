use airq_engine::aqi::AqiMethod;
use airq_engine::config::Config;
use airq_engine::error::AppError;
use airq_engine::fetcher::{fetch_stations, Fetcher};
use airq_engine::stations::builtin_station_count;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing both feeds at the mock server, with TolNet simulation off
fn config_for(server: &MockServer, zip_codes: &[&str], api_key: Option<&str>) -> Config {
    let mut config = Config::from_yaml(
        r#"
sources:
  simulate_tolnet: false
"#,
    )
    .expect("Failed to parse base config");
    config.sources.openaq_base_url = server.uri();
    config.sources.airnow_base_url = server.uri();
    config.sources.zip_codes = zip_codes.iter().map(|z| z.to_string()).collect();
    config.sources.airnow_api_key = api_key.map(str::to_string);
    config
}

fn openaq_body() -> serde_json::Value {
    json!({
        "meta": { "found": 3 },
        "results": [
            {
                "locationId": 101,
                "location": "Queens College",
                "parameter": "pm25",
                "value": 20.0,
                "unit": "µg/m³",
                "country": "US",
                "city": "New York",
                "coordinates": { "latitude": 40.7362, "longitude": -73.8215 },
                "date": { "utc": "2024-01-15T14:00:00Z", "local": "2024-01-15T09:00:00-05:00" }
            },
            {
                "locationId": 101,
                "location": "Queens College",
                "parameter": "o3",
                "value": 40.0,
                "unit": "ppb",
                "country": "US",
                "city": "New York",
                "coordinates": { "latitude": 40.7362, "longitude": -73.8215 },
                "date": { "utc": "2024-01-15T14:00:00Z", "local": "2024-01-15T09:00:00-05:00" }
            },
            {
                "locationId": 202,
                "location": "No Coordinates",
                "parameter": "pm25",
                "value": 10.0,
                "unit": "µg/m³",
                "country": "US"
            }
        ]
    })
}

/// Test OpenAQ measurements are requested with the expected query and parsed
#[tokio::test]
async fn test_fetch_openaq_measurements() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/measurements"))
        .and(query_param("country", "US"))
        .and(query_param("limit", "100"))
        .and(query_param("order_by", "datetime"))
        .and(query_param("sort", "desc"))
        .and(query_param("parameter", "pm25,pm10,o3,no2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openaq_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &[], None);
    let fetcher = Fetcher::new(&config.sources).expect("Failed to create fetcher");

    let measurements = fetcher
        .fetch_openaq_measurements("US", 100)
        .await
        .expect("OpenAQ fetch should succeed");

    assert_eq!(measurements.len(), 3);
    assert_eq!(measurements[0].location_id, 101);
    assert_eq!(measurements[1].parameter, "o3");
    assert!(measurements[2].coordinates.is_none());
}

/// Test `/latest` results are flattened to one record per measurement
#[tokio::test]
async fn test_fetch_openaq_latest_flattens() {
    let mock_server = MockServer::start().await;

    let body = json!({
        "results": [
            {
                "id": 7,
                "location": "Delhi Anand Vihar",
                "city": "Delhi",
                "country": "IN",
                "coordinates": { "latitude": 28.6469, "longitude": 77.3152 },
                "measurements": [
                    { "parameter": "pm25", "value": 180.0, "unit": "µg/m³", "lastUpdated": "2024-01-15T14:00:00Z" },
                    { "parameter": "pm10", "value": 310.0, "unit": "µg/m³", "lastUpdated": "2024-01-15T14:00:00Z" }
                ]
            },
            {
                "id": 8,
                "location": "Berlin Mitte",
                "country": "DE",
                "coordinates": { "latitude": 52.52, "longitude": 13.405 },
                "measurements": [
                    { "parameter": "no2", "value": 22.0, "unit": "µg/m³" }
                ]
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("limit", "1000"))
        .and(query_param("order_by", "lastUpdated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &[], None);
    let fetcher = Fetcher::new(&config.sources).expect("Failed to create fetcher");

    let measurements = fetcher
        .fetch_openaq_latest(1000)
        .await
        .expect("OpenAQ latest fetch should succeed");

    assert_eq!(measurements.len(), 3);
    assert_eq!(measurements[0].location_id, 7);
    assert_eq!(measurements[0].country.as_deref(), Some("IN"));
    assert_eq!(measurements[1].parameter, "pm10");
    assert_eq!(measurements[2].location, "Berlin Mitte");
    assert_eq!(measurements[2].city.as_deref(), Some(""));
    // Missing lastUpdated falls back to the fetch time
    assert!(!measurements[2].date.as_ref().unwrap().utc.is_empty());
}

/// Test retry logic with transient failures
#[tokio::test]
async fn test_fetcher_retries_on_server_error() {
    let mock_server = MockServer::start().await;

    // First two requests fail with 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/measurements"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/measurements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openaq_body()))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &[], None);
    let fetcher = Fetcher::new(&config.sources).expect("Failed to create fetcher");

    let measurements = fetcher
        .fetch_openaq_measurements("US", 100)
        .await
        .expect("Fetch should succeed after retries");
    assert_eq!(measurements.len(), 3);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

/// Test client errors are returned without retrying
#[tokio::test]
async fn test_fetcher_does_not_retry_client_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/measurements"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &[], None);
    let fetcher = Fetcher::new(&config.sources).expect("Failed to create fetcher");

    let result = fetcher.fetch_openaq_measurements("US", 100).await;
    match result.unwrap_err() {
        AppError::Http(e) => assert_eq!(e.status().map(|s| s.as_u16()), Some(401)),
        e => panic!("Expected Http error, got: {:?}", e),
    }
}

/// Test malformed JSON surfaces as a Json error
#[tokio::test]
async fn test_fetcher_reports_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/measurements"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &[], None);
    let fetcher = Fetcher::new(&config.sources).expect("Failed to create fetcher");

    let result = fetcher.fetch_openaq_measurements("US", 100).await;
    assert!(matches!(result, Err(AppError::Json(_))));
}

/// Test AirNow is queried once per ZIP and a failing ZIP is skipped
#[tokio::test]
async fn test_fetch_airnow_skips_failed_zip() {
    let mock_server = MockServer::start().await;

    let observations = json!([
        {
            "DateObserved": "2024-01-15 ",
            "HourObserved": 14,
            "LocalTimeZone": "EST",
            "ReportingArea": "New York City",
            "StateCode": "NY",
            "Latitude": 40.71,
            "Longitude": -74.0,
            "ParameterName": "PM2.5",
            "AQI": 72,
            "Category": { "Number": 2, "Name": "Moderate" }
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/observation/zipCode/current/"))
        .and(query_param("zipCode", "10001"))
        .and(query_param("API_KEY", "test-key"))
        .and(query_param("distance", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observations))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/observation/zipCode/current/"))
        .and(query_param("zipCode", "99999"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &["10001", "99999"], Some("test-key"));
    let fetcher = Fetcher::new(&config.sources).expect("Failed to create fetcher");

    let result = fetcher.fetch_airnow(Some("test-key")).await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].reporting_area, "New York City");
    assert_eq!(result[0].aqi, 72);
    assert_eq!(result[0].reported_category(), Some("Moderate"));
}

/// Test the full pipeline merges live OpenAQ and AirNow stations
#[tokio::test]
async fn test_fetch_stations_merges_sources() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/measurements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openaq_body()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/observation/zipCode/current/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "ReportingArea": "Los Angeles",
                "StateCode": "CA",
                "Latitude": 34.05,
                "Longitude": -118.24,
                "ParameterName": "O3",
                "AQI": 95,
                "CategoryName": "Moderate"
            }
        ])))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &["90210"], Some("test-key"));
    let stations = fetch_stations(&config).await;

    assert_eq!(stations.len(), 2);

    let queens = &stations[0];
    assert_eq!(queens.id, "101");
    assert_eq!(queens.location, "New York, US");
    assert_eq!(queens.method, AqiMethod::LinearApproximation);
    // max(20.0 * 4.17, 40.0 * 1.28) = 83.4
    assert_eq!(queens.aqi, 83);
    assert_eq!(queens.level, "Moderate");

    let la = &stations[1];
    assert_eq!(la.id, "epa-0");
    assert_eq!(la.method, AqiMethod::Reported);
    assert_eq!(la.aqi, 95);
}

/// Test every source failing degrades to the built-in station list
#[tokio::test]
async fn test_fetch_stations_falls_back_to_builtin() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &["10001"], Some("test-key"));
    let stations = fetch_stations(&config).await;

    assert_eq!(stations.len(), builtin_station_count());
    assert!(stations.iter().all(|s| s.method == AqiMethod::Reported));
}

/// Test AirNow is skipped entirely without an API key
#[tokio::test]
async fn test_fetch_airnow_without_key_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server, &["10001", "90210"], None);
    let fetcher = Fetcher::new(&config.sources).expect("Failed to create fetcher");

    assert!(fetcher.fetch_airnow(None).await.is_empty());
}
