//! Daily weather series from the Open-Meteo forecast API.

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use http::Extensions;
use http_cache_reqwest::{Cache, CacheMode, CACacheManager, HttpCache, HttpCacheOptions};
use log::{debug, warn};
use reqwest::{
    header::{HeaderValue, CACHE_CONTROL},
    Request, Response, StatusCode,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use serde::Deserialize;
use serde_json::Value;

use crate::dates::DateWindow;

pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_TIMEZONE: &str = "GMT";
pub const DEFAULT_MODEL: &str = "gfs_seamless";

const RETRIES: u32 = 5;
const BACKOFF_FACTOR: f64 = 0.2;
// responses are kept for one hour whatever the server says
const CACHE_FOR: &str = "max-age=3600";
const DAY_SECONDS: i64 = 86_400;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub window: DateWindow,
    pub variables: Vec<String>,
    pub timezone: String,
    pub model: Option<String>,
}

impl WeatherRequest {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("daily", self.variables.join(",")),
            ("timezone", self.timezone.clone()),
            ("start_date", self.window.start_str()),
            ("end_date", self.window.end_str()),
            ("timeformat", "unixtime".to_string()),
        ];
        if let Some(model) = &self.model {
            params.push(("models", model.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One value per day per requested variable. Missing values are `None`.
pub struct DailyWeather {
    pub dates: Vec<NaiveDate>,
    pub variables: BTreeMap<String, Vec<Option<f64>>>,
}

impl DailyWeather {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    utc_offset_seconds: i64,
}

/// Open-Meteo forecast client. With a cache directory, successful responses are
/// served from disk for an hour.
pub struct OpenMeteo {
    client: ClientWithMiddleware,
    url: String,
}

impl OpenMeteo {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        OpenMeteo::with_url(FORECAST_URL, cache_dir)
    }

    fn with_url(url: &str, cache_dir: Option<PathBuf>) -> Self {
        let builder = ClientBuilder::new(reqwest::Client::new());
        let client = match cache_dir {
            Some(path) => {
                debug!("Caching weather responses in {}", path.display());
                builder
                    .with(Cache(HttpCache {
                        mode: CacheMode::Default,
                        manager: CACacheManager::new(path, false),
                        options: HttpCacheOptions::default(),
                    }))
                    .with(ForceMaxAge(CACHE_FOR))
                    .build()
            }
            None => builder.build(),
        };

        OpenMeteo {
            client,
            url: url.to_string(),
        }
    }

    pub async fn fetch_daily(&self, request: &WeatherRequest) -> Result<DailyWeather> {
        let url = reqwest::Url::parse_with_params(&self.url, request.query())?;
        let body = self.get_with_retry(url.as_str()).await?;
        parse_daily(&body, &request.variables)
    }

    /// GET with up to [`RETRIES`] retries on transport errors, 429 and 5xx.
    async fn get_with_retry(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            let (error, retryable) = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => match response.text().await {
                    Ok(body) => return Ok(body),
                    Err(e) => (anyhow!("Open-Meteo response unreadable: {}", e), true),
                },
                Ok(response) => {
                    let status = response.status();
                    let reason = response.text().await.unwrap_or_default();
                    let retryable =
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                    (anyhow!("Open-Meteo request failed: {} {}", status, reason), retryable)
                }
                Err(e) => (anyhow!("Open-Meteo request failed: {}", e), true),
            };

            if !retryable || attempt >= RETRIES {
                return Err(error);
            }
            let delay = backoff(attempt);
            warn!("{}; retrying in {:?}", error, delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Overrides the freshness of successful responses so the cache layer above keeps
/// them.
struct ForceMaxAge(&'static str);

#[async_trait]
impl Middleware for ForceMaxAge {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let mut response = next.run(req, extensions).await?;
        if response.status().is_success() {
            response
                .headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static(self.0));
        }
        Ok(response)
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs_f64(BACKOFF_FACTOR * 2f64.powi(attempt as i32))
}

/// Builds the series from a JSON response requested with `timeformat=unixtime`.
pub fn parse_daily(body: &str, variables: &[String]) -> Result<DailyWeather> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    let daily = response
        .daily
        .ok_or_else(|| anyhow!("Response has no daily section"))?;

    let times: Vec<i64> = daily
        .get("time")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("Daily section has no time axis"))?
        .iter()
        .filter_map(Value::as_i64)
        .collect();

    let dates = match (times.first(), times.last()) {
        (Some(&start), Some(&last)) => {
            let interval = match times.get(1) {
                Some(&next) => next - start,
                None => DAY_SECONDS,
            };
            date_axis(
                start + response.utc_offset_seconds,
                last + interval + response.utc_offset_seconds,
                interval,
            )?
        }
        _ => Vec::new(),
    };

    let mut series = BTreeMap::new();
    for variable in variables {
        let values = daily
            .get(variable)
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("Response has no daily `{}`", variable))?;
        let mut values: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
        values.resize(dates.len(), None);
        series.insert(variable.clone(), values);
    }

    Ok(DailyWeather {
        dates,
        variables: series,
    })
}

/// Dates from `start` (inclusive) to `end` (exclusive), both in Unix seconds, every
/// `interval` seconds.
pub fn date_axis(start: i64, end: i64, interval: i64) -> Result<Vec<NaiveDate>> {
    if interval <= 0 {
        return Err(anyhow!("Invalid interval of {} seconds", interval));
    }
    let mut dates = Vec::new();
    let mut t = start;
    while t < end {
        let dt = DateTime::from_timestamp(t, 0).ok_or_else(|| anyhow!("Timestamp {} out of range", t))?;
        dates.push(dt.date_naive());
        t += interval;
    }
    Ok(dates)
}

pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("mtbs").join("openmeteo"))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::test_server::StubServer;

    fn request() -> WeatherRequest {
        WeatherRequest {
            latitude: 39.8,
            longitude: -121.4,
            window: DateWindow::parse("2021-07-01", "2021-07-03").unwrap(),
            variables: vec!["temperature_2m_max".to_string(), "precipitation_sum".to_string()],
            timezone: DEFAULT_TIMEZONE.to_string(),
            model: Some(DEFAULT_MODEL.to_string()),
        }
    }

    fn body() -> &'static str {
        r#"{
            "latitude": 39.8, "longitude": -121.4, "utc_offset_seconds": 0,
            "daily_units": {"time": "unixtime"},
            "daily": {
                "time": [1625097600, 1625184000, 1625270400],
                "temperature_2m_max": [31.2, 33.0, null],
                "precipitation_sum": [0.0, 0.0, 1.5]
            }
        }"#
    }

    #[test]
    fn should_build_query_parameters() {
        let params = request().query();

        assert!(params.contains(&("daily", "temperature_2m_max,precipitation_sum".to_string())));
        assert!(params.contains(&("start_date", "2021-07-01".to_string())));
        assert!(params.contains(&("models", "gfs_seamless".to_string())));
        assert!(params.contains(&("timeformat", "unixtime".to_string())));
    }

    #[test]
    fn should_omit_model_when_absent() {
        let mut r = request();
        r.model = None;
        assert!(!r.query().iter().any(|(k, _)| *k == "models"));
    }

    #[test]
    fn should_parse_daily_response() {
        let weather = parse_daily(body(), &request().variables).unwrap();

        assert_eq!(weather.len(), 3);
        assert_eq!(weather.dates[0], NaiveDate::from_ymd_opt(2021, 7, 1).unwrap());
        assert_eq!(weather.dates[2], NaiveDate::from_ymd_opt(2021, 7, 3).unwrap());
        assert_eq!(
            weather.variables["temperature_2m_max"],
            vec![Some(31.2), Some(33.0), None]
        );
        assert_eq!(weather.variables["precipitation_sum"][2], Some(1.5));
    }

    #[test]
    fn should_fail_on_missing_variable() {
        let variables = vec!["wind_speed_10m_max".to_string()];
        assert!(parse_daily(body(), &variables).is_err());
    }

    #[test]
    fn should_build_left_inclusive_date_axis() {
        let axis = date_axis(1625097600, 1625097600 + 2 * DAY_SECONDS, DAY_SECONDS).unwrap();

        assert_eq!(
            axis,
            vec![
                NaiveDate::from_ymd_opt(2021, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 7, 2).unwrap(),
            ]
        );
        assert!(date_axis(0, 10, 0).is_err());
    }

    #[test]
    fn should_grow_backoff_exponentially() {
        assert_eq!(backoff(0), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn should_retry_server_error_then_succeed() {
        let server = StubServer::start(vec![(503, "busy".to_string()), (200, body().to_string())]).await;
        let client = OpenMeteo::with_url(&server.url, None);

        let weather = client.fetch_daily(&request()).await.unwrap();

        assert_eq!(weather.len(), 3);
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn should_not_retry_client_error() {
        let server = StubServer::start(vec![
            (400, r#"{"error": true, "reason": "bad variable"}"#.to_string()),
            (200, body().to_string()),
        ])
        .await;
        let client = OpenMeteo::with_url(&server.url, None);

        let error = client.fetch_daily(&request()).await.unwrap_err();

        assert!(error.to_string().contains("400"));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn should_serve_second_request_from_cache() {
        let dir = TempDir::new().unwrap();
        let server = StubServer::start(vec![(200, body().to_string())]).await;
        let client = OpenMeteo::with_url(&server.url, Some(dir.path().to_path_buf()));

        let first = client.fetch_daily(&request()).await.unwrap();
        let second = client.fetch_daily(&request()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn should_bypass_cache_without_directory() {
        let server = StubServer::start(vec![(200, body().to_string()), (200, body().to_string())]).await;
        let client = OpenMeteo::with_url(&server.url, None);

        client.fetch_daily(&request()).await.unwrap();
        client.fetch_daily(&request()).await.unwrap();

        assert_eq!(server.requests().len(), 2);
    }
}
