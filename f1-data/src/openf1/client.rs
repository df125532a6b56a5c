//! OpenF1 HTTP client.
//!
//! Provides async methods for the OpenF1 REST API. Handles request limiting,
//! status checks and conversion to domain types.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::session::{Session, SessionKey, SessionType, TelemetrySample};
use crate::source::{RaceCalendar, TelemetryProvider};

use super::convert::{SessionParts, build_session, convert_car_data};
use super::types::{CarDataDto, DriverDto, LapDto, MeetingDto, SessionDto, StintDto, WeatherDto};

/// Default base URL for the OpenF1 API.
const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

/// Default maximum concurrent requests. OpenF1 throttles anonymous clients.
const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Timestamp format accepted by the `date>=` / `date<=` filters.
const DATE_FILTER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Configuration for the OpenF1 client.
#[derive(Debug, Clone)]
pub struct OpenF1Config {
    /// Base URL for the API (defaults to production OpenF1)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenF1Config {
    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for OpenF1Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }
}

/// OpenF1 API client.
///
/// Serves both the race calendar (meetings, sessions) and session telemetry.
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct OpenF1Client {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl OpenF1Client {
    /// Create a new OpenF1 client with the given configuration.
    pub fn new(config: OpenF1Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// GET `{base_url}/{path}` with query parameters and decode a JSON array.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        let request = self.http.get(&url).query(query);
        self.fetch(request).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, FetchError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "openf1 response");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                host: response.url().host_str().unwrap_or_default().to_string(),
            });
        }

        // OpenF1 reports a query with no matching records as 404.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body).map_err(|e| FetchError::json(&e, &body))
    }

    /// All meetings held in a season.
    pub async fn get_meetings(&self, year: i32) -> Result<Vec<MeetingDto>, FetchError> {
        self.get_json("meetings", &[("year", year.to_string())])
            .await
    }

    /// All sessions at a circuit in a season.
    pub async fn get_sessions(
        &self,
        year: i32,
        circuit_short_name: &str,
    ) -> Result<Vec<SessionDto>, FetchError> {
        self.get_json(
            "sessions",
            &[
                ("year", year.to_string()),
                ("circuit_short_name", circuit_short_name.to_string()),
            ],
        )
        .await
    }

    /// Resolve a single session.
    async fn find_session(&self, key: &SessionKey) -> Result<(SessionDto, u32), FetchError> {
        let sessions: Vec<SessionDto> = self
            .get_json(
                "sessions",
                &[
                    ("year", key.year.to_string()),
                    ("circuit_short_name", key.circuit.clone()),
                    ("session_name", key.session_type.as_str().to_string()),
                ],
            )
            .await?;

        sessions
            .into_iter()
            .find_map(|s| s.session_key.map(|id| (s, id)))
            .ok_or_else(|| FetchError::SessionNotFound {
                year: key.year,
                circuit: key.circuit.clone(),
                session_type: key.session_type,
            })
    }

    async fn get_for_session<T: DeserializeOwned>(
        &self,
        path: &str,
        session_key: u32,
    ) -> Result<Vec<T>, FetchError> {
        self.get_json(path, &[("session_key", session_key.to_string())])
            .await
    }

    /// Car telemetry for one driver between two instants.
    pub async fn get_car_data(
        &self,
        session_key: u32,
        driver_number: u32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CarDataDto>, FetchError> {
        // The comparison operators are part of the parameter name, which the
        // query encoder would escape, so the URL is assembled by hand.
        let url = format!(
            "{}/car_data?session_key={}&driver_number={}&date>={}&date<={}",
            self.base_url,
            session_key,
            driver_number,
            from.format(DATE_FILTER_FORMAT),
            to.format(DATE_FILTER_FORMAT),
        );
        self.fetch(self.http.get(&url)).await
    }
}

#[async_trait]
impl RaceCalendar for OpenF1Client {
    async fn meetings(&self, year: i32) -> Result<Vec<MeetingDto>, FetchError> {
        self.get_meetings(year).await
    }

    async fn sessions(
        &self,
        year: i32,
        circuit_short_name: &str,
    ) -> Result<Vec<SessionDto>, FetchError> {
        self.get_sessions(year, circuit_short_name).await
    }
}

#[async_trait]
impl TelemetryProvider for OpenF1Client {
    async fn load_session(
        &self,
        year: i32,
        circuit: &str,
        session_type: SessionType,
    ) -> Result<Session, FetchError> {
        let key = SessionKey::new(year, circuit, session_type);
        let (session, session_key) = self.find_session(&key).await?;

        let (laps, drivers, stints, weather) = futures::try_join!(
            self.get_for_session::<LapDto>("laps", session_key),
            self.get_for_session::<DriverDto>("drivers", session_key),
            self.get_for_session::<StintDto>("stints", session_key),
            self.get_for_session::<WeatherDto>("weather", session_key),
        )?;

        info!(
            session = %key,
            laps = laps.len(),
            drivers = drivers.len(),
            "loaded session"
        );

        let parts = SessionParts {
            session,
            session_key,
            laps,
            drivers,
            stints,
            weather,
        };
        Ok(build_session(key, parts))
    }

    async fn lap_telemetry(
        &self,
        session: &Session,
        driver: &str,
        lap_number: u32,
    ) -> Result<Vec<TelemetrySample>, FetchError> {
        let window = session.laps.lap(driver, lap_number).and_then(|lap| {
            let start = lap.date_start?;
            let duration = chrono::Duration::from_std(lap.lap_time?).ok()?;
            Some((lap.driver_number, start, start + duration))
        });
        let Some((driver_number, from, to)) = window else {
            return Err(FetchError::LapWindowUnknown {
                driver: driver.to_string(),
                lap: lap_number,
            });
        };

        let samples = self
            .get_car_data(session.provider_id, driver_number, from, to)
            .await?;
        Ok(samples.iter().map(convert_car_data).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = OpenF1Config::default()
            .with_base_url("http://localhost:8080")
            .with_max_concurrent(10)
            .with_timeout(60);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = OpenF1Config::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn client_creation() {
        let client = OpenF1Client::new(OpenF1Config::default().with_base_url("http://x/v1/"));
        assert_eq!(client.unwrap().base_url, "http://x/v1");
    }

    #[test]
    fn date_filter_format() {
        let t: DateTime<Utc> = "2023-09-03T13:03:57.620+00:00".parse().unwrap();
        assert_eq!(t.format(DATE_FILTER_FORMAT).to_string(), "2023-09-03T13:03:57.620");
    }

    #[tokio::test]
    async fn lap_without_window_is_rejected() {
        use crate::session::{Lap, Laps};

        let client = OpenF1Client::new(OpenF1Config::default()).unwrap();
        let session = Session {
            key: SessionKey::new(2023, "Monza", SessionType::Race),
            provider_id: 9161,
            location: None,
            country_name: None,
            date_start: None,
            laps: Laps::new(vec![Lap {
                driver: "VER".into(),
                driver_number: 1,
                lap_number: 1,
                lap_time: None,
                date_start: None,
                is_pit_out_lap: true,
                compound: None,
                stint: None,
            }]),
            drivers: vec![],
            stints: vec![],
            weather: vec![],
        };

        // Neither call reaches the network.
        let err = client.lap_telemetry(&session, "VER", 1).await.unwrap_err();
        assert!(matches!(err, FetchError::LapWindowUnknown { lap: 1, .. }));
        let err = client.lap_telemetry(&session, "HAM", 1).await.unwrap_err();
        assert!(matches!(err, FetchError::LapWindowUnknown { .. }));
    }

    // Live API tests would go here, but they depend on a third-party
    // service and are not run in CI.
}
