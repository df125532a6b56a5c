//! Cached fetch service.
//!
//! [`F1DataService`] owns one [`TtlCache`] per fetch operation and talks to
//! its data sources through the traits in [`crate::source`]. Every operation
//! returns a `Result`; callers wanting the degraded empty result wrap it in
//! [`or_empty`](crate::error::or_empty).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheConfig, Clock, SystemClock, TtlCache};
use crate::circuits::{CircuitTable, session_names};
use crate::error::FetchError;
use crate::layouts::{CircuitGeometryTable, CircuitLayoutClient, CircuitLayoutConfig};
use crate::openf1::{OpenF1Client, OpenF1Config};
use crate::session::{Session, SessionKey, SessionType, TelemetrySample, quick_lap_drivers};
use crate::source::{CircuitLayoutSource, RaceCalendar, TelemetryProvider};

/// A loaded session instance: its key plus the address of its `Arc`.
type LoadedSessionId = (SessionKey, usize);

/// Driver list, with the session it came from kept alive so its address is not reused.
type DriversEntry = (Arc<Session>, Arc<Vec<String>>);

/// Default bound on a single external call, including session loading.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the fetch service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Applied to each of the service's caches.
    pub cache: CacheConfig,

    /// Upper bound on each external call. `None` leaves only the HTTP client timeouts.
    pub call_timeout: Option<Duration>,
}

impl ServiceConfig {
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
        }
    }
}

/// F1 data access with per-operation memoization.
pub struct F1DataService {
    calendar: Arc<dyn RaceCalendar>,
    telemetry: Arc<dyn TelemetryProvider>,
    layouts: Arc<dyn CircuitLayoutSource>,
    call_timeout: Option<Duration>,

    sessions: TtlCache<SessionKey, Arc<Session>>,
    circuits: TtlCache<i32, Arc<CircuitTable>>,
    session_names: TtlCache<(i32, String), Arc<Vec<String>>>,
    drivers: TtlCache<LoadedSessionId, DriversEntry>,
    geometries: TtlCache<(), Arc<CircuitGeometryTable>>,
}

impl F1DataService {
    /// Create a service over the given sources, using the wall clock.
    pub fn new(
        calendar: Arc<dyn RaceCalendar>,
        telemetry: Arc<dyn TelemetryProvider>,
        layouts: Arc<dyn CircuitLayoutSource>,
        config: &ServiceConfig,
    ) -> Self {
        Self::with_clock(calendar, telemetry, layouts, config, Arc::new(SystemClock))
    }

    /// Create a service whose caches read time from `clock`.
    pub fn with_clock(
        calendar: Arc<dyn RaceCalendar>,
        telemetry: Arc<dyn TelemetryProvider>,
        layouts: Arc<dyn CircuitLayoutSource>,
        config: &ServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = &config.cache;
        Self {
            calendar,
            telemetry,
            layouts,
            call_timeout: config.call_timeout,
            sessions: TtlCache::new("sessions", cache, clock.clone()),
            circuits: TtlCache::new("circuits", cache, clock.clone()),
            session_names: TtlCache::new("session_names", cache, clock.clone()),
            drivers: TtlCache::new("drivers", cache, clock.clone()),
            geometries: TtlCache::new("geometries", cache, clock),
        }
    }

    /// Create a service backed by OpenF1 and the circuit layout dataset.
    pub fn connect(
        openf1: OpenF1Config,
        layouts: CircuitLayoutConfig,
        config: &ServiceConfig,
    ) -> Result<Self, FetchError> {
        let openf1 = Arc::new(OpenF1Client::new(openf1)?);
        let layouts = Arc::new(CircuitLayoutClient::new(layouts)?);
        Ok(Self::new(openf1.clone(), openf1, layouts, config))
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        let Some(limit) = self.call_timeout else {
            return call.await;
        };
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_secs = limit.as_secs(), "external call timed out");
                Err(FetchError::Timeout { after: limit })
            }
        }
    }

    /// Load a session with laps, drivers, stints and weather.
    ///
    /// Provider errors are returned unchanged; there is no degraded result.
    pub async fn load_session(
        &self,
        year: i32,
        circuit: &str,
        session_type: SessionType,
    ) -> Result<Arc<Session>, FetchError> {
        let key = SessionKey::new(year, circuit, session_type);
        self.sessions
            .get_or_try_fetch(key, || async move {
                let session = self
                    .bounded(
                        "load_session",
                        self.telemetry.load_session(year, circuit, session_type),
                    )
                    .await?;
                Ok::<_, FetchError>(Arc::new(session))
            })
            .await
    }

    /// Circuits visited in `year`, one row per (name, location, country).
    pub async fn get_circuits_for_year(&self, year: i32) -> Result<Arc<CircuitTable>, FetchError> {
        self.circuits
            .get_or_try_fetch(year, || async move {
                let meetings = self
                    .bounded("meetings", self.calendar.meetings(year))
                    .await?;
                debug!(year, meetings = meetings.len(), "fetched meetings");
                Ok::<_, FetchError>(Arc::new(CircuitTable::from_meetings(&meetings)))
            })
            .await
    }

    /// Distinct session names held at a circuit in `year`, sorted.
    pub async fn get_sessions_for_circuit_year(
        &self,
        year: i32,
        circuit_name: &str,
    ) -> Result<Arc<Vec<String>>, FetchError> {
        self.session_names
            .get_or_try_fetch((year, circuit_name.to_string()), || async move {
                let sessions = self
                    .bounded("sessions", self.calendar.sessions(year, circuit_name))
                    .await?;
                Ok::<_, FetchError>(Arc::new(session_names(&sessions)))
            })
            .await
    }

    /// Drivers with at least one quick lap, sorted and deduplicated.
    ///
    /// No session gives an empty list. Results are cached per loaded session
    /// instance, so reloading a session (for example after its cache entry
    /// expires) recomputes the list from the new laps.
    pub async fn get_drivers_session(&self, session: Option<&Arc<Session>>) -> Arc<Vec<String>> {
        let Some(session) = session else {
            return Arc::new(Vec::new());
        };
        let id = (session.key.clone(), Arc::as_ptr(session) as usize);
        let (_, drivers) = self
            .drivers
            .get_or_insert_with(id, || async move {
                let drivers = Arc::new(quick_lap_drivers(&session.laps));
                (session.clone(), drivers)
            })
            .await;
        drivers
    }

    /// Circuit layouts with metadata and country.
    pub async fn get_circuits_geojson(&self) -> Result<Arc<CircuitGeometryTable>, FetchError> {
        self.geometries
            .get_or_try_fetch((), || async move {
                let collection = self
                    .bounded("circuit_layouts", self.layouts.circuit_layouts())
                    .await?;
                let table = CircuitGeometryTable::from_collection(collection)?;
                Ok::<_, FetchError>(Arc::new(table))
            })
            .await
    }

    /// Car telemetry for one lap. Not cached.
    pub async fn lap_telemetry(
        &self,
        session: &Session,
        driver: &str,
        lap_number: u32,
    ) -> Result<Vec<TelemetrySample>, FetchError> {
        self.bounded(
            "lap_telemetry",
            self.telemetry.lap_telemetry(session, driver, lap_number),
        )
        .await
    }

    /// TTL shared by every cache.
    pub fn ttl(&self) -> Duration {
        self.circuits.ttl()
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
