//! External data source traits.
//!
//! The fetch service talks to its providers only through these traits, so
//! tests can swap in [`MockF1Source`](crate::mock::MockF1Source).

use async_trait::async_trait;

use crate::error::FetchError;
use crate::layouts::FeatureCollection;
use crate::openf1::{MeetingDto, SessionDto};
use crate::session::{Session, SessionType, TelemetrySample};

/// Season calendar: meetings and the sessions held at each circuit.
#[async_trait]
pub trait RaceCalendar: Send + Sync {
    /// Meetings held in a season, in API order.
    async fn meetings(&self, year: i32) -> Result<Vec<MeetingDto>, FetchError>;

    /// Sessions held at a circuit in a season, in API order.
    async fn sessions(
        &self,
        year: i32,
        circuit_short_name: &str,
    ) -> Result<Vec<SessionDto>, FetchError>;
}

/// Session timing and telemetry.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// Resolve and eagerly load a session: laps, drivers, stints, weather.
    async fn load_session(
        &self,
        year: i32,
        circuit: &str,
        session_type: SessionType,
    ) -> Result<Session, FetchError>;

    /// Car telemetry for a single lap.
    async fn lap_telemetry(
        &self,
        session: &Session,
        driver: &str,
        lap_number: u32,
    ) -> Result<Vec<TelemetrySample>, FetchError>;
}

/// Static circuit layout dataset.
#[async_trait]
pub trait CircuitLayoutSource: Send + Sync {
    async fn circuit_layouts(&self) -> Result<FeatureCollection, FetchError>;
}
