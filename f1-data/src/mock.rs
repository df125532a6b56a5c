//! In-memory F1 data source for testing without network access.
//!
//! Serves canned meetings, sessions, loaded sessions and layouts, counts
//! every call, and can be told to fail specific operations.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::layouts::FeatureCollection;
use crate::openf1::{MeetingDto, SessionDto};
use crate::session::{Session, SessionKey, SessionType, TelemetrySample};
use crate::source::{CircuitLayoutSource, RaceCalendar, TelemetryProvider};

/// Operations the mock can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    Meetings,
    Sessions,
    LoadSession,
    LapTelemetry,
    CircuitLayouts,
}

/// Mock data source implementing every provider trait.
#[derive(Default)]
pub struct MockF1Source {
    meetings: HashMap<i32, Vec<MeetingDto>>,
    sessions: HashMap<(i32, String), Vec<SessionDto>>,
    loaded: HashMap<SessionKey, Session>,
    telemetry: Vec<TelemetrySample>,
    layouts: Option<FeatureCollection>,
    failing: HashSet<MockCall>,
    delay: Option<Duration>,
    calls: Mutex<HashMap<MockCall, usize>>,
}

impl MockF1Source {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meetings returned for `year`. Unknown years return an empty list.
    pub fn with_meetings(mut self, year: i32, meetings: Vec<MeetingDto>) -> Self {
        self.meetings.insert(year, meetings);
        self
    }

    /// Sessions returned for `(year, circuit)`.
    pub fn with_sessions(
        mut self,
        year: i32,
        circuit: impl Into<String>,
        sessions: Vec<SessionDto>,
    ) -> Self {
        self.sessions.insert((year, circuit.into()), sessions);
        self
    }

    /// A session served by `load_session` under its own key.
    pub fn with_session(mut self, session: Session) -> Self {
        self.loaded.insert(session.key.clone(), session);
        self
    }

    /// Samples returned for any lap telemetry request.
    pub fn with_telemetry(mut self, samples: Vec<TelemetrySample>) -> Self {
        self.telemetry = samples;
        self
    }

    /// Layout dataset. Without one, layout requests fail with a 404.
    pub fn with_layouts(mut self, layouts: FeatureCollection) -> Self {
        self.layouts = Some(layouts);
        self
    }

    /// Make `call` fail with a 503.
    pub fn failing(mut self, call: MockCall) -> Self {
        self.failing.insert(call);
        self
    }

    /// Sleep this long before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `call` has been made.
    pub fn calls(&self, call: MockCall) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(&call).copied().unwrap_or(0)
    }

    async fn record(&self, call: MockCall) -> Result<(), FetchError> {
        {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            *calls.entry(call).or_default() += 1;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&call) {
            return Err(FetchError::Api {
                status: 503,
                message: format!("mock failure for {call:?}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RaceCalendar for MockF1Source {
    async fn meetings(&self, year: i32) -> Result<Vec<MeetingDto>, FetchError> {
        self.record(MockCall::Meetings).await?;
        Ok(self.meetings.get(&year).cloned().unwrap_or_default())
    }

    async fn sessions(
        &self,
        year: i32,
        circuit_short_name: &str,
    ) -> Result<Vec<SessionDto>, FetchError> {
        self.record(MockCall::Sessions).await?;
        Ok(self
            .sessions
            .get(&(year, circuit_short_name.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TelemetryProvider for MockF1Source {
    async fn load_session(
        &self,
        year: i32,
        circuit: &str,
        session_type: SessionType,
    ) -> Result<Session, FetchError> {
        self.record(MockCall::LoadSession).await?;
        let key = SessionKey::new(year, circuit, session_type);
        self.loaded
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::SessionNotFound {
                year,
                circuit: circuit.to_string(),
                session_type,
            })
    }

    async fn lap_telemetry(
        &self,
        session: &Session,
        driver: &str,
        lap_number: u32,
    ) -> Result<Vec<TelemetrySample>, FetchError> {
        self.record(MockCall::LapTelemetry).await?;
        if session.laps.lap(driver, lap_number).is_none() {
            return Err(FetchError::LapWindowUnknown {
                driver: driver.to_string(),
                lap: lap_number,
            });
        }
        Ok(self.telemetry.clone())
    }
}

#[async_trait]
impl CircuitLayoutSource for MockF1Source {
    async fn circuit_layouts(&self) -> Result<FeatureCollection, FetchError> {
        self.record(MockCall::CircuitLayouts).await?;
        self.layouts.clone().ok_or_else(|| FetchError::Api {
            status: 404,
            message: "no mock layouts".to_string(),
        })
    }
}
