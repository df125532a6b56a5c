//! Session domain types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::laps::Laps;

/// Error returned when parsing an unknown session type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session type: {0:?}")]
pub struct InvalidSessionType(String);

/// The kinds of session a race weekend can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionType {
    Practice1,
    Practice2,
    Practice3,
    Qualifying,
    Race,
    Sprint,
    SprintQualifying,
    SprintShootout,
}

impl SessionType {
    pub const ALL: [SessionType; 8] = [
        SessionType::Practice1,
        SessionType::Practice2,
        SessionType::Practice3,
        SessionType::Qualifying,
        SessionType::Race,
        SessionType::Sprint,
        SessionType::SprintQualifying,
        SessionType::SprintShootout,
    ];

    /// The session name as the APIs spell it.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Practice1 => "Practice 1",
            SessionType::Practice2 => "Practice 2",
            SessionType::Practice3 => "Practice 3",
            SessionType::Qualifying => "Qualifying",
            SessionType::Race => "Race",
            SessionType::Sprint => "Sprint",
            SessionType::SprintQualifying => "Sprint Qualifying",
            SessionType::SprintShootout => "Sprint Shootout",
        }
    }
}

impl FromStr for SessionType {
    type Err = InvalidSessionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidSessionType(s.to_string()))
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a session: what the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub year: i32,
    pub circuit: String,
    pub session_type: SessionType,
}

impl SessionKey {
    pub fn new(year: i32, circuit: impl Into<String>, session_type: SessionType) -> Self {
        Self {
            year,
            circuit: circuit.into(),
            session_type,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.year, self.circuit, self.session_type)
    }
}

/// Tyre compound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    Unknown,
}

impl Compound {
    /// Parse the upper-case compound names used by timing data.
    /// Anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "SOFT" => Compound::Soft,
            "MEDIUM" => Compound::Medium,
            "HARD" => Compound::Hard,
            "INTERMEDIATE" => Compound::Intermediate,
            "WET" => Compound::Wet,
            _ => Compound::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compound::Soft => "SOFT",
            Compound::Medium => "MEDIUM",
            Compound::Hard => "HARD",
            Compound::Intermediate => "INTERMEDIATE",
            Compound::Wet => "WET",
            Compound::Unknown => "Unknown",
        }
    }

    /// Display colour for strategy charts.
    pub fn colour(&self) -> &'static str {
        match self {
            Compound::Soft => "#FF3333",
            Compound::Medium => "#FFFF00",
            Compound::Hard => "#FFFFFF",
            Compound::Intermediate => "#39FF14",
            Compound::Wet => "#0080FF",
            Compound::Unknown => "#808080",
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver entered in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Driver {
    pub number: u32,
    /// Three-letter abbreviation, e.g. "VER".
    pub acronym: String,
    pub full_name: Option<String>,
    pub team_name: Option<String>,
    /// Team colour as `#RRGGBB`.
    pub team_colour: Option<String>,
}

/// One timed lap.
#[derive(Debug, Clone, PartialEq)]
pub struct Lap {
    /// Driver acronym, or the car number when the acronym is unknown.
    pub driver: String,
    pub driver_number: u32,
    pub lap_number: u32,
    /// `None` when no time was recorded (pit out, red flag, ...).
    pub lap_time: Option<Duration>,
    pub date_start: Option<DateTime<Utc>>,
    pub is_pit_out_lap: bool,
    pub compound: Option<Compound>,
    pub stint: Option<u32>,
}

/// A run on one set of tyres.
#[derive(Debug, Clone, PartialEq)]
pub struct Stint {
    pub driver: String,
    pub driver_number: u32,
    pub stint_number: u32,
    pub compound: Compound,
    pub lap_start: u32,
    pub lap_end: u32,
    pub tyre_age_at_start: Option<u32>,
}

impl Stint {
    /// Number of laps covered, inclusive of both ends.
    pub fn length(&self) -> u32 {
        self.lap_end.saturating_sub(self.lap_start) + 1
    }

    pub fn covers(&self, lap_number: u32) -> bool {
        (self.lap_start..=self.lap_end).contains(&lap_number)
    }
}

/// Weather sample taken during the session.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSample {
    pub date: DateTime<Utc>,
    pub air_temperature: Option<f64>,
    pub track_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub rainfall: bool,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
}

/// Car telemetry sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub date: DateTime<Utc>,
    /// km/h
    pub speed: Option<f64>,
    /// Percent, 0-100.
    pub throttle: Option<f64>,
    /// Percent, 0-100. Timing data only reports 0 or 100.
    pub brake: Option<f64>,
    pub gear: Option<u8>,
    pub rpm: Option<u32>,
    pub drs: Option<u8>,
}

/// A fully loaded session.
#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    /// Provider identifier for follow-up requests (e.g. lap telemetry).
    pub provider_id: u32,
    pub location: Option<String>,
    pub country_name: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub laps: Laps,
    pub drivers: Vec<Driver>,
    pub stints: Vec<Stint>,
    pub weather: Vec<WeatherSample>,
}

/// Stint length summary for strategy charts.
#[derive(Debug, Clone, PartialEq)]
pub struct StintSummary {
    pub driver: String,
    pub stint_number: u32,
    pub compound: Compound,
    pub laps: u32,
}

impl Session {
    /// Highest lap number anyone completed.
    pub fn total_laps(&self) -> u32 {
        self.laps.iter().map(|l| l.lap_number).max().unwrap_or(0)
    }

    /// Look up a driver by acronym.
    pub fn driver(&self, acronym: &str) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.acronym == acronym)
    }

    /// Stints per driver, ordered by driver then stint number.
    pub fn stint_summary(&self) -> Vec<StintSummary> {
        let mut summary: Vec<StintSummary> = self
            .stints
            .iter()
            .map(|s| StintSummary {
                driver: s.driver.clone(),
                stint_number: s.stint_number,
                compound: s.compound.clone(),
                laps: s.length(),
            })
            .collect();
        summary.sort_by(|a, b| {
            a.driver
                .cmp(&b.driver)
                .then(a.stint_number.cmp(&b.stint_number))
        });
        summary
    }
}
