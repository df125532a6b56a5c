//! OpenF1 REST client.
//!
//! This module provides an HTTP client for the public OpenF1 API, which
//! serves the race calendar (meetings and sessions) and per-session timing
//! data (laps, drivers, stints, weather, car telemetry).
//!
//! Key characteristics of OpenF1:
//! - Every endpoint returns a flat JSON array of records
//! - Filters are plain query parameters; date ranges use `date>=`/`date<=`
//! - Anonymous access is rate limited, so requests go through a semaphore

mod client;
mod convert;
mod types;

pub use client::{OpenF1Client, OpenF1Config};
pub use types::{CarDataDto, DriverDto, LapDto, MeetingDto, SessionDto, StintDto, WeatherDto};
