//! Loaded session data.
//!
//! A [`Session`] is immutable once loaded and is shared through `Arc` by the
//! cache entry that produced it.

mod laps;
mod types;

pub use laps::{Laps, QUICK_LAP_THRESHOLD, quick_lap_drivers};
pub use types::{
    Compound, Driver, InvalidSessionType, Lap, Session, SessionKey, SessionType, Stint,
    StintSummary, TelemetrySample, WeatherSample,
};
