//! OpenF1 API response DTOs.
//!
//! These map directly to the JSON objects the endpoints return. Fields the
//! API sometimes sends as `null` are `Option`; fields the crate depends on are
//! required so a response without them fails to parse.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One record from `/v1/meetings`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeetingDto {
    pub circuit_short_name: String,
    pub location: String,
    pub country_name: String,
    pub meeting_name: String,
    pub meeting_key: Option<u32>,
    pub year: Option<i32>,
}

/// One record from `/v1/sessions`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionDto {
    pub session_name: String,
    pub session_key: Option<u32>,
    pub session_type: Option<String>,
    pub circuit_short_name: Option<String>,
    pub location: Option<String>,
    pub country_name: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub year: Option<i32>,
}

/// One record from `/v1/laps`.
#[derive(Debug, Clone, Deserialize)]
pub struct LapDto {
    pub driver_number: u32,
    pub lap_number: u32,
    /// Seconds.
    pub lap_duration: Option<f64>,
    pub date_start: Option<DateTime<Utc>>,
    pub is_pit_out_lap: Option<bool>,
}

/// One record from `/v1/drivers`.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverDto {
    pub driver_number: u32,
    pub name_acronym: Option<String>,
    pub full_name: Option<String>,
    pub team_name: Option<String>,
    /// Hex colour without the leading `#`.
    pub team_colour: Option<String>,
}

/// One record from `/v1/stints`.
#[derive(Debug, Clone, Deserialize)]
pub struct StintDto {
    pub driver_number: u32,
    pub stint_number: u32,
    pub compound: Option<String>,
    pub lap_start: Option<u32>,
    pub lap_end: Option<u32>,
    pub tyre_age_at_start: Option<u32>,
}

/// One record from `/v1/weather`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherDto {
    pub date: DateTime<Utc>,
    pub air_temperature: Option<f64>,
    pub track_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    /// 0 or 1.
    pub rainfall: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
}

/// One record from `/v1/car_data`.
#[derive(Debug, Clone, Deserialize)]
pub struct CarDataDto {
    pub date: DateTime<Utc>,
    pub speed: Option<f64>,
    pub throttle: Option<f64>,
    pub brake: Option<f64>,
    pub n_gear: Option<u8>,
    pub rpm: Option<u32>,
    pub drs: Option<u8>,
}
