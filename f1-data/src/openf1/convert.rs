//! Conversion from OpenF1 DTOs to session domain types.
//!
//! Laps only carry a car number; the acronym comes from the driver list and
//! the compound from whichever stint covers the lap.

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use crate::session::{
    Compound, Driver, Lap, Laps, Session, SessionKey, Stint, TelemetrySample, WeatherSample,
};

use super::types::{CarDataDto, DriverDto, LapDto, SessionDto, StintDto, WeatherDto};

/// Raw responses that make up one session.
pub struct SessionParts {
    pub session: SessionDto,
    pub session_key: u32,
    pub laps: Vec<LapDto>,
    pub drivers: Vec<DriverDto>,
    pub stints: Vec<StintDto>,
    pub weather: Vec<WeatherDto>,
}

/// Assemble a session from its raw parts.
pub fn build_session(key: SessionKey, parts: SessionParts) -> Session {
    let drivers: Vec<Driver> = parts.drivers.iter().map(convert_driver).collect();

    let acronyms: HashMap<u32, &str> = drivers
        .iter()
        .map(|d| (d.number, d.acronym.as_str()))
        .collect();
    let label = |number: u32| -> String {
        acronyms
            .get(&number)
            .map(|a| a.to_string())
            .unwrap_or_else(|| number.to_string())
    };

    let stints: Vec<Stint> = parts
        .stints
        .iter()
        .filter_map(|s| convert_stint(s, label(s.driver_number)))
        .collect();

    let laps: Laps = parts
        .laps
        .iter()
        .map(|l| {
            let stint = stints
                .iter()
                .find(|s| s.driver_number == l.driver_number && s.covers(l.lap_number));
            Lap {
                driver: label(l.driver_number),
                driver_number: l.driver_number,
                lap_number: l.lap_number,
                lap_time: l.lap_duration.and_then(seconds_to_duration),
                date_start: l.date_start,
                is_pit_out_lap: l.is_pit_out_lap.unwrap_or(false),
                compound: stint.map(|s| s.compound.clone()),
                stint: stint.map(|s| s.stint_number),
            }
        })
        .collect();

    let weather = parts.weather.iter().map(convert_weather).collect();

    Session {
        key,
        provider_id: parts.session_key,
        location: parts.session.location,
        country_name: parts.session.country_name,
        date_start: parts.session.date_start,
        laps,
        drivers,
        stints,
        weather,
    }
}

fn convert_driver(dto: &DriverDto) -> Driver {
    let acronym = dto
        .name_acronym
        .clone()
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| dto.driver_number.to_string());

    Driver {
        number: dto.driver_number,
        acronym,
        full_name: dto.full_name.clone(),
        team_name: dto.team_name.clone(),
        team_colour: dto
            .team_colour
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| format!("#{}", c.trim_start_matches('#'))),
    }
}

fn convert_stint(dto: &StintDto, driver: String) -> Option<Stint> {
    // Stints still in progress have no end lap yet.
    let (Some(lap_start), Some(lap_end)) = (dto.lap_start, dto.lap_end) else {
        warn!(
            driver = %driver,
            stint = dto.stint_number,
            "skipping stint without lap range"
        );
        return None;
    };

    Some(Stint {
        driver,
        driver_number: dto.driver_number,
        stint_number: dto.stint_number,
        compound: dto
            .compound
            .as_deref()
            .map(Compound::parse)
            .unwrap_or(Compound::Unknown),
        lap_start,
        lap_end,
        tyre_age_at_start: dto.tyre_age_at_start,
    })
}

fn convert_weather(dto: &WeatherDto) -> WeatherSample {
    WeatherSample {
        date: dto.date,
        air_temperature: dto.air_temperature,
        track_temperature: dto.track_temperature,
        humidity: dto.humidity,
        pressure: dto.pressure,
        rainfall: dto.rainfall.is_some_and(|r| r > 0.0),
        wind_speed: dto.wind_speed,
        wind_direction: dto.wind_direction,
    }
}

pub fn convert_car_data(dto: &CarDataDto) -> TelemetrySample {
    TelemetrySample {
        date: dto.date,
        speed: dto.speed,
        throttle: dto.throttle,
        brake: dto.brake,
        gear: dto.n_gear,
        rpm: dto.rpm,
        drs: dto.drs,
    }
}

fn seconds_to_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok().filter(|d| !d.is_zero())
}
