//! Circuit and session-type listings for a season.
//!
//! Meetings come back one record per event; the circuit table keeps one row
//! per (name, location, country_name), first occurrence wins.

use std::collections::{BTreeSet, HashSet};

use crate::openf1::{MeetingDto, SessionDto};

/// One circuit visited in a season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitRecord {
    /// Circuit short name, e.g. "Monza".
    pub name: String,
    pub location: String,
    pub country_name: String,
    pub meeting_name: String,
}

impl CircuitRecord {
    fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.name, &self.location, &self.country_name)
    }
}

/// Circuits of a season, in calendar order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitTable {
    rows: Vec<CircuitRecord>,
}

impl CircuitTable {
    pub const COLUMNS: [&'static str; 4] = ["name", "location", "country_name", "meeting_name"];

    pub fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    /// Rows, indexed sequentially from 0.
    pub fn rows(&self) -> &[CircuitRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Circuit short names, for selection lists.
    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }

    /// Build the table from meeting records.
    pub fn from_meetings(meetings: &[MeetingDto]) -> Self {
        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        for m in meetings {
            let key = (
                m.circuit_short_name.as_str(),
                m.location.as_str(),
                m.country_name.as_str(),
            );
            if !seen.insert(key) {
                continue;
            }
            rows.push(CircuitRecord {
                name: m.circuit_short_name.clone(),
                location: m.location.clone(),
                country_name: m.country_name.clone(),
                meeting_name: m.meeting_name.clone(),
            });
        }

        Self { rows }
    }
}

/// Distinct session names, sorted ascending.
pub fn session_names(sessions: &[SessionDto]) -> Vec<String> {
    sessions
        .iter()
        .map(|s| s.session_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
