//! Lap selection.
//!
//! "Quick" laps follow the usual timing-analysis convention: a lap counts if
//! its time is strictly below 107% of the fastest recorded lap.

use std::collections::BTreeSet;
use std::time::Duration;

use super::types::Lap;

/// Default quick-lap threshold relative to the fastest lap.
pub const QUICK_LAP_THRESHOLD: f64 = 1.07;

/// Bounds of a plausible racing lap, exclusive.
const MIN_PLAUSIBLE_LAP: Duration = Duration::from_secs(30);
const MAX_PLAUSIBLE_LAP: Duration = Duration::from_secs(300);

/// The laps of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Laps(Vec<Lap>);

impl Laps {
    pub fn new(laps: Vec<Lap>) -> Self {
        Self(laps)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Lap> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fastest recorded lap time.
    pub fn fastest(&self) -> Option<Duration> {
        self.0.iter().filter_map(|l| l.lap_time).min()
    }

    /// Laps faster than `threshold` times the fastest lap.
    ///
    /// Laps without a time never qualify. A negative, NaN or overflowing
    /// threshold selects nothing.
    pub fn pick_quick_laps(&self, threshold: f64) -> Laps {
        let Some(fastest) = self.fastest() else {
            return Laps::default();
        };
        let Ok(cutoff) = Duration::try_from_secs_f64(fastest.as_secs_f64() * threshold) else {
            return Laps::default();
        };

        self.0
            .iter()
            .filter(|l| l.lap_time.is_some_and(|t| t < cutoff))
            .cloned()
            .collect()
    }

    /// Laps with a time strictly between 30 s and 300 s.
    pub fn with_plausible_times(&self) -> Laps {
        self.0
            .iter()
            .filter(|l| {
                l.lap_time
                    .is_some_and(|t| t > MIN_PLAUSIBLE_LAP && t < MAX_PLAUSIBLE_LAP)
            })
            .cloned()
            .collect()
    }

    /// Laps for one driver, ordered by lap number.
    pub fn for_driver(&self, driver: &str) -> Laps {
        let mut laps: Vec<Lap> = self
            .0
            .iter()
            .filter(|l| l.driver == driver)
            .cloned()
            .collect();
        laps.sort_by_key(|l| l.lap_number);
        Laps(laps)
    }

    /// Find a specific lap.
    pub fn lap(&self, driver: &str, lap_number: u32) -> Option<&Lap> {
        self.0
            .iter()
            .find(|l| l.driver == driver && l.lap_number == lap_number)
    }

    /// Sorted, deduplicated driver identifiers.
    pub fn drivers(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|l| l.driver.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl FromIterator<Lap> for Laps {
    fn from_iter<I: IntoIterator<Item = Lap>>(iter: I) -> Self {
        Laps(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Laps {
    type Item = &'a Lap;
    type IntoIter = std::slice::Iter<'a, Lap>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Drivers who set at least one quick lap.
pub fn quick_lap_drivers(laps: &Laps) -> Vec<String> {
    laps.pick_quick_laps(QUICK_LAP_THRESHOLD).drivers()
}
