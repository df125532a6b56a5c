//! Circuit geometry table.
//!
//! The layout dataset has no country property, so countries are assigned by
//! row position from [`LAYOUT_COUNTRIES`]. This relies on the dataset keeping
//! its row order; a row count that no longer matches is reported as an error
//! instead of assigning a partial or shifted list.

use crate::error::FetchError;

use super::geojson::{FeatureCollection, Geometry};

/// Country of each layout, in dataset row order.
pub const LAYOUT_COUNTRIES: [&str; 36] = [
    "Australia",
    "Bahrain",
    "China",
    "Azerbaijan",
    "Spain",
    "Monaco",
    "Canada",
    "France",
    "Austria",
    "United Kingdom",
    "Germany",
    "Hungary",
    "Belgium",
    "Italy",
    "Singapore",
    "Russia",
    "Japan",
    "United States",
    "Mexico",
    "Brazil",
    "United Arab Emirates",
    "Italy",
    "Germany",
    "Portugal",
    "Italy",
    "Malaysia",
    "Turkey",
    "Netherlands",
    "France",
    "Portugal",
    "Brazil",
    "Saudi Arabia",
    "United States",
    "Qatar",
    "United States",
    "Spain",
];

/// One row of the geometry table. The source `id` is not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitGeometry {
    pub name: String,
    pub location: String,
    pub country: String,
    pub opened: Option<i32>,
    pub first_gp: Option<i32>,
    /// Metres.
    pub length: Option<f64>,
    /// Metres.
    pub altitude: Option<f64>,
    pub geometry: Geometry,
}

/// Circuit layouts with metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircuitGeometryTable {
    rows: Vec<CircuitGeometry>,
}

impl CircuitGeometryTable {
    pub const COLUMNS: [&'static str; 8] = [
        "Name", "Location", "Country", "opened", "firstgp", "length", "altitude", "geometry",
    ];

    pub fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    pub fn rows(&self) -> &[CircuitGeometry] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a layout by circuit name or location.
    pub fn find(&self, name_or_location: &str) -> Option<&CircuitGeometry> {
        self.rows
            .iter()
            .find(|r| r.name == name_or_location || r.location == name_or_location)
    }

    /// Build the table from the downloaded collection.
    pub fn from_collection(collection: FeatureCollection) -> Result<Self, FetchError> {
        Self::with_countries(collection, &LAYOUT_COUNTRIES)
    }

    fn with_countries(
        collection: FeatureCollection,
        countries: &[&str],
    ) -> Result<Self, FetchError> {
        if collection.features.len() != countries.len() {
            return Err(FetchError::CountryBackfillMismatch {
                expected: countries.len(),
                actual: collection.features.len(),
            });
        }

        let rows = collection
            .features
            .into_iter()
            .zip(countries)
            .map(|(feature, country)| {
                let p = feature.properties;
                CircuitGeometry {
                    name: p.name,
                    location: p.location,
                    country: country.to_string(),
                    opened: p.opened,
                    first_gp: p.firstgp,
                    length: p.length,
                    altitude: p.altitude,
                    geometry: feature.geometry,
                }
            })
            .collect();

        Ok(Self { rows })
    }
}
