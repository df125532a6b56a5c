//! Circuit layouts.
//!
//! Downloads the public GeoJSON dataset of circuit shapes and turns it into a
//! [`CircuitGeometryTable`].

mod client;
mod geojson;
mod table;

pub use client::{CircuitLayoutClient, CircuitLayoutConfig};
pub use geojson::{Bounds, Coord, Feature, FeatureCollection, Geometry, LayoutProperties};
pub use table::{CircuitGeometry, CircuitGeometryTable, LAYOUT_COUNTRIES};

#[cfg(test)]
pub(crate) use table::tests::collection as test_collection;
