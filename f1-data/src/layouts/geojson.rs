//! GeoJSON DTOs for the circuit layout dataset.
//!
//! Only the geometry types the dataset uses are modelled. Positions may carry
//! a third (altitude) value, which is ignored.

use serde::Deserialize;

/// Top-level GeoJSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// One circuit.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub properties: LayoutProperties,
    pub geometry: Geometry,
}

/// Feature properties as published.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutProperties {
    pub id: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Location")]
    pub location: String,
    pub opened: Option<i32>,
    pub firstgp: Option<i32>,
    /// Metres.
    pub length: Option<f64>,
    /// Metres above sea level.
    pub altitude: Option<f64>,
}

/// A longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl TryFrom<Vec<f64>> for Coord {
    type Error = String;

    fn try_from(v: Vec<f64>) -> Result<Self, Self::Error> {
        match v.as_slice() {
            [lon, lat, ..] => Ok(Coord {
                lon: *lon,
                lat: *lat,
            }),
            _ => Err(format!("position needs at least 2 values, got {}", v.len())),
        }
    }
}

/// Track shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Coord },
    LineString { coordinates: Vec<Coord> },
    MultiLineString { coordinates: Vec<Vec<Coord>> },
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Coord,
    pub max: Coord,
}

impl Geometry {
    /// The line parts of this geometry. A point is a single one-vertex part.
    fn parts(&self) -> Vec<&[Coord]> {
        match self {
            Geometry::Point { coordinates } => vec![std::slice::from_ref(coordinates)],
            Geometry::LineString { coordinates } => vec![coordinates.as_slice()],
            Geometry::MultiLineString { coordinates } => {
                coordinates.iter().map(Vec::as_slice).collect()
            }
        }
    }

    /// First vertex; for a circuit this is the start/finish line.
    pub fn start(&self) -> Option<Coord> {
        self.parts().into_iter().find_map(|p| p.first().copied())
    }

    /// Total number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.parts().iter().map(|p| p.len()).sum()
    }

    /// Length-weighted centroid of the line work, in degrees.
    ///
    /// Degenerate lines (all segments zero length) fall back to the vertex mean.
    pub fn centroid(&self) -> Option<Coord> {
        let parts = self.parts();
        let (mut sum_lon, mut sum_lat, mut total) = (0.0, 0.0, 0.0);

        for part in &parts {
            for seg in part.windows(2) {
                let (a, b) = (seg[0], seg[1]);
                let len = (b.lon - a.lon).hypot(b.lat - a.lat);
                sum_lon += len * (a.lon + b.lon) / 2.0;
                sum_lat += len * (a.lat + b.lat) / 2.0;
                total += len;
            }
        }

        if total > 0.0 {
            return Some(Coord {
                lon: sum_lon / total,
                lat: sum_lat / total,
            });
        }

        let vertices: Vec<Coord> = parts.into_iter().flatten().copied().collect();
        if vertices.is_empty() {
            return None;
        }
        let n = vertices.len() as f64;
        Some(Coord {
            lon: vertices.iter().map(|c| c.lon).sum::<f64>() / n,
            lat: vertices.iter().map(|c| c.lat).sum::<f64>() / n,
        })
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut vertices = self.parts().into_iter().flatten().copied();
        let first = vertices.next()?;
        Some(vertices.fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, c| Bounds {
                min: Coord {
                    lon: b.min.lon.min(c.lon),
                    lat: b.min.lat.min(c.lat),
                },
                max: Coord {
                    lon: b.max.lon.max(c.lon),
                    lat: b.max.lat.max(c.lat),
                },
            },
        ))
    }
}
