//! Geometry payloads held by the cache and spatial keys held by indexes.
//!
//! Cached geometries are an explicit tagged union ([`CacheGeometry`])
//! keyed by a variant enum; the snapshot codec dispatches on the variant
//! for both encode and decode, so no runtime-type inspection is needed.
//!
//! Index keys ([`IndexShape`]) are deliberately reduced precision: a
//! spatial key needs neither Z nor double precision, so points and
//! rectangles are stored as 32-bit floats.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::bounding_box::BoundingBox;

/// A full-precision 3D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coord {
    /// Creates a new coordinate.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a coordinate in the XY plane.
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance to another coordinate in the XY plane.
    pub fn distance_xy(&self, other: &Coord) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Ring set of one polygon: the exterior shell plus any interior holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRings {
    pub shell: Vec<Coord>,
    pub holes: Vec<Vec<Coord>>,
}

impl PolygonRings {
    /// Creates a polygon ring set.
    pub fn new(shell: Vec<Coord>, holes: Vec<Vec<Coord>>) -> Self {
        Self { shell, holes }
    }
}

/// A geometry payload memoized by the cache.
///
/// The cache itself never interprets the payload; the variants exist so
/// the snapshot codec can encode each one compactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheGeometry {
    /// A single 3D point.
    Point(Coord),
    /// An open or closed line string.
    LineString(Vec<Coord>),
    /// A polygon with shell and holes.
    Polygon(PolygonRings),
    /// A collection of point geometries.
    MultiPoint(Vec<CacheGeometry>),
    /// A collection of line-string geometries.
    MultiLineString(Vec<CacheGeometry>),
    /// A collection of polygon ring sets.
    MultiPolygon(Vec<PolygonRings>),
}

impl CacheGeometry {
    /// Creates a point geometry.
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        CacheGeometry::Point(Coord::new(x, y, z))
    }

    /// Creates a line string from coordinates.
    pub fn line_string(coords: Vec<Coord>) -> Self {
        CacheGeometry::LineString(coords)
    }

    /// Creates a polygon from its shell and holes.
    pub fn polygon(shell: Vec<Coord>, holes: Vec<Vec<Coord>>) -> Self {
        CacheGeometry::Polygon(PolygonRings::new(shell, holes))
    }

    /// Computes the 2D bounding box of this geometry, if it has any
    /// coordinates at all.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        self.visit_coords(&mut |c| {
            let point = BoundingBox::new(c.x, c.x, c.y, c.y);
            bounds = Some(match bounds.take() {
                Some(current) => current.union(&point),
                None => point,
            });
        });
        bounds
    }

    fn visit_coords(&self, visit: &mut impl FnMut(&Coord)) {
        match self {
            CacheGeometry::Point(c) => visit(c),
            CacheGeometry::LineString(coords) => coords.iter().for_each(&mut *visit),
            CacheGeometry::Polygon(rings) => {
                rings.shell.iter().for_each(&mut *visit);
                for hole in &rings.holes {
                    hole.iter().for_each(&mut *visit);
                }
            }
            CacheGeometry::MultiPoint(parts) | CacheGeometry::MultiLineString(parts) => {
                for part in parts {
                    part.visit_coords(visit);
                }
            }
            CacheGeometry::MultiPolygon(polygons) => {
                for rings in polygons {
                    rings.shell.iter().for_each(&mut *visit);
                    for hole in &rings.holes {
                        hole.iter().for_each(&mut *visit);
                    }
                }
            }
        }
    }
}

/// Reduced-precision bounding shape used as a spatial index key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IndexShape {
    /// A 2D point key.
    Point { x: f32, y: f32 },
    /// A rectangle key (x1, y1) to (x2, y2).
    Rect { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl IndexShape {
    /// Creates a point shape.
    pub fn point(x: f32, y: f32) -> Self {
        IndexShape::Point { x, y }
    }

    /// Creates a rectangle shape.
    pub fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        IndexShape::Rect { x1, y1, x2, y2 }
    }

    /// Creates a rectangle shape from a full-precision bounding box.
    pub fn from_bounding_box(bbox: &BoundingBox) -> Self {
        IndexShape::Rect {
            x1: bbox.min_x as f32,
            y1: bbox.min_y as f32,
            x2: bbox.max_x as f32,
            y2: bbox.max_y as f32,
        }
    }

    /// Converts this shape to an rstar envelope.
    pub(crate) fn to_aabb(&self) -> rstar::AABB<[f32; 2]> {
        match *self {
            IndexShape::Point { x, y } => rstar::AABB::from_point([x, y]),
            IndexShape::Rect { x1, y1, x2, y2 } => {
                rstar::AABB::from_corners([x1, y1], [x2, y2])
            }
        }
    }
}
