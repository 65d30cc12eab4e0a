use std::hash::Hash;

use rstar::AABB;

/// A 2D axis-aligned bounding box.
///
/// `BoundingBox` defines a rectangular area in 2D space using the minimum
/// (min_x, min_y) and maximum (max_x, max_y) corners. Envelopes cached per
/// node and spatial query regions are both expressed as bounding boxes.
#[derive(Clone, PartialEq, Default, Debug, serde::Deserialize, serde::Serialize)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl Eq for BoundingBox {}

impl Hash for BoundingBox {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.min_x.to_bits().hash(state);
        self.max_x.to_bits().hash(state);
        self.min_y.to_bits().hash(state);
        self.max_y.to_bits().hash(state);
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BoundingBox({}, {}, {}, {})",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

impl BoundingBox {
    /// Creates a new bounding box with the specified extents.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Checks if this bounding box contains a point.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Checks if this bounding box intersects another bounding box.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Returns the union of this bounding box with another.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.max_x.max(other.max_x),
            self.min_y.min(other.min_y),
            self.max_y.max(other.max_y),
        )
    }

    /// Checks if this bounding box is valid (min <= max).
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Converts to a single-precision rstar envelope for index queries.
    pub(crate) fn to_aabb(&self) -> AABB<[f32; 2]> {
        AABB::from_corners(
            [self.min_x as f32, self.min_y as f32],
            [self.max_x as f32, self.max_y as f32],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new() {
        let bbox = BoundingBox::new(1.0, 3.0, 2.0, 4.0);
        assert_eq!(bbox.min_x, 1.0);
        assert_eq!(bbox.max_x, 3.0);
        assert_eq!(bbox.min_y, 2.0);
        assert_eq!(bbox.max_y, 4.0);
    }

    #[test]
    fn test_width_height() {
        let bbox = BoundingBox::new(0.0, 10.0, 0.0, 5.0);
        assert_eq!(bbox.width(), 10.0);
        assert_eq!(bbox.height(), 5.0);
    }

    #[test]
    fn test_contains_point() {
        let bbox = BoundingBox::new(0.0, 10.0, 0.0, 10.0);

        assert!(bbox.contains_point(5.0, 5.0));
        assert!(bbox.contains_point(0.0, 0.0));
        assert!(bbox.contains_point(10.0, 10.0));
        assert!(!bbox.contains_point(-1.0, 5.0));
        assert!(!bbox.contains_point(11.0, 5.0));
    }

    #[test]
    fn test_intersects() {
        let bbox1 = BoundingBox::new(0.0, 10.0, 0.0, 10.0);
        let bbox2 = BoundingBox::new(5.0, 15.0, 5.0, 15.0);
        let bbox3 = BoundingBox::new(20.0, 30.0, 20.0, 30.0);
        let touching = BoundingBox::new(10.0, 20.0, 10.0, 20.0);

        assert!(bbox1.intersects(&bbox2));
        assert!(bbox2.intersects(&bbox1));
        assert!(!bbox1.intersects(&bbox3));
        assert!(bbox1.intersects(&touching));
    }

    #[test]
    fn test_union() {
        let bbox1 = BoundingBox::new(0.0, 5.0, 0.0, 5.0);
        let bbox2 = BoundingBox::new(3.0, 10.0, 3.0, 10.0);

        let union = bbox1.union(&bbox2);
        assert_eq!(union, BoundingBox::new(0.0, 10.0, 0.0, 10.0));
    }

    #[test]
    fn test_is_valid() {
        assert!(BoundingBox::new(0.0, 10.0, 0.0, 10.0).is_valid());
        assert!(!BoundingBox::new(10.0, 0.0, 10.0, 0.0).is_valid());
        assert!(BoundingBox::new(5.0, 5.0, 5.0, 5.0).is_valid());
    }

    #[test]
    fn test_hash() {
        let bbox1 = BoundingBox::new(1.0, 3.0, 2.0, 4.0);
        let bbox2 = BoundingBox::new(1.0, 3.0, 2.0, 4.0);
        let bbox3 = BoundingBox::new(5.0, 7.0, 6.0, 8.0);

        let mut set = HashSet::new();
        set.insert(bbox1);

        assert!(set.contains(&bbox2));
        assert!(!set.contains(&bbox3));
    }

    #[test]
    fn test_serialization() {
        let bbox = BoundingBox::new(1.5, 3.5, 2.5, 4.5);
        let json = serde_json::to_string(&bbox).unwrap();
        let deserialized: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(bbox, deserialized);
    }

    #[test]
    fn test_display() {
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(format!("{}", bbox), "BoundingBox(1, 2, 3, 4)");
    }

    #[test]
    fn test_to_aabb() {
        let bbox = BoundingBox::new(0.0, 10.0, 0.0, 5.0);
        let aabb = bbox.to_aabb();
        assert_eq!(aabb.lower(), [0.0f32, 0.0]);
        assert_eq!(aabb.upper(), [10.0f32, 5.0]);
    }
}
