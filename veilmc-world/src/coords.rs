use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a world/dimension. Coordinates only mean something inside one.
pub type PartitionId = i32;

/// Integer block position. Ordered x, then y, then z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Centre of the block in world space.
    pub fn center(&self) -> [f64; 3] {
        [self.x as f64 + 0.5, self.y as f64 + 0.5, self.z as f64 + 0.5]
    }

    /// Key used for a single record in the persisted tag format: `"x y z"`.
    pub fn tag_key(&self) -> String {
        format!("{} {} {}", self.x, self.y, self.z)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for Coordinate {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

/// A coordinate qualified by the partition it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub partition: PartitionId,
    pub coord: Coordinate,
}

impl Location {
    pub const fn new(partition: PartitionId, coord: Coordinate) -> Self {
        Self { partition, coord }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_key() {
        assert_eq!(Coordinate::new(1, -2, 300).tag_key(), "1 -2 300");
    }

    #[test]
    fn test_ordering_is_x_major() {
        let mut coords = vec![
            Coordinate::new(1, 0, 0),
            Coordinate::new(0, 5, 0),
            Coordinate::new(0, 0, 9),
        ];
        coords.sort();
        assert_eq!(coords[0], Coordinate::new(0, 0, 9));
        assert_eq!(coords[2], Coordinate::new(1, 0, 0));
    }

    #[test]
    fn test_location_equality_includes_partition() {
        let coord = Coordinate::new(4, 64, 4);
        assert_ne!(Location::new(0, coord), Location::new(-1, coord));
        assert_eq!(Location::new(1, coord), Location::new(1, coord));
    }
}
