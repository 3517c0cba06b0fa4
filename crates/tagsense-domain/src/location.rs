//! World-space locations

/// A point in world space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Z coordinate
    pub z: f32,
}

impl Location {
    /// The world origin
    pub const ORIGIN: Location = Location { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a location from its coordinates
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared distance to another location
    ///
    /// Range checks compare against squared thresholds so no square root is
    /// taken on the hot path.
    pub fn dist_squared(&self, other: &Location) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to another location
    pub fn distance(&self, other: &Location) -> f32 {
        self.dist_squared(other).sqrt()
    }
}

impl From<[f32; 3]> for Location {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Location> for [f32; 3] {
    fn from(location: Location) -> Self {
        [location.x, location.y, location.z]
    }
}
