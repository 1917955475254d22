//! Positions, loads and node addresses used by the bundled structural models.

use nalgebra::{Vector2, Vector3};

/// Position in three dimensional space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Coordinate along the global X axis.
    pub x: f64,
    /// Coordinate along the global Y axis.
    pub y: f64,
    /// Coordinate along the global Z axis.
    pub z: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Point load acting on a truss joint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Force {
    /// Component along the global X axis.
    pub x: f64,
    /// Component along the global Y axis.
    pub y: f64,
    /// Component along the global Z axis.
    pub z: f64,
}

impl Force {
    /// Create a [`Force`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the force into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// In-plane point load acting on a grid node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlanarForce {
    /// Component along the X axis.
    pub x: f64,
    /// Component along the Y axis, positive upward.
    pub y: f64,
}

impl PlanarForce {
    /// Create a [`PlanarForce`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale both components.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Convert the force into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// Address of a node in a structured grid.
///
/// `ix` counts columns from the left edge and `iy` counts rows upward from the bottom edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridNode {
    /// Column index.
    pub ix: usize,
    /// Row index.
    pub iy: usize,
}

impl GridNode {
    /// Create a [`GridNode`] from its column and row.
    #[must_use]
    pub const fn new(ix: usize, iy: usize) -> Self {
        Self { ix, iy }
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use simpx::point;
///
/// let origin = point(0.0, 0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// Convenience helper for creating [`Force`] instances.
///
/// # Examples
/// ```
/// use simpx::force;
///
/// let load = force(1.0, 0.0, -5.0);
/// assert_eq!(load.z, -5.0);
/// ```
#[must_use]
pub const fn force(x: f64, y: f64, z: f64) -> Force {
    Force::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_carry_components() {
        assert_eq!(point(1.0, 2.0, 3.0).to_vector(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(force(0.1, -0.2, 0.3).to_vector(), Vector3::new(0.1, -0.2, 0.3));
    }

    #[test]
    fn planar_forces_scale() {
        let load = PlanarForce::new(2.0, -4.0).scaled(0.5);
        assert_eq!(load, PlanarForce::new(1.0, -2.0));
        assert_eq!(load.to_vector(), Vector2::new(1.0, -2.0));
    }
}
