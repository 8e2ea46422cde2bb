use crate::Vec3;

/// A ray in 3D space with origin, unit direction, and bounce depth.
///
/// `depth` counts scattering events: camera rays start at 0 and every
/// continuation ray spawned at a surface is one deeper than its parent.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub depth: u32,
}

impl Ray {
    /// Create a depth-0 ray. The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_depth(origin, direction, 0)
    }

    /// Create a ray at the given bounce depth. The direction is normalized.
    pub fn with_depth(origin: Vec3, direction: Vec3, depth: u32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            depth,
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// True if the direction could not be normalized.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO
    }

    /// Spawn the next ray of a path from `origin` towards `direction`.
    #[inline]
    pub fn bounce(&self, origin: Vec3, direction: Vec3) -> Ray {
        Ray::with_depth(origin, direction, self.depth + 1)
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
