use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for the BVH and instance culling.
///
/// Stored as two corners. Boxes with zero extent along an axis (a flat
/// triangle, a single point) are valid: the slab test is inclusive, so they
/// behave as infinitesimally thin bounds instead of being padded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An empty box: the identity for `union`.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// A box containing all of space.
    pub const UNIVERSE: Aabb = Aabb {
        min: Vec3::NEG_INFINITY,
        max: Vec3::INFINITY,
    };

    /// Create an AABB from two corner points (in any order).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing every point of the iterator.
    pub fn from_iter_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Aabb::EMPTY, |acc, p| acc.extend(p))
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Grow the box to contain `p`.
    #[inline]
    pub fn extend(&self, p: Vec3) -> Aabb {
        Aabb {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// True if the box contains nothing.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True if any extent is infinite.
    pub fn is_unbounded(&self) -> bool {
        !(self.min.is_finite() && self.max.is_finite())
    }

    /// Slab test against the ray's parametric range.
    ///
    /// Returns the entry distance (clamped to `ray_t.min`) when the ray
    /// overlaps the box inside `ray_t`.
    pub fn hit(&self, r: &Ray, ray_t: Interval) -> Option<f32> {
        let inv_dir = r.direction.recip();
        let mut range = ray_t;

        for axis in 0..3 {
            let mut t0 = (self.min[axis] - r.origin[axis]) * inv_dir[axis];
            let mut t1 = (self.max[axis] - r.origin[axis]) * inv_dir[axis];
            if inv_dir[axis] < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // f32::max/min drop a NaN operand (origin exactly on a slab of a
            // zero-direction axis), which keeps the current bound.
            range.min = range.min.max(t0);
            range.max = range.max.min(t1);
            if range.is_empty() {
                return None;
            }
        }

        Some(range.min)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    ///
    /// Ties go to the lowest axis index.
    pub fn longest_axis(&self) -> usize {
        let size = self.size();

        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Surface area, zero for empty boxes.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.size();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// The eight corners, indexed by bit pattern (bit k set = max on axis k).
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            )
        })
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_surrounding() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::new(5.0, 5.0, 5.0));
        let box2 = Aabb::from_points(Vec3::new(3.0, 3.0, 3.0), Vec3::new(10.0, 10.0, 10.0));
        let surrounding = Aabb::surrounding(&box1, &box2);

        assert_eq!(surrounding.min, Vec3::ZERO);
        assert_eq!(surrounding.max, Vec3::splat(10.0));
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let t = aabb.hit(&ray, Interval::new(0.0, 100.0));
        assert!((t.unwrap() - 4.0).abs() < 1e-5);

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)).is_none());

        // Ray missing the box
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)).is_none());

        // Box beyond the bound
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 3.0)).is_none());
    }

    #[test]
    fn test_flat_box_is_hittable() {
        // Zero thickness along z, like an axis-aligned triangle.
        let flat = Aabb::from_points(Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, 1.0, 2.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let t = flat.hit(&ray, Interval::ray(f32::INFINITY));
        assert!((t.unwrap() - 2.0).abs() < 1e-6);

        // A single point is insertable too.
        let point = Aabb::from_points(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 3.0));
        assert!(point.hit(&ray, Interval::ray(f32::INFINITY)).is_some());
    }

    #[test]
    fn test_axis_parallel_ray_inside_slab() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        // Direction has zero x/y components and the origin lies on the x slab.
        let ray = Ray::new(Vec3::new(0.0, 0.5, -1.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::ray(10.0)).is_some());
    }

    #[test]
    fn test_aabb_longest_axis() {
        let aabb_x = Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0));
        assert_eq!(aabb_x.longest_axis(), 0);

        let aabb_y = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0));
        assert_eq!(aabb_y.longest_axis(), 1);

        let aabb_z = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0));
        assert_eq!(aabb_z.longest_axis(), 2);

        // Ties resolve to the lowest axis.
        let cube = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        assert_eq!(cube.longest_axis(), 0);
    }

    #[test]
    fn test_surface_area_and_corners() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert!((aabb.surface_area() - 22.0).abs() < 1e-5);
        assert_eq!(Aabb::EMPTY.surface_area(), 0.0);

        let corners = aabb.corners();
        assert_eq!(corners[0], Vec3::ZERO);
        assert_eq!(corners[7], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Aabb::from_iter_points(corners), aabb);
    }

    #[test]
    fn test_unbounded() {
        assert!(Aabb::UNIVERSE.is_unbounded());
        assert!(!Aabb::from_points(Vec3::ZERO, Vec3::ONE).is_unbounded());
    }
}
