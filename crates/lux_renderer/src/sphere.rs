//! Sphere primitive centered at the origin.
//!
//! Placement and non-uniform scaling come from the owning instance.

use std::f32::consts::PI;

use lux_math::{warp, Aabb, Frame, Ray, Vec2, Vec3, EPSILON};

use crate::sampler::Sampler;
use crate::shape::{AreaSample, SurfaceHit};

#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.abs(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    /// Spherical parameterization, both coordinates in [0, 1].
    fn uv(normal: Vec3) -> Vec2 {
        let phi = normal.z.atan2(normal.x) / (2.0 * PI);
        let theta = normal.y.clamp(-1.0, 1.0).asin() / PI;
        Vec2::new(phi + 0.5, theta + 0.5)
    }

    fn surface(&self, normal: Vec3) -> (Vec3, Frame, Vec2) {
        (normal * self.radius, Frame::from_normal(normal), Self::uv(normal))
    }

    /// Solve `A t² - 2 B t + C = 0` for `|O + tD|² = r²`.
    ///
    /// The nearer root above `EPSILON` wins; if it lies beyond `t_max` the
    /// hit is rejected without falling back to the farther root.
    pub fn intersect(&self, ray: &Ray, t_max: f32) -> Option<SurfaceHit> {
        let to_center = -ray.origin;
        let a = ray.direction.length_squared();
        let b = ray.direction.dot(to_center);
        let c = to_center.length_squared() - self.radius * self.radius;

        let discriminant = b * b - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        let t_near = (b - sqrtd) / a;
        let t_far = (b + sqrtd) / a;

        let t = if t_near > EPSILON {
            t_near
        } else if t_far > EPSILON {
            t_far
        } else {
            return None;
        };
        if t > t_max {
            return None;
        }

        let normal = ray.at(t).try_normalize()?;
        let (position, frame, uv) = self.surface(normal);
        Some(SurfaceHit {
            t,
            position,
            frame,
            uv,
            pdf: 1.0 / self.area(),
        })
    }

    pub fn bounding_box(&self) -> Aabb {
        let r = Vec3::splat(self.radius);
        Aabb::from_points(-r, r)
    }

    pub fn sample_area(&self, sampler: &mut dyn Sampler) -> AreaSample {
        let normal = warp::square_to_uniform_sphere(sampler.next_2d());
        let (position, frame, uv) = self.surface(normal);
        AreaSample {
            position,
            frame,
            uv,
            pdf: 1.0 / self.area(),
        }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(1.0)
    }
}
