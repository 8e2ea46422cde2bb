//! Local-space primitive geometry.

use lux_math::{Aabb, Frame, Ray, Vec2, Vec3};

use crate::bvh::Hit;
use crate::sampler::Sampler;
use crate::sphere::Sphere;
use crate::triangle_mesh::TriangleMesh;

/// A surface point found along a ray.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHit {
    /// Distance along the (unit-direction) ray.
    pub t: f32,
    pub position: Vec3,
    /// Orthonormal shading frame.
    pub frame: Frame,
    pub uv: Vec2,
    /// Density, per unit area, with which `sample_area` would produce this point.
    pub pdf: f32,
}

impl Hit for SurfaceHit {
    fn t(&self) -> f32 {
        self.t
    }
}

/// A point drawn from a surface, for area lights.
#[derive(Debug, Clone, Copy)]
pub struct AreaSample {
    pub position: Vec3,
    pub frame: Frame,
    pub uv: Vec2,
    /// Density per unit area.
    pub pdf: f32,
}

/// Geometry an instance can reference.
#[derive(Debug)]
pub enum Shape {
    Sphere(Sphere),
    Mesh(TriangleMesh),
}

impl Shape {
    /// Nearest hit with `EPSILON < t <= t_max`.
    pub fn intersect(&self, ray: &Ray, t_max: f32) -> Option<SurfaceHit> {
        match self {
            Shape::Sphere(sphere) => sphere.intersect(ray, t_max),
            Shape::Mesh(mesh) => mesh.intersect(ray, t_max),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere(sphere) => sphere.bounding_box(),
            Shape::Mesh(mesh) => mesh.bounding_box(),
        }
    }

    pub fn centroid(&self) -> Vec3 {
        match self {
            Shape::Sphere(_) => Vec3::ZERO,
            Shape::Mesh(mesh) => mesh.bounding_box().centroid(),
        }
    }

    /// Uniformly sample a point on the surface.
    pub fn sample_area(&self, sampler: &mut dyn Sampler) -> AreaSample {
        match self {
            Shape::Sphere(sphere) => sphere.sample_area(sampler),
            Shape::Mesh(mesh) => mesh.sample_area(sampler),
        }
    }
}

impl From<Sphere> for Shape {
    fn from(sphere: Sphere) -> Self {
        Shape::Sphere(sphere)
    }
}

impl From<TriangleMesh> for Shape {
    fn from(mesh: TriangleMesh) -> Self {
        Shape::Mesh(mesh)
    }
}
