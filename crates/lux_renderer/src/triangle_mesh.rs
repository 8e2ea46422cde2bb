//! Triangle mesh shape.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection, with a
//! nested BVH over the triangles keyed by triangle index.

use std::sync::Arc;

use lux_core::Mesh;
use lux_math::{warp, Aabb, Frame, Ray, Vec2, Vec3, EPSILON};

use crate::bvh::{Bvh, BvhPrimitive, Hit, SplitMethod};
use crate::sampler::Sampler;
use crate::shape::{AreaSample, SurfaceHit};

/// Determinants below this are treated as rays parallel to the triangle.
const DETERMINANT_EPSILON: f32 = 1e-12;

/// Barycentric hit on one triangle, before shading data is computed.
#[derive(Debug, Clone, Copy)]
struct TriangleHit {
    t: f32,
    triangle: u32,
    barycentric: Vec2,
}

impl Hit for TriangleHit {
    fn t(&self) -> f32 {
        self.t
    }
}

#[derive(Debug)]
pub struct TriangleMesh {
    mesh: Arc<Mesh>,
    smooth_normals: bool,
    bvh: Bvh,
    /// Running sum of triangle areas, for area-proportional sampling.
    area_cdf: Vec<f32>,
    total_area: f32,
}

impl TriangleMesh {
    /// Build the triangle BVH and area table for `mesh`.
    pub fn new(mesh: Arc<Mesh>, smooth_normals: bool) -> Self {
        Self::with_split_method(mesh, smooth_normals, SplitMethod::default())
    }

    pub fn with_split_method(mesh: Arc<Mesh>, smooth_normals: bool, method: SplitMethod) -> Self {
        let primitives: Vec<BvhPrimitive> = (0..mesh.triangle_count())
            .map(|i| {
                let [a, b, c] = mesh.triangle_vertices(i);
                let bounds = Aabb::from_iter_points([a.position, b.position, c.position]);
                let centroid = (a.position + b.position + c.position) / 3.0;
                BvhPrimitive::new(bounds, centroid)
            })
            .collect();
        let bvh = Bvh::new(&primitives, method);

        let mut total_area = 0.0;
        let area_cdf = (0..mesh.triangle_count())
            .map(|i| {
                total_area += mesh.triangle_area(i);
                total_area
            })
            .collect();

        log::info!(
            "Triangle mesh: {} triangles, {} BVH nodes, depth {}",
            mesh.triangle_count(),
            bvh.node_count(),
            bvh.depth()
        );

        Self {
            mesh,
            smooth_normals,
            bvh,
            area_cdf,
            total_area,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn smooth_normals(&self) -> bool {
        self.smooth_normals
    }

    pub fn total_area(&self) -> f32 {
        self.total_area
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }

    /// Möller-Trumbore test against one triangle.
    ///
    /// Barycentrics are divided by the determinant before the range checks.
    fn intersect_triangle(&self, index: u32, ray: &Ray, t_max: f32) -> Option<TriangleHit> {
        let [v0, v1, v2] = self.mesh.triangle_vertices(index as usize);
        let edge1 = v1.position - v0.position;
        let edge2 = v2.position - v0.position;

        let pvec = ray.direction.cross(edge2);
        let det = edge1.dot(pvec);

        // Ray is parallel to triangle (or the triangle is degenerate)
        if det.abs() < DETERMINANT_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin - v0.position;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(edge1);
        let v = ray.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(qvec) * inv_det;
        if t <= EPSILON || t > t_max || !t.is_finite() {
            return None;
        }

        Some(TriangleHit {
            t,
            triangle: index,
            barycentric: Vec2::new(u, v),
        })
    }

    /// Shading data at barycentric `(u, v)` of a triangle.
    fn surface(&self, triangle: u32, barycentric: Vec2) -> (Vec3, Frame, Vec2) {
        let [v0, v1, v2] = self.mesh.triangle_vertices(triangle as usize);
        let (u, v) = (barycentric.x, barycentric.y);
        let w = 1.0 - u - v;

        let edge1 = v1.position - v0.position;
        let edge2 = v2.position - v0.position;
        let position = v0.position * w + v1.position * u + v2.position * v;
        let uv = v0.uv * w + v1.uv * u + v2.uv * v;

        // Winding decides orientation, so the cross product keeps its sign
        let geometric = edge1.cross(edge2).normalize_or_zero();
        let normal = if self.smooth_normals {
            (v0.normal * w + v1.normal * u + v2.normal * v)
                .try_normalize()
                .unwrap_or(geometric)
        } else {
            geometric
        };

        (position, Frame::from_normal_tangent(normal, edge1), uv)
    }

    pub fn intersect(&self, ray: &Ray, t_max: f32) -> Option<SurfaceHit> {
        let hit = self.bvh.intersect(ray, t_max, |index, bound| {
            self.intersect_triangle(index, ray, bound)
        })?;

        let (position, frame, uv) = self.surface(hit.triangle, hit.barycentric);
        Some(SurfaceHit {
            t: hit.t,
            position,
            frame,
            uv,
            pdf: self.area_pdf(),
        })
    }

    fn area_pdf(&self) -> f32 {
        if self.total_area > 0.0 {
            1.0 / self.total_area
        } else {
            0.0
        }
    }

    /// Pick a triangle proportionally to its area, then a uniform point on it.
    pub fn sample_area(&self, sampler: &mut dyn Sampler) -> AreaSample {
        let target = sampler.next() * self.total_area;
        let triangle = self
            .area_cdf
            .partition_point(|&c| c <= target)
            .min(self.area_cdf.len().saturating_sub(1));

        let barycentric = warp::square_to_uniform_triangle(sampler.next_2d());
        let (position, frame, uv) = self.surface(triangle as u32, barycentric);
        AreaSample {
            position,
            frame,
            uv,
            pdf: self.area_pdf(),
        }
    }
}
