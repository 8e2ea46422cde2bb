// Affine transforms for instancing.
//
// Wraps a glam::Mat4 together with its cached inverse so that rays can be
// moved into local space and hits moved back out without re-inverting.

use glam::{Mat3, Mat4, Vec3};

use crate::{Aabb, Ray};

/// An invertible affine local-to-world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Mat4,
    inverse: Mat4,
}

impl Transform {
    /// Wrap a local-to-world matrix.
    ///
    /// Returns `None` when the matrix is singular or not finite.
    pub fn new(matrix: Mat4) -> Option<Self> {
        let det = matrix.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inverse = matrix.inverse();
        if !inverse.is_finite() {
            return None;
        }
        Some(Self { matrix, inverse })
    }

    /// Pure translation.
    pub fn from_translation(offset: Vec3) -> Self {
        Self {
            matrix: Mat4::from_translation(offset),
            inverse: Mat4::from_translation(-offset),
        }
    }

    /// Scale, rotation and translation, applied in that order.
    ///
    /// Returns `None` if any scale component is zero.
    pub fn from_scale_rotation_translation(
        scale: Vec3,
        rotation: glam::Quat,
        translation: Vec3,
    ) -> Option<Self> {
        Self::new(Mat4::from_scale_rotation_translation(
            scale,
            rotation,
            translation,
        ))
    }

    /// Local point to world.
    #[inline]
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.matrix.transform_point3(p)
    }

    /// Local direction to world (no translation, not normalized).
    #[inline]
    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        self.matrix.transform_vector3(v)
    }

    /// Local surface normal to world through the inverse transpose.
    #[inline]
    pub fn apply_normal(&self, n: Vec3) -> Vec3 {
        Mat3::from_mat4(self.inverse).transpose() * n
    }

    /// World point to local.
    #[inline]
    pub fn inverse_point(&self, p: Vec3) -> Vec3 {
        self.inverse.transform_point3(p)
    }

    /// World direction to local (not normalized).
    #[inline]
    pub fn inverse_vector(&self, v: Vec3) -> Vec3 {
        self.inverse.transform_vector3(v)
    }

    /// World ray to local space with a re-normalized direction.
    ///
    /// Also returns the factor that converts world distances along the ray
    /// into local distances (`t_local = t_world * scale`).
    pub fn inverse_ray(&self, ray: &Ray) -> (Ray, f32) {
        let origin = self.inverse_point(ray.origin);
        let direction = self.inverse_vector(ray.direction);
        let scale = direction.length();
        (Ray::with_depth(origin, direction, ray.depth), scale)
    }

    /// True if the linear part has a negative determinant (flips handedness).
    pub fn is_mirroring(&self) -> bool {
        Mat3::from_mat4(self.matrix).determinant() < 0.0
    }

    /// Factor by which a local surface patch with unit normal `n` grows
    /// in area when mapped to world space.
    pub fn area_scale(&self, n: Vec3) -> f32 {
        let linear = Mat3::from_mat4(self.matrix);
        linear.determinant().abs() * (Mat3::from_mat4(self.inverse).transpose() * n).length()
    }

    /// Conservative world bounds of a local box: the box around its eight
    /// transformed corners.
    pub fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_unbounded() {
            return Aabb::UNIVERSE;
        }
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }
        Aabb::from_iter_points(aabb.corners().into_iter().map(|c| self.apply_point(c)))
    }
}
