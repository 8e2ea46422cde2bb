//! Camera for ray generation.
//!
//! In camera space the view direction is +z. Pixels left of the image
//! center map to -x and pixels below it to -y; the camera transform then
//! places the camera in the world.

use lux_math::{warp, Mat4, Ray, Transform, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::sampler::Sampler;

/// Image axis the field of view is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FovAxis {
    X,
    #[default]
    Y,
}

/// Thin-lens depth of field settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinLens {
    pub lens_radius: f32,
    /// Distance along the view axis that stays in focus.
    pub focal_distance: f32,
}

impl Default for ThinLens {
    fn default() -> Self {
        Self {
            lens_radius: 0.05,
            focal_distance: 7.0,
        }
    }
}

/// Perspective camera, optionally with a thin lens.
#[derive(Debug, Clone)]
pub struct Camera {
    image_width: u32,
    image_height: u32,
    fov: f32,
    fov_axis: FovAxis,
    transform: Transform,
    lens: Option<ThinLens>,

    // Distance from the pinhole to the image plane, in pixels
    focal_length: f32,
}

impl Camera {
    /// Create a pinhole camera at the origin looking along +z.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 800,
            image_height: 450,
            fov: 40.0,
            fov_axis: FovAxis::Y,
            transform: Transform::from_translation(Vec3::ZERO),
            lens: None,
            focal_length: 0.0,
        };
        camera.update_focal_length();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self.update_focal_length();
        self
    }

    /// Set the field of view in degrees along `axis`.
    pub fn with_fov(mut self, degrees: f32, axis: FovAxis) -> Self {
        self.fov = degrees;
        self.fov_axis = axis;
        self.update_focal_length();
        self
    }

    /// Set the camera-to-world transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Place the camera at `look_from`, facing `look_at`.
    ///
    /// Leaves the transform unchanged if the view direction is degenerate
    /// or parallel to `up`.
    pub fn with_look_at(mut self, look_from: Vec3, look_at: Vec3, up: Vec3) -> Self {
        let Some(forward) = (look_at - look_from).try_normalize() else {
            log::warn!("Camera look_at target coincides with its position");
            return self;
        };
        let Some(right) = forward.cross(up).try_normalize() else {
            log::warn!("Camera up vector is parallel to the view direction");
            return self;
        };
        let true_up = right.cross(forward);

        let matrix = Mat4::from_cols(
            right.extend(0.0),
            true_up.extend(0.0),
            forward.extend(0.0),
            look_from.extend(1.0),
        );
        if let Some(transform) = Transform::new(matrix) {
            self.transform = transform;
        }
        self
    }

    /// Enable depth of field.
    pub fn with_lens(mut self, lens: ThinLens) -> Self {
        self.lens = Some(lens);
        self
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn lens(&self) -> Option<&ThinLens> {
        self.lens.as_ref()
    }

    fn update_focal_length(&mut self) {
        let extent = match self.fov_axis {
            FovAxis::X => self.image_width,
            FovAxis::Y => self.image_height,
        } as f32;
        self.focal_length = 0.5 * extent / (0.5 * self.fov.to_radians()).tan();
    }

    /// Ray through normalized image coordinates in `[-1, 1]²`.
    pub fn sample(&self, normalized: Vec2, sampler: &mut dyn Sampler) -> Ray {
        let direction = Vec3::new(
            0.5 * normalized.x * self.image_width as f32,
            0.5 * normalized.y * self.image_height as f32,
            self.focal_length,
        )
        .normalize();

        let (origin, direction) = match &self.lens {
            None => (Vec3::ZERO, direction),
            Some(lens) => {
                let disk = warp::square_to_concentric_disk(sampler.next_2d()) * lens.lens_radius;
                let origin = Vec3::new(disk.x, disk.y, 0.0);
                let focus = direction * (lens.focal_distance / direction.z);
                (origin, focus - origin)
            }
        };

        Ray::new(
            self.transform.apply_point(origin),
            self.transform.apply_vector(direction),
        )
    }

    /// Jittered ray for pixel `(x, y)`, with row 0 at the top.
    pub fn get_ray(&self, x: u32, y: u32, sampler: &mut dyn Sampler) -> Ray {
        let jitter = sampler.next_2d();
        let normalized = Vec2::new(
            2.0 * (x as f32 + jitter.x) / self.image_width as f32 - 1.0,
            1.0 - 2.0 * (y as f32 + jitter.y) / self.image_height as f32,
        );
        self.sample(normalized, sampler)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
