//! Radiance arriving from infinitely far away.

use std::f32::consts::PI;

use lux_core::Texture;
use lux_math::{Color, Transform, Vec2, Vec3};

/// Lat-long environment lookup. +y is up; `u` runs around the y axis.
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    texture: Texture,
    transform: Option<Transform>,
}

impl EnvironmentMap {
    pub fn new(texture: impl Into<Texture>) -> Self {
        Self {
            texture: texture.into(),
            transform: None,
        }
    }

    /// Constant radiance from every direction.
    pub fn constant(color: Color) -> Self {
        Self::new(color)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Texture coordinate seen along a world direction.
    pub fn direction_to_uv(&self, direction: Vec3) -> Vec2 {
        let local = match &self.transform {
            Some(t) => t.inverse_vector(direction),
            None => direction,
        }
        .normalize_or_zero();

        let phi = local.z.atan2(local.x);
        let theta = local.y.clamp(-1.0, 1.0).acos();
        Vec2::new(0.5 - phi / (2.0 * PI), theta / PI)
    }

    pub fn evaluate(&self, direction: Vec3) -> Color {
        self.texture.evaluate(self.direction_to_uv(direction))
    }
}
