// Re-export glam for convenience
pub use glam::*;

// Lux math types
mod aabb;
mod frame;
mod interval;
mod ray;
mod transform;
pub mod warp;

pub use aabb::Aabb;
pub use frame::Frame;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Transform;

/// Minimum hit distance accepted by every intersection layer.
///
/// Keeps secondary rays from re-hitting the surface they were spawned on.
pub const EPSILON: f32 = 1e-4;

/// RGB radiance / reflectance triple.
pub type Color = Vec3;

/// Arithmetic mean of the three channels.
#[inline]
pub fn mean(c: Color) -> f32 {
    (c.x + c.y + c.z) / 3.0
}

/// True when no channel is NaN or infinite.
#[inline]
pub fn is_finite_color(c: Color) -> bool {
    c.x.is_finite() && c.y.is_finite() && c.z.is_finite()
}
