use lux_math::{Color, Ray, Vec3};

use super::Integrator;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Visualizes world-space shading normals.
#[derive(Debug, Clone, Copy)]
pub struct NormalsIntegrator {
    /// Map `[-1, 1]` to `[0, 1]` for display.
    remap: bool,
}

impl NormalsIntegrator {
    pub fn new(remap: bool) -> Self {
        Self { remap }
    }
}

impl Integrator for NormalsIntegrator {
    fn li(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler) -> Color {
        let normal = scene
            .intersect(ray, f32::INFINITY, sampler)
            .map_or(Vec3::ZERO, |its| its.frame.normal);

        if self.remap {
            (normal + Vec3::ONE) * 0.5
        } else {
            normal
        }
    }
}
