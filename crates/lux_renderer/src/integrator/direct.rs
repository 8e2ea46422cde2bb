use lux_math::{Color, Ray};

use super::Integrator;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Single-bounce estimator that finds light only by BSDF sampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectIntegrator;

impl Integrator for DirectIntegrator {
    fn li(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler) -> Color {
        let Some(its) = scene.intersect(ray, f32::INFINITY, sampler) else {
            return scene.evaluate_background(ray.direction);
        };
        if its.is_emitter() {
            return its.evaluate_emission();
        }

        let Some(sample) = its.sample_bsdf(sampler) else {
            return Color::ZERO;
        };
        let bounce = ray.bounce(its.position, sample.wi);
        let incident = match scene.intersect(&bounce, f32::INFINITY, sampler) {
            Some(second) => second.evaluate_emission(),
            None => scene.evaluate_background(bounce.direction),
        };
        sample.weight * incident
    }
}
