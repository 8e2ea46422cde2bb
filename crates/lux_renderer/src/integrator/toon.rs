use lux_math::{Color, Ray};

use super::{estimate_direct, visible_background, visible_emission, Integrator};
use crate::bsdf::ToonConfig;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// One-bounce shading pushed through a stylized tone ramp.
#[derive(Debug, Clone)]
pub struct ToonIntegrator {
    config: ToonConfig,
}

impl ToonIntegrator {
    pub fn new(config: ToonConfig) -> Self {
        Self { config }
    }

    fn radiance(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler) -> Color {
        let Some(its) = scene.intersect(ray, f32::INFINITY, sampler) else {
            return scene.evaluate_background(ray.direction);
        };

        let nee = scene.has_lights();
        let mut light = Color::ZERO;
        if nee {
            light += estimate_direct(scene, &its, sampler);
        }

        if its.is_emitter() {
            return light + its.evaluate_emission();
        }

        let Some(sample) = its.sample_bsdf(sampler) else {
            return light;
        };
        let unsampled = !nee || its.is_delta();
        let bounce = ray.bounce(its.position, sample.wi);
        let incident = match scene.intersect(&bounce, f32::INFINITY, sampler) {
            Some(second) => visible_emission(scene, &second, unsampled),
            None => visible_background(scene, &bounce, unsampled),
        };
        light + sample.weight * incident
    }
}

impl Integrator for ToonIntegrator {
    fn li(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler) -> Color {
        self.config.apply(self.radiance(scene, ray, sampler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::EnvironmentMap;
    use crate::sampler::IndependentSampler;
    use lux_math::Vec3;

    #[test]
    fn test_background_goes_through_ramp() {
        let mut builder = Scene::builder();
        builder.background(EnvironmentMap::constant(Color::new(0.0, 0.15, 1.0)));
        let scene = builder.build().unwrap();
        let mut sampler = IndependentSampler::new(0);

        let li = ToonIntegrator::new(ToonConfig::default()).li(
            &scene,
            &Ray::new(Vec3::ZERO, Vec3::Z),
            &mut sampler,
        );
        assert!((li.x - 0.051).abs() < 1e-6);
        assert!((li.y - (0.051 + 0.5 * 0.949)).abs() < 1e-5);
        assert!((li.z - 1.0).abs() < 1e-6);
    }
}
