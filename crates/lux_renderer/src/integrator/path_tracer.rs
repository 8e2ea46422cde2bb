use lux_math::{Color, Ray};
use serde::{Deserialize, Serialize};

use super::{estimate_direct, visible_background, visible_emission, Integrator};
use crate::error::{RenderError, RenderResult};
use crate::sampler::Sampler;
use crate::scene::{Intersection, Scene};

/// Lowest path depth the estimator supports: a shading vertex plus the
/// vertex its light arrives from.
pub const MIN_DEPTH: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTracerConfig {
    /// Maximum number of path vertices.
    pub depth: u32,
    /// Next-event estimation towards the scene's lights.
    pub nee: bool,
}

impl Default for PathTracerConfig {
    fn default() -> Self {
        Self {
            depth: MIN_DEPTH,
            nee: true,
        }
    }
}

/// Unidirectional path tracer with next-event estimation.
#[derive(Debug, Clone)]
pub struct PathTracer {
    config: PathTracerConfig,
}

impl PathTracer {
    pub fn new(config: PathTracerConfig) -> RenderResult<Self> {
        if config.depth < MIN_DEPTH {
            return Err(RenderError::InvalidDepth(config.depth));
        }
        Ok(Self { config })
    }

    pub fn depth(&self) -> u32 {
        self.config.depth
    }

    pub fn nee(&self) -> bool {
        self.config.nee
    }

    /// Trace a path, asking `intercept` at every surface vertex whether to
    /// stop with a given radiance instead of shading.
    ///
    /// An intercepted value is scaled by the throughput reaching the vertex.
    pub(crate) fn trace(
        &self,
        scene: &Scene,
        ray: &Ray,
        sampler: &mut dyn Sampler,
        mut intercept: impl FnMut(&Ray, &Intersection<'_>, &mut dyn Sampler) -> Option<Color>,
    ) -> Color {
        let nee = self.config.nee && scene.has_lights();

        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut ray = *ray;
        // Emitters reached from here were not found by light sampling
        let mut unsampled = true;

        for depth in 0..self.config.depth {
            let Some(its) = scene.intersect(&ray, f32::INFINITY, sampler) else {
                radiance += throughput * visible_background(scene, &ray, unsampled);
                break;
            };

            if let Some(value) = intercept(&ray, &its, sampler) {
                radiance += throughput * value;
                break;
            }

            radiance += throughput * visible_emission(scene, &its, unsampled);

            // Last vertex: nothing left to scatter towards
            if depth + 1 == self.config.depth {
                break;
            }

            if nee {
                radiance += throughput * estimate_direct(scene, &its, sampler);
            }

            let Some(sample) = its.sample_bsdf(sampler) else {
                break;
            };
            throughput *= sample.weight;
            if throughput == Color::ZERO {
                break;
            }

            unsampled = !nee || its.is_delta();
            ray = ray.bounce(its.position, sample.wi);
        }

        radiance
    }
}

impl Integrator for PathTracer {
    fn li(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler) -> Color {
        self.trace(scene, ray, sampler, |_, _, _| None)
    }
}
