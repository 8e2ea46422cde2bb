//! Radiance estimators, one per camera ray.

mod albedo;
mod direct;
mod feature_line;
mod normals;
mod path_tracer;
mod toon;

pub use albedo::AlbedoIntegrator;
pub use direct::DirectIntegrator;
pub use feature_line::{FeatureLineConfig, FeatureLineIntegrator};
pub use normals::NormalsIntegrator;
pub use path_tracer::{PathTracer, PathTracerConfig};
pub use toon::ToonIntegrator;
pub use crate::bsdf::{RampChannel, ToonConfig};

use lux_math::{Color, Ray};
use serde::{Deserialize, Serialize};

use crate::error::RenderResult;
use crate::sampler::Sampler;
use crate::scene::{Intersection, Scene};

/// Shadow rays stop this fraction short of the light to avoid hitting it.
const SHADOW_EPSILON: f32 = 1e-3;

pub trait Integrator: Send + Sync {
    /// Radiance arriving at the origin of `ray` from its direction.
    fn li(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler) -> Color;
}

/// Serializable integrator selection.
///
/// ```json
/// { "type": "path_tracer", "depth": 4, "nee": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegratorConfig {
    PathTracer(PathTracerConfig),
    Direct,
    Normals {
        #[serde(default = "default_remap")]
        remap: bool,
    },
    Albedo,
    Toon(ToonConfig),
    FeatureLine(FeatureLineConfig),
}

fn default_remap() -> bool {
    true
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        IntegratorConfig::PathTracer(PathTracerConfig::default())
    }
}

impl IntegratorConfig {
    pub fn from_json(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the settings and create the integrator.
    pub fn build(&self) -> RenderResult<Box<dyn Integrator>> {
        Ok(match self {
            IntegratorConfig::PathTracer(config) => Box::new(PathTracer::new(config.clone())?),
            IntegratorConfig::Direct => Box::new(DirectIntegrator),
            IntegratorConfig::Normals { remap } => Box::new(NormalsIntegrator::new(*remap)),
            IntegratorConfig::Albedo => Box::new(AlbedoIntegrator),
            IntegratorConfig::Toon(config) => Box::new(ToonIntegrator::new(config.clone())),
            IntegratorConfig::FeatureLine(config) => {
                Box::new(FeatureLineIntegrator::new(config.clone())?)
            }
        })
    }
}

/// One-sample next-event estimate at `its`, not yet scaled by throughput.
pub(crate) fn estimate_direct(
    scene: &Scene,
    its: &Intersection<'_>,
    sampler: &mut dyn Sampler,
) -> Color {
    if its.bsdf().is_none() {
        return Color::ZERO;
    }
    let Some((light, probability)) = scene.sample_light(sampler) else {
        return Color::ZERO;
    };
    let Some(sample) = light.sample_direct(scene, its.position, sampler) else {
        return Color::ZERO;
    };
    if sample.weight == Color::ZERO {
        return Color::ZERO;
    }

    let eval = its.evaluate_bsdf(sample.wi);
    if eval.is_invalid() {
        return Color::ZERO;
    }

    let shadow = Ray::new(its.position, sample.wi);
    let t_max = if sample.distance.is_finite() {
        sample.distance * (1.0 - SHADOW_EPSILON)
    } else {
        f32::INFINITY
    };
    if scene.is_occluded(&shadow, t_max, sampler) {
        return Color::ZERO;
    }

    sample.weight * eval.value() / probability
}

/// Emission seen at `its`, unless light sampling already covered it.
///
/// `unsampled` is true when the previous vertex could not have found this
/// emitter through light sampling (camera rays, delta bounces, no NEE).
pub(crate) fn visible_emission(scene: &Scene, its: &Intersection<'_>, unsampled: bool) -> Color {
    if unsampled || !scene.is_sampled_emitter(its.instance_id) {
        its.evaluate_emission()
    } else {
        Color::ZERO
    }
}

/// Background seen along an escaping ray, with the same rule as emission.
pub(crate) fn visible_background(scene: &Scene, ray: &Ray, unsampled: bool) -> Color {
    if unsampled || !scene.samples_background() {
        scene.evaluate_background(ray.direction)
    } else {
        Color::ZERO
    }
}
