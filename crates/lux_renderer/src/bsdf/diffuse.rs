use std::f32::consts::FRAC_1_PI;

use lux_core::Texture;
use lux_math::{warp, Color, Frame, Vec2, Vec3};

use super::{BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// Lambertian reflector.
#[derive(Debug, Clone)]
pub struct Diffuse {
    pub albedo: Texture,
}

impl Diffuse {
    pub fn new(albedo: impl Into<Texture>) -> Self {
        Self {
            albedo: albedo.into(),
        }
    }

    pub fn evaluate(&self, uv: Vec2, _wo: Vec3, wi: Vec3) -> BsdfEval {
        lobe_evaluate(self.albedo.evaluate(uv), wi)
    }

    /// Cosine-weighted sampling: `f · cos / pdf` reduces to the albedo.
    pub fn sample(&self, uv: Vec2, _wo: Vec3, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        lobe_sample(self.albedo.evaluate(uv), sampler)
    }
}

pub(super) fn lobe_evaluate(color: Color, wi: Vec3) -> BsdfEval {
    let cos_theta = Frame::cos_theta(wi);
    if cos_theta <= 0.0 {
        return BsdfEval::Invalid;
    }
    BsdfEval::Valid(color * FRAC_1_PI * cos_theta)
}

pub(super) fn lobe_sample(color: Color, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
    let wi = warp::square_to_cosine_hemisphere(sampler.next_2d());
    if Frame::cos_theta(wi) <= 0.0 {
        return None;
    }
    Some(BsdfSample {
        wi,
        weight: color,
        pdf: Some(warp::cosine_hemisphere_pdf(wi)),
    })
}

pub(super) fn lobe_pdf(wi: Vec3) -> f32 {
    warp::cosine_hemisphere_pdf(wi)
}
