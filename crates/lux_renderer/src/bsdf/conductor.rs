use lux_core::Texture;
use lux_math::{Color, Vec2, Vec3};

use super::microfacet::{
    det_reflection, evaluate_ggx, pdf_ggx_vndf, roughness_to_alpha, sample_ggx_vndf, smith_g1,
};
use super::{reflect, BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// Rough metal with a GGX microfacet distribution.
#[derive(Debug, Clone)]
pub struct RoughConductor {
    pub reflectance: Texture,
    pub roughness: Texture,
}

impl RoughConductor {
    pub fn new(reflectance: impl Into<Texture>, roughness: impl Into<Texture>) -> Self {
        Self {
            reflectance: reflectance.into(),
            roughness: roughness.into(),
        }
    }

    pub fn evaluate(&self, uv: Vec2, wo: Vec3, wi: Vec3) -> BsdfEval {
        let alpha = roughness_to_alpha(self.roughness.scalar(uv));
        lobe_evaluate(self.reflectance.evaluate(uv), alpha, wo, wi)
    }

    pub fn sample(&self, uv: Vec2, wo: Vec3, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        let alpha = roughness_to_alpha(self.roughness.scalar(uv));
        lobe_sample(self.reflectance.evaluate(uv), alpha, wo, sampler)
    }
}

/// `R · D · G1(wi) · G1(wo) / (4 |cos θo|)`
pub(super) fn lobe_evaluate(color: Color, alpha: f32, wo: Vec3, wi: Vec3) -> BsdfEval {
    let cos_theta_o = wo.z.abs();
    let Some(wh) = (wo + wi).try_normalize() else {
        return BsdfEval::Invalid;
    };
    if cos_theta_o == 0.0 {
        return BsdfEval::Invalid;
    }

    let d = evaluate_ggx(alpha, wh);
    let g_wi = smith_g1(alpha, wh, wi);
    let g_wo = smith_g1(alpha, wh, wo);
    BsdfEval::Valid(color * d * g_wi * g_wo / (4.0 * cos_theta_o))
}

/// Visible-normal sampling; the weight reduces to `R · G1(wi)`.
pub(super) fn lobe_sample(
    color: Color,
    alpha: f32,
    wo: Vec3,
    sampler: &mut dyn Sampler,
) -> Option<BsdfSample> {
    if wo.z <= 0.0 {
        return None;
    }
    let wh = sample_ggx_vndf(alpha, wo, sampler.next_2d());
    let wi = reflect(wo, wh);
    if wi.z <= 0.0 {
        return None;
    }

    let pdf = pdf_ggx_vndf(alpha, wh, wo) * det_reflection(wh, wo);
    if !(pdf > 0.0) {
        return None;
    }

    Some(BsdfSample {
        wi,
        weight: color * smith_g1(alpha, wh, wi),
        pdf: Some(pdf),
    })
}

/// Solid-angle density of [`lobe_sample`] producing `wi`.
pub(super) fn lobe_pdf(alpha: f32, wo: Vec3, wi: Vec3) -> f32 {
    if wo.z <= 0.0 || wi.z <= 0.0 {
        return 0.0;
    }
    match (wo + wi).try_normalize() {
        Some(wh) => pdf_ggx_vndf(alpha, wh, wo) * det_reflection(wh, wo),
        None => 0.0,
    }
}
