//! Scattering models evaluated in the local shading frame (normal = +z).
//!
//! `evaluate` returns the BSDF value already multiplied by `cos θi`, and
//! `sample` returns `f · |cos θi| / pdf` as its weight, so callers only
//! multiply by incident radiance.

mod conductor;
mod dielectric;
mod diffuse;
pub mod fresnel;
pub mod microfacet;
mod principled;
mod toon;

pub use conductor::RoughConductor;
pub use dielectric::Dielectric;
pub use diffuse::Diffuse;
pub use principled::Principled;
pub use toon::{RampChannel, Toon, ToonConfig};

use lux_math::{is_finite_color, Color, Vec2, Vec3};

use crate::sampler::Sampler;

/// Result of evaluating a BSDF for a fixed pair of directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BsdfEval {
    Valid(Color),
    /// The pair has zero probability under continuous sampling (delta lobes),
    /// or lies outside the lobe's support.
    Invalid,
}

impl BsdfEval {
    /// The contribution, zero for invalid evaluations.
    pub fn value(&self) -> Color {
        match self {
            BsdfEval::Valid(c) => *c,
            BsdfEval::Invalid => Color::ZERO,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, BsdfEval::Invalid)
    }
}

/// An importance-sampled incident direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfSample {
    pub wi: Vec3,
    /// `f(wo, wi) · |cos θi| / pdf(wi)`
    pub weight: Color,
    /// Solid-angle density of `wi`; `None` for delta lobes.
    pub pdf: Option<f32>,
}

#[derive(Debug, Clone)]
pub enum Bsdf {
    Diffuse(Diffuse),
    RoughConductor(RoughConductor),
    Dielectric(Dielectric),
    Principled(Principled),
    Toon(Toon),
}

impl Bsdf {
    pub fn evaluate(&self, uv: Vec2, wo: Vec3, wi: Vec3) -> BsdfEval {
        match self {
            Bsdf::Diffuse(b) => b.evaluate(uv, wo, wi),
            Bsdf::RoughConductor(b) => b.evaluate(uv, wo, wi),
            Bsdf::Dielectric(_) => BsdfEval::Invalid,
            Bsdf::Principled(b) => b.evaluate(uv, wo, wi),
            Bsdf::Toon(b) => b.evaluate(uv, wo, wi),
        }
    }

    /// Draw `wi` given `wo`; `None` when the sample is absorbed or degenerate.
    pub fn sample(&self, uv: Vec2, wo: Vec3, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        let sample = match self {
            Bsdf::Diffuse(b) => b.sample(uv, wo, sampler),
            Bsdf::RoughConductor(b) => b.sample(uv, wo, sampler),
            Bsdf::Dielectric(b) => b.sample(uv, wo, sampler),
            Bsdf::Principled(b) => b.sample(uv, wo, sampler),
            Bsdf::Toon(b) => b.sample(uv, wo, sampler),
        }?;

        // Weights are never negative or NaN
        (is_finite_color(sample.weight) && sample.weight.min_element() >= 0.0).then_some(sample)
    }

    /// Hemispherical reflectance estimate used by the albedo and line passes.
    pub fn albedo(&self, uv: Vec2) -> Color {
        match self {
            Bsdf::Diffuse(b) => b.albedo.evaluate(uv),
            Bsdf::RoughConductor(b) => b.reflectance.evaluate(uv),
            Bsdf::Dielectric(b) => b.reflectance.evaluate(uv),
            Bsdf::Principled(b) => b.base_color.evaluate(uv),
            Bsdf::Toon(_) => Color::ZERO,
        }
    }

    /// True for BSDFs that only scatter into discrete directions.
    pub fn is_delta(&self) -> bool {
        matches!(self, Bsdf::Dielectric(_))
    }
}

/// Mirror `w` about `n`.
#[inline]
pub fn reflect(w: Vec3, n: Vec3) -> Vec3 {
    -w + 2.0 * w.dot(n) * n
}

impl From<Diffuse> for Bsdf {
    fn from(b: Diffuse) -> Self {
        Bsdf::Diffuse(b)
    }
}

impl From<RoughConductor> for Bsdf {
    fn from(b: RoughConductor) -> Self {
        Bsdf::RoughConductor(b)
    }
}

impl From<Dielectric> for Bsdf {
    fn from(b: Dielectric) -> Self {
        Bsdf::Dielectric(b)
    }
}

impl From<Principled> for Bsdf {
    fn from(b: Principled) -> Self {
        Bsdf::Principled(b)
    }
}

impl From<Toon> for Bsdf {
    fn from(b: Toon) -> Self {
        Bsdf::Toon(b)
    }
}
