use lux_core::Texture;
use lux_math::{mean, Color, Vec2, Vec3};

use super::fresnel::schlick;
use super::microfacet::roughness_to_alpha;
use super::{conductor, diffuse, BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// Diffuse base blended with a metallic GGX lobe.
#[derive(Debug, Clone)]
pub struct Principled {
    pub base_color: Texture,
    pub roughness: Texture,
    pub metallic: Texture,
    pub specular: Texture,
    /// Read specular from the green and metallic from the blue channel, for
    /// maps that pack roughness, specular and metallic into one texture.
    pub packed_channels: bool,
}

/// The two lobes at one shading point, with the diffuse selection probability.
struct Lobes {
    diffuse_color: Color,
    metallic_color: Color,
    alpha: f32,
    diffuse_probability: f32,
}

impl Principled {
    pub fn new(
        base_color: impl Into<Texture>,
        roughness: impl Into<Texture>,
        metallic: impl Into<Texture>,
        specular: impl Into<Texture>,
    ) -> Self {
        Self {
            base_color: base_color.into(),
            roughness: roughness.into(),
            metallic: metallic.into(),
            specular: specular.into(),
            packed_channels: false,
        }
    }

    /// Shade from a single packed map: roughness in red, specular in green,
    /// metallic in blue.
    pub fn packed(base_color: impl Into<Texture>, channels: impl Into<Texture>) -> Self {
        let channels = channels.into();
        Self {
            packed_channels: true,
            ..Self::new(base_color, channels.clone(), channels.clone(), channels)
        }
    }

    fn lobes(&self, uv: Vec2, wo: Vec3) -> Lobes {
        let base_color = self.base_color.evaluate(uv);
        let alpha = roughness_to_alpha(self.roughness.scalar(uv));
        let (specular, metallic) = if self.packed_channels {
            (self.specular.evaluate(uv).y, self.metallic.evaluate(uv).z)
        } else {
            (self.specular.scalar(uv), self.metallic.scalar(uv))
        };

        let fresnel = specular * schlick((1.0 - metallic) * 0.08, wo.z);
        let diffuse_color = (1.0 - fresnel) * (1.0 - metallic) * base_color;
        let metallic_color = Color::splat(fresnel) + (1.0 - fresnel) * metallic * base_color;

        let diffuse_albedo = mean(diffuse_color);
        let total_albedo = diffuse_albedo + mean(metallic_color);
        let diffuse_probability = if total_albedo > 0.0 {
            diffuse_albedo / total_albedo
        } else {
            1.0
        };

        Lobes {
            diffuse_color,
            metallic_color,
            alpha,
            diffuse_probability,
        }
    }

    pub fn evaluate(&self, uv: Vec2, wo: Vec3, wi: Vec3) -> BsdfEval {
        let lobes = self.lobes(uv, wo);
        let diffuse = diffuse::lobe_evaluate(lobes.diffuse_color, wi);
        let metallic = conductor::lobe_evaluate(lobes.metallic_color, lobes.alpha, wo, wi);

        if wi.z <= 0.0 || (diffuse.is_invalid() && metallic.is_invalid()) {
            return BsdfEval::Invalid;
        }
        BsdfEval::Valid(diffuse.value() + metallic.value())
    }

    /// Pick one lobe in proportion to its mean reflectance and divide its
    /// weight by the selection probability.
    pub fn sample(&self, uv: Vec2, wo: Vec3, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        let lobes = self.lobes(uv, wo);
        let p_diffuse = lobes.diffuse_probability;

        let sample_diffuse = sampler.next() < p_diffuse;
        let (sample, probability) = if sample_diffuse {
            (diffuse::lobe_sample(lobes.diffuse_color, sampler)?, p_diffuse)
        } else {
            (
                conductor::lobe_sample(lobes.metallic_color, lobes.alpha, wo, sampler)?,
                1.0 - p_diffuse,
            )
        };
        if sample.wi.z <= 0.0 || probability <= 0.0 {
            return None;
        }

        let pdf = p_diffuse * diffuse::lobe_pdf(sample.wi)
            + (1.0 - p_diffuse) * conductor::lobe_pdf(lobes.alpha, wo, sample.wi);

        Some(BsdfSample {
            wi: sample.wi,
            weight: sample.weight / probability,
            pdf: Some(pdf),
        })
    }
}
