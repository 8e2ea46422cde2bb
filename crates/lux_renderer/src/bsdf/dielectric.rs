use lux_core::Texture;
use lux_math::{Vec2, Vec3};

use super::fresnel::fresnel_dielectric;
use super::{reflect, BsdfSample};
use crate::sampler::Sampler;

/// Smooth glass-like interface; reflects or refracts but never both.
///
/// `ior` is the interior index over the exterior index. The normal points
/// to the exterior.
#[derive(Debug, Clone)]
pub struct Dielectric {
    pub ior: Texture,
    pub reflectance: Texture,
    pub transmittance: Texture,
}

impl Dielectric {
    pub fn new(
        ior: impl Into<Texture>,
        reflectance: impl Into<Texture>,
        transmittance: impl Into<Texture>,
    ) -> Self {
        Self {
            ior: ior.into(),
            reflectance: reflectance.into(),
            transmittance: transmittance.into(),
        }
    }

    /// Glass with the given index and white reflectance and transmittance.
    pub fn glass(ior: f32) -> Self {
        Self::new(Texture::constant(ior), Texture::constant(1.0), Texture::constant(1.0))
    }

    /// Choose reflection with probability `F`, refraction otherwise.
    ///
    /// The branch probability cancels the Fresnel factor, leaving the
    /// reflectance for reflection and `transmittance / η²` for refraction.
    pub fn sample(&self, uv: Vec2, wo: Vec3, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        if wo.z == 0.0 {
            return None;
        }

        let ior = self.ior.scalar(uv);
        let (eta, normal) = if wo.z > 0.0 {
            (ior, Vec3::Z)
        } else {
            // Leaving the interior
            (1.0 / ior, -Vec3::Z)
        };

        let cos_i = wo.z.abs();
        let fresnel = fresnel_dielectric(cos_i, eta);

        if sampler.next() < fresnel {
            return Some(BsdfSample {
                wi: reflect(wo, normal),
                weight: self.reflectance.evaluate(uv),
                pdf: None,
            });
        }

        // fresnel < 1 here, so Snell's law has a solution
        let sin2_t = (1.0 - cos_i * cos_i) / (eta * eta);
        let cos_t = (1.0 - sin2_t).max(0.0).sqrt();
        let wi = (-wo / eta + (cos_i / eta - cos_t) * normal).normalize();

        Some(BsdfSample {
            wi,
            weight: self.transmittance.evaluate(uv) / (eta * eta),
            pdf: None,
        })
    }
}
