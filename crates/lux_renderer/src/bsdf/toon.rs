//! Cel-shaded Lambertian lobe.

use lux_core::Texture;
use lux_math::{Color, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::{diffuse, BsdfEval, BsdfSample};
use crate::sampler::Sampler;

/// Piecewise-linear ramp for one color channel.
///
/// Values below `start` map to `low`, values at or above `end` map to
/// `high`, and values in between are interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampChannel {
    pub start: f32,
    pub end: f32,
    #[serde(default = "default_low")]
    pub low: f32,
    #[serde(default = "default_high")]
    pub high: f32,
}

fn default_low() -> f32 {
    0.051
}

fn default_high() -> f32 {
    1.0
}

impl RampChannel {
    pub fn new(start: f32, end: f32) -> Self {
        Self {
            start,
            end,
            low: default_low(),
            high: default_high(),
        }
    }

    /// Position of `v` along the ramp in `[0, 1]`.
    fn fraction(&self, v: f32) -> f32 {
        if v < self.start {
            0.0
        } else if v >= self.end {
            1.0
        } else {
            (v - self.start) / (self.end - self.start)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToonConfig {
    /// Ramps for the red, green and blue channels.
    pub ramp: [RampChannel; 3],
    /// Quantize each ramp into this many flat steps; 0 keeps it continuous.
    pub bands: u32,
}

impl Default for ToonConfig {
    fn default() -> Self {
        Self {
            ramp: [
                RampChannel::new(0.1, 0.12),
                RampChannel::new(0.1, 0.2),
                RampChannel::new(0.05, 0.3),
            ],
            bands: 0,
        }
    }
}

impl ToonConfig {
    /// Map linear radiance through the per-channel ramps.
    pub fn apply(&self, radiance: Color) -> Color {
        let mut out = [0.0; 3];
        for (channel, value) in out.iter_mut().enumerate() {
            let ramp = &self.ramp[channel];
            let mut r = ramp.fraction(radiance[channel]);
            if self.bands > 0 {
                let bands = self.bands as f32;
                r = (r * bands).floor() / bands;
            }
            *value = ramp.low + r * (ramp.high - ramp.low);
        }
        Color::from_array(out)
    }
}

/// Lambertian reflector whose evaluated response is pushed through a
/// [`ToonConfig`] ramp, giving flat light and shadow bands under NEE.
///
/// Sampled bounces keep the plain Lambertian weight, and the albedo is
/// reported as black so feature lines only follow geometry on toon surfaces.
#[derive(Debug, Clone)]
pub struct Toon {
    pub albedo: Texture,
    pub ramp: ToonConfig,
}

impl Toon {
    pub fn new(albedo: impl Into<Texture>) -> Self {
        Self::with_ramp(albedo, ToonConfig::default())
    }

    pub fn with_ramp(albedo: impl Into<Texture>, ramp: ToonConfig) -> Self {
        Self {
            albedo: albedo.into(),
            ramp,
        }
    }

    pub fn evaluate(&self, uv: Vec2, _wo: Vec3, wi: Vec3) -> BsdfEval {
        match diffuse::lobe_evaluate(self.albedo.evaluate(uv), wi) {
            BsdfEval::Valid(value) => BsdfEval::Valid(self.ramp.apply(value)),
            BsdfEval::Invalid => BsdfEval::Invalid,
        }
    }

    pub fn sample(&self, uv: Vec2, _wo: Vec3, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        diffuse::lobe_sample(self.albedo.evaluate(uv), sampler)
    }
}
