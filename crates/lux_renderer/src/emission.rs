//! Surface emission profiles.

use lux_core::Texture;
use lux_math::{Color, Frame, Vec2, Vec3};

#[derive(Debug, Clone)]
pub enum Emission {
    /// Uniform radiance from the front side only.
    Lambertian(Texture),
}

impl Emission {
    pub fn lambertian(radiance: impl Into<Texture>) -> Self {
        Emission::Lambertian(radiance.into())
    }

    /// Radiance leaving towards `wo`, given in the local shading frame.
    pub fn evaluate(&self, uv: Vec2, wo: Vec3) -> Color {
        match self {
            Emission::Lambertian(radiance) => {
                if Frame::cos_theta(wo) <= 0.0 {
                    Color::ZERO
                } else {
                    radiance.evaluate(uv)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_sided() {
        let e = Emission::lambertian(Color::splat(3.0));
        assert_eq!(e.evaluate(Vec2::ZERO, Vec3::new(0.6, 0.0, 0.8)), Color::splat(3.0));
        assert_eq!(e.evaluate(Vec2::ZERO, -Vec3::Z), Color::ZERO);
    }
}
