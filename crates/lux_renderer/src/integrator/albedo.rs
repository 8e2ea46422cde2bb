use lux_math::{Color, Ray};

use super::Integrator;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Outputs the surface albedo at the first hit, black on a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlbedoIntegrator;

impl Integrator for AlbedoIntegrator {
    fn li(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler) -> Color {
        scene
            .intersect(ray, f32::INFINITY, sampler)
            .map_or(Color::ZERO, |its| its.albedo())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsdf::Diffuse;
    use crate::instance::Instance;
    use crate::sampler::IndependentSampler;
    use crate::sphere::Sphere;
    use lux_core::Texture;
    use lux_math::{Vec2, Vec3};

    #[test]
    fn test_albedo_follows_texture() {
        let mut builder = Scene::builder();
        let sphere = builder.add_shape(Sphere::new(1.0));
        let checker = builder.add_bsdf(Diffuse::new(Texture::Checkerboard {
            color0: Color::new(1.0, 0.0, 0.0),
            color1: Color::new(0.0, 0.0, 1.0),
            scale: Vec2::splat(1.0),
        }));
        builder.add_instance(Instance::new(sphere).with_bsdf(checker));
        builder.add_instance(Instance::new(sphere).with_transform(
            lux_math::Transform::from_translation(Vec3::X * 5.0),
        ));
        let scene = builder.build().unwrap();
        let mut sampler = IndependentSampler::new(0);

        let front = AlbedoIntegrator.li(&scene, &Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z), &mut sampler);
        assert!(front == Color::new(1.0, 0.0, 0.0) || front == Color::new(0.0, 0.0, 1.0));

        // No BSDF, no albedo
        let bare = AlbedoIntegrator.li(&scene, &Ray::new(Vec3::new(5.0, 0.0, -3.0), Vec3::Z), &mut sampler);
        assert_eq!(bare, Color::ZERO);

        let miss = AlbedoIntegrator.li(&scene, &Ray::new(Vec3::new(0.0, 5.0, -3.0), Vec3::Z), &mut sampler);
        assert_eq!(miss, Color::ZERO);
    }
}
