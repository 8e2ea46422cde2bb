//! Light sources that can be sampled from a shading point.

use std::f32::consts::PI;

use lux_math::{warp, Color, Vec3};

use crate::sampler::Sampler;
use crate::scene::{InstanceId, Scene};

/// A direction towards a light and the radiance arriving along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectLightSample {
    /// Unit direction from the shading point towards the light.
    pub wi: Vec3,
    /// Incident radiance divided by the sampling density.
    pub weight: Color,
    /// Distance to the sampled point; infinite for lights at infinity.
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Isotropic point source; `power` is the total emitted power.
    Point { position: Vec3, power: Color },
    /// Parallel light arriving from `direction` (pointing towards the light).
    Directional { direction: Vec3, intensity: Color },
    /// Emissive instance sampled by area.
    Area { instance: InstanceId },
    /// The scene background.
    Environment,
}

impl Light {
    /// Sample incident light at `origin`. `None` if nothing arrives.
    pub fn sample_direct(
        &self,
        scene: &Scene,
        origin: Vec3,
        sampler: &mut dyn Sampler,
    ) -> Option<DirectLightSample> {
        match self {
            Light::Point { position, power } => {
                let offset = *position - origin;
                let distance2 = offset.length_squared();
                if distance2 == 0.0 {
                    return None;
                }
                let distance = distance2.sqrt();
                Some(DirectLightSample {
                    wi: offset / distance,
                    weight: *power / (4.0 * PI * distance2),
                    distance,
                })
            }

            Light::Directional {
                direction,
                intensity,
            } => Some(DirectLightSample {
                wi: direction.try_normalize()?,
                weight: *intensity,
                distance: f32::INFINITY,
            }),

            Light::Area { instance } => {
                let instance = scene.instance(*instance)?;
                let emission = instance.emission()?;
                let sample = instance.sample_area(scene.assets(), sampler);
                if !(sample.pdf > 0.0) {
                    return None;
                }

                let offset = sample.position - origin;
                let distance2 = offset.length_squared();
                if distance2 == 0.0 {
                    return None;
                }
                let distance = distance2.sqrt();
                let wi = offset / distance;

                let local = sample.frame.to_local(-wi);
                let radiance = emission.evaluate(sample.uv, local);
                // area density to solid angle
                let weight = radiance * local.z.abs() / (distance2 * sample.pdf);
                Some(DirectLightSample {
                    wi,
                    weight,
                    distance,
                })
            }

            Light::Environment => {
                let wi = warp::square_to_uniform_sphere(sampler.next_2d());
                let weight = scene.evaluate_background(wi) / warp::uniform_sphere_pdf();
                Some(DirectLightSample {
                    wi,
                    weight,
                    distance: f32::INFINITY,
                })
            }
        }
    }

    /// True if a ray can hit this light by chance.
    pub fn can_be_intersected(&self) -> bool {
        matches!(self, Light::Area { .. } | Light::Environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::EnvironmentMap;
    use crate::emission::Emission;
    use crate::instance::Instance;
    use crate::sampler::IndependentSampler;
    use crate::sphere::Sphere;
    use crate::triangle_mesh::TriangleMesh;
    use lux_core::Mesh;
    use lux_math::{Mat4, Quat, Transform};
    use std::sync::Arc;

    #[test]
    fn test_point_light_inverse_square() {
        let scene = Scene::builder().build().unwrap();
        let light = Light::Point {
            position: Vec3::new(0.0, 2.0, 0.0),
            power: Color::splat(4.0 * PI),
        };
        let mut sampler = IndependentSampler::new(0);
        let s = light.sample_direct(&scene, Vec3::ZERO, &mut sampler).unwrap();

        assert!((s.wi - Vec3::Y).length() < 1e-6);
        assert!((s.distance - 2.0).abs() < 1e-6);
        assert!((s.weight - Color::splat(0.25)).length() < 1e-6);
        assert!(!light.can_be_intersected());
    }

    #[test]
    fn test_directional_light_at_infinity() {
        let scene = Scene::builder().build().unwrap();
        let light = Light::Directional {
            direction: Vec3::new(0.0, 3.0, 0.0),
            intensity: Color::ONE,
        };
        let mut sampler = IndependentSampler::new(0);
        let s = light.sample_direct(&scene, Vec3::ZERO, &mut sampler).unwrap();

        assert_eq!(s.wi, Vec3::Y);
        assert!(s.distance.is_infinite());
        assert_eq!(s.weight, Color::ONE);
    }

    #[test]
    fn test_area_light_estimates_irradiance() {
        // Unit quad at height 1 facing down, emitting 1.
        let mut builder = Scene::builder();
        let quad = builder.add_shape(TriangleMesh::new(Arc::new(Mesh::quad(1.0).unwrap()), false));
        let flip = Transform::new(
            Mat4::from_translation(Vec3::Y) * Mat4::from_rotation_x(PI),
        )
        .unwrap();
        builder.add_area_light(
            Instance::new(quad)
                .with_transform(flip)
                .with_emission(Emission::lambertian(Color::ONE)),
        );
        let scene = builder.build().unwrap();
        let light = &scene.lights()[0];
        assert!(light.can_be_intersected());

        let mut sampler = IndependentSampler::new(5);
        let n = 20_000;
        let mut irradiance = 0.0;
        for _ in 0..n {
            if let Some(s) = light.sample_direct(&scene, Vec3::ZERO, &mut sampler) {
                irradiance += s.weight.x * s.wi.y.max(0.0);
            }
        }
        irradiance /= n as f32;

        // Analytic irradiance under a centred 1x1 square at height 1
        let a = 0.5f32;
        let expected = 4.0 * (a / (1.0 + a * a).sqrt() * (a / (1.0 + a * a).sqrt()).atan());
        assert!(
            (irradiance - expected).abs() < 0.03 * expected,
            "irradiance {irradiance}, expected {expected}"
        );
    }

    #[test]
    fn test_area_light_back_side_is_dark() {
        let mut builder = Scene::builder();
        let quad = builder.add_shape(TriangleMesh::new(Arc::new(Mesh::quad(1.0).unwrap()), false));
        builder.add_area_light(
            Instance::new(quad)
                .with_transform(Transform::from_translation(Vec3::Y))
                .with_emission(Emission::lambertian(Color::ONE)),
        );
        let scene = builder.build().unwrap();
        let mut sampler = IndependentSampler::new(5);

        // Quad faces +y, the origin is below it
        for _ in 0..64 {
            let s = scene.lights()[0]
                .sample_direct(&scene, Vec3::ZERO, &mut sampler)
                .unwrap();
            assert_eq!(s.weight, Color::ZERO);
        }
    }

    #[test]
    fn test_environment_light_constant() {
        let mut builder = Scene::builder();
        builder
            .background(EnvironmentMap::constant(Color::splat(0.5)))
            .add_light(Light::Environment);
        let scene = builder.build().unwrap();
        let mut sampler = IndependentSampler::new(1);

        let s = scene.lights()[0]
            .sample_direct(&scene, Vec3::ZERO, &mut sampler)
            .unwrap();
        assert!((s.wi.length() - 1.0).abs() < 1e-5);
        assert!((s.weight - Color::splat(2.0 * PI)).length() < 1e-4);
        assert!(s.distance.is_infinite());
    }

    #[test]
    fn test_sphere_light_pdf_matches_area() {
        let mut builder = Scene::builder();
        let sphere = builder.add_shape(Sphere::new(1.0));
        let scaled = Transform::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::ZERO,
        )
        .unwrap();
        builder.add_area_light(
            Instance::new(sphere)
                .with_transform(scaled)
                .with_emission(Emission::lambertian(Color::ONE)),
        );
        let scene = builder.build().unwrap();
        let mut sampler = IndependentSampler::new(2);

        let sample = scene.instances()[0].sample_area(scene.assets(), &mut sampler);
        let area = 4.0 * PI * 4.0;
        assert!((sample.pdf - 1.0 / area).abs() < 1e-6);
        assert!((sample.position.length() - 2.0).abs() < 1e-4);
    }
}
