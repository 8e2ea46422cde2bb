//! Path tracing with stylized feature lines.
//!
//! At each vertex on an instance with a line style, a few probe rays are
//! shot through a disk on the tangent plane around the hit point. If any
//! probe misses, lands on another instance, or sees a large albedo or
//! normal change, the vertex lies on a line and takes the line color.

use std::f32::consts::PI;

use lux_math::{Color, Ray, Vec3};
use serde::{Deserialize, Serialize};

use super::path_tracer::{PathTracer, PathTracerConfig};
use super::Integrator;
use crate::error::RenderResult;
use crate::sampler::Sampler;
use crate::scene::{Intersection, Scene};

/// Probe rays start slightly ahead of the parent ray's origin.
const PROBE_OFFSET: f32 = 1e-2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureLineConfig {
    pub depth: u32,
    pub nee: bool,
    /// Line width in screen space, scaled per instance.
    pub width_scale: f32,
    /// Squared albedo difference above which a probe marks a line.
    pub albedo_threshold: f32,
    /// `1 - |n · n'|` above which a probe marks a crease.
    pub normal_threshold: f32,
    /// Probe rays per vertex.
    pub sample_count: u32,
}

impl Default for FeatureLineConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            nee: true,
            width_scale: 0.2,
            albedo_threshold: 0.12,
            normal_threshold: 0.47,
            sample_count: 7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureLineIntegrator {
    tracer: PathTracer,
    config: FeatureLineConfig,
}

impl FeatureLineIntegrator {
    pub fn new(config: FeatureLineConfig) -> RenderResult<Self> {
        let tracer = PathTracer::new(PathTracerConfig {
            depth: config.depth,
            nee: config.nee,
        })?;
        Ok(Self { tracer, config })
    }

    /// Probe the neighbourhood of `its`; `width` accumulates along the path
    /// so lines seen through reflections get wider.
    fn is_line(
        &self,
        scene: &Scene,
        ray: &Ray,
        its: &Intersection<'_>,
        sampler: &mut dyn Sampler,
        width: &mut f32,
    ) -> bool {
        let Some(style) = its.instance.feature_line() else {
            return false;
        };

        let radius = self.config.width_scale * style.pixel_width * its.t + *width;
        *width = radius;
        let albedo = its.albedo();

        let origin = ray.origin + PROBE_OFFSET * ray.direction;
        for _ in 0..self.config.sample_count {
            let u = sampler.next_2d();
            let phi = 2.0 * PI * u.x;
            let offset = its
                .frame
                .to_world(Vec3::new(phi.cos(), phi.sin(), 0.0) * radius * u.y);
            let probe = Ray::with_depth(origin, its.position + offset - origin, ray.depth);

            let Some(hit) = scene.intersect(&probe, f32::INFINITY, sampler) else {
                return true;
            };
            if hit.instance_id != its.instance_id {
                return true;
            }
            if style.albedo_edges
                && (hit.albedo() - albedo).length_squared() > self.config.albedo_threshold
            {
                return true;
            }
            if style.normal_edges
                && 1.0 - hit.frame.normal.dot(its.frame.normal).abs() > self.config.normal_threshold
            {
                return true;
            }
        }
        false
    }
}

impl Integrator for FeatureLineIntegrator {
    fn li(&self, scene: &Scene, ray: &Ray, sampler: &mut dyn Sampler) -> Color {
        let mut width = 0.0;
        self.tracer.trace(scene, ray, sampler, |ray, its, sampler| {
            let color = its.instance.feature_line()?.color;
            self.is_line(scene, ray, its, sampler, &mut width)
                .then_some(color)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::EnvironmentMap;
    use crate::bsdf::Diffuse;
    use crate::instance::{FeatureLineStyle, Instance};
    use crate::sampler::IndependentSampler;
    use crate::sphere::Sphere;
    use lux_math::Transform;

    fn scene(pixel_width: f32) -> Scene {
        let mut builder = Scene::builder();
        let sphere = builder.add_shape(Sphere::new(1.0));
        let white = builder.add_bsdf(Diffuse::new(Color::splat(0.5)));
        builder.add_instance(
            Instance::new(sphere)
                .with_bsdf(white)
                .with_transform(Transform::from_translation(Vec3::Z * 5.0))
                .with_feature_line(FeatureLineStyle {
                    color: Color::new(1.0, 0.0, 0.0),
                    pixel_width,
                    ..FeatureLineStyle::default()
                }),
        );
        builder.background(EnvironmentMap::constant(Color::splat(0.2)));
        builder.build().unwrap()
    }

    #[test]
    fn test_interior_is_not_a_line() {
        // Probe disk of radius 0.2 on a sphere at distance 4
        let scene = scene(0.25);
        let integrator = FeatureLineIntegrator::new(FeatureLineConfig::default()).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        for i in 0..16 {
            let mut sampler = IndependentSampler::new(3);
            sampler.seed(0, 0, i);
            let li = integrator.li(&scene, &ray, &mut sampler);
            assert_ne!(li, Color::new(1.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_wide_probe_finds_silhouette() {
        // Probes spread far beyond the sphere and almost surely escape
        let scene = scene(10.0);
        let integrator = FeatureLineIntegrator::new(FeatureLineConfig::default()).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        let mut sampler = IndependentSampler::new(3);
        let li = integrator.li(&scene, &ray, &mut sampler);
        assert_eq!(li, Color::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_unstyled_instances_shade_normally() {
        let mut builder = Scene::builder();
        let sphere = builder.add_shape(Sphere::new(1.0));
        let white = builder.add_bsdf(Diffuse::new(Color::splat(0.5)));
        builder.add_instance(Instance::new(sphere).with_bsdf(white));
        builder.background(EnvironmentMap::constant(Color::ONE));
        let scene = builder.build().unwrap();

        let config = FeatureLineConfig {
            width_scale: 100.0,
            ..FeatureLineConfig::default()
        };
        let integrator = FeatureLineIntegrator::new(config).unwrap();
        let mut sampler = IndependentSampler::new(3);
        // No lights: the BSDF sample escapes and sees the sky times albedo
        let li = integrator.li(&scene, &Ray::new(Vec3::new(0.0, 0.0, -4.0), Vec3::Z), &mut sampler);
        assert!((li - Color::splat(0.5)).length() < 1e-5);
    }
}
