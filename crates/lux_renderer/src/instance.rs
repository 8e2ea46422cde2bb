//! Instances place a shape in the world and attach surface properties.
//!
//! Without a transform, local space is world space and rays go straight to
//! the shape. With one, rays are mapped into local space, the hit is mapped
//! back, and the shading frame is rebuilt in world space.

use lux_core::Texture;
use lux_math::{Aabb, Color, Frame, Ray, Transform, Vec2, Vec3, EPSILON};

use crate::bsdf::Bsdf;
use crate::emission::Emission;
use crate::sampler::Sampler;
use crate::scene::{BsdfId, SceneAssets, ShapeId};
use crate::shape::{AreaSample, SurfaceHit};

/// Per-instance settings for the feature-line integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureLineStyle {
    pub color: Color,
    /// Line width scale for this instance, multiplied by the screen width.
    pub pixel_width: f32,
    /// Draw lines where the albedo changes.
    pub albedo_edges: bool,
    /// Draw lines at creases.
    pub normal_edges: bool,
}

impl Default for FeatureLineStyle {
    fn default() -> Self {
        Self {
            color: Color::ZERO,
            pixel_width: 1.0,
            albedo_edges: true,
            normal_edges: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Instance {
    shape: ShapeId,
    transform: Option<Transform>,
    bsdf: Option<BsdfId>,
    emission: Option<Emission>,
    alpha: Option<Texture>,
    normal_map: Option<Texture>,
    flip_normal: bool,
    feature_line: Option<FeatureLineStyle>,
}

impl Instance {
    pub fn new(shape: ShapeId) -> Self {
        Self {
            shape,
            transform: None,
            bsdf: None,
            emission: None,
            alpha: None,
            normal_map: None,
            flip_normal: false,
            feature_line: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_bsdf(mut self, bsdf: BsdfId) -> Self {
        self.bsdf = Some(bsdf);
        self
    }

    pub fn with_emission(mut self, emission: Emission) -> Self {
        self.emission = Some(emission);
        self
    }

    /// Stochastic cutout: hits survive with probability `alpha(uv)`.
    pub fn with_alpha(mut self, alpha: impl Into<Texture>) -> Self {
        self.alpha = Some(alpha.into());
        self
    }

    /// Tangent-space normal map, encoded as `(n + 1) / 2`.
    pub fn with_normal_map(mut self, normal_map: impl Into<Texture>) -> Self {
        self.normal_map = Some(normal_map.into());
        self
    }

    pub fn with_flip_normal(mut self, flip: bool) -> Self {
        self.flip_normal = flip;
        self
    }

    pub fn with_feature_line(mut self, style: FeatureLineStyle) -> Self {
        self.feature_line = Some(style);
        self
    }

    pub fn shape_id(&self) -> ShapeId {
        self.shape
    }

    pub fn bsdf_id(&self) -> Option<BsdfId> {
        self.bsdf
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn emission(&self) -> Option<&Emission> {
        self.emission.as_ref()
    }

    pub fn feature_line(&self) -> Option<&FeatureLineStyle> {
        self.feature_line.as_ref()
    }

    pub fn bsdf<'a>(&self, assets: &'a SceneAssets) -> Option<&'a Bsdf> {
        self.bsdf.map(|id| assets.bsdf(id))
    }

    /// Nearest hit with `EPSILON < t <= t_max`, in world units.
    ///
    /// Alpha masking may consume a sample and reject the hit; the caller's
    /// bound is untouched in that case since nothing is returned.
    pub fn intersect(
        &self,
        assets: &SceneAssets,
        ray: &Ray,
        t_max: f32,
        sampler: &mut dyn Sampler,
    ) -> Option<SurfaceHit> {
        let shape = assets.shape(self.shape);

        let mut hit = match &self.transform {
            // fast path, if no transform is needed
            None => shape.intersect(ray, t_max)?,
            Some(transform) => {
                let (local_ray, scale) = transform.inverse_ray(ray);
                if local_ray.is_degenerate() {
                    return None;
                }
                let local = shape.intersect(&local_ray, t_max * scale)?;
                self.to_world(transform, ray, t_max, local)?
            }
        };

        if let Some(alpha) = &self.alpha {
            let a = alpha.scalar(hit.uv);
            if a < 1.0 && sampler.next() >= a {
                return None;
            }
        }

        hit.frame = self.shade_frame(hit.frame, hit.uv);
        Some(hit)
    }

    /// Map a local hit back to world space.
    fn to_world(
        &self,
        transform: &Transform,
        ray: &Ray,
        t_max: f32,
        local: SurfaceHit,
    ) -> Option<SurfaceHit> {
        let position = transform.apply_point(local.position);

        // Per-axis scale differs under non-uniform transforms, so the world
        // distance is measured rather than converted
        let t = (position - ray.origin).length();
        if t < EPSILON || t > t_max {
            return None;
        }

        let frame = world_frame(transform, &local.frame)?;
        let pdf = local.pdf / transform.area_scale(local.frame.normal);
        Some(SurfaceHit {
            t,
            position,
            frame,
            uv: local.uv,
            pdf,
        })
    }

    /// Apply normal flipping and normal mapping to a world-space frame.
    fn shade_frame(&self, mut frame: Frame, uv: Vec2) -> Frame {
        if self.flip_normal {
            frame = frame.flipped();
        }
        if let Some(normal_map) = &self.normal_map {
            let encoded = normal_map.evaluate(uv);
            let tangent_space = encoded * 2.0 - Vec3::ONE;
            if let Some(n) = frame.to_world(tangent_space).try_normalize() {
                frame = Frame::from_normal(n);
            }
        }
        frame
    }

    pub fn bounding_box(&self, assets: &SceneAssets) -> Aabb {
        let local = assets.shape(self.shape).bounding_box();
        match &self.transform {
            // fast path
            None => local,
            Some(transform) => transform.transform_aabb(&local),
        }
    }

    pub fn centroid(&self, assets: &SceneAssets) -> Vec3 {
        let local = assets.shape(self.shape).centroid();
        match &self.transform {
            None => local,
            Some(transform) => transform.apply_point(local),
        }
    }

    /// Sample a world-space point on the surface, with a world-area density.
    pub fn sample_area(&self, assets: &SceneAssets, sampler: &mut dyn Sampler) -> AreaSample {
        let local = assets.shape(self.shape).sample_area(sampler);
        let mut sample = match &self.transform {
            None => local,
            Some(transform) => {
                let frame = world_frame(transform, &local.frame).unwrap_or(local.frame);
                AreaSample {
                    position: transform.apply_point(local.position),
                    frame,
                    uv: local.uv,
                    pdf: local.pdf / transform.area_scale(local.frame.normal),
                }
            }
        };
        sample.frame = self.shade_frame(sample.frame, sample.uv);
        sample
    }
}

/// Transform the tangent basis and re-derive an orthonormal frame from it.
///
/// Mirroring transforms reverse `t × b`, so the bitangent is negated first
/// to keep the normal on the outside.
fn world_frame(transform: &Transform, local: &Frame) -> Option<Frame> {
    let tangent = transform.apply_vector(local.tangent);
    let mut bitangent = transform.apply_vector(local.bitangent);
    if transform.is_mirroring() {
        bitangent = -bitangent;
    }
    Frame::from_tangent_basis(tangent, bitangent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::IndependentSampler;
    use crate::scene::Scene;
    use crate::sphere::Sphere;

    /// A single unit sphere at the origin, built from `instance`.
    fn unit_sphere(configure: impl FnOnce(Instance) -> Instance) -> Scene {
        let mut builder = Scene::builder();
        let sphere = builder.add_shape(Sphere::new(1.0));
        builder.add_instance(configure(Instance::new(sphere)));
        builder.build().unwrap()
    }

    fn hit_frame(scene: &Scene, ray: &Ray) -> Frame {
        let mut sampler = IndependentSampler::new(0);
        scene.instances()[0]
            .intersect(scene.assets(), ray, f32::INFINITY, &mut sampler)
            .unwrap()
            .frame
    }

    #[test]
    fn test_alpha_rejects_hits_and_falls_through() {
        let mut builder = Scene::builder();
        let sphere = builder.add_shape(Sphere::new(1.0));
        builder.add_instance(
            Instance::new(sphere)
                .with_alpha(0.5)
                .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 5.0))),
        );
        builder.add_instance(
            Instance::new(sphere)
                .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 10.0))),
        );
        let scene = builder.build().unwrap();

        let mut sampler = IndependentSampler::new(3);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let n = 10_000;
        let mut near = 0;
        for _ in 0..n {
            let its = scene.intersect(&ray, f32::INFINITY, &mut sampler).unwrap();
            if (its.t - 4.0).abs() < 1e-4 {
                near += 1;
            } else {
                // A rejected hit never hides what lies behind it
                assert!((its.t - 9.0).abs() < 1e-4);
                assert_eq!(its.instance_id.index(), 1);
            }
        }
        let rate = near as f32 / n as f32;
        assert!((rate - 0.5).abs() < 0.03, "accepted {rate}");
    }

    #[test]
    fn test_opaque_alpha_never_rejects() {
        let scene = unit_sphere(|i| i.with_alpha(1.0));
        let mut sampler = IndependentSampler::new(4);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        for _ in 0..100 {
            assert!(scene.intersect(&ray, f32::INFINITY, &mut sampler).is_some());
        }
    }

    #[test]
    fn test_flip_negates_normal_and_bitangent() {
        let ray = Ray::new(Vec3::new(0.3, 0.2, -5.0), Vec3::Z);
        let plain = hit_frame(&unit_sphere(|i| i), &ray);
        let flipped = hit_frame(&unit_sphere(|i| i.with_flip_normal(true)), &ray);

        assert!((flipped.normal + plain.normal).length() < 1e-6);
        assert!((flipped.bitangent + plain.bitangent).length() < 1e-6);
        assert!((flipped.tangent - plain.tangent).length() < 1e-6);
        assert!(flipped.is_orthonormal(1e-4));
        // Still right-handed
        assert!((flipped.tangent.cross(flipped.bitangent) - flipped.normal).length() < 1e-4);
    }

    #[test]
    fn test_normal_map_perturbs_and_stays_orthonormal() {
        let ray = Ray::new(Vec3::new(0.3, 0.2, -5.0), Vec3::Z);
        let plain = hit_frame(&unit_sphere(|i| i), &ray);

        // Encoded (0.5, 0, 0.5) in tangent space
        let encoded = Color::new(0.75, 0.5, 0.75);
        let mapped = hit_frame(&unit_sphere(|i| i.with_normal_map(encoded)), &ray);
        let expected = (plain.tangent + plain.normal).normalize();
        assert!((mapped.normal - expected).length() < 1e-4);
        assert!(mapped.is_orthonormal(1e-4));

        // Flat encoding leaves the normal alone
        let flat = hit_frame(
            &unit_sphere(|i| i.with_normal_map(Color::new(0.5, 0.5, 1.0))),
            &ray,
        );
        assert!((flat.normal - plain.normal).length() < 1e-5);

        // Flip is applied first, so the perturbation follows the flipped frame
        let both = hit_frame(
            &unit_sphere(|i| i.with_flip_normal(true).with_normal_map(encoded)),
            &ray,
        );
        let flipped = plain.flipped();
        let expected = (flipped.tangent + flipped.normal).normalize();
        assert!((both.normal - expected).length() < 1e-4);
        assert!(both.is_orthonormal(1e-4));
    }

    #[test]
    fn test_transformed_area_sample_is_on_surface() {
        let scene = unit_sphere(|i| {
            i.with_transform(Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)))
        });
        let instance = &scene.instances()[0];
        let mut sampler = IndependentSampler::new(9);
        for _ in 0..32 {
            let s = instance.sample_area(scene.assets(), &mut sampler);
            let offset = s.position - Vec3::new(1.0, 2.0, 3.0);
            assert!((offset.length() - 1.0).abs() < 1e-4);
            assert!((s.frame.normal - offset.normalize()).length() < 1e-3);
        }
    }
}
