//! Scene assembly and world-level ray queries.
//!
//! Shapes and BSDFs live in arenas and are referenced from instances by id.
//! A top-level BVH over instance bounds answers nearest-hit and shadow
//! queries; each instance then recurses into its own shape.

use lux_math::{Aabb, Color, Frame, Ray, Vec2, Vec3};

use crate::background::EnvironmentMap;
use crate::bsdf::{Bsdf, BsdfEval, BsdfSample};
use crate::bvh::{Bvh, BvhPrimitive, Hit, SplitMethod};
use crate::error::{RenderError, RenderResult};
use crate::instance::Instance;
use crate::light::Light;
use crate::sampler::Sampler;
use crate::shape::{Shape, SurfaceHit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BsdfId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub(crate) usize);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl BsdfId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl InstanceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shared, immutable geometry and materials.
#[derive(Debug, Default)]
pub struct SceneAssets {
    shapes: Vec<Shape>,
    bsdfs: Vec<Bsdf>,
}

impl SceneAssets {
    /// Ids are validated when the scene is built.
    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.0]
    }

    pub fn bsdf(&self, id: BsdfId) -> &Bsdf {
        &self.bsdfs[id.0]
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn bsdf_count(&self) -> usize {
        self.bsdfs.len()
    }
}

/// Collects scene contents, then validates and indexes them in [`build`].
///
/// [`build`]: SceneBuilder::build
#[derive(Debug, Default)]
pub struct SceneBuilder {
    assets: SceneAssets,
    instances: Vec<Instance>,
    lights: Vec<Light>,
    background: Option<EnvironmentMap>,
    split_method: SplitMethod,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shape(&mut self, shape: impl Into<Shape>) -> ShapeId {
        self.assets.shapes.push(shape.into());
        ShapeId(self.assets.shapes.len() - 1)
    }

    pub fn add_bsdf(&mut self, bsdf: impl Into<Bsdf>) -> BsdfId {
        self.assets.bsdfs.push(bsdf.into());
        BsdfId(self.assets.bsdfs.len() - 1)
    }

    pub fn add_instance(&mut self, instance: Instance) -> InstanceId {
        self.instances.push(instance);
        InstanceId(self.instances.len() - 1)
    }

    pub fn add_light(&mut self, light: Light) -> &mut Self {
        self.lights.push(light);
        self
    }

    /// Add an instance and register it as an area light in one step.
    pub fn add_area_light(&mut self, instance: Instance) -> InstanceId {
        let id = self.add_instance(instance);
        self.lights.push(Light::Area { instance: id });
        id
    }

    pub fn background(&mut self, background: EnvironmentMap) -> &mut Self {
        self.background = Some(background);
        self
    }

    pub fn split_method(&mut self, method: SplitMethod) -> &mut Self {
        self.split_method = method;
        self
    }

    pub fn build(self) -> RenderResult<Scene> {
        let Self {
            assets,
            instances,
            lights,
            background,
            split_method,
        } = self;

        for (index, instance) in instances.iter().enumerate() {
            let shape = instance.shape_id().0;
            if shape >= assets.shapes.len() {
                return Err(RenderError::MissingShape { instance: index, shape });
            }
            if let Some(bsdf) = instance.bsdf_id() {
                if bsdf.0 >= assets.bsdfs.len() {
                    return Err(RenderError::MissingBsdf {
                        instance: index,
                        bsdf: bsdf.0,
                    });
                }
            }
        }

        let mut sampled_emitter = vec![false; instances.len()];
        for light in &lights {
            match light {
                Light::Area { instance } => {
                    let Some(target) = instances.get(instance.0) else {
                        return Err(RenderError::MissingInstance(instance.0));
                    };
                    if target.emission().is_none() {
                        return Err(RenderError::NonEmissiveAreaLight(instance.0));
                    }
                    sampled_emitter[instance.0] = true;
                }
                Light::Environment if background.is_none() => {
                    return Err(RenderError::MissingBackground);
                }
                _ => {}
            }
        }

        let primitives: Vec<BvhPrimitive> = instances
            .iter()
            .map(|instance| {
                BvhPrimitive::new(instance.bounding_box(&assets), instance.centroid(&assets))
            })
            .collect();
        let bvh = Bvh::new(&primitives, split_method);

        if lights.is_empty() {
            log::warn!("Scene has no lights; next-event estimation will be skipped");
        }

        log::info!(
            "Scene built: {} instances, {} shapes, {} bsdfs, {} lights, BVH {} nodes (depth {})",
            instances.len(),
            assets.shapes.len(),
            assets.bsdfs.len(),
            lights.len(),
            bvh.node_count(),
            bvh.depth()
        );

        Ok(Scene {
            assets,
            instances,
            bvh,
            lights,
            background,
            sampled_emitter,
        })
    }
}

/// Read-only scene used during rendering.
#[derive(Debug)]
pub struct Scene {
    assets: SceneAssets,
    instances: Vec<Instance>,
    bvh: Bvh,
    lights: Vec<Light>,
    background: Option<EnvironmentMap>,
    /// Instances that are also reachable through light sampling.
    sampled_emitter: Vec<bool>,
}

struct InstanceHit {
    index: usize,
    hit: SurfaceHit,
}

impl Hit for InstanceHit {
    fn t(&self) -> f32 {
        self.hit.t
    }
}

impl Scene {
    pub fn builder() -> SceneBuilder {
        SceneBuilder::new()
    }

    pub fn assets(&self) -> &SceneAssets {
        &self.assets
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.0)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn has_lights(&self) -> bool {
        !self.lights.is_empty()
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bvh.bounding_box()
    }

    /// Nearest surface along `ray` with `EPSILON < t <= t_max`.
    pub fn intersect(
        &self,
        ray: &Ray,
        t_max: f32,
        sampler: &mut dyn Sampler,
    ) -> Option<Intersection<'_>> {
        let found = self.bvh.intersect(ray, t_max, |index, bound| {
            let instance = &self.instances[index as usize];
            instance
                .intersect(&self.assets, ray, bound, sampler)
                .map(|hit| InstanceHit {
                    index: index as usize,
                    hit,
                })
        })?;

        let instance = &self.instances[found.index];
        let hit = found.hit;
        Some(Intersection {
            t: hit.t,
            position: hit.position,
            frame: hit.frame,
            uv: hit.uv,
            pdf: hit.pdf,
            wo: -ray.direction,
            instance,
            instance_id: InstanceId(found.index),
            bsdf: instance.bsdf(&self.assets),
        })
    }

    /// True if anything blocks `ray` before `t_max`.
    pub fn is_occluded(&self, ray: &Ray, t_max: f32, sampler: &mut dyn Sampler) -> bool {
        self.bvh.occluded(ray, t_max, |index, bound| {
            self.instances[index as usize]
                .intersect(&self.assets, ray, bound, sampler)
                .is_some()
        })
    }

    /// Pick one light uniformly; returns it with its selection probability.
    pub fn sample_light(&self, sampler: &mut dyn Sampler) -> Option<(&Light, f32)> {
        if self.lights.is_empty() {
            return None;
        }
        let count = self.lights.len();
        let index = ((sampler.next() * count as f32) as usize).min(count - 1);
        Some((&self.lights[index], 1.0 / count as f32))
    }

    /// Radiance reaching an escaping ray; black without a background.
    pub fn evaluate_background(&self, direction: Vec3) -> Color {
        self.background
            .as_ref()
            .map_or(Color::ZERO, |bg| bg.evaluate(direction))
    }

    pub fn background(&self) -> Option<&EnvironmentMap> {
        self.background.as_ref()
    }

    /// True if light sampling already accounts for this instance's emission.
    pub fn is_sampled_emitter(&self, id: InstanceId) -> bool {
        self.sampled_emitter.get(id.0).copied().unwrap_or(false)
    }

    /// True if the background is part of the light set.
    pub fn samples_background(&self) -> bool {
        self.lights.iter().any(|l| matches!(l, Light::Environment))
    }
}

/// A frozen nearest hit, with world-space shading data.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    pub t: f32,
    pub position: Vec3,
    pub frame: Frame,
    pub uv: Vec2,
    /// Area density with which the instance would sample this point.
    pub pdf: f32,
    /// Unit direction back towards the ray origin.
    pub wo: Vec3,
    pub instance: &'a Instance,
    pub instance_id: InstanceId,
    bsdf: Option<&'a Bsdf>,
}

impl<'a> Intersection<'a> {
    pub fn bsdf(&self) -> Option<&'a Bsdf> {
        self.bsdf
    }

    /// BSDF times cosine for a world-space incident direction.
    pub fn evaluate_bsdf(&self, wi: Vec3) -> BsdfEval {
        match self.bsdf {
            Some(bsdf) => bsdf.evaluate(
                self.uv,
                self.frame.to_local(self.wo),
                self.frame.to_local(wi),
            ),
            None => BsdfEval::Invalid,
        }
    }

    /// Importance-sample the BSDF; `wi` is returned in world space.
    pub fn sample_bsdf(&self, sampler: &mut dyn Sampler) -> Option<BsdfSample> {
        let bsdf = self.bsdf?;
        let sample = bsdf.sample(self.uv, self.frame.to_local(self.wo), sampler)?;
        Some(BsdfSample {
            wi: self.frame.to_world(sample.wi),
            ..sample
        })
    }

    /// Radiance emitted towards `wo`.
    pub fn evaluate_emission(&self) -> Color {
        self.instance
            .emission()
            .map_or(Color::ZERO, |e| e.evaluate(self.uv, self.frame.to_local(self.wo)))
    }

    pub fn is_emitter(&self) -> bool {
        self.instance.emission().is_some()
    }

    pub fn albedo(&self) -> Color {
        self.bsdf.map_or(Color::ZERO, |b| b.albedo(self.uv))
    }

    pub fn is_delta(&self) -> bool {
        self.bsdf.is_some_and(Bsdf::is_delta)
    }
}
