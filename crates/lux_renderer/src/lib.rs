//! Lux Renderer - CPU path tracing
//!
//! A Monte Carlo light transport engine: two-level BVH over instanced
//! shapes, microfacet and dielectric BSDFs, point/directional/area/
//! environment lights and a path tracer with next-event estimation.
//!
//! # Example
//!
//! ```ignore
//! use lux_renderer::*;
//!
//! let mut builder = Scene::builder();
//! let sphere = builder.add_shape(Sphere::new(1.0));
//! let grey = builder.add_bsdf(Diffuse::new(Color::splat(0.5)));
//! builder.add_instance(Instance::new(sphere).with_bsdf(grey));
//! builder.add_light(Light::Point { position: Vec3::Y * 3.0, power: Color::splat(50.0) });
//! let scene = builder.build()?;
//!
//! let integrator = IntegratorConfig::default().build()?;
//! let camera = Camera::new().with_look_at(Vec3::Z * -5.0, Vec3::ZERO, Vec3::Y);
//! let image = render(&scene, &camera, integrator.as_ref(), &RenderConfig::default())?;
//! ```

mod background;
pub mod bsdf;
mod bucket;
pub mod bvh;
mod camera;
mod emission;
mod error;
mod instance;
pub mod integrator;
mod light;
mod renderer;
mod sampler;
mod scene;
mod shape;
mod sphere;
mod triangle_mesh;

pub use background::EnvironmentMap;
pub use bsdf::{Bsdf, BsdfEval, BsdfSample, Dielectric, Diffuse, Principled, RoughConductor, Toon};
pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{Bvh, SplitMethod};
pub use camera::{Camera, FovAxis, ThinLens};
pub use emission::Emission;
pub use error::{RenderError, RenderResult};
pub use instance::{FeatureLineStyle, Instance};
pub use integrator::{Integrator, IntegratorConfig};
pub use light::{DirectLightSample, Light};
pub use renderer::{
    color_to_rgba, linear_to_gamma, render, render_pixel, render_with_cancel, ImageBuffer,
    RenderConfig, RenderContext,
};
pub use sampler::{IndependentSampler, Sampler};
pub use scene::{BsdfId, InstanceId, Intersection, Scene, SceneAssets, SceneBuilder, ShapeId};
pub use shape::{AreaSample, Shape, SurfaceHit};
pub use sphere::Sphere;
pub use triangle_mesh::TriangleMesh;

// Re-export math and asset types used in the public API
pub use lux_core::{Mesh, Texture};
pub use lux_math::{Color, Frame, Quat, Ray, Transform, Vec2, Vec3, EPSILON};
