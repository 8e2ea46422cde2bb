//! Parallel image rendering.
//!
//! Buckets are rendered with rayon and assembled into an [`ImageBuffer`]
//! afterwards. Every (pixel, sample) pair reseeds its sampler, so the image
//! only depends on the seed and not on thread scheduling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use lux_math::{is_finite_color, Color};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::integrator::Integrator;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub samples_per_pixel: u32,
    /// Base seed for all sample streams.
    pub seed: u64,
    /// Bucket edge length in pixels.
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            seed: 0,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Everything a worker needs to shade pixels, shared read-only.
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub integrator: &'a dyn Integrator,
    pub config: &'a RenderConfig,
}

/// Average of `samples_per_pixel` estimates for pixel `(x, y)`.
///
/// Non-finite estimates are dropped so one bad path cannot poison a pixel.
pub fn render_pixel(ctx: &RenderContext<'_>, x: u32, y: u32, sampler: &mut dyn Sampler) -> Color {
    let spp = ctx.config.samples_per_pixel;
    let mut pixel_color = Color::ZERO;

    for sample_index in 0..spp {
        sampler.seed(x, y, sample_index);
        let ray = ctx.camera.get_ray(x, y, sampler);
        let li = ctx.integrator.li(ctx.scene, &ray, sampler);
        if is_finite_color(li) {
            pixel_color += li;
        }
    }

    pixel_color / spp as f32
}

/// Linear radiance image.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (i, color) in result.pixels.iter().enumerate() {
            let local_x = i as u32 % bucket.width;
            let local_y = i as u32 / bucket.width;
            self.set(bucket.x + local_x, bucket.y + local_y, *color);
        }
    }

    /// Convert to gamma-corrected RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let encode = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [encode(color.x), encode(color.y), encode(color.z), 255]
}

/// Render the full image in parallel.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    integrator: &dyn Integrator,
    config: &RenderConfig,
) -> RenderResult<ImageBuffer> {
    render_with_cancel(scene, camera, integrator, config, &AtomicBool::new(false))
}

/// Render the full image, skipping buckets not yet started once `cancel`
/// is set. Buckets in flight run to completion.
pub fn render_with_cancel(
    scene: &Scene,
    camera: &Camera,
    integrator: &dyn Integrator,
    config: &RenderConfig,
    cancel: &AtomicBool,
) -> RenderResult<ImageBuffer> {
    if config.samples_per_pixel == 0 {
        return Err(RenderError::ZeroSamples);
    }
    let (width, height) = camera.resolution();
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyImage { width, height });
    }

    let buckets = generate_buckets(width, height, config.bucket_size);
    log::info!(
        "Rendering {}x{} at {} spp, {} buckets",
        width,
        height,
        config.samples_per_pixel,
        buckets.len()
    );
    let start = Instant::now();

    let ctx = RenderContext {
        scene,
        camera,
        integrator,
        config,
    };
    let results: Vec<BucketResult> = buckets
        .par_iter()
        .filter_map(|bucket| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            Some(render_bucket(bucket, &ctx))
        })
        .collect();

    let mut image = ImageBuffer::new(width, height);
    for result in &results {
        image.write_bucket(result);
    }

    if results.len() < buckets.len() {
        log::warn!(
            "Render cancelled: {} of {} buckets finished",
            results.len(),
            buckets.len()
        );
    } else {
        log::info!("Render finished in {:.2?}", start.elapsed());
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::EnvironmentMap;
    use crate::bsdf::Diffuse;
    use crate::instance::Instance;
    use crate::integrator::{NormalsIntegrator, PathTracer, PathTracerConfig};
    use crate::sphere::Sphere;
    use lux_math::{Transform, Vec3};

    fn test_scene() -> Scene {
        let mut builder = Scene::builder();
        let sphere = builder.add_shape(Sphere::new(1.0));
        let grey = builder.add_bsdf(Diffuse::new(Color::splat(0.5)));
        builder.add_instance(
            Instance::new(sphere)
                .with_bsdf(grey)
                .with_transform(Transform::from_translation(Vec3::Z * 4.0)),
        );
        builder.background(EnvironmentMap::constant(Color::new(0.5, 0.7, 1.0)));
        builder.build().unwrap()
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
        assert_eq!(color_to_rgba(Color::new(4.0, -1.0, 0.25)), [255, 0, 127, 255]);
    }

    #[test]
    fn test_render_deterministic_across_bucket_sizes() {
        let scene = test_scene();
        let camera = Camera::new().with_resolution(24, 16);
        let integrator = PathTracer::new(PathTracerConfig::default()).unwrap();

        let small = RenderConfig {
            samples_per_pixel: 2,
            seed: 7,
            bucket_size: 5,
        };
        let large = RenderConfig {
            bucket_size: 64,
            ..small.clone()
        };

        let a = render(&scene, &camera, &integrator, &small).unwrap();
        let b = render(&scene, &camera, &integrator, &large).unwrap();
        assert_eq!(a.pixels, b.pixels);
    }

    #[test]
    fn test_render_center_pixel_hits_sphere() {
        let scene = test_scene();
        let camera = Camera::new().with_resolution(9, 9);
        let integrator = NormalsIntegrator::new(false);
        let config = RenderConfig {
            samples_per_pixel: 1,
            ..RenderConfig::default()
        };

        let image = render(&scene, &camera, &integrator, &config).unwrap();
        assert!(image.get(4, 4).z < -0.9);
        assert_eq!(image.get(0, 0), Color::ZERO);
    }

    #[test]
    fn test_invalid_configs() {
        let scene = test_scene();
        let integrator = NormalsIntegrator::new(true);
        let zero_spp = RenderConfig {
            samples_per_pixel: 0,
            ..RenderConfig::default()
        };
        assert!(matches!(
            render(&scene, &Camera::new(), &integrator, &zero_spp),
            Err(RenderError::ZeroSamples)
        ));

        let empty = Camera::new().with_resolution(0, 10);
        assert!(matches!(
            render(&scene, &empty, &integrator, &RenderConfig::default()),
            Err(RenderError::EmptyImage { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_cancelled_render_skips_buckets() {
        let scene = test_scene();
        let camera = Camera::new().with_resolution(8, 8);
        let integrator = NormalsIntegrator::new(true);
        let cancel = AtomicBool::new(true);

        let image =
            render_with_cancel(&scene, &camera, &integrator, &RenderConfig::default(), &cancel)
                .unwrap();
        assert!(image.pixels.iter().all(|&c| c == Color::ZERO));
    }

    #[test]
    fn test_render_config_json() {
        let config = RenderConfig::from_json(r#"{ "samples_per_pixel": 64 }"#).unwrap();
        assert_eq!(config.samples_per_pixel, 64);
        assert_eq!(config.bucket_size, DEFAULT_BUCKET_SIZE);
    }
}
