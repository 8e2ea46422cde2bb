//! Renders a small studio scene to `simple_render.png`.
//!
//! Usage: cargo run --release --example simple_render [integrator.json]

use std::sync::Arc;

use anyhow::Context;
use lux_renderer::{
    render, Camera, Color, Dielectric, Diffuse, Emission, EnvironmentMap, FeatureLineStyle,
    Instance, IntegratorConfig, Light, Mesh, Principled, Quat, RenderConfig, RoughConductor,
    Scene, Sphere, Transform, TriangleMesh, Vec3,
};

fn build_scene() -> anyhow::Result<Scene> {
    let mut builder = Scene::builder();

    let sphere = builder.add_shape(Sphere::new(1.0));
    let floor = builder.add_shape(TriangleMesh::new(Arc::new(Mesh::quad(20.0)?), false));
    let cube = builder.add_shape(TriangleMesh::new(Arc::new(Mesh::cube(1.0)?), false));

    let white = builder.add_bsdf(Diffuse::new(Color::splat(0.7)));
    let gold = builder.add_bsdf(RoughConductor::new(Color::new(1.0, 0.78, 0.34), 0.25));
    let glass = builder.add_bsdf(Dielectric::glass(1.5));
    let plastic = builder.add_bsdf(Principled::new(Color::new(0.1, 0.3, 0.8), 0.4, 0.0, 0.5));

    builder.add_instance(Instance::new(floor).with_bsdf(white));
    builder.add_instance(
        Instance::new(sphere)
            .with_bsdf(gold)
            .with_transform(Transform::from_translation(Vec3::new(-2.2, 1.0, 0.0)))
            .with_feature_line(FeatureLineStyle::default()),
    );
    builder.add_instance(
        Instance::new(sphere)
            .with_bsdf(glass)
            .with_transform(Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
    );
    let tilted = Transform::from_scale_rotation_translation(
        Vec3::splat(1.4),
        Quat::from_rotation_y(0.6),
        Vec3::new(2.2, 0.7, 0.0),
    )
    .context("cube transform is singular")?;
    builder.add_instance(
        Instance::new(cube)
            .with_bsdf(plastic)
            .with_transform(tilted)
            .with_feature_line(FeatureLineStyle::default()),
    );

    let lamp = Transform::from_scale_rotation_translation(
        Vec3::splat(0.5),
        Quat::IDENTITY,
        Vec3::new(0.0, 5.0, -2.0),
    )
    .context("lamp transform is singular")?;
    builder.add_area_light(
        Instance::new(sphere)
            .with_transform(lamp)
            .with_emission(Emission::lambertian(Color::splat(40.0))),
    );
    builder.add_light(Light::Directional {
        direction: Vec3::new(-0.4, 1.0, -0.3),
        intensity: Color::splat(1.5),
    });
    builder
        .background(EnvironmentMap::constant(Color::new(0.25, 0.3, 0.4)))
        .add_light(Light::Environment);

    Ok(builder.build()?)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let integrator_config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading integrator config {path}"))?;
            IntegratorConfig::from_json(&json)?
        }
        None => IntegratorConfig::default(),
    };
    log::info!("Integrator: {:?}", integrator_config);
    let integrator = integrator_config.build()?;

    let scene = build_scene()?;
    let camera = Camera::new()
        .with_resolution(480, 270)
        .with_look_at(Vec3::new(0.0, 2.5, -8.0), Vec3::new(0.0, 0.8, 0.0), Vec3::Y);
    let config = RenderConfig {
        samples_per_pixel: 64,
        ..RenderConfig::default()
    };

    let image = render(&scene, &camera, integrator.as_ref(), &config)?;

    let output = "simple_render.png";
    image::save_buffer(
        output,
        &image.to_rgba(),
        image.width,
        image.height,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("writing {output}"))?;
    log::info!("Saved {}", output);

    Ok(())
}
