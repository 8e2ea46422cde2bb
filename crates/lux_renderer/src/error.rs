//! Errors raised while assembling scenes and starting renders.
//!
//! Nothing on the per-ray hot path returns these: misses and zero-measure
//! scattering events are ordinary values there.

use lux_core::{MeshError, TextureError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Path depth {0} is not supported (minimum is 2)")]
    InvalidDepth(u32),

    #[error("Instance {instance} references missing shape {shape}")]
    MissingShape { instance: usize, shape: usize },

    #[error("Instance {instance} references missing bsdf {bsdf}")]
    MissingBsdf { instance: usize, bsdf: usize },

    #[error("Area light references missing instance {0}")]
    MissingInstance(usize),

    #[error("Area light instance {0} has no emission")]
    NonEmissiveAreaLight(usize),

    #[error("Environment light requires a scene background")]
    MissingBackground,

    #[error("Samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("Image size {width}x{height} is empty")]
    EmptyImage { width: u32, height: u32 },

    #[error("Invalid integrator configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

pub type RenderResult<T> = Result<T, RenderError>;
