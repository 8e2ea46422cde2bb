//! Lux Core - scene assets shared by the renderer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Mesh` with a shared vertex buffer and validated triangle indices
//! - **Textures**: constant, checkerboard and image textures with file loading
//!
//! # Example
//!
//! ```ignore
//! use lux_core::{load_image_texture, Mesh, Texture};
//!
//! let floor = Mesh::quad(10.0)?;
//! let albedo = Texture::Image(load_image_texture("wood.png")?.into());
//! ```

pub mod mesh;
pub mod texture;

// Re-export commonly used types
pub use mesh::{Mesh, MeshError, MeshResult, Vertex};
pub use texture::{
    load_image_texture, BorderMode, FilterMode, ImageTexture, Texture, TextureError,
    TextureResult,
};
