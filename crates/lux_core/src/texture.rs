//! Textures evaluated at surface UV coordinates.
//!
//! Image pixels are stored as linear float RGBA. 8-bit sources are assumed to
//! be sRGB encoded and are linearised at load time; float sources (HDR) are
//! used as-is.

use std::path::Path;
use std::sync::Arc;

use lux_math::{Color, Vec2};
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Texture '{0}' has zero width or height")]
    EmptyImage(String),

    #[error("Pixel buffer has {len} entries, expected {expected}")]
    PixelCount { len: usize, expected: usize },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// How lookups outside [0, 1] are resolved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BorderMode {
    Clamp,
    #[default]
    Repeat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    #[default]
    Bilinear,
}

/// A loaded image with pixel data.
///
/// `v = 0` addresses the top row of the image.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    /// Row-major linear RGBA
    pixels: Vec<[f32; 4]>,
    pub border: BorderMode,
    pub filter: FilterMode,
    pub exposure: f32,
}

impl ImageTexture {
    /// Create an image texture from linear RGBA pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> TextureResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextureError::EmptyImage("<memory>".to_string()));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::PixelCount {
                len: pixels.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            border: BorderMode::default(),
            filter: FilterMode::default(),
            exposure: 1.0,
        })
    }

    pub fn with_border(mut self, border: BorderMode) -> Self {
        self.border = border;
        self
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Look up the filtered RGBA value at `uv`, exposure applied to RGB.
    pub fn sample(&self, uv: Vec2) -> [f32; 4] {
        let res = Vec2::new(self.width as f32, self.height as f32);
        let mut texel = match self.filter {
            FilterMode::Nearest => {
                let p = (uv * res).floor();
                self.texel(p.x as i64, p.y as i64)
            }
            FilterMode::Bilinear => {
                // Pixel centres sit at half-integer coordinates
                let p = uv * res - Vec2::splat(0.5);
                let base = p.floor();
                let f = p - base;
                let (x, y) = (base.x as i64, base.y as i64);

                let c00 = self.texel(x, y);
                let c10 = self.texel(x + 1, y);
                let c01 = self.texel(x, y + 1);
                let c11 = self.texel(x + 1, y + 1);

                let mut out = [0.0; 4];
                for (i, o) in out.iter_mut().enumerate() {
                    let top = c00[i] * (1.0 - f.x) + c10[i] * f.x;
                    let bottom = c01[i] * (1.0 - f.x) + c11[i] * f.x;
                    *o = top * (1.0 - f.y) + bottom * f.y;
                }
                out
            }
        };

        for c in &mut texel[..3] {
            *c *= self.exposure;
        }
        texel
    }

    /// Fetch a texel, resolving out-of-range coordinates with the border mode.
    fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = match self.border {
            BorderMode::Clamp => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
            BorderMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
        };
        self.pixels[(y * w + x) as usize]
    }

    /// Approximate memory footprint.
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}

/// A texture that can be evaluated at any UV coordinate.
#[derive(Clone, Debug)]
pub enum Texture {
    Constant(Color),
    /// Alternating tiles; `scale` is the tile count along u and v.
    Checkerboard {
        color0: Color,
        color1: Color,
        scale: Vec2,
    },
    Image(Arc<ImageTexture>),
}

impl Texture {
    pub fn constant(value: f32) -> Self {
        Texture::Constant(Color::splat(value))
    }

    /// Evaluate the RGB value at `uv`.
    pub fn evaluate(&self, uv: Vec2) -> Color {
        match self {
            Texture::Constant(color) => *color,
            Texture::Checkerboard {
                color0,
                color1,
                scale,
            } => {
                let tile = (uv * *scale).floor();
                if (tile.x + tile.y).rem_euclid(2.0) == 0.0 {
                    *color0
                } else {
                    *color1
                }
            }
            Texture::Image(image) => {
                let [r, g, b, _] = image.sample(uv);
                Color::new(r, g, b)
            }
        }
    }

    /// Evaluate a single scalar (the first channel) at `uv`.
    ///
    /// Used for alpha masks and other grayscale parameters.
    pub fn scalar(&self, uv: Vec2) -> f32 {
        self.evaluate(uv).x
    }
}

impl From<Color> for Texture {
    fn from(color: Color) -> Self {
        Texture::Constant(color)
    }
}

impl From<f32> for Texture {
    fn from(value: f32) -> Self {
        Texture::constant(value)
    }
}

impl From<ImageTexture> for Texture {
    fn from(image: ImageTexture) -> Self {
        Texture::Image(Arc::new(image))
    }
}

/// Load an image file into a linear float texture.
pub fn load_image_texture(path: impl AsRef<Path>) -> TextureResult<ImageTexture> {
    let path = path.as_ref();
    let img = image::open(path)?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(TextureError::EmptyImage(path.display().to_string()));
    }

    let pixels: Vec<[f32; 4]> = match &img {
        image::DynamicImage::ImageRgb32F(_) | image::DynamicImage::ImageRgba32F(_) => {
            img.to_rgba32f().pixels().map(|p| p.0).collect()
        }
        _ => img
            .to_rgba8()
            .pixels()
            .map(|p| {
                [
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f32 / 255.0, // Alpha is linear
                ]
            })
            .collect(),
    };

    let texture = ImageTexture::new(width, height, pixels)?;
    log::debug!(
        "Loaded texture: {} ({}x{}, {:.1} KB)",
        path.display(),
        width,
        height,
        texture.size_bytes() as f32 / 1024.0
    );
    Ok(texture)
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_one() -> ImageTexture {
        ImageTexture::new(2, 1, vec![[0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_constant() {
        let tex = Texture::Constant(Color::new(1.0, 0.5, 0.0));
        let sample = tex.evaluate(Vec2::new(0.3, 0.9));
        assert!((sample - Color::new(1.0, 0.5, 0.0)).length() < 1e-6);
        assert_eq!(tex.scalar(Vec2::ZERO), 1.0);

        let gray = Texture::from(0.25);
        assert_eq!(gray.evaluate(Vec2::ZERO), Color::splat(0.25));
    }

    #[test]
    fn test_checkerboard() {
        let tex = Texture::Checkerboard {
            color0: Color::ZERO,
            color1: Color::ONE,
            scale: Vec2::splat(2.0),
        };
        assert_eq!(tex.evaluate(Vec2::new(0.1, 0.1)), Color::ZERO);
        assert_eq!(tex.evaluate(Vec2::new(0.6, 0.1)), Color::ONE);
        assert_eq!(tex.evaluate(Vec2::new(0.6, 0.6)), Color::ZERO);
        // Negative coordinates keep alternating
        assert_eq!(tex.evaluate(Vec2::new(-0.1, 0.1)), Color::ONE);
    }

    #[test]
    fn test_nearest_and_border() {
        let tex = two_by_one().with_filter(FilterMode::Nearest);
        assert_eq!(tex.sample(Vec2::new(0.25, 0.5))[0], 0.0);
        assert_eq!(tex.sample(Vec2::new(0.75, 0.5))[0], 1.0);
        // Repeat wraps 1.25 back onto the first texel
        assert_eq!(tex.sample(Vec2::new(1.25, 0.5))[0], 0.0);

        let clamped = tex.with_border(BorderMode::Clamp);
        assert_eq!(clamped.sample(Vec2::new(1.25, 0.5))[0], 1.0);
    }

    #[test]
    fn test_bilinear_midpoint() {
        let tex = two_by_one().with_border(BorderMode::Clamp);
        // Exactly between both texel centres
        let mid = tex.sample(Vec2::new(0.5, 0.5));
        assert!((mid[0] - 0.5).abs() < 1e-6);
        // At a texel centre the value is exact
        assert!((tex.sample(Vec2::new(0.75, 0.5))[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_exposure_scales_rgb_only() {
        let tex = two_by_one()
            .with_filter(FilterMode::Nearest)
            .with_exposure(2.0);
        let texel = tex.sample(Vec2::new(0.75, 0.5));
        assert_eq!(texel, [2.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_rejects_bad_buffers() {
        assert!(matches!(
            ImageTexture::new(0, 4, Vec::new()),
            Err(TextureError::EmptyImage(_))
        ));
        assert!(matches!(
            ImageTexture::new(2, 2, vec![[0.0; 4]; 3]),
            Err(TextureError::PixelCount {
                len: 3,
                expected: 4
            })
        ));
    }

    #[test]
    fn test_srgb_to_linear() {
        // Black stays black
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);

        // White stays white
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");

        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 0, 128]));
        img.put_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        img.save(&path).unwrap();

        let tex = load_image_texture(&path)
            .unwrap()
            .with_filter(FilterMode::Nearest);
        assert_eq!((tex.width(), tex.height()), (2, 2));

        let top_left = tex.sample(Vec2::new(0.25, 0.25));
        assert!((top_left[0] - 1.0).abs() < 1e-4);
        let bottom_left = tex.sample(Vec2::new(0.25, 0.75));
        assert!((bottom_left[3] - 128.0 / 255.0).abs() < 1e-4);
        let bottom_right = Texture::from(tex).evaluate(Vec2::new(0.75, 0.75));
        assert!((bottom_right - Color::new(1.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_image_texture(dir.path().join("missing.png")).is_err());
    }
}
