//! Core types for the rasterizer

use serde::{Deserialize, Serialize};

use super::math::Vec3;
use crate::error::AssetError;

/// Packed `0xAARRGGBB` color as stored in the color buffer
pub type Argb = u32;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i) as u8,
            g: (self.g as f32 * i) as u8,
            b: (self.b as f32 * i) as u8,
            a: self.a,
        }
    }

    /// Pack into the color buffer format
    pub const fn to_argb(self) -> Argb {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    pub const fn from_argb(c: Argb) -> Self {
        Self {
            a: (c >> 24) as u8,
            r: (c >> 16) as u8,
            g: (c >> 8) as u8,
            b: c as u8,
        }
    }
}

/// Stable, opaque synthetic color for a face index (golden ratio hash)
pub fn random_color(seed: usize) -> Argb {
    let hashed = (seed as u32).wrapping_mul(2_654_435_761);
    0xFF00_0000 | (hashed & 0x00FF_FFFF)
}

/// Blend three colors with barycentric weights, one byte lane at a time.
/// Alpha comes out opaque.
pub fn interpolate_color(weights: Vec3, colors: [Argb; 3]) -> Argb {
    let [c0, c1, c2] = colors.map(Color::from_argb);
    let lane = |a: u8, b: u8, c: u8| {
        (weights.x * a as f32 + weights.y * b as f32 + weights.z * c as f32).clamp(0.0, 255.0) as u8
    };
    Color::new(lane(c0.r, c1.r, c2.r), lane(c0.g, c1.g, c2.g), lane(c0.b, c1.b, c2.b)).to_argb()
}

/// Read-only texel array sampled by the textured fill
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Argb>,
}

impl Texture {
    /// Solid white texture
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE.to_argb(); width * height],
        }
    }

    /// Load texture from a PNG/JPEG/BMP file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, AssetError> {
        use image::GenericImageView;

        let path = path.as_ref();
        let img = image::open(path).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let (width, height) = img.dimensions();
        let pixels: Vec<Argb> = img
            .to_rgba8()
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]).to_argb())
            .collect();

        log::info!("Loaded texture: {} ({}x{})", path.display(), width, height);

        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels,
        })
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 }.to_argb());
            }
        }
        Self { width, height, pixels }
    }

    /// Sample at UV coordinates, nearest texel.
    ///
    /// The modulo keeps samples that barycentric round-off pushed marginally
    /// outside [0, 1] inside the texel array.
    pub fn sample(&self, u: f32, v: f32) -> Argb {
        if self.pixels.is_empty() {
            return Color::BLACK.to_argb();
        }
        let tx = ((u * (self.width - 1) as f32).abs().floor() as usize) % self.width;
        let ty = ((v * (self.height - 1) as f32).abs().floor() as usize) % self.height;
        self.pixels[ty * self.width + tx]
    }
}

/// What the canvas draws for each triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

impl PolygonMode {
    const fn bit(self) -> u8 {
        match self {
            PolygonMode::Fill => 0b001,
            PolygonMode::Line => 0b010,
            PolygonMode::Point => 0b100,
        }
    }
}

/// Set of enabled polygon modes (bitmask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PolygonMode>", into = "Vec<PolygonMode>")]
pub struct DrawModes(u8);

impl DrawModes {
    pub const NONE: DrawModes = DrawModes(0);

    pub fn of(modes: &[PolygonMode]) -> Self {
        modes.iter().fold(Self::NONE, |acc, &m| DrawModes(acc.0 | m.bit()))
    }

    pub fn contains(self, mode: PolygonMode) -> bool {
        self.0 & mode.bit() != 0
    }

    pub fn insert(&mut self, mode: PolygonMode) {
        self.0 |= mode.bit();
    }

    pub fn remove(&mut self, mode: PolygonMode) {
        self.0 &= !mode.bit();
    }
}

impl Default for DrawModes {
    fn default() -> Self {
        Self::of(&[PolygonMode::Fill])
    }
}

impl From<Vec<PolygonMode>> for DrawModes {
    fn from(modes: Vec<PolygonMode>) -> Self {
        Self::of(&modes)
    }
}

impl From<DrawModes> for Vec<PolygonMode> {
    fn from(modes: DrawModes) -> Self {
        [PolygonMode::Fill, PolygonMode::Line, PolygonMode::Point]
            .into_iter()
            .filter(|&m| modes.contains(m))
            .collect()
    }
}

/// How filled pixels get their color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// One color for the whole triangle
    #[default]
    Solid,
    /// Per-vertex colors blended across the face
    VertexColor,
    /// Perspective-correct texture lookup
    Texture,
}

/// Which covered-pixel walker the canvas uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RasterRule {
    /// Sorted vertices, flat-top/flat-bottom halves, stepped span ends
    Scanline,
    /// Bounding box with three edge functions and the top-left rule
    #[default]
    EdgeFunction,
}

/// Rasterizer settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RasterSettings {
    pub modes: DrawModes,
    pub fill_mode: FillMode,
    pub rule: RasterRule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_round_trip_keeps_lanes() {
        let c = Color::with_alpha(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.to_argb(), 0x7812_3456);
        assert_eq!(Color::from_argb(0x7812_3456), c);
    }

    #[test]
    fn test_interpolate_color_at_corners() {
        let colors = [0xFFFF_0000, 0xFF00_FF00, 0xFF00_00FF];
        assert_eq!(interpolate_color(Vec3::new(1.0, 0.0, 0.0), colors), 0xFFFF_0000);
        assert_eq!(interpolate_color(Vec3::new(0.0, 0.0, 1.0), colors), 0xFF00_00FF);
        let mid = Color::from_argb(interpolate_color(Vec3::new(0.5, 0.5, 0.0), colors));
        assert_eq!((mid.r, mid.g, mid.b, mid.a), (127, 127, 0, 255));
    }

    #[test]
    fn test_random_color_is_opaque_and_stable() {
        assert_eq!(random_color(7) >> 24, 0xFF);
        assert_eq!(random_color(7), random_color(7));
        assert_ne!(random_color(7), random_color(8));
    }

    #[test]
    fn test_sample_corners_and_wrap() {
        let mut tex = Texture::new(4, 4);
        tex.pixels[0] = 0xFF00_0001;
        tex.pixels[15] = 0xFF00_0002;
        assert_eq!(tex.sample(0.0, 0.0), 0xFF00_0001);
        assert_eq!(tex.sample(1.0, 1.0), 0xFF00_0002);
        // Marginal overshoot must not index out of bounds
        let _ = tex.sample(1.4, -1.4);
    }

    #[test]
    fn test_draw_modes_bits_are_independent() {
        let mut modes = DrawModes::of(&[PolygonMode::Fill, PolygonMode::Point]);
        assert!(modes.contains(PolygonMode::Fill));
        assert!(!modes.contains(PolygonMode::Line));
        modes.remove(PolygonMode::Fill);
        modes.insert(PolygonMode::Line);
        assert_eq!(Vec::<PolygonMode>::from(modes), vec![PolygonMode::Line, PolygonMode::Point]);
    }
}
