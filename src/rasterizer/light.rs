//! Directional light: one attenuation factor per face

use serde::{Deserialize, Serialize};

use super::math::Vec3;
use super::types::Argb;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels in (not towards the light)
    pub direction: Vec3,
}

impl DirectionalLight {
    pub fn new(direction: Vec3) -> Self {
        Self { direction: direction.normalize() }
    }

    /// Scale the RGB lanes of `color` by how directly `normal` faces the light.
    /// Alpha is preserved. `normal` must be unit length.
    pub fn modulate_surface_color(&self, color: Argb, normal: Vec3) -> Argb {
        let attenuation = (-self.direction).dot(normal).clamp(0.0, 1.0);

        let a = color & 0xFF00_0000;
        let r = ((color & 0x00FF_0000) as f32 * attenuation) as u32;
        let g = ((color & 0x0000_FF00) as f32 * attenuation) as u32;
        let b = ((color & 0x0000_00FF) as f32 * attenuation) as u32;

        a | (r & 0x00FF_0000) | (g & 0x0000_FF00) | (b & 0x0000_00FF)
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -1.0, 0.0))
    }
}
