//! CPU software rasterizer
//!
//! Features:
//! - Six-plane frustum clipping (Sutherland–Hodgman)
//! - Perspective-correct texture mapping
//! - Solid, per-vertex and textured fill
//! - Scanline or edge-function fill with a top-left rule
//! - Depth buffer with nearest-wins testing
//! - Wireframe and vertex overlays

mod canvas;
mod frustum;
mod light;
mod math;
mod types;

pub use canvas::*;
pub use frustum::*;
pub use light::*;
pub use math::*;
pub use types::*;

/// Default framebuffer size
pub const WIDTH: usize = 640;
pub const HEIGHT: usize = 480;
