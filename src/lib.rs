//! softras: a CPU-only 3D rasterizer
//!
//! Meshes go through model, view and projection transforms, get clipped
//! against the view frustum and are filled into a depth-buffered color
//! buffer. No GPU pipeline is involved; the viewer binary only copies the
//! finished color buffer to the screen.

pub mod app;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod rasterizer;
pub mod world;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
