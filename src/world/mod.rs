//! World module - meshes, OBJ loading and scene files
//!
//! Scene data is authored as RON and OBJ and loaded once at startup.
//! Only mesh transforms change afterwards.

mod mesh;
mod obj;
mod scene;

pub use mesh::*;
pub use obj::*;
pub use scene::*;
