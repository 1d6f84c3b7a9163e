//! Scene loading
//!
//! Scenes are RON files listing objects and a light. Relative asset paths
//! are resolved against the scene file's directory.
//!
//! ```ron
//! (
//!     light: (x: 0.3, y: -0.5, z: 1.0),
//!     objects: [
//!         (mesh: Cube, texture: Some(Checkerboard(32)), translation: (x: 0.0, y: 0.0, z: 6.0)),
//!         (mesh: Obj("mesh/cube.obj"), spin: (x: 0.0, y: 1.0, z: 0.0)),
//!     ],
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::mesh::{Mesh, TextureId};
use super::obj::load_obj;
use crate::error::AssetError;
use crate::rasterizer::{Color, DirectionalLight, Texture, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeshSource {
    Obj(PathBuf),
    Cube,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextureSource {
    File(PathBuf),
    /// Square checkerboard with this edge length
    Checkerboard(usize),
}

fn one() -> Vec3 {
    Vec3::ONE
}

fn default_light() -> Vec3 {
    Vec3::new(0.3, -0.5, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub mesh: MeshSource,
    #[serde(default)]
    pub texture: Option<TextureSource>,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "one")]
    pub scale: Vec3,
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default)]
    pub spin: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// World-space direction the light travels in
    #[serde(default = "default_light")]
    pub light: Vec3,
    pub objects: Vec<ObjectDescription>,
}

/// Meshes, the textures they refer to, and the light
#[derive(Debug, Clone)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub textures: Vec<Texture>,
    pub light: DirectionalLight,
}

/// Load a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, AssetError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let scene = load_scene_from_str(&contents, base_dir)?;

    log::info!(
        "Loaded scene: {} ({} meshes, {} textures)",
        path.display(),
        scene.meshes.len(),
        scene.textures.len()
    );
    Ok(scene)
}

/// Load a scene from a RON string, resolving asset paths against `base_dir`
pub fn load_scene_from_str(s: &str, base_dir: &Path) -> Result<Scene, AssetError> {
    let description: SceneDescription = ron::from_str(s)?;
    Scene::from_description(&description, base_dir)
}

impl Scene {
    pub fn new(light: DirectionalLight) -> Self {
        Self {
            meshes: Vec::new(),
            textures: Vec::new(),
            light,
        }
    }

    pub fn from_description(description: &SceneDescription, base_dir: &Path) -> Result<Self, AssetError> {
        let mut scene = Scene::new(DirectionalLight::new(description.light));

        for object in &description.objects {
            let mut mesh = match &object.mesh {
                MeshSource::Obj(path) => load_obj(base_dir.join(path))?,
                MeshSource::Cube => Mesh::unit_cube(),
            };
            mesh.rotation = object.rotation;
            mesh.scale = object.scale;
            mesh.translation = object.translation;
            mesh.spin = object.spin;

            if let Some(source) = &object.texture {
                let texture = match source {
                    TextureSource::File(path) => Texture::from_file(base_dir.join(path))?,
                    TextureSource::Checkerboard(size) => checkerboard(*size),
                };
                mesh.texture = Some(scene.add_texture(texture));
            }

            scene.meshes.push(mesh);
        }

        Ok(scene)
    }

    /// Built-in scene: a textured cube and a plain one, both spinning
    pub fn demo() -> Self {
        let mut scene = Scene::new(DirectionalLight::new(default_light()));
        let texture = scene.add_texture(checkerboard(32));

        let mut textured = Mesh::unit_cube();
        textured.translation = Vec3::new(-1.6, 0.0, 7.0);
        textured.rotation = Vec3::new(0.6, 0.8, 0.0);
        textured.spin = Vec3::new(0.3, 0.7, 0.0);
        textured.texture = Some(texture);
        scene.meshes.push(textured);

        let mut plain = Mesh::unit_cube();
        plain.translation = Vec3::new(1.6, 0.0, 7.0);
        plain.rotation = Vec3::new(-0.4, 0.5, 0.2);
        plain.spin = Vec3::new(0.0, -0.5, 0.4);
        scene.meshes.push(plain);

        scene
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    /// Texture bound to `mesh`, if its handle is valid
    pub fn texture_for(&self, mesh: &Mesh) -> Option<&Texture> {
        mesh.texture.and_then(|id| self.textures.get(id))
    }

    /// Advance every mesh's spin by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        for mesh in &mut self.meshes {
            mesh.update(dt);
        }
    }
}

fn checkerboard(size: usize) -> Texture {
    Texture::checkerboard(size, size, Color::WHITE, Color::new(0x4C, 0x1D, 0x95))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_str_with_defaults() {
        let scene = load_scene_from_str(
            "(objects: [(mesh: Cube), (mesh: Cube, texture: Some(Checkerboard(8)), translation: (x: 1.0, y: 2.0, z: 3.0))])",
            Path::new("."),
        )
        .unwrap();

        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.textures.len(), 1);
        assert_eq!(scene.meshes[0].scale, Vec3::ONE);
        assert_eq!(scene.meshes[0].texture, None);
        assert_eq!(scene.meshes[1].texture, Some(0));
        assert_eq!(scene.meshes[1].translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.texture_for(&scene.meshes[1]).map(|t| t.width), Some(8));
        assert!((scene.light.direction.len() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_parse_error_is_scene_error() {
        let err = load_scene_from_str("(objects: [(mesh: Sphere)])", Path::new(".")).unwrap_err();
        assert!(matches!(err, AssetError::Scene(_)));
    }

    #[test]
    fn test_missing_obj_is_io_error() {
        let err = load_scene_from_str("(objects: [(mesh: Obj(\"nope.obj\"))])", Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_dangling_texture_handle_is_none() {
        let mut scene = Scene::demo();
        scene.meshes[0].texture = Some(99);
        assert!(scene.texture_for(&scene.meshes[0]).is_none());
    }

    #[test]
    fn test_update_spins_meshes() {
        let mut scene = Scene::demo();
        let before = scene.meshes[0].rotation;
        scene.update(1.0);
        assert_ne!(scene.meshes[0].rotation, before);
    }

    #[test]
    fn test_bundled_scene_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/scene.ron");
        let scene = load_scene(path).unwrap();
        assert!(!scene.meshes.is_empty());
    }

    #[test]
    fn test_description_round_trips_through_ron() {
        let description = SceneDescription {
            light: Vec3::new(0.0, -1.0, 0.0),
            objects: vec![ObjectDescription {
                mesh: MeshSource::Obj(PathBuf::from("mesh/cube.obj")),
                texture: Some(TextureSource::File(PathBuf::from("cube.png"))),
                rotation: Vec3::ZERO,
                scale: Vec3::ONE,
                translation: Vec3::new(0.0, 0.0, 5.0),
                spin: Vec3::UP,
            }],
        };
        let text = ron::to_string(&description).unwrap();
        let parsed: SceneDescription = ron::from_str(&text).unwrap();
        assert_eq!(parsed, description);
    }
}
