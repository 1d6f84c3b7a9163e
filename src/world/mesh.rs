//! Mesh geometry and model transform
//!
//! Geometry (positions, texture coordinates, faces) is fixed once a mesh is
//! built. Only the transform fields change from frame to frame.

use crate::rasterizer::{Mat4, Vec2, Vec3};

/// Index into `Scene::textures`
pub type TextureId = usize;

/// Triangle by index into the mesh's shared arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub vertices: [usize; 3],
    /// Present only when every corner names a texture coordinate
    pub uvs: Option<[usize; 3]>,
}

impl Face {
    pub fn new(vertices: [usize; 3]) -> Self {
        Self { vertices, uvs: None }
    }

    pub fn with_uvs(vertices: [usize; 3], uvs: [usize; 3]) -> Self {
        Self { vertices, uvs: Some(uvs) }
    }
}

/// Resolved face: positions in model space plus matching texture coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleFace {
    pub vertices: [Vec3; 3],
    pub uvs: [Vec2; 3],
}

#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    faces: Vec<Face>,

    /// Euler angles in radians, applied X then Y then Z
    pub rotation: Vec3,
    pub scale: Vec3,
    pub translation: Vec3,
    /// Radians per second added to `rotation`
    pub spin: Vec3,
    pub texture: Option<TextureId>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vec3>, uvs: Vec<Vec2>, faces: Vec<Face>) -> Self {
        Self {
            vertices,
            uvs,
            faces,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            translation: Vec3::ZERO,
            spin: Vec3::ZERO,
            texture: None,
        }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Look up face `index`. Panics when `index` or any stored index is out of
    /// range; meshes built by the loader never store such indices.
    pub fn face(&self, index: usize) -> TriangleFace {
        let face = &self.faces[index];
        let vertices = face.vertices.map(|i| self.vertices[i]);
        let uvs = match face.uvs {
            Some(uvs) => uvs.map(|i| self.uvs[i]),
            None => [Vec2::ZERO; 3],
        };
        TriangleFace { vertices, uvs }
    }

    /// `Translate * RotateZ * RotateY * RotateX * Scale`
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::translation(self.translation)
            * Mat4::rotation_z(self.rotation.z)
            * Mat4::rotation_y(self.rotation.y)
            * Mat4::rotation_x(self.rotation.x)
            * Mat4::scale(self.scale)
    }

    /// Advance rotation by `spin * dt`
    pub fn update(&mut self, dt: f32) {
        self.rotation = self.rotation + self.spin * dt;
    }

    /// Cube spanning -1..1 on each axis, two triangles per side.
    /// Faces wind clockwise when seen from outside.
    pub fn unit_cube() -> Self {
        let vertices = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
        ];
        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ];

        // Each side as a quad: bottom-left, top-left, top-right, bottom-right
        let sides: [[usize; 4]; 6] = [
            [0, 1, 2, 3], // front
            [3, 2, 4, 5], // right
            [5, 4, 6, 7], // back
            [7, 6, 1, 0], // left
            [1, 6, 4, 2], // top
            [5, 7, 0, 3], // bottom
        ];
        let faces = sides
            .iter()
            .flat_map(|&[a, b, c, d]| {
                [
                    Face::with_uvs([a, b, c], [0, 1, 2]),
                    Face::with_uvs([a, c, d], [0, 2, 3]),
                ]
            })
            .collect();

        Self::new(vertices, uvs, faces)
    }
}
