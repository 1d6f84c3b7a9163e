//! View frustum: camera placement, projection and polygon clipping
//!
//! View space is left-handed with the camera at the origin looking down +Z.
//! The six planes are built once from the field of view and near/far
//! distances. Each stores a point and an inward-facing unit normal, so a
//! positive signed distance means "inside".
//!
//! ```text
//!   Near   : P=(0, 0, near), N=(0, 0,  1)
//!   Far    : P=(0, 0, far),  N=(0, 0, -1)
//!   Top    : P=origin,       N=(0, -cos(fovV/2), sin(fovV/2))
//!   Bottom : P=origin,       N=(0,  cos(fovV/2), sin(fovV/2))
//!   Left   : P=origin,       N=( cos(fovH/2), 0, sin(fovH/2))
//!   Right  : P=origin,       N=(-cos(fovH/2), 0, sin(fovH/2))
//! ```

use super::math::{Mat4, Vec2, Vec3};

/// Maximum vertices a clipped polygon can hold. Each plane adds at most one
/// vertex to a convex polygon, so a triangle tops out at 3 + 6 = 9.
pub const MAX_POLYGON_VERTICES: usize = 10;

const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumPlane {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
    Near = 4,
    Far = 5,
}

impl FrustumPlane {
    /// Clip order
    pub const ALL: [FrustumPlane; 6] = [
        FrustumPlane::Left,
        FrustumPlane::Right,
        FrustumPlane::Top,
        FrustumPlane::Bottom,
        FrustumPlane::Near,
        FrustumPlane::Far,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }
}

/// Bounded convex polygon used only while clipping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    vertices: [Vec3; MAX_POLYGON_VERTICES],
    uvs: [Vec2; MAX_POLYGON_VERTICES],
    len: usize,
}

impl Polygon {
    pub fn empty() -> Self {
        Self {
            vertices: [Vec3::ZERO; MAX_POLYGON_VERTICES],
            uvs: [Vec2::ZERO; MAX_POLYGON_VERTICES],
            len: 0,
        }
    }

    pub fn from_triangle(vertices: [Vec3; 3], uvs: [Vec2; 3]) -> Self {
        let mut polygon = Self::empty();
        for (v, uv) in vertices.into_iter().zip(uvs) {
            polygon.push(v, uv);
        }
        polygon
    }

    /// Append a vertex. Overflowing the fixed capacity is a programming
    /// error: clipping a triangle can never produce more than nine vertices.
    pub fn push(&mut self, vertex: Vec3, uv: Vec2) {
        assert!(
            self.len < MAX_POLYGON_VERTICES,
            "polygon exceeded {} vertices",
            MAX_POLYGON_VERTICES
        );
        self.vertices[self.len] = vertex;
        self.uvs[self.len] = uv;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices[..self.len]
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs[..self.len]
    }

    /// Number of fan triangles (`len - 2`, or zero below three vertices)
    pub fn triangle_count(&self) -> usize {
        self.len.saturating_sub(2)
    }

    /// Fan triangulation around vertex 0
    pub fn triangles(&self) -> impl Iterator<Item = ([Vec3; 3], [Vec2; 3])> + '_ {
        (1..self.len.saturating_sub(1)).map(move |i| {
            (
                [self.vertices[0], self.vertices[i], self.vertices[i + 1]],
                [self.uvs[0], self.uvs[i], self.uvs[i + 1]],
            )
        })
    }
}

/// Camera frustum
#[derive(Debug, Clone)]
pub struct Frustum {
    /// height / width
    pub aspect_vertical: f32,
    /// width / height
    pub aspect_horizontal: f32,
    pub fov_vertical: f32,
    pub fov_horizontal: f32,
    pub near: f32,
    pub far: f32,

    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Forward direction, derived from yaw/pitch
    pub direction: Vec3,

    planes: [Plane; 6],
}

impl Frustum {
    pub fn new(width: f32, height: f32, fov_vertical: f32, near: f32, far: f32) -> Self {
        let aspect_horizontal = width / height;
        let fov_horizontal = 2.0 * ((fov_vertical / 2.0).tan() * aspect_horizontal).atan();

        Self {
            aspect_vertical: height / width,
            aspect_horizontal,
            fov_vertical,
            fov_horizontal,
            near,
            far,
            eye: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            direction: Vec3::FORWARD,
            planes: Self::create_planes(fov_vertical, fov_horizontal, near, far),
        }
    }

    fn create_planes(fov_vertical: f32, fov_horizontal: f32, near: f32, far: f32) -> [Plane; 6] {
        let (sin_v, cos_v) = (fov_vertical / 2.0).sin_cos();
        let (sin_h, cos_h) = (fov_horizontal / 2.0).sin_cos();
        let origin = Vec3::ZERO;

        let mut planes = [Plane { point: origin, normal: Vec3::FORWARD }; 6];
        planes[FrustumPlane::Left as usize].normal = Vec3::new(cos_h, 0.0, sin_h);
        planes[FrustumPlane::Right as usize].normal = Vec3::new(-cos_h, 0.0, sin_h);
        planes[FrustumPlane::Top as usize].normal = Vec3::new(0.0, -cos_v, sin_v);
        planes[FrustumPlane::Bottom as usize].normal = Vec3::new(0.0, cos_v, sin_v);
        planes[FrustumPlane::Near as usize] = Plane {
            point: Vec3::new(0.0, 0.0, near),
            normal: Vec3::new(0.0, 0.0, 1.0),
        };
        planes[FrustumPlane::Far as usize] = Plane {
            point: Vec3::new(0.0, 0.0, far),
            normal: Vec3::new(0.0, 0.0, -1.0),
        };
        planes
    }

    pub fn plane(&self, which: FrustumPlane) -> Plane {
        self.planes[which as usize]
    }

    /// Recompute the forward vector from yaw and pitch
    pub fn update_direction(&mut self) {
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        let rotation = Mat4::rotation_y(self.yaw) * Mat4::rotation_x(self.pitch);
        self.direction = rotation.transform_direction(Vec3::FORWARD).normalize();
    }

    /// Move the eye along the forward direction
    pub fn move_forward(&mut self, distance: f32) {
        self.eye = self.eye + self.direction * distance;
    }

    /// Move the eye sideways (positive = right)
    pub fn strafe(&mut self, distance: f32) {
        let right = Vec3::UP.cross(self.direction).normalize();
        self.eye = self.eye + right * distance;
    }

    /// Move the eye along world up
    pub fn rise(&mut self, distance: f32) {
        self.eye.y += distance;
    }

    /// Point one unit ahead of the eye
    pub fn target(&self) -> Vec3 {
        self.eye + self.direction
    }

    /// World-to-view matrix looking from `eye` at `target`.
    /// `target - eye` must not be parallel to `up`.
    pub fn view(&self, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - self.eye).normalize();
        let right = up.cross(forward).normalize();
        let upward = forward.cross(right);

        Mat4::from_rows([
            [right.x, right.y, right.z, -right.dot(self.eye)],
            [upward.x, upward.y, upward.z, -upward.dot(self.eye)],
            [forward.x, forward.y, forward.z, -forward.dot(self.eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// View-to-clip matrix. `w` receives view-space depth so the divide can
    /// happen later; `y` is negated so +Y points down the screen.
    pub fn perspective_projection(&self) -> Mat4 {
        let f = 1.0 / (self.fov_vertical / 2.0).tan();
        let depth_scale = self.far / (self.far - self.near);

        Mat4::from_rows([
            [self.aspect_vertical * f, 0.0, 0.0, 0.0],
            [0.0, -f, 0.0, 0.0],
            [0.0, 0.0, depth_scale, -self.near * depth_scale],
            [0.0, 0.0, 1.0, 0.0],
        ])
    }

    /// Sutherland–Hodgman against all six planes, in `FrustumPlane::ALL` order.
    /// A polygon that falls below three vertices yields no triangles.
    pub fn clip_polygon(&self, mut polygon: Polygon) -> Polygon {
        for plane in FrustumPlane::ALL {
            if polygon.len() < 3 {
                return Polygon::empty();
            }
            polygon = clip_against_plane(&polygon, &self.planes[plane as usize]);
        }
        if polygon.len() < 3 {
            return Polygon::empty();
        }
        polygon
    }
}

fn clip_against_plane(polygon: &Polygon, plane: &Plane) -> Polygon {
    let mut inside = Polygon::empty();
    let vertices = polygon.vertices();
    let uvs = polygon.uvs();

    let mut previous = vertices.len() - 1;
    let mut previous_distance = plane.signed_distance(vertices[previous]);

    for current in 0..vertices.len() {
        let current_distance = plane.signed_distance(vertices[current]);

        // Edge crosses the plane: keep the intersection I = Qp + t (Qc - Qp)
        if current_distance * previous_distance < 0.0 {
            let t = previous_distance / (previous_distance - current_distance);
            inside.push(
                vertices[previous].lerp(vertices[current], t),
                uvs[previous].lerp(uvs[current], t),
            );
        }

        if current_distance > 0.0 {
            inside.push(vertices[current], uvs[current]);
        }

        previous = current;
        previous_distance = current_distance;
    }

    inside
}
