//! Per-frame triangle assembly
//!
//! For every mesh face: model and view transform, backface test, frustum
//! clip, then projection to screen space. The resulting triangles borrow
//! their textures from the scene and are handed to the canvas.

use std::cmp::Ordering;

use crate::rasterizer::{
    random_color, Canvas, Color, Frustum, Mat4, Polygon, ScreenTriangle, Vec3, Vec4,
};
use crate::world::Scene;

/// Per-vertex colors for the vertex-color fill
const VERTEX_PALETTE: [Color; 3] = [Color::RED, Color::GREEN, Color::BLUE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub backface_culling: bool,
    /// Submit back to front. The depth test still runs.
    pub depth_sort: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            backface_culling: true,
            depth_sort: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Faces looked at
    pub faces: usize,
    /// Faces rejected by the backface test
    pub culled: usize,
    /// Faces that clipping removed entirely
    pub clipped: usize,
    /// Screen triangles handed to the canvas
    pub triangles: usize,
}

impl FrameStats {
    /// Faces that survived the backface test, before clipping
    pub fn front_facing(&self) -> usize {
        self.faces - self.culled
    }
}

/// Screen triangles for one frame, in submission order
pub struct Frame<'a> {
    pub triangles: Vec<ScreenTriangle<'a>>,
    pub stats: FrameStats,
}

/// Clip space to pixels: `x` and `y` scaled by half the canvas and offset by
/// `w` times half the canvas, so the later divide lands them on screen.
pub fn viewport(width: usize, height: usize) -> Mat4 {
    let (hw, hh) = (width as f32 / 2.0, height as f32 / 2.0);
    Mat4::from_rows([
        [hw, 0.0, 0.0, hw],
        [0.0, hh, 0.0, hh],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// View space to screen space. `w == 0` passes through undivided.
pub fn to_screen(screen_projection: &Mat4, view_point: Vec3) -> Vec4 {
    let mut p = *screen_projection * Vec4::point(view_point);
    if p.w == 0.0 {
        return p;
    }
    p.x /= p.w;
    p.y /= p.w;
    p.z /= p.w;
    p
}

/// Build this frame's screen triangles
pub fn assemble<'a>(
    scene: &'a Scene,
    frustum: &Frustum,
    width: usize,
    height: usize,
    options: PipelineOptions,
) -> Frame<'a> {
    let view = frustum.view(frustum.target(), Vec3::UP);
    let screen_projection = viewport(width, height) * frustum.perspective_projection();

    // Light is authored in world space
    let mut light = scene.light;
    light.direction = view.transform_direction(light.direction).normalize();

    let mut stats = FrameStats::default();
    let mut assembled: Vec<(f32, ScreenTriangle<'a>)> = Vec::new();

    for mesh in &scene.meshes {
        let model_view = view * mesh.model_matrix();
        let texture = scene.texture_for(mesh);

        for index in 0..mesh.face_count() {
            stats.faces += 1;
            let face = mesh.face(index);
            let v = face.vertices.map(|p| model_view.transform_point(p));

            // Clockwise faces: the normal points out of the visible side
            let normal = (v[1] - v[0]).cross(v[2] - v[0]).normalize();
            if options.backface_culling && normal.dot((-v[0]).normalize()) < 0.0 {
                stats.culled += 1;
                continue;
            }

            let color = light.modulate_surface_color(random_color(index), normal);
            let vertex_colors =
                VERTEX_PALETTE.map(|c| light.modulate_surface_color(c.to_argb(), normal));

            let polygon = frustum.clip_polygon(Polygon::from_triangle(v, face.uvs));
            if polygon.is_empty() {
                stats.clipped += 1;
                continue;
            }

            for (vertices, uvs) in polygon.triangles() {
                let depth = (vertices[0].z + vertices[1].z + vertices[2].z) / 3.0;
                let triangle = ScreenTriangle {
                    points: vertices.map(|p| to_screen(&screen_projection, p)),
                    uvs,
                    color,
                    vertex_colors,
                    texture,
                };
                assembled.push((depth, triangle));
            }
        }
    }

    if options.depth_sort {
        // Farthest first
        assembled.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    }

    stats.triangles = assembled.len();
    Frame {
        triangles: assembled.into_iter().map(|(_, t)| t).collect(),
        stats,
    }
}

/// Assemble the scene and rasterize it into `canvas`. Does not clear.
pub fn render(canvas: &mut Canvas, scene: &Scene, frustum: &Frustum, options: PipelineOptions) -> FrameStats {
    let frame = assemble(scene, frustum, canvas.width(), canvas.height(), options);
    for triangle in &frame.triangles {
        canvas.draw_triangle(triangle);
    }

    log::debug!(
        "frame: {} faces, {} culled, {} clipped away, {} triangles",
        frame.stats.faces,
        frame.stats.culled,
        frame.stats.clipped,
        frame.stats.triangles
    );
    frame.stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{DirectionalLight, FillMode, PolygonMode, RasterRule, FAR_DEPTH};
    use crate::world::Mesh;
    use std::f32::consts::FRAC_PI_3;

    const W: usize = 160;
    const H: usize = 120;

    fn frustum() -> Frustum {
        Frustum::new(W as f32, H as f32, FRAC_PI_3, 0.1, 100.0)
    }

    fn cube_scene(rotation: Vec3, translation: Vec3) -> Scene {
        let mut scene = Scene::new(DirectionalLight::new(Vec3::new(0.0, 0.0, 1.0)));
        let mut cube = Mesh::unit_cube();
        cube.rotation = rotation;
        cube.translation = translation;
        scene.meshes.push(cube);
        scene
    }

    #[test]
    fn test_cube_shows_six_front_facing_triangles() {
        // Turned so three sides face the camera
        let scene = cube_scene(Vec3::new(0.6, 0.8, 0.0), Vec3::new(0.0, 0.0, 6.0));
        let frame = assemble(&scene, &frustum(), W, H, PipelineOptions::default());

        assert_eq!(frame.stats.faces, 12);
        assert_eq!(frame.stats.front_facing(), 6);
        assert_eq!(frame.stats.clipped, 0);
        assert_eq!(frame.triangles.len(), 6);
    }

    #[test]
    fn test_cube_square_on_shows_one_side() {
        let scene = cube_scene(Vec3::ZERO, Vec3::new(0.0, 0.0, 6.0));
        let frame = assemble(&scene, &frustum(), W, H, PipelineOptions::default());
        assert_eq!(frame.stats.front_facing(), 2);
    }

    #[test]
    fn test_culling_off_keeps_every_face() {
        let scene = cube_scene(Vec3::new(0.6, 0.8, 0.0), Vec3::new(0.0, 0.0, 6.0));
        let options = PipelineOptions {
            backface_culling: false,
            depth_sort: false,
        };
        let frame = assemble(&scene, &frustum(), W, H, options);
        assert_eq!(frame.stats.culled, 0);
        assert_eq!(frame.triangles.len(), 12);
    }

    #[test]
    fn test_cube_behind_camera_is_clipped_away() {
        let scene = cube_scene(Vec3::new(0.6, 0.8, 0.0), Vec3::new(0.0, 0.0, -6.0));
        let options = PipelineOptions {
            backface_culling: false,
            depth_sort: false,
        };
        let frame = assemble(&scene, &frustum(), W, H, options);
        assert_eq!(frame.stats.clipped, 12);
        assert!(frame.triangles.is_empty());
    }

    #[test]
    fn test_cube_through_near_plane_yields_extra_triangles() {
        // Camera sits inside the cube: every face is clipped somewhere
        let scene = cube_scene(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.5));
        let options = PipelineOptions {
            backface_culling: false,
            depth_sort: false,
        };
        let frame = assemble(&scene, &frustum(), W, H, options);
        assert!(frame.stats.clipped > 0);
        assert!(!frame.triangles.is_empty());
    }

    #[test]
    fn test_projection_centers_point_ahead() {
        let f = frustum();
        let m = viewport(W, H) * f.perspective_projection();
        let p = to_screen(&m, Vec3::new(0.0, 0.0, 5.0));
        assert!((p.x - W as f32 / 2.0).abs() < 1e-4);
        assert!((p.y - H as f32 / 2.0).abs() < 1e-4);
        assert!((p.w - 5.0).abs() < 1e-6);

        // Up in view space is up on screen
        let up = to_screen(&m, Vec3::new(0.0, 1.0, 5.0));
        assert!(up.y < p.y);
    }

    #[test]
    fn test_zero_w_passes_through() {
        let m = Mat4::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ]);
        let p = to_screen(&m, Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(p, Vec4::new(3.0, 4.0, 5.0, 0.0));
    }

    #[test]
    fn test_depth_sort_orders_far_to_near() {
        let mut scene = cube_scene(Vec3::new(0.6, 0.8, 0.0), Vec3::new(-1.5, 0.0, 5.0));
        let mut far = Mesh::unit_cube();
        far.translation = Vec3::new(1.5, 0.0, 20.0);
        scene.meshes.push(far);

        let options = PipelineOptions {
            backface_culling: true,
            depth_sort: true,
        };
        let frame = assemble(&scene, &frustum(), W, H, options);
        let w: Vec<f32> = frame.triangles.iter().map(|t| t.points[0].w).collect();
        assert!(w.first() > w.last(), "expected far triangles first: {:?}", w);
    }

    #[test]
    fn test_sorted_and_unsorted_frames_match() {
        let mut scene = cube_scene(Vec3::new(0.6, 0.8, 0.0), Vec3::new(-0.5, 0.0, 6.0));
        let mut other = Mesh::unit_cube();
        other.rotation = Vec3::new(-0.3, 0.4, 0.1);
        other.translation = Vec3::new(0.8, 0.2, 7.5);
        scene.meshes.push(other);

        let draw = |depth_sort| {
            let mut canvas = Canvas::new(W, H);
            canvas.set_rule(RasterRule::Scanline);
            let options = PipelineOptions {
                backface_culling: true,
                depth_sort,
            };
            render(&mut canvas, &scene, &frustum(), options);
            canvas
        };
        let (sorted, unsorted) = (draw(true), draw(false));
        // Depth testing makes submission order irrelevant away from exact ties
        let differing = sorted
            .color_buffer()
            .iter()
            .zip(unsorted.color_buffer())
            .filter(|(a, b)| a != b)
            .count();
        assert!(differing < W, "{} pixels differ", differing);
        assert_eq!(sorted.depth_buffer(), unsorted.depth_buffer());
    }

    #[test]
    fn test_render_fills_depth_buffer() {
        let scene = cube_scene(Vec3::new(0.6, 0.8, 0.0), Vec3::new(0.0, 0.0, 6.0));
        let mut canvas = Canvas::new(W, H);
        canvas.set_fill_mode(FillMode::VertexColor);
        canvas.enable(PolygonMode::Line);
        let stats = render(&mut canvas, &scene, &frustum(), PipelineOptions::default());

        assert_eq!(stats.triangles, 6);
        let center = (H / 2) * W + W / 2;
        assert!(canvas.depth_buffer()[center] < FAR_DEPTH);
        assert_ne!(canvas.color_buffer()[center], canvas.background);
    }

    #[test]
    fn test_textured_cube_borrows_scene_texture() {
        let mut scene = cube_scene(Vec3::new(0.6, 0.8, 0.0), Vec3::new(0.0, 0.0, 6.0));
        let id = scene.add_texture(crate::rasterizer::Texture::new(4, 4));
        scene.meshes[0].texture = Some(id);
        let frame = assemble(&scene, &frustum(), W, H, PipelineOptions::default());
        assert!(frame
            .triangles
            .iter()
            .all(|t| t.texture.is_some_and(|tex| std::ptr::eq(tex, &scene.textures[id]))));
    }
}
