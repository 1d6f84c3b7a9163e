//! Canvas: color buffer, depth buffer and triangle fill
//!
//! Screen vertices are rounded to whole pixels and pixel centers sit at
//! `(x + 0.5, y + 0.5)`. Coverage is decided in integer arithmetic on doubled
//! coordinates (vertex `2x`, center `2x + 1`), so both fill walkers see the
//! same edge values and visit the same pixels.
//!
//! Edge functions are oriented so that the triangle area is positive. An edge
//! owns the pixels exactly on it only when it is a top or left edge:
//!
//! ```text
//!   top  : dy == 0 && dx > 0
//!   left : dy < 0
//! ```

use std::cmp::Ordering;
use std::ops::Range;

use super::math::{Vec2, Vec3, Vec4};
use super::types::{
    interpolate_color, Argb, FillMode, PolygonMode, RasterRule, RasterSettings, Texture,
};

pub const DEFAULT_BACKGROUND: Argb = 0xFF2E_1065;
pub const LINE_COLOR: Argb = 0xFFA7_8BFA;
pub const POINT_COLOR: Argb = 0xFF7C_3AED;
pub const GRID_COLOR: Argb = 0xFF7C_3AED;

/// Depth of an empty pixel. Every finite positive `w` gives `1 - 1/w < 1`.
pub const FAR_DEPTH: f32 = 1.0;

const POINT_SIZE: i32 = 10;
const GRID_SPACING: usize = 10;

/// Edges that are not top-left lose pixels lying exactly on them
const FILL_RULE_BIAS: i64 = -1;

/// Keeps doubled-coordinate products well inside i64
const MAX_COORD: f32 = (1 << 24) as f32;

/// Triangle ready for the canvas: `x, y` in pixels, `z` after the
/// perspective divide, `w` the view-space depth.
#[derive(Debug, Clone, Copy)]
pub struct ScreenTriangle<'a> {
    pub points: [Vec4; 3],
    pub uvs: [Vec2; 3],
    /// Used by solid fill, and by textured fill when there is no texture
    pub color: Argb,
    pub vertex_colors: [Argb; 3],
    /// Borrowed from the scene for the frame
    pub texture: Option<&'a Texture>,
}

/// Per-triangle coloring, picked once before the fill loop
#[derive(Clone, Copy)]
enum Shader<'a> {
    Solid(Argb),
    Vertex([Argb; 3]),
    Texture { texture: &'a Texture, uvs: [Vec2; 3] },
}

impl<'a> Shader<'a> {
    fn for_triangle(fill: FillMode, tri: &ScreenTriangle<'a>) -> Self {
        match (fill, tri.texture) {
            (FillMode::Solid, _) | (FillMode::Texture, None) => Shader::Solid(tri.color),
            (FillMode::VertexColor, _) => Shader::Vertex(tri.vertex_colors),
            // Image rows run top to bottom, V runs bottom to top
            (FillMode::Texture, Some(texture)) => Shader::Texture {
                texture,
                uvs: tri.uvs.map(|uv| Vec2::new(uv.x, 1.0 - uv.y)),
            },
        }
    }

    fn shade(&self, weights: Vec3, inv_w: [f32; 3], w_recip: f32) -> Argb {
        match *self {
            Shader::Solid(color) => color,
            Shader::Vertex(colors) => interpolate_color(weights, colors),
            Shader::Texture { texture, uvs } => {
                let uv = perspective_uv(weights, uvs, inv_w, w_recip);
                texture.sample(uv.x, uv.y)
            }
        }
    }
}

/// Interpolate `uv / w` linearly, then undo the projective scaling
pub fn perspective_uv(weights: Vec3, uvs: [Vec2; 3], inv_w: [f32; 3], w_recip: f32) -> Vec2 {
    let w = [weights.x * inv_w[0], weights.y * inv_w[1], weights.z * inv_w[2]];
    let u = w[0] * uvs[0].x + w[1] * uvs[1].x + w[2] * uvs[2].x;
    let v = w[0] * uvs[0].y + w[1] * uvs[1].y + w[2] * uvs[2].y;
    Vec2::new(u / w_recip, v / w_recip)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Point {
    x: i64,
    y: i64,
}

impl Point {
    /// Nearest pixel, in doubled coordinates
    fn from_screen(v: Vec4) -> Self {
        let snap = |c: f32| (c.round().clamp(-MAX_COORD, MAX_COORD) as i64) * 2;
        Self { x: snap(v.x), y: snap(v.y) }
    }

    fn center(px: i64, py: i64) -> Self {
        Self { x: 2 * px + 1, y: 2 * py + 1 }
    }

    fn pixel(self) -> (i64, i64) {
        (self.x.div_euclid(2), self.y.div_euclid(2))
    }
}

/// Signed parallelogram area of `(a, b, c)`
fn edge(a: Point, b: Point, c: Point) -> i64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn is_top_left(a: Point, b: Point) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    dy < 0 || (dy == 0 && dx > 0)
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -(-a).div_euclid(b)
}

/// Triangle with positive area and the attribute order that goes with it
struct Setup<'a> {
    p: [Point; 3],
    area: i64,
    bias: [i64; 3],
    inv_w: [f32; 3],
    shader: Shader<'a>,
}

impl<'a> Setup<'a> {
    /// `None` for zero-area triangles
    fn new(tri: &ScreenTriangle<'a>, fill: FillMode) -> Option<Self> {
        let mut tri = *tri;
        let mut p = tri.points.map(Point::from_screen);
        let mut area = edge(p[0], p[1], p[2]);
        if area == 0 {
            return None;
        }
        if area < 0 {
            p.swap(1, 2);
            tri.points.swap(1, 2);
            tri.uvs.swap(1, 2);
            tri.vertex_colors.swap(1, 2);
            area = -area;
        }

        let bias = [0, 1, 2].map(|i| {
            let (a, b) = (p[(i + 1) % 3], p[(i + 2) % 3]);
            if is_top_left(a, b) {
                0
            } else {
                FILL_RULE_BIAS
            }
        });
        let inv_w = tri.points.map(|v| if v.w == 0.0 { 0.0 } else { 1.0 / v.w });

        Some(Self {
            p,
            area,
            bias,
            inv_w,
            shader: Shader::for_triangle(fill, &tri),
        })
    }

    /// Edge values opposite each vertex
    fn edges(&self, c: Point) -> [i64; 3] {
        [
            edge(self.p[1], self.p[2], c),
            edge(self.p[2], self.p[0], c),
            edge(self.p[0], self.p[1], c),
        ]
    }

    fn covers(&self, c: Point) -> bool {
        self.edges(c).iter().zip(self.bias).all(|(&e, bias)| e + bias >= 0)
    }

    /// Barycentric weights; exactly one-hot at the vertices
    fn weights(&self, c: Point) -> Vec3 {
        let [e0, e1, e2] = self.edges(c);
        let area = self.area as f32;
        Vec3::new(e0 as f32 / area, e1 as f32 / area, e2 as f32 / area)
    }
}

/// Exact x-crossing of one edge, stepped one row at a time.
/// Holds `num / dy` = doubled x of the edge at the current row center.
struct EdgeStepper {
    num: i64,
    dy: i64,
    step: i64,
}

impl EdgeStepper {
    fn new(top: Point, bottom: Point, first_row: i64) -> Self {
        let dx = bottom.x - top.x;
        let dy = bottom.y - top.y;
        let cy = 2 * first_row + 1;
        Self {
            num: top.x * dy + dx * (cy - top.y),
            dy,
            step: 2 * dx,
        }
    }

    /// First pixel whose center is at or right of the edge
    fn first_pixel(&self) -> i64 {
        ceil_div(self.num - self.dy, 2 * self.dy)
    }

    fn advance(&mut self) {
        self.num += self.step;
    }
}

/// Software render target
pub struct Canvas {
    width: usize,
    height: usize,
    color: Vec<Argb>,
    depth: Vec<f32>,
    settings: RasterSettings,
    pub background: Argb,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![DEFAULT_BACKGROUND; width * height],
            depth: vec![FAR_DEPTH; width * height],
            settings: RasterSettings::default(),
            background: DEFAULT_BACKGROUND,
        }
    }

    /// Reallocate both buffers. Contents are reset.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.color = vec![self.background; width * height];
        self.depth = vec![FAR_DEPTH; width * height];
    }

    pub fn clear(&mut self) {
        self.color.fill(self.background);
        self.depth.fill(FAR_DEPTH);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn color_buffer(&self) -> &[Argb] {
        &self.color
    }

    pub fn depth_buffer(&self) -> &[f32] {
        &self.depth
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Argb> {
        (x < self.width && y < self.height).then(|| self.color[y * self.width + x])
    }

    pub fn settings(&self) -> RasterSettings {
        self.settings
    }

    pub fn enable(&mut self, mode: PolygonMode) {
        self.settings.modes.insert(mode);
    }

    pub fn disable(&mut self, mode: PolygonMode) {
        self.settings.modes.remove(mode);
    }

    pub fn is_enabled(&self, mode: PolygonMode) -> bool {
        self.settings.modes.contains(mode)
    }

    pub fn set_fill_mode(&mut self, fill_mode: FillMode) {
        self.settings.fill_mode = fill_mode;
    }

    pub fn set_rule(&mut self, rule: RasterRule) {
        self.settings.rule = rule;
    }

    pub fn apply_settings(&mut self, settings: RasterSettings) {
        self.settings = settings;
    }

    /// Copy the packed buffer out as RGBA bytes (4 per pixel)
    pub fn write_rgba8(&self, out: &mut [u8]) {
        for (dst, &c) in out.chunks_exact_mut(4).zip(&self.color) {
            dst.copy_from_slice(&[(c >> 16) as u8, (c >> 8) as u8, c as u8, (c >> 24) as u8]);
        }
    }

    /// Out-of-bounds writes are dropped
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Argb) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.color[y as usize * self.width + x as usize] = color;
        }
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Argb) {
        let x_end = (x.saturating_add(width)).min(self.width as i32);
        let y_end = (y.saturating_add(height)).min(self.height as i32);
        for row in y.max(0)..y_end {
            for column in x.max(0)..x_end {
                self.draw_pixel(column, row, color);
            }
        }
    }

    /// Square marker centered on `(x, y)`
    pub fn draw_point(&mut self, x: i32, y: i32) {
        self.draw_rect(x - POINT_SIZE / 2, y - POINT_SIZE / 2, POINT_SIZE, POINT_SIZE, POINT_COLOR);
    }

    /// DDA line, endpoints included
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Argb) {
        let dx = x1 as f32 - x0 as f32;
        let dy = y1 as f32 - y0 as f32;
        let steps = dx.abs().max(dy.abs());
        if steps == 0.0 {
            self.draw_pixel(x0, y0, color);
            return;
        }

        let (x_inc, y_inc) = (dx / steps, dy / steps);
        let (mut x, mut y) = (x0 as f32, y0 as f32);
        for _ in 0..=steps as u32 {
            self.draw_pixel(x.round() as i32, y.round() as i32, color);
            x += x_inc;
            y += y_inc;
        }
    }

    /// Dotted debug grid
    pub fn draw_grid(&mut self) {
        for y in (0..self.height).step_by(GRID_SPACING) {
            for x in (0..self.width).step_by(GRID_SPACING) {
                self.color[y * self.width + x] = GRID_COLOR;
            }
        }
    }

    /// Rasterize one triangle with the active modes, fill style and rule
    pub fn draw_triangle(&mut self, tri: &ScreenTriangle) {
        if self.settings.modes.contains(PolygonMode::Fill) {
            if let Some(setup) = Setup::new(tri, self.settings.fill_mode) {
                match self.settings.rule {
                    RasterRule::Scanline => self.fill_scanline(&setup),
                    RasterRule::EdgeFunction => self.fill_edge_function(&setup),
                }
            }
        }

        let corners = tri.points.map(|v| {
            let (x, y) = Point::from_screen(v).pixel();
            (x as i32, y as i32)
        });

        if self.settings.modes.contains(PolygonMode::Line) {
            for (i, j) in [(0, 1), (1, 2), (2, 0)] {
                let ((x0, y0), (x1, y1)) = (corners[i], corners[j]);
                self.draw_line(x0, y0, x1, y1, LINE_COLOR);
            }
        }

        if self.settings.modes.contains(PolygonMode::Point) {
            for (x, y) in corners {
                self.draw_point(x, y);
            }
        }
    }

    fn clamp_rows(&self, rows: Range<i64>) -> Range<i64> {
        rows.start.max(0)..rows.end.min(self.height as i64)
    }

    fn clamp_columns(&self, columns: Range<i64>) -> Range<i64> {
        columns.start.max(0)..columns.end.min(self.width as i64)
    }

    fn fill_edge_function(&mut self, setup: &Setup) {
        let (xs, ys) = (setup.p.map(|p| p.pixel().0), setup.p.map(|p| p.pixel().1));
        let min = |v: [i64; 3]| v[0].min(v[1]).min(v[2]);
        let max = |v: [i64; 3]| v[0].max(v[1]).max(v[2]);
        let rows = self.clamp_rows(min(ys)..max(ys));
        let columns = self.clamp_columns(min(xs)..max(xs));

        for py in rows {
            for px in columns.clone() {
                let center = Point::center(px, py);
                if setup.covers(center) {
                    self.shade_pixel(setup, px, py, center);
                }
            }
        }
    }

    fn fill_scanline(&mut self, setup: &Setup) {
        let mut p = setup.p;
        p.sort_by_key(|p| p.y);
        let [p0, p1, p2] = p;

        if p0.y == p2.y {
            return;
        }

        // Sign of (mid.x - p1.x) * (p2.y - p0.y), with
        // mid.x = (p2.x - p0.x) * (p1.y - p0.y) / (p2.y - p0.y) + p0.x
        let side = (p2.x - p0.x) * (p1.y - p0.y) - (p1.x - p0.x) * (p2.y - p0.y);
        let p1_on_left = side > 0;

        let (y0, y1, y2) = (p0.y / 2, p1.y / 2, p2.y / 2);

        // Flat-top triangles have no upper half, flat-bottom ones no lower half
        if y0 < y1 {
            self.fill_half(setup, y0..y1, (p0, p1), (p0, p2), p1_on_left);
        }
        if y1 < y2 {
            self.fill_half(setup, y1..y2, (p1, p2), (p0, p2), p1_on_left);
        }
    }

    fn fill_half(
        &mut self,
        setup: &Setup,
        rows: Range<i64>,
        short: (Point, Point),
        long: (Point, Point),
        short_on_left: bool,
    ) {
        let rows = self.clamp_rows(rows);
        if rows.is_empty() {
            return;
        }

        let (left, right) = if short_on_left { (short, long) } else { (long, short) };
        let mut left = EdgeStepper::new(left.0, left.1, rows.start);
        let mut right = EdgeStepper::new(right.0, right.1, rows.start);

        for py in rows {
            for px in self.clamp_columns(left.first_pixel()..right.first_pixel()) {
                self.shade_pixel(setup, px, py, Point::center(px, py));
            }
            left.advance();
            right.advance();
        }
    }

    fn shade_pixel(&mut self, setup: &Setup, px: i64, py: i64, center: Point) {
        let index = py as usize * self.width + px as usize;
        let weights = setup.weights(center);
        let inv_w = setup.inv_w;
        let w_recip = weights.x * inv_w[0] + weights.y * inv_w[1] + weights.z * inv_w[2];

        // Nearest wins; ties keep the stored fragment
        let depth = 1.0 - w_recip;
        if depth.partial_cmp(&self.depth[index]) != Some(Ordering::Less) {
            return;
        }

        self.color[index] = setup.shader.shade(weights, inv_w, w_recip);
        self.depth[index] = depth;
    }
}
