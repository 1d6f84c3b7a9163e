//! Application state and semantic input actions
//!
//! The viewer turns raw key presses into `Action`s. `AppState` applies them
//! and renders one frame at a time; it never touches the window.

use crate::config::RenderConfig;
use crate::error::AssetError;
use crate::pipeline::{render, FrameStats, PipelineOptions};
use crate::rasterizer::{Canvas, FillMode, Frustum, PolygonMode, RasterRule};
use crate::world::{load_scene, Scene};

/// Decoded user input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    /// Draw-mode preset, 1 to 7
    Preset(u8),
    SetCulling(bool),
    ToggleRasterRule,
    ToggleDepthSort,
    ToggleGrid,
    /// Eye movement in world units
    Move { forward: f32, right: f32, up: f32 },
    /// Camera rotation in radians
    Turn { yaw: f32, pitch: f32 },
    /// New framebuffer size in pixels
    SetResolution { width: usize, height: usize },
}

/// Draw modes and fill style for preset keys 1 to 7
const PRESETS: [(&[PolygonMode], FillMode); 7] = [
    (&[PolygonMode::Line, PolygonMode::Point], FillMode::Solid),
    (&[PolygonMode::Line], FillMode::Solid),
    (&[PolygonMode::Fill], FillMode::Solid),
    (&[PolygonMode::Fill, PolygonMode::Line], FillMode::Solid),
    (&[PolygonMode::Fill, PolygonMode::Line], FillMode::Texture),
    (&[PolygonMode::Fill], FillMode::Texture),
    (&[PolygonMode::Fill], FillMode::VertexColor),
];

pub fn preset(n: u8) -> Option<(&'static [PolygonMode], FillMode)> {
    PRESETS.get(usize::from(n).checked_sub(1)?).copied()
}

pub struct AppState {
    pub config: RenderConfig,
    pub canvas: Canvas,
    pub frustum: Frustum,
    pub scene: Scene,
    pub options: PipelineOptions,
    pub show_grid: bool,
    pub running: bool,
}

impl AppState {
    pub fn new(config: RenderConfig, scene: Scene) -> Self {
        let mut canvas = Canvas::new(config.width, config.height);
        canvas.background = config.background;
        canvas.apply_settings(config.raster_settings());
        canvas.clear();

        let frustum = Frustum::new(
            config.width as f32,
            config.height as f32,
            config.fov_radians(),
            config.near,
            config.far,
        );

        Self {
            options: PipelineOptions {
                backface_culling: config.backface_culling,
                depth_sort: config.depth_sort,
            },
            show_grid: config.show_grid,
            running: true,
            config,
            canvas,
            frustum,
            scene,
        }
    }

    /// Build state from a config, loading its scene file or the demo scene
    pub fn from_config(config: RenderConfig) -> Result<Self, AssetError> {
        let scene = match &config.scene {
            Some(path) => load_scene(path)?,
            None => {
                log::info!("No scene file given, using the demo scene");
                Scene::demo()
            }
        };
        Ok(Self::new(config, scene))
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Preset(n) => match preset(n) {
                Some((modes, fill_mode)) => {
                    for mode in [PolygonMode::Fill, PolygonMode::Line, PolygonMode::Point] {
                        if modes.contains(&mode) {
                            self.canvas.enable(mode);
                        } else {
                            self.canvas.disable(mode);
                        }
                    }
                    self.canvas.set_fill_mode(fill_mode);
                }
                None => log::warn!("Unknown preset {}", n),
            },
            Action::SetCulling(on) => self.options.backface_culling = on,
            Action::ToggleRasterRule => {
                let rule = match self.canvas.settings().rule {
                    RasterRule::Scanline => RasterRule::EdgeFunction,
                    RasterRule::EdgeFunction => RasterRule::Scanline,
                };
                log::info!("Raster rule: {:?}", rule);
                self.canvas.set_rule(rule);
            }
            Action::ToggleDepthSort => self.options.depth_sort = !self.options.depth_sort,
            Action::ToggleGrid => self.show_grid = !self.show_grid,
            Action::Move { forward, right, up } => {
                self.frustum.move_forward(forward);
                self.frustum.strafe(right);
                self.frustum.rise(up);
            }
            Action::Turn { yaw, pitch } => {
                self.frustum.yaw += yaw;
                self.frustum.pitch += pitch;
                self.frustum.update_direction();
            }
            Action::SetResolution { width, height } => self.set_resolution(width, height),
        }
    }

    /// Reallocate the canvas and rebuild the projection, keeping the camera
    fn set_resolution(&mut self, width: usize, height: usize) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring empty resolution {}x{}", width, height);
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.canvas.resize(width, height);

        let mut frustum = Frustum::new(
            width as f32,
            height as f32,
            self.config.fov_radians(),
            self.config.near,
            self.config.far,
        );
        frustum.eye = self.frustum.eye;
        frustum.yaw = self.frustum.yaw;
        frustum.pitch = self.frustum.pitch;
        frustum.direction = self.frustum.direction;
        self.frustum = frustum;
        log::info!("Resolution: {}x{}", width, height);
    }

    /// Advance the scene by `dt` seconds and redraw the canvas
    pub fn frame(&mut self, dt: f32) -> FrameStats {
        self.scene.update(dt);
        self.canvas.clear();
        let stats = render(&mut self.canvas, &self.scene, &self.frustum, self.options);
        if self.show_grid {
            self.canvas.draw_grid();
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{Vec3, GRID_COLOR};

    fn app() -> AppState {
        let config = RenderConfig {
            width: 80,
            height: 60,
            ..RenderConfig::default()
        };
        AppState::new(config, Scene::demo())
    }

    #[test]
    fn test_presets_set_modes_and_fill() {
        let mut app = app();
        app.apply(Action::Preset(1));
        assert!(!app.canvas.is_enabled(PolygonMode::Fill));
        assert!(app.canvas.is_enabled(PolygonMode::Line));
        assert!(app.canvas.is_enabled(PolygonMode::Point));

        app.apply(Action::Preset(5));
        assert!(app.canvas.is_enabled(PolygonMode::Fill));
        assert!(app.canvas.is_enabled(PolygonMode::Line));
        assert!(!app.canvas.is_enabled(PolygonMode::Point));
        assert_eq!(app.canvas.settings().fill_mode, FillMode::Texture);

        app.apply(Action::Preset(7));
        assert_eq!(app.canvas.settings().fill_mode, FillMode::VertexColor);

        let before = app.canvas.settings();
        app.apply(Action::Preset(9));
        assert_eq!(app.canvas.settings(), before);
    }

    #[test]
    fn test_toggles() {
        let mut app = app();
        app.apply(Action::SetCulling(false));
        assert!(!app.options.backface_culling);
        app.apply(Action::SetCulling(true));
        assert!(app.options.backface_culling);

        let rule = app.canvas.settings().rule;
        app.apply(Action::ToggleRasterRule);
        assert_ne!(app.canvas.settings().rule, rule);
        app.apply(Action::ToggleRasterRule);
        assert_eq!(app.canvas.settings().rule, rule);

        app.apply(Action::ToggleDepthSort);
        assert!(app.options.depth_sort);
        app.apply(Action::Quit);
        assert!(!app.running);
    }

    #[test]
    fn test_move_and_turn() {
        let mut app = app();
        app.apply(Action::Move { forward: 2.0, right: 1.0, up: 0.5 });
        assert!((app.frustum.eye - Vec3::new(1.0, 0.5, 2.0)).len() < 1e-5);

        app.apply(Action::Turn { yaw: std::f32::consts::FRAC_PI_2, pitch: 0.0 });
        assert!((app.frustum.direction - Vec3::new(1.0, 0.0, 0.0)).len() < 1e-5);
    }

    #[test]
    fn test_frame_renders_demo_scene() {
        let mut app = app();
        let stats = app.frame(0.016);
        assert_eq!(stats.faces, 24);
        assert!(stats.triangles > 0);
        assert!(app.canvas.color_buffer().iter().any(|&c| c != app.canvas.background));
    }

    #[test]
    fn test_grid_is_drawn_after_geometry() {
        let mut app = app();
        app.apply(Action::ToggleGrid);
        app.frame(0.0);
        assert_eq!(app.canvas.pixel(0, 0), Some(GRID_COLOR));
        assert_eq!(app.canvas.pixel(40, 30), Some(GRID_COLOR));
    }

    #[test]
    fn test_set_resolution_keeps_camera() {
        let mut app = app();
        app.apply(Action::Move { forward: 1.0, right: 0.0, up: 0.0 });
        app.apply(Action::SetResolution { width: 160, height: 90 });
        assert_eq!((app.canvas.width(), app.canvas.height()), (160, 90));
        assert_eq!(app.canvas.color_buffer().len(), 160 * 90);
        assert!((app.frustum.aspect_horizontal - 160.0 / 90.0).abs() < 1e-5);
        assert!((app.frustum.eye.z - 1.0).abs() < 1e-5);

        app.apply(Action::SetResolution { width: 0, height: 10 });
        assert_eq!(app.canvas.width(), 160);
        assert!(app.frame(0.0).triangles > 0);
    }

    #[test]
    fn test_from_config_without_scene_uses_demo() {
        let app = AppState::from_config(RenderConfig::default()).unwrap();
        assert_eq!(app.scene.meshes.len(), 2);
    }
}
