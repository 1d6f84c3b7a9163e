//! softras viewer
//!
//! Opens a window, maps keys to actions and shows the software-rendered
//! color buffer scaled to the window.
//!
//! Keys:
//! - 1-7: draw-mode presets
//! - C / X: backface culling on / off
//! - R: switch scanline / edge-function fill
//! - Z: toggle back-to-front sorting
//! - G: toggle grid
//! - - / =: halve / double the framebuffer resolution
//! - WASD, Space, Shift: move
//! - Arrows: turn
//! - Esc: quit

use std::path::PathBuf;

use clap::Parser;
use macroquad::prelude::*;

use softras::app::{Action, AppState};
use softras::config::RenderConfig;
use softras::VERSION;

#[derive(Parser, Debug)]
#[command(version, about = "CPU-only software rasterizer")]
struct Args {
    /// Render configuration (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene file (RON); overrides the config's scene
    #[arg(long)]
    scene: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<RenderConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(scene) = &args.scene {
        config.scene = Some(scene.clone());
    }
    Ok(config)
}

fn startup(args: &Args) -> Result<AppState, Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    Ok(AppState::from_config(config)?)
}

fn window_conf() -> Conf {
    // Sizing only; errors are reported once the logger is up
    let config = load_config(&Args::parse()).unwrap_or_default();
    Conf {
        window_title: format!("softras v{}", VERSION),
        window_width: (config.width * config.window_scale) as i32,
        window_height: (config.height * config.window_scale) as i32,
        window_resizable: true,
        ..Default::default()
    }
}

const PRESET_KEYS: [(KeyCode, u8); 7] = [
    (KeyCode::Key1, 1),
    (KeyCode::Key2, 2),
    (KeyCode::Key3, 3),
    (KeyCode::Key4, 4),
    (KeyCode::Key5, 5),
    (KeyCode::Key6, 6),
    (KeyCode::Key7, 7),
];

const MIN_RESOLUTION: usize = 40;
const MAX_RESOLUTION: usize = 4096;

/// Decode this frame's keyboard state
fn poll_actions(config: &RenderConfig, dt: f32) -> Vec<Action> {
    let mut actions = Vec::new();

    if is_key_pressed(KeyCode::Escape) {
        actions.push(Action::Quit);
    }
    for (key, n) in PRESET_KEYS {
        if is_key_pressed(key) {
            actions.push(Action::Preset(n));
        }
    }
    if is_key_pressed(KeyCode::C) {
        actions.push(Action::SetCulling(true));
    }
    if is_key_pressed(KeyCode::X) {
        actions.push(Action::SetCulling(false));
    }
    if is_key_pressed(KeyCode::R) {
        actions.push(Action::ToggleRasterRule);
    }
    if is_key_pressed(KeyCode::Z) {
        actions.push(Action::ToggleDepthSort);
    }
    if is_key_pressed(KeyCode::G) {
        actions.push(Action::ToggleGrid);
    }
    if is_key_pressed(KeyCode::Minus) && config.width.min(config.height) / 2 >= MIN_RESOLUTION {
        actions.push(Action::SetResolution {
            width: config.width / 2,
            height: config.height / 2,
        });
    }
    if is_key_pressed(KeyCode::Equal) && config.width.max(config.height) * 2 <= MAX_RESOLUTION {
        actions.push(Action::SetResolution {
            width: config.width * 2,
            height: config.height * 2,
        });
    }

    let axis = |plus: KeyCode, minus: KeyCode| {
        is_key_down(plus) as i32 as f32 - is_key_down(minus) as i32 as f32
    };

    let step = config.camera_speed * dt;
    let (forward, right) = (axis(KeyCode::W, KeyCode::S), axis(KeyCode::D, KeyCode::A));
    let up = axis(KeyCode::Space, KeyCode::LeftShift);
    if forward != 0.0 || right != 0.0 || up != 0.0 {
        actions.push(Action::Move {
            forward: forward * step,
            right: right * step,
            up: up * step,
        });
    }

    let turn = config.turn_speed * dt;
    let (yaw, pitch) = (axis(KeyCode::Right, KeyCode::Left), axis(KeyCode::Down, KeyCode::Up));
    if yaw != 0.0 || pitch != 0.0 {
        actions.push(Action::Turn {
            yaw: yaw * turn,
            pitch: pitch * turn,
        });
    }

    actions
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut app = match startup(&args) {
        Ok(app) => app,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let (mut width, mut height) = (app.canvas.width(), app.canvas.height());
    let mut rgba = vec![0u8; width * height * 4];
    let mut texture = Texture2D::from_rgba8(width as u16, height as u16, &rgba);
    texture.set_filter(FilterMode::Nearest);

    log::info!("=== softras v{} ({}x{}) ===", VERSION, width, height);

    while app.running {
        let dt = get_frame_time();
        for action in poll_actions(&app.config, dt) {
            app.apply(action);
        }

        if (app.canvas.width(), app.canvas.height()) != (width, height) {
            (width, height) = (app.canvas.width(), app.canvas.height());
            rgba = vec![0u8; width * height * 4];
            texture = Texture2D::from_rgba8(width as u16, height as u16, &rgba);
            texture.set_filter(FilterMode::Nearest);
        }

        let stats = app.frame(dt);
        app.canvas.write_rgba8(&mut rgba);
        texture.update_from_bytes(width as u32, height as u32, &rgba);

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );

        let settings = app.canvas.settings();
        draw_text(
            &format!(
                "{:.0} fps | {} tris | {} culled | {:?} {:?} | cull {} | sort {}",
                1.0 / dt.max(1e-6),
                stats.triangles,
                stats.culled,
                settings.rule,
                settings.fill_mode,
                app.options.backface_culling,
                app.options.depth_sort,
            ),
            8.0,
            20.0,
            18.0,
            WHITE,
        );

        next_frame().await;
    }
}
