// What you SEE:
// • Live mirrored camera is always the base image.
// • Menu: three round icons; click one to start that game.
// • In a game: "< Back" button top-left, Q/ESC also goes back.
// • On the menu Q/ESC quits. Once a game is over, any click returns to the menu.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rainbow_playground::camera::CameraCapture;
use rainbow_playground::clock::SystemClock;
use rainbow_playground::compositor::Compositor;
use rainbow_playground::config::AppConfig;
use rainbow_playground::games::{AnyGame, Game, GameContext};
use rainbow_playground::menu::Menu;
use rainbow_playground::types::{rgb, FrameBuffer, Rect, KEY_ESCAPE, WHITE};
use rainbow_playground::window::Drawer;
use rainbow_playground::Result;

/// Back button area (x, y, w, h); edges count as inside.
const BACK_BUTTON: Rect = Rect::new(10, 10, 120, 50);

#[derive(Parser, Debug)]
#[command(author, version, about = "Camera kiosk with three children's mini-games", long_about = None)]
struct Cli {
    /// JSON config file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Camera index (overrides the config file).
    #[arg(long)]
    camera: Option<u32>,
    /// Font to try before the configured candidates.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Requested capture width.
    #[arg(long)]
    width: Option<u32>,
    /// Requested capture height.
    #[arg(long)]
    height: Option<u32>,
}

impl Cli {
    fn into_config(self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(index) = self.camera {
            config.camera.index = index;
        }
        if let Some(width) = self.width {
            config.camera.width = width;
        }
        if let Some(height) = self.height {
            config.camera.height = height;
        }
        if let Some(font) = self.font {
            config.render.font_paths.insert(0, font);
        }
        Ok(config)
    }
}

/// Where the shell is: on the menu or inside one game.
enum Screen {
    Menu,
    Playing(AnyGame),
}

fn main() -> Result<()> {
    init_tracing();
    let config = Cli::parse().into_config()?;
    tracing::info!(camera = ?config.camera, "starting Rainbow Playground");

    /* --- Camera + window setup ---
       Visual: window opens with the live camera feed under the menu. */
    let mut cam = CameraCapture::open(&config.camera)?;
    let (w, h) = cam.resolution();
    let mut drawer = Drawer::new(&config.window, w as usize, h as usize)?;

    /* --- Shared renderer, clock and menu --- */
    let compositor = Rc::new(Compositor::from_font_paths(
        &config.render.font_paths,
        config.render.glyph_cache_capacity,
    ));
    let ctx = GameContext::new(Rc::clone(&compositor), Rc::new(SystemClock::new()));
    let mut menu = Menu::new(Rc::clone(&compositor));
    let mut screen = Screen::Menu;

    /* --- FPS ---
       Visual: small grey counter bottom-left. */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut fps_text = String::from("FPS: 0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() {
        /* 1) Grab a fresh mirrored frame. A dropped frame just skips this tick. */
        let Some(mut frame) = cam.read_mirrored_frame() else {
            drawer.pump();
            std::thread::sleep(Duration::from_millis(100));
            continue;
        };
        let click = drawer.take_click();

        /* 2) Menu or game draws onto the frame. */
        let mut next = None;
        match &mut screen {
            Screen::Menu => {
                menu.draw(&mut frame);
                if let Some(kind) = click.and_then(|(x, y)| menu.hit_test(x, y)) {
                    tracing::info!(game = kind.title(), "starting game");
                    next = Some(Screen::Playing(AnyGame::new(kind, &ctx)));
                }
            }
            Screen::Playing(game) => {
                game.on_frame(&mut frame);
                draw_back_button(&compositor, &mut frame);
                if let Some((x, y)) = click {
                    if BACK_BUTTON.contains(x, y) || game.is_finished() {
                        tracing::info!(game = game.kind().title(), "back to menu");
                        next = Some(Screen::Menu);
                    }
                }
            }
        }
        if let Some(s) = next {
            screen = s;
        }

        /* 3) FPS counter (logs + on-screen text once per second). */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            tracing::debug!(fps = frames_this_second, "frame rate");
            fps_text = format!("FPS: {frames_this_second}");
            frames_this_second = 0;
            last_fps_time = now;
        }
        let fps_y = frame.height as i32 - 20;
        compositor.draw_text(&mut frame, &fps_text, (10, fps_y), 14, rgb(100, 100, 100), false, false);

        /* 4) Present to the window. */
        drawer.present(&frame)?;

        /* 5) Keys: q/Q/ESC leave the game or quit; the rest go to the game. */
        let mut back_to_menu = false;
        for key in drawer.keys_pressed() {
            let leave = key == 'q' as u32 || key == 'Q' as u32 || key == KEY_ESCAPE;
            match &mut screen {
                Screen::Menu if leave => {
                    tracing::info!("quit requested");
                    return Ok(());
                }
                Screen::Playing(game) if leave => {
                    tracing::info!(game = game.kind().title(), "back to menu");
                    back_to_menu = true;
                    break;
                }
                Screen::Playing(game) => game.on_key(key),
                Screen::Menu => {}
            }
        }
        if back_to_menu {
            screen = Screen::Menu;
        }
    }

    Ok(())
}

/// "< Back" pill in the top-left corner.
fn draw_back_button(compositor: &Compositor, frame: &mut FrameBuffer) {
    compositor.draw_rounded_rect(frame, BACK_BUTTON, rgb(60, 60, 60), 12, None, 0.7);
    let center = (BACK_BUTTON.x + BACK_BUTTON.w / 2, BACK_BUTTON.y + BACK_BUTTON.h / 2);
    compositor.draw_text(frame, "< Back", center, 22, WHITE, false, true);
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
