//! Retroflight - a low-resolution dithered flight sim.
//!
//! Native kernel: a winit event loop presents the composed frame through `pixels`, with an
//! optional headless mode that renders a fixed number of frames to a PNG.

mod aircraft;
mod config;
mod events;
mod game;
mod hud;
mod kernel;
mod models;
mod scenery;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use engine_core::Time;
use input::{ElementState, InputState, KeyCode};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use config::GameConfig;
use game::Game;
use kernel::FrameLimiter;

/// Longest simulated step handed to the game after a hitch.
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);
const HEADLESS_DELTA: Duration = Duration::from_nanos(16_666_667);

/// Everything alive while the window is open.
pub struct GameState {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    game: Game,
    input: InputState,
    time: Time,
    limiter: FrameLimiter,
    /// Real time accumulated over refreshes the limiter held back.
    pending: Duration,
    title: String,
    running: bool,
}

impl GameState {
    fn new(window: Arc<Window>, config: &GameConfig) -> Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let surface = SurfaceTexture::new(width, height, Arc::clone(&window));
        let pixels = Pixels::new(width, height, surface).context("creating pixel surface")?;

        let mut game = Game::new(config)?;
        game.set_viewport(width, height)?;

        Ok(Self {
            window,
            pixels,
            game,
            input: InputState::new(),
            time: Time::new(),
            limiter: FrameLimiter::new(config.target_fps),
            pending: Duration::ZERO,
            title: String::new(),
            running: true,
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            // Minimised.
            return Ok(());
        }
        self.pixels
            .resize_surface(width, height)
            .context("resizing surface")?;
        self.pixels
            .resize_buffer(width, height)
            .context("resizing pixel buffer")?;
        self.game.set_viewport(width, height)
    }

    /// Runs one kernel tick: maybe a game frame, then presents.
    fn redraw(&mut self) -> Result<()> {
        self.time.update();
        self.pending += self.time.delta();
        if !self.limiter.tick(self.time.delta()) {
            return Ok(());
        }
        let delta = self.pending.min(MAX_FRAME_DELTA);
        self.pending = Duration::ZERO;

        self.game.frame(&self.input, delta.as_secs_f32())?;
        self.input.end_frame();
        if !self.game.is_running() {
            self.running = false;
            return Ok(());
        }

        self.update_title();
        let output = self.game.output().data();
        let frame = self.pixels.frame_mut();
        if frame.len() == output.len() {
            frame.copy_from_slice(output);
        }
        self.pixels.render().context("presenting frame")?;
        Ok(())
    }

    /// Window title carries the camera mode and time of day.
    fn update_title(&mut self) {
        let title = window_title(&self.game);
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }
}

fn window_title(game: &Game) -> String {
    format!("Retroflight - {} - {:?}", game.camera_mode().label(), game.time_of_day())
}

fn log_pacing(limiter: &FrameLimiter) {
    log::info!(
        "{} frames run, {} refreshes skipped (cap {} fps)",
        limiter.frames(),
        limiter.skipped(),
        limiter.target_fps()
    );
}

/// Application handler for winit.
struct App {
    config: GameConfig,
    state: Option<GameState>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            state: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("Retroflight")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("creating window"));
                return;
            }
        };

        match GameState::new(Arc::clone(&window), &self.config) {
            Ok(s) => {
                self.state = Some(s);
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e.context("initializing game")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        let result = state
            .handle_window_event(event)
            .map(|exit| exit || !state.running);
        match result {
            Ok(true) => event_loop.exit(),
            Ok(false) => {}
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

/// Renders `frames` frames at a fixed 1/60 s with full throttle and optionally saves the last one.
fn run_headless(config: &GameConfig, frames: u64, out: Option<PathBuf>) -> Result<()> {
    let mut game = Game::new(config)?;
    game.set_viewport(config.logical_width, config.logical_height)?;
    let mut input = InputState::new();
    input.process_keyboard(KeyCode::KeyA, ElementState::Pressed);

    let mut limiter = FrameLimiter::new(config.target_fps);
    let mut pending = Duration::ZERO;
    while limiter.frames() < frames {
        pending += HEADLESS_DELTA;
        if !limiter.tick(HEADLESS_DELTA) {
            continue;
        }
        game.frame(&input, pending.min(MAX_FRAME_DELTA).as_secs_f32())?;
        pending = Duration::ZERO;
        input.end_frame();
    }

    let t = game.telemetry();
    log::info!(
        "Headless run done: {}, airspeed {:.1} m/s, altitude {:.1} m, landed {}, crashed {}",
        window_title(&game),
        t.airspeed,
        t.altitude,
        t.landed,
        t.crashed
    );
    if let Some(aircraft) = game.aircraft() {
        log::info!(
            "{:?} flight model, {} smoke puffs alive",
            aircraft.flight().kind(),
            aircraft.smoke().alive()
        );
    }
    log_pacing(&limiter);

    if let Some(path) = out {
        let output = game.output();
        let image = image::RgbaImage::from_raw(output.width(), output.height(), output.data().to_vec())
            .context("frame buffer size mismatch")?;
        image
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Saved frame to {}", path.display());
    }
    Ok(())
}

fn print_banner() {
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                       RETROFLIGHT                        ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  CONTROLS:                                               ║");
    println!("║    Up/Down    - Pitch          │  Left/Right - Roll      ║");
    println!("║    Z/X        - Yaw            │  A/Q or +/- - Throttle  ║");
    println!("║    G          - Landing gear   │  F          - Flaps     ║");
    println!("║    C          - Chase/cockpit  │  M          - Mirror    ║");
    println!("║    N          - Day/night      │  R          - Reset     ║");
    println!("║    H          - HUD text style │  Escape     - Quit      ║");
    println!("╚══════════════════════════════════════════════════════════╝");
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load_or_create();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("--headless") {
        let Some(frames) = args.get(1) else {
            bail!("usage: retroflight --headless <frames> [out.png]");
        };
        let frames: u64 = frames
            .parse()
            .with_context(|| format!("invalid frame count {frames:?}"))?;
        return run_headless(&config, frames, args.get(2).map(PathBuf::from));
    }

    print_banner();
    log::info!("Starting Retroflight");

    let event_loop = EventLoop::new()?;
    // The limiter paces frames; poll so every display refresh reaches it.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    if let Some(state) = &app.state {
        log_pacing(&state.limiter);
    }

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_title_tracks_camera_and_time_of_day() {
        if let Err(e) = renderer::GpuContext::shared() {
            eprintln!("skipping title test: {e}");
            return;
        }
        let config = GameConfig {
            logical_width: 160,
            logical_height: 100,
            ..GameConfig::default()
        };
        let mut game = Game::new(&config).expect("game");
        assert_eq!(window_title(&game), "Retroflight - CHASE - Day");

        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyC, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyN, ElementState::Pressed);
        game.frame(&input, 1.0 / 60.0).expect("frame");
        assert_eq!(window_title(&game), "Retroflight - COCKPIT - Night");
    }
}
