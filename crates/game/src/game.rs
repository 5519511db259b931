//! Composition root: scene, cameras, render targets and layers, and the per-frame order.

use anyhow::{Context, Result};
use engine_core::{look_rotation, rotate_towards, Transform};
use glam::{Quat, Vec3};
use input::{FlightControls, InputState, KeyCode};
use renderer::{
    Camera, Palette, RenderLayer, RenderTargetKind, Renderer, Scene, TimeOfDay, LIST_FLATS, LIST_HUD,
    LIST_PARTICLES, LIST_VOLUMES,
};
use tiny_skia::Pixmap;

use crate::aircraft::{Aircraft, Telemetry};
use crate::config::GameConfig;
use crate::hud::CockpitHud;
use crate::models;
use crate::scenery::{Ground, Scenery};

pub const TARGET_MAIN: &str = "main";
pub const TARGET_MIRROR: &str = "mirror";
pub const TARGET_HUD: &str = "hud";

const FOV_DEGREES: f32 = 60.0;
const NEAR: f32 = 0.5;
const FAR: f32 = 12_000.0;
/// Chase camera offset behind and above the aircraft.
const CHASE_DISTANCE: f32 = 18.0;
const CHASE_HEIGHT: f32 = 4.5;
/// Radians per second the chase camera may turn to catch up.
const CHASE_TURN_RATE: f32 = 2.5;
/// Eye point in aircraft space.
const COCKPIT_EYE: Vec3 = Vec3::new(0.0, 0.9, -1.0);
/// Mirror strip size as a share of the logical frame.
const MIRROR_WIDTH: f32 = 0.4;
const MIRROR_HEIGHT: f32 = 0.16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Chase,
    Cockpit,
}

impl CameraMode {
    fn toggled(self) -> Self {
        match self {
            CameraMode::Chase => CameraMode::Cockpit,
            CameraMode::Cockpit => CameraMode::Chase,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraMode::Chase => "CHASE",
            CameraMode::Cockpit => "COCKPIT",
        }
    }
}

pub struct Game {
    renderer: Renderer,
    scene: Scene,
    controls: FlightControls,
    camera_mode: CameraMode,
    main_camera: Camera,
    mirror_camera: Camera,
    show_mirror: bool,
    time_of_day: TimeOfDay,
    running: bool,
}

impl Game {
    pub fn new(config: &GameConfig) -> Result<Self> {
        let (lw, lh) = (config.logical_width, config.logical_height);
        let time_of_day = if config.night { TimeOfDay::Night } else { TimeOfDay::Day };
        let mut renderer = Renderer::new(lw, lh, Palette::for_time(time_of_day))?;
        renderer.set_text_effect(config.hud_text_effect);

        renderer.create_render_target(TARGET_MAIN, RenderTargetKind::Raster, 0.0, 0.0, lw, lh)?;
        let (mw, mh) = (
            ((lw as f32 * MIRROR_WIDTH) as u32).max(1),
            ((lh as f32 * MIRROR_HEIGHT) as u32).max(1),
        );
        let mirror_x = ((lw - mw) / 2) as f32;
        renderer.create_render_target(TARGET_MIRROR, RenderTargetKind::Raster, mirror_x, 2.0, mw, mh)?;
        renderer.create_render_target(TARGET_HUD, RenderTargetKind::Canvas, 0.0, 0.0, lw, lh)?;
        for list in [LIST_FLATS, LIST_VOLUMES, LIST_PARTICLES, LIST_HUD] {
            renderer.create_render_list(list)?;
        }

        // Flats paint in submission order: the ground goes in before the runway.
        let mut scene = Scene::new();
        scene.add(Box::new(Ground::new()));
        scene.add(Box::new(Scenery::new(config.seed, config.lod_bias)));
        scene.add(Box::new(Aircraft::new(
            config.flight_model,
            models::aircraft(),
            config.lod_bias,
            config.smoke.clone(),
            config.seed ^ 0xA5A5,
        )));
        scene.add(Box::new(CockpitHud::new()));

        let mut main_camera = Camera::perspective(FOV_DEGREES, 1.0, NEAR, FAR);
        main_camera.set_aspect(lw, lh);
        let mut mirror_camera = Camera::perspective(FOV_DEGREES, 1.0, NEAR, FAR);
        mirror_camera.set_aspect(mw, mh);

        let mut game = Self {
            renderer,
            scene,
            controls: FlightControls::new(),
            camera_mode: CameraMode::Chase,
            main_camera,
            mirror_camera,
            show_mirror: config.show_mirror,
            time_of_day,
            running: true,
        };
        game.snap_cameras();
        game.publish_telemetry();
        log::info!(
            "Game ready: {}x{} logical, {:?} flight model, {:?}",
            lw,
            lh,
            config.flight_model,
            time_of_day
        );
        Ok(game)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    pub fn output(&self) -> &Pixmap {
        self.renderer.output()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        self.renderer
            .set_viewport(width, height)
            .with_context(|| format!("resizing output to {width}x{height}"))
    }

    pub fn aircraft(&self) -> Option<&Aircraft> {
        self.scene.find::<Aircraft>()
    }

    pub fn aircraft_mut(&mut self) -> Option<&mut Aircraft> {
        self.scene.find_mut::<Aircraft>()
    }

    pub fn telemetry(&self) -> Telemetry {
        self.aircraft().map(Aircraft::telemetry).unwrap_or_default()
    }

    /// One frame: input, scene update, cameras, render.
    pub fn frame(&mut self, input: &InputState, delta: f32) -> Result<()> {
        self.handle_commands(input);
        let controls = self.controls;
        if let Some(aircraft) = self.aircraft_mut() {
            controls.apply(input, aircraft.flight_mut(), delta);
        }

        self.scene.update(delta);
        self.update_cameras(delta);
        self.publish_telemetry();
        self.render()
    }

    fn handle_commands(&mut self, input: &InputState) {
        if input.is_key_pressed(KeyCode::Escape) {
            self.running = false;
        }
        if input.is_key_pressed(KeyCode::KeyC) {
            self.camera_mode = self.camera_mode.toggled();
            self.snap_cameras();
            log::info!("Camera: {}", self.camera_mode.label());
        }
        if input.is_key_pressed(KeyCode::KeyN) {
            self.time_of_day = self.time_of_day.toggled();
            self.renderer.set_palette(Palette::for_time(self.time_of_day));
        }
        if input.is_key_pressed(KeyCode::KeyM) {
            self.show_mirror = !self.show_mirror;
        }
        if input.is_key_pressed(KeyCode::KeyH) {
            let effect = self.renderer.text_effect().cycled();
            self.renderer.set_text_effect(effect);
            log::info!("HUD text effect: {:?}", effect);
        }
        if input.is_key_pressed(KeyCode::KeyR) {
            if let Some(aircraft) = self.aircraft_mut() {
                aircraft.reset();
            }
            self.snap_cameras();
        }
    }

    fn layers(&self) -> Vec<RenderLayer> {
        let mut layers = vec![RenderLayer::raster(
            self.main_camera.clone(),
            TARGET_MAIN,
            &[LIST_FLATS, LIST_VOLUMES, LIST_PARTICLES],
        )];
        if self.show_mirror {
            layers.push(RenderLayer::raster(
                self.mirror_camera.clone(),
                TARGET_MIRROR,
                &[LIST_FLATS, LIST_VOLUMES],
            ));
        }
        layers.push(RenderLayer::canvas(TARGET_HUD, &[LIST_HUD]));
        layers
    }

    fn render(&mut self) -> Result<()> {
        let layers = self.layers();
        self.renderer.render(&self.scene, &layers)?;
        Ok(())
    }

    fn aircraft_transform(&self) -> Transform {
        self.aircraft().map(|a| *a.transform()).unwrap_or_default()
    }

    fn cockpit_transform(&self) -> Transform {
        let plane = self.aircraft_transform();
        Transform::from_position_rotation(plane.transform_point(COCKPIT_EYE), plane.rotation)
    }

    /// Chase eye and orientation for the current aircraft pose.
    fn chase_pose(&self) -> (Vec3, Quat) {
        let plane = self.aircraft_transform();
        let forward = plane.forward();
        let mut eye = plane.position - forward * CHASE_DISTANCE + Vec3::Y * CHASE_HEIGHT;
        eye.y = eye.y.max(NEAR * 2.0);
        let target = plane.position + forward * 10.0;
        (eye, look_rotation(target - eye, Vec3::Y))
    }

    /// Jump every camera to its target pose without smoothing.
    fn snap_cameras(&mut self) {
        match self.camera_mode {
            CameraMode::Chase => {
                let (eye, rotation) = self.chase_pose();
                self.main_camera.transform = Transform::from_position_rotation(eye, rotation);
            }
            CameraMode::Cockpit => self.main_camera.transform = self.cockpit_transform(),
        }
        self.update_mirror();
        self.sync_visibility();
    }

    fn update_cameras(&mut self, delta: f32) {
        match self.camera_mode {
            CameraMode::Chase => {
                let (eye, rotation) = self.chase_pose();
                let current = self.main_camera.transform.rotation;
                self.main_camera.transform = Transform::from_position_rotation(
                    eye,
                    rotate_towards(current, rotation, CHASE_TURN_RATE * delta),
                );
            }
            CameraMode::Cockpit => self.main_camera.transform = self.cockpit_transform(),
        }
        self.update_mirror();
        self.sync_visibility();
    }

    /// The mirror looks backwards from the cockpit.
    fn update_mirror(&mut self) {
        let eye = self.cockpit_transform();
        self.mirror_camera.transform =
            Transform::from_position_rotation(eye.position, eye.rotation * Quat::from_rotation_y(std::f32::consts::PI));
    }

    fn sync_visibility(&mut self) {
        let cockpit = self.camera_mode == CameraMode::Cockpit;
        if let Some(aircraft) = self.aircraft_mut() {
            aircraft.visible = !cockpit;
        }
    }

    fn publish_telemetry(&mut self) {
        let telemetry = self.telemetry();
        let cockpit = self.camera_mode == CameraMode::Cockpit;
        let label = self.camera_mode.label();
        if let Some(hud) = self.scene.find_mut::<CockpitHud>() {
            hud.telemetry = telemetry;
            hud.show_ladder = cockpit;
            hud.status = label.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input::ElementState;
    use renderer::TextEffect;

    fn config() -> GameConfig {
        GameConfig {
            logical_width: 160,
            logical_height: 100,
            ..GameConfig::default()
        }
    }

    fn press(input: &mut InputState, key: KeyCode) {
        input.process_keyboard(key, ElementState::Pressed);
    }

    /// Every game owns raster targets, so these tests need a GPU adapter.
    fn gpu_missing() -> bool {
        match renderer::GpuContext::shared() {
            Ok(_) => false,
            Err(e) => {
                eprintln!("skipping game test: {e}");
                true
            }
        }
    }

    #[test]
    fn builds_and_renders_a_frame() {
        if gpu_missing() {
            return;
        }
        let mut game = Game::new(&config()).expect("game");
        let input = InputState::new();
        game.frame(&input, 1.0 / 60.0).expect("frame");
        assert_eq!(game.output().width(), 160);
        assert!(game.telemetry().landed);
        // Sky above the horizon, ground below it.
        let px = |x: u32, y: u32| {
            let i = ((y * 160 + x) * 4) as usize;
            let d = game.output().data();
            [d[i], d[i + 1], d[i + 2]]
        };
        let sky = Palette::day().background;
        assert_eq!(px(150, 14), [sky.r, sky.g, sky.b]);
        assert_ne!(px(80, 97), [sky.r, sky.g, sky.b]);
    }

    #[test]
    fn throttle_key_spools_the_engine() {
        if gpu_missing() {
            return;
        }
        let mut game = Game::new(&config()).expect("game");
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyA);
        for _ in 0..(60 * 5) {
            game.frame(&input, 1.0 / 60.0).expect("frame");
            input.end_frame();
        }
        let t = game.telemetry();
        assert_eq!(t.throttle, 1.0);
        assert!(t.effective_throttle > 0.0);
        assert!(!t.crashed);
    }

    #[test]
    fn commands_toggle_state() {
        if gpu_missing() {
            return;
        }
        let mut game = Game::new(&config()).expect("game");
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyC);
        press(&mut input, KeyCode::KeyN);
        game.frame(&input, 1.0 / 60.0).expect("frame");
        assert_eq!(game.camera_mode(), CameraMode::Cockpit);
        assert_eq!(game.time_of_day(), TimeOfDay::Night);
        assert!(game.aircraft().is_some_and(|a| !a.visible));
        assert!(game.is_running());

        input.end_frame();
        press(&mut input, KeyCode::Escape);
        game.frame(&input, 1.0 / 60.0).expect("frame");
        assert!(!game.is_running());
    }

    #[test]
    fn reset_returns_to_the_runway() {
        if gpu_missing() {
            return;
        }
        let mut game = Game::new(&config()).expect("game");
        if let Some(a) = game.aircraft_mut() {
            a.flight_mut()
                .state_mut()
                .place_in_air(Vec3::new(0.0, 300.0, -500.0), Quat::IDENTITY, 50.0);
        }
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyR);
        game.frame(&input, 1.0 / 60.0).expect("frame");
        let position = game.aircraft().map(|a| a.transform().position).unwrap_or(Vec3::NAN);
        assert!(position.y < 2.0 && position.z.abs() < 1.0, "{position:?}");
    }

    #[test]
    fn hud_text_effect_comes_from_config_and_cycles() {
        if gpu_missing() {
            return;
        }
        let render_with = |effect: TextEffect| {
            let config = GameConfig {
                hud_text_effect: effect,
                ..config()
            };
            let mut game = Game::new(&config).expect("game");
            game.frame(&InputState::new(), 1.0 / 60.0).expect("frame");
            game
        };
        let plain = render_with(TextEffect::None);
        let mut outlined = render_with(TextEffect::Outline);
        assert_eq!(outlined.renderer.text_effect(), TextEffect::Outline);
        assert_ne!(plain.output().data(), outlined.output().data());

        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyH);
        outlined.frame(&input, 1.0 / 60.0).expect("frame");
        assert_eq!(outlined.renderer.text_effect(), TextEffect::None);
    }
}
