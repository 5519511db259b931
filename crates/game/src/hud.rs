//! Cockpit HUD: flight instruments painted onto the HUD canvas layer.

use std::any::Any;

use renderer::{Canvas, Entity, RenderContext, Rgb, LIST_HUD};

use crate::aircraft::Telemetry;

const MARGIN: f32 = 4.0;
const MS_TO_KNOTS: f32 = 1.943_844;
const M_TO_FEET: f32 = 3.280_84;
/// Pitch ladder spacing in canvas pixels per degree.
const LADDER_PIXELS_PER_DEGREE: f32 = 2.0;
const LADDER_STEP_DEGREES: i32 = 10;
const THROTTLE_BAR_HEIGHT: f32 = 40.0;
const WARNING: Rgb = Rgb::new(255, 64, 48);

/// Fixed-size instrument readout. The game copies fresh telemetry in every frame.
#[derive(Debug, Default)]
pub struct CockpitHud {
    pub telemetry: Telemetry,
    /// Draw the horizon and pitch ladder (cockpit view only).
    pub show_ladder: bool,
    /// Short status line at the bottom centre, e.g. the active camera.
    pub status: String,
    /// Seconds since start, drives warning blink.
    clock: f32,
}

impl CockpitHud {
    pub fn new() -> Self {
        Self::default()
    }

    fn blink_on(&self) -> bool {
        (self.clock * 2.0).fract() < 0.5
    }

    fn draw_readouts(&self, canvas: &mut Canvas, color: Rgb) {
        let t = &self.telemetry;
        let w = canvas.width() as f32;
        let line = canvas.text_height() as f32 + 2.0;

        canvas.text(MARGIN, MARGIN, &format!("SPD {:3.0}", t.airspeed * MS_TO_KNOTS), color);
        canvas.text(MARGIN, MARGIN + line, &format!("VS {:+4.0}", t.vertical_speed * M_TO_FEET * 60.0 / 100.0), color);

        let alt = format!("ALT {:5.0}", t.altitude.max(0.0) * M_TO_FEET);
        let alt_w = canvas.text_width(&alt) as f32;
        canvas.text(w - MARGIN - alt_w, MARGIN, &alt, color);

        let heading = (t.heading.round() as i32).rem_euclid(360);
        canvas.text_centered(w * 0.5, MARGIN, &format!("HDG {heading:03}"), color);
    }

    fn draw_throttle(&self, canvas: &mut Canvas, color: Rgb) {
        let h = canvas.height() as f32;
        let x = MARGIN;
        let bottom = h - MARGIN - canvas.text_height() as f32 - 3.0;
        let top = bottom - THROTTLE_BAR_HEIGHT;
        canvas.stroke_rect(x, top, 6.0, THROTTLE_BAR_HEIGHT, color);
        let fill = THROTTLE_BAR_HEIGHT * self.telemetry.effective_throttle.clamp(0.0, 1.0);
        canvas.fill_rect(x + 1.0, bottom - fill, 4.0, fill, color);
        // Lever position; the engine spools towards it.
        let lever = bottom - THROTTLE_BAR_HEIGHT * self.telemetry.throttle.clamp(0.0, 1.0);
        canvas.line((x + 7.0, lever), (x + 10.0, lever), color);
        canvas.text(x, h - MARGIN - canvas.text_height() as f32, "THR", color);
    }

    fn draw_configuration(&self, canvas: &mut Canvas, color: Rgb) {
        let t = &self.telemetry;
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let line = canvas.text_height() as f32 + 2.0;
        let gear = if t.gear_down { "GEAR DN" } else { "GEAR UP" };
        let flaps = if t.flaps_extended { "FLAPS" } else { "" };
        for (row, text) in [flaps, gear].into_iter().enumerate() {
            let y = h - MARGIN - line * (row as f32 + 1.0) + 2.0;
            let tw = canvas.text_width(text) as f32;
            canvas.text(w - MARGIN - tw, y, text, color);
        }
    }

    fn draw_ladder(&self, canvas: &mut Canvas, color: Rgb) {
        let t = &self.telemetry;
        let cx = canvas.width() as f32 * 0.5;
        let cy = canvas.height() as f32 * 0.5;
        let roll = -t.roll.to_radians();
        let (sin, cos) = roll.sin_cos();
        let rotate = |x: f32, y: f32| (cx + x * cos - y * sin, cy + x * sin + y * cos);

        let first = ((t.pitch as i32) / LADDER_STEP_DEGREES - 2) * LADDER_STEP_DEGREES;
        for k in 0..5 {
            let rung = first + k * LADDER_STEP_DEGREES;
            if !(-90..=90).contains(&rung) {
                continue;
            }
            let y = (t.pitch - rung as f32) * LADDER_PIXELS_PER_DEGREE;
            let half = if rung == 0 { 40.0 } else { 16.0 };
            canvas.line(rotate(-half, y), rotate(-6.0, y), color);
            canvas.line(rotate(6.0, y), rotate(half, y), color);
        }
        // Boresight.
        canvas.line((cx - 3.0, cy), (cx + 3.0, cy), color);
        canvas.line((cx, cy - 2.0), (cx, cy + 2.0), color);
    }

    fn draw_warnings(&self, canvas: &mut Canvas) {
        let t = &self.telemetry;
        let cx = canvas.width() as f32 * 0.5;
        let y = canvas.height() as f32 * 0.5 + 24.0;
        if t.crashed {
            canvas.text_centered(cx, y, "CRASHED", WARNING);
            canvas.text_centered(cx, y + canvas.text_height() as f32 + 3.0, "PRESS R TO RESET", WARNING);
        } else if t.stalling && self.blink_on() {
            canvas.text_centered(cx, y, "STALL", WARNING);
        }
    }
}

impl Entity for CockpitHud {
    fn update(&mut self, delta: f32) {
        self.clock += delta;
    }

    fn render_2d(&self, ctx: &RenderContext, list: &str, canvas: &mut Canvas) {
        if list != LIST_HUD {
            return;
        }
        let color = ctx.palette.hud;
        self.draw_readouts(canvas, color);
        self.draw_throttle(canvas, color);
        self.draw_configuration(canvas, color);
        if self.show_ladder {
            self.draw_ladder(canvas, color);
        }
        self.draw_warnings(canvas);
        if !self.status.is_empty() {
            let y = canvas.height() as f32 - MARGIN - canvas.text_height() as f32;
            canvas.text_centered(canvas.width() as f32 * 0.5, y, &self.status, color);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
