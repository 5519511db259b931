//! 2D painting surface handed to entities for canvas layers.

use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::font::{glyph, glyph_pixel, text_width, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::palette::Rgb;

/// How HUD text is separated from whatever is behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEffect {
    None,
    /// One font pixel down-right in the effect colour.
    #[default]
    Shadow,
    /// All eight neighbours in the effect colour.
    Outline,
}

impl TextEffect {
    /// None, shadow, outline, then back to none.
    pub fn cycled(self) -> Self {
        match self {
            TextEffect::None => TextEffect::Shadow,
            TextEffect::Shadow => TextEffect::Outline,
            TextEffect::Outline => TextEffect::None,
        }
    }
}

pub struct Canvas<'a> {
    pixmap: &'a mut Pixmap,
    pub text_effect: TextEffect,
    pub effect_color: Rgb,
    /// Font pixel size in canvas pixels.
    pub text_scale: u32,
}

fn paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = false;
    paint
}

impl<'a> Canvas<'a> {
    pub fn new(pixmap: &'a mut Pixmap, text_effect: TextEffect, effect_color: Rgb) -> Self {
        Self {
            pixmap,
            text_effect,
            effect_color,
            text_scale: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            self.pixmap.fill_rect(rect, &paint(color), Transform::identity(), None);
        }
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        if let Some(rect) = Rect::from_xywh(x, y, width, height) {
            let path = PathBuilder::from_rect(rect);
            let stroke = Stroke { width: 1.0, ..Stroke::default() };
            self.pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
        }
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        if let Some(path) = pb.finish() {
            let stroke = Stroke { width: 1.0, ..Stroke::default() };
            self.pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
        }
    }

    /// Filled convex polygon.
    pub fn polygon(&mut self, points: &[(f32, f32)], color: Rgb) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(first.0, first.1);
        for p in rest {
            pb.line_to(p.0, p.1);
        }
        pb.close();
        if let Some(path) = pb.finish() {
            self.pixmap
                .fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Width of `text` in canvas pixels at the current scale.
    pub fn text_width(&self, text: &str) -> u32 {
        text_width(text) * self.text_scale
    }

    pub fn text_height(&self) -> u32 {
        GLYPH_HEIGHT * self.text_scale
    }

    /// Draw `text` with its top-left corner at (`x`, `y`), applying the text effect.
    pub fn text(&mut self, x: f32, y: f32, text: &str, color: Rgb) {
        let s = self.text_scale as f32;
        match self.text_effect {
            TextEffect::None => {}
            TextEffect::Shadow => self.glyphs(x + s, y + s, text, self.effect_color),
            TextEffect::Outline => {
                for (dx, dy) in [(-1.0, -1.0), (0.0, -1.0), (1.0, -1.0), (-1.0, 0.0), (1.0, 0.0), (-1.0, 1.0), (0.0, 1.0), (1.0, 1.0)] {
                    self.glyphs(x + dx * s, y + dy * s, text, self.effect_color);
                }
            }
        }
        self.glyphs(x, y, text, color);
    }

    /// Text centred horizontally on `cx`.
    pub fn text_centered(&mut self, cx: f32, y: f32, text: &str, color: Rgb) {
        let w = self.text_width(text) as f32;
        self.text((cx - w * 0.5).round(), y, text, color);
    }

    fn glyphs(&mut self, x: f32, y: f32, text: &str, color: Rgb) {
        let s = self.text_scale as f32;
        let paint = paint(color);
        let mut pen = x;
        for c in text.chars() {
            let g = glyph(c);
            for gy in 0..GLYPH_HEIGHT {
                for gx in 0..GLYPH_WIDTH {
                    if !glyph_pixel(&g, gx, gy) {
                        continue;
                    }
                    if let Some(rect) = Rect::from_xywh(pen + gx as f32 * s, y + gy as f32 * s, s, s) {
                        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                    }
                }
            }
            pen += GLYPH_ADVANCE as f32 * s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * pixmap.width() + x) * 4) as usize;
        let d = pixmap.data();
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    }

    #[test]
    fn draws_glyph_pixels() {
        let mut pixmap = Pixmap::new(16, 8).expect("pixmap");
        let mut canvas = Canvas::new(&mut pixmap, TextEffect::None, Rgb::BLACK);
        canvas.text(0.0, 0.0, "1", Rgb::new(255, 0, 0));
        assert_eq!(pixel(&pixmap, 1, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&pixmap, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn shadow_lands_down_right() {
        let mut pixmap = Pixmap::new(16, 8).expect("pixmap");
        let mut canvas = Canvas::new(&mut pixmap, TextEffect::Shadow, Rgb::new(0, 0, 255));
        canvas.text(0.0, 0.0, "1", Rgb::new(255, 0, 0));
        // Right of the top stroke of "1" is empty in the glyph, filled by the shadow.
        assert_eq!(pixel(&pixmap, 2, 1), [0, 0, 255, 255]);
        assert_eq!(pixel(&pixmap, 1, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn outline_surrounds_text() {
        let mut pixmap = Pixmap::new(16, 8).expect("pixmap");
        let mut canvas = Canvas::new(&mut pixmap, TextEffect::Outline, Rgb::new(0, 0, 255));
        canvas.text(1.0, 1.0, ".", Rgb::WHITE);
        // "." is a single pixel at glyph (1, 4).
        assert_eq!(pixel(&pixmap, 2, 5), [255, 255, 255, 255]);
        for (x, y) in [(1, 4), (3, 4), (1, 6), (3, 6), (2, 4), (2, 6)] {
            assert_eq!(pixel(&pixmap, x, y), [0, 0, 255, 255], "at {x},{y}");
        }
    }

    #[test]
    fn scaled_text_width() {
        let mut pixmap = Pixmap::new(4, 4).expect("pixmap");
        let mut canvas = Canvas::new(&mut pixmap, TextEffect::None, Rgb::BLACK);
        canvas.text_scale = 2;
        assert_eq!(canvas.text_width("AB"), 14);
        assert_eq!(canvas.text_height(), 10);
    }

    #[test]
    fn text_effects_cycle_back_to_none() {
        let mut effect = TextEffect::None;
        let mut seen = Vec::new();
        for _ in 0..3 {
            effect = effect.cycled();
            seen.push(effect);
        }
        assert_eq!(seen, vec![TextEffect::Shadow, TextEffect::Outline, TextEffect::None]);
    }
}
