//! Camera view, colors, and the draw-command sink.
//!
//! The kernel never talks to a graphics API. Components and the particle
//! engine emit [`DrawCommand`]s in screen space through a [`RenderFrame`];
//! whatever owns the window implements [`RenderSink`] and rasterizes them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::assets::AssetCatalog;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Linear RGBA color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgba(1.0, 0.0, 1.0, 1.0);
    pub const ORANGE: Color = Color::rgba(1.0, 128.0 / 255.0, 0.0, 1.0);
    pub const RED_CLEAR: Color = Color::rgba(1.0, 0.0, 0.0, 0.0);
    pub const GREY: Color = Color::rgba(0.5, 0.5, 0.5, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Component-wise interpolation; `t` is clamped to `0.0..=1.0`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Color::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// 2D camera: a world-space center, a zoom scale and the screen size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Vec2,
    pub scale: f32,
    pub screen: Vec2,
}

impl View {
    pub fn new(screen: Vec2) -> Self {
        Self {
            center: Vec2::ZERO,
            scale: 1.0,
            screen,
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.center) * self.scale + self.screen * 0.5
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.screen * 0.5) / self.scale + self.center
    }

    /// Half of the visible area, in world units.
    pub fn half_extent(&self) -> Vec2 {
        self.screen * 0.5 / self.scale
    }
}

// ---------------------------------------------------------------------------
// Draw commands
// ---------------------------------------------------------------------------

/// A screen-space drawing instruction. Positions are rectangle centers.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Sprite {
        texture: String,
        center: Vec2,
        size: Vec2,
        rotation: f32,
    },
    Rect {
        center: Vec2,
        size: Vec2,
        rotation: f32,
        color: Color,
    },
    /// One tile of a repeating background; `origin` is the top-left corner.
    Tile {
        texture: String,
        origin: Vec2,
        size: Vec2,
    },
    Hud {
        score: i64,
        high_score: i64,
        game_over: bool,
    },
}

/// Receiver of draw commands for one frame.
pub trait RenderSink {
    fn begin_frame(&mut self) {}
    fn draw(&mut self, command: DrawCommand);
    fn end_frame(&mut self) {}
}

/// Sink that keeps the commands of the most recent frame.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<DrawCommand>,
    pub frames: u64,
}

impl RenderSink for RecordingSink {
    fn begin_frame(&mut self) {
        self.commands.clear();
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}

/// Borrowed rendering state for one frame.
pub struct RenderFrame<'a> {
    pub view: &'a View,
    pub assets: &'a dyn AssetCatalog,
    /// Fraction of a tick left in the clock accumulator.
    pub alpha: f32,
    sink: &'a mut dyn RenderSink,
}

impl<'a> RenderFrame<'a> {
    pub fn new(view: &'a View, assets: &'a dyn AssetCatalog, sink: &'a mut dyn RenderSink, alpha: f32) -> Self {
        Self {
            view,
            assets,
            alpha,
            sink,
        }
    }

    pub fn draw(&mut self, command: DrawCommand) {
        self.sink.draw(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_lerp_endpoints_and_midpoint() {
        let start = Color::from_rgba8(255, 128, 0, 255);
        let end = Color::from_rgba8(255, 0, 0, 0);
        assert_eq!(start.lerp(end, 0.0), start);
        assert_eq!(start.lerp(end, 1.0), end);
        assert_eq!(start.lerp(end, 0.5).to_rgba8(), [255, 64, 0, 128]);
        assert_eq!(start.lerp(end, 7.0), end);
    }

    #[test]
    fn view_roundtrips_points() {
        let view = View {
            center: Vec2::new(500.0, -20.0),
            scale: 2.0,
            screen: Vec2::new(1280.0, 720.0),
        };
        assert_eq!(view.world_to_screen(view.center), Vec2::new(640.0, 360.0));
        let p = Vec2::new(123.0, 45.0);
        let back = view.screen_to_world(view.world_to_screen(p));
        assert!((back - p).length() < 1e-3);
        assert_eq!(view.half_extent(), Vec2::new(320.0, 180.0));
    }
}
