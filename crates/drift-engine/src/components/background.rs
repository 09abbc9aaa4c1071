use glam::Vec2;

use crate::component::{Component, ComponentRegistry};
use crate::render::{DrawCommand, RenderFrame};

/// Upper bound on tiles per frame, reached only with degenerate tile sizes.
const MAX_TILES: i32 = 4096;

/// Screen-filling repeated texture that scrolls with the camera.
///
/// `parallax` scales how far the pattern moves relative to the camera:
/// 1.0 tracks the world, 0.0 is pinned to the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    texture: String,
    tile: Vec2,
    parallax: f32,
}

impl Background {
    pub fn new(texture: impl Into<String>, tile: Vec2, parallax: f32) -> Self {
        Self {
            texture: texture.into(),
            tile,
            parallax,
        }
    }

    pub fn texture(&self) -> &str {
        &self.texture
    }
}

impl Component for Background {
    fn render(&self, _siblings: &ComponentRegistry, frame: &mut RenderFrame<'_>) {
        if !frame.assets.has_texture(&self.texture) {
            return;
        }
        let view = *frame.view;
        let tile = self.tile * view.scale;
        if tile.x <= 0.0 || tile.y <= 0.0 {
            return;
        }

        let scroll = view.center * self.parallax * view.scale;
        let start = -Vec2::new(scroll.x.rem_euclid(tile.x), scroll.y.rem_euclid(tile.y));
        let cols = (view.screen.x / tile.x).ceil() as i32 + 1;
        let rows = (view.screen.y / tile.y).ceil() as i32 + 1;
        if cols.saturating_mul(rows) > MAX_TILES {
            return;
        }

        for row in 0..rows {
            for col in 0..cols {
                frame.draw(DrawCommand::Tile {
                    texture: self.texture.clone(),
                    origin: start + Vec2::new(col as f32 * tile.x, row as f32 * tile.y),
                    size: tile,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetManifest;
    use crate::entity::EntityId;
    use crate::render::{RecordingSink, View};

    fn tiles(assets: &AssetManifest, center: Vec2) -> Vec<DrawCommand> {
        let mut registry = ComponentRegistry::new();
        registry.add(EntityId::new(0, 0), Background::new("stars", Vec2::new(100.0, 100.0), 0.5));
        let mut view = View::new(Vec2::new(250.0, 150.0));
        view.center = center;
        let mut sink = RecordingSink::default();
        let mut frame = RenderFrame::new(&view, assets, &mut sink, 0.0);
        registry.render_all(&mut frame);
        sink.commands
    }

    #[test]
    fn covers_screen_with_scrolled_tiles() {
        let assets = AssetManifest::new().with_texture("stars", 100, 100);
        let commands = tiles(&assets, Vec2::new(60.0, 0.0));
        // ceil(2.5) + 1 columns, ceil(1.5) + 1 rows.
        assert_eq!(commands.len(), 12);
        match &commands[0] {
            DrawCommand::Tile { origin, .. } => assert_eq!(*origin, Vec2::new(-30.0, 0.0)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn missing_texture_draws_nothing() {
        assert!(tiles(&AssetManifest::new(), Vec2::ZERO).is_empty());
    }
}
