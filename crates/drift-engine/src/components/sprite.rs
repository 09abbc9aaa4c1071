use glam::Vec2;
use tracing::debug;

use crate::assets::AssetCatalog;
use crate::component::{Component, ComponentRegistry};
use crate::entity::EntityId;
use crate::render::{Color, DrawCommand, RenderFrame};

use super::Transform;

/// Textured quad centered on the owner's transform.
///
/// When the texture key does not resolve in the asset catalog, the sprite is
/// drawn as a flat rectangle in its fallback color instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    texture: Option<String>,
    size: Vec2,
    color: Color,
}

impl Sprite {
    pub fn textured(texture: impl Into<String>, size: Vec2) -> Self {
        Self {
            texture: Some(texture.into()),
            size,
            color: Color::WHITE,
        }
    }

    pub fn flat(size: Vec2, color: Color) -> Self {
        Self {
            texture: None,
            size,
            color,
        }
    }

    /// Size the sprite so one edge is `extent` pixels and the other follows
    /// the texture's aspect ratio. `match_width` picks which edge is fixed.
    /// An unknown texture yields a square.
    pub fn sized_to_texture(
        texture: impl Into<String>,
        extent: f32,
        match_width: bool,
        assets: &dyn AssetCatalog,
    ) -> Self {
        let texture = texture.into();
        let size = match assets.texture_size(&texture) {
            Some((w, h)) if w > 0 && h > 0 => {
                let aspect = w as f32 / h as f32;
                if match_width {
                    Vec2::new(extent, extent / aspect)
                } else {
                    Vec2::new(extent * aspect, extent)
                }
            }
            _ => {
                debug!(texture = %texture, "texture not in catalog, sprite falls back to a square");
                Vec2::splat(extent)
            }
        };
        Self::textured(texture, size)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn texture(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

impl Component for Sprite {
    fn init(&mut self, owner: EntityId, siblings: &ComponentRegistry) {
        if !siblings.contains::<Transform>() {
            debug!(entity = %owner, "sprite attached before a transform; it will not draw");
        }
    }

    fn render(&self, siblings: &ComponentRegistry, frame: &mut RenderFrame<'_>) {
        let Some(transform) = siblings.get::<Transform>() else {
            return;
        };
        let center = frame.view.world_to_screen(transform.position);
        let size = self.size * frame.view.scale;
        let command = match &self.texture {
            Some(texture) if frame.assets.has_texture(texture) => DrawCommand::Sprite {
                texture: texture.clone(),
                center,
                size,
                rotation: transform.rotation,
            },
            _ => DrawCommand::Rect {
                center,
                size,
                rotation: transform.rotation,
                color: self.color,
            },
        };
        frame.draw(command);
    }
}
