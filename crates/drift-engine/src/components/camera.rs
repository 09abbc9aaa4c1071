use crate::component::{Component, ComponentRegistry};
use crate::context::TickContext;

use super::Transform;

/// Centers the camera view on the owner every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraFollow;

impl Component for CameraFollow {
    fn update(&mut self, siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        if let Some(transform) = siblings.get::<Transform>() {
            ctx.resources.view.center = transform.position;
        }
    }
}
