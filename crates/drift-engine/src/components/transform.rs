use glam::Vec2;

use crate::component::{Component, ComponentRegistry};
use crate::context::TickContext;

/// World-space pose in pixels. `rotation` is in radians; zero faces +x.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec2,
    /// Pixels per second, integrated each tick. Physics-driven entities
    /// leave this at zero and let their body write `position` instead.
    pub velocity: Vec2,
    pub rotation: f32,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Unit vector along the facing direction.
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }
}

impl Component for Transform {
    fn update(&mut self, _siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        self.position += self.velocity * ctx.dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::testing::test_resources;

    #[test]
    fn velocity_integrates_per_tick() {
        let mut registry = ComponentRegistry::new();
        let owner = EntityId::new(0, 0);
        registry.add(
            owner,
            Transform {
                velocity: Vec2::new(120.0, -60.0),
                ..Transform::default()
            },
        );
        let mut resources = test_resources();
        let (mut spawns, mut deletions) = (Vec::new(), Vec::new());
        let mut ctx = TickContext::new(&mut resources, owner, 0.5, &mut spawns, &mut deletions);
        registry.update_all(&mut ctx);

        assert_eq!(registry.get::<Transform>().map(|t| t.position), Some(Vec2::new(60.0, -30.0)));
    }

    #[test]
    fn forward_follows_rotation() {
        let t = Transform::default().with_rotation(std::f32::consts::PI);
        assert!((t.forward() - Vec2::new(-1.0, 0.0)).length() < 1e-6);
    }
}
