use glam::Vec2;

use crate::component::{Component, ComponentRegistry};
use crate::context::TickContext;
use crate::input::{Key, MouseButton};
use crate::physics::PIXELS_PER_METER;

use super::{PhysicsBody, Transform};

// ---------------------------------------------------------------------------
// Thrust
// ---------------------------------------------------------------------------

/// Pushes the owner's body along its facing while the thrust button is held,
/// and caps its speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thrust {
    /// Force in pixel units (mass * px / s^2).
    pub force: f32,
    /// Pixels per second.
    pub max_speed: f32,
    pub button: MouseButton,
}

impl Default for Thrust {
    fn default() -> Self {
        Self {
            force: 1500.0,
            max_speed: 400.0,
            button: MouseButton::Left,
        }
    }
}

impl Component for Thrust {
    fn update(&mut self, siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        if !ctx.resources.input.is_button_down(self.button) {
            return;
        }
        let Some(handle) = siblings.get::<PhysicsBody>().and_then(PhysicsBody::handle) else {
            return;
        };
        let Some(forward) = siblings.get::<Transform>().map(Transform::forward) else {
            return;
        };

        let physics = ctx.physics();
        physics.apply_force(handle, forward * (self.force / PIXELS_PER_METER));

        let cap = self.max_speed / PIXELS_PER_METER;
        if let Some(velocity) = physics.linear_velocity(handle) {
            if velocity.length() > cap {
                physics.set_linear_velocity(handle, velocity.normalize_or_zero() * cap);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RotateToPointer
// ---------------------------------------------------------------------------

/// Turns the owner to face the pointer, converted into world space.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotateToPointer;

impl Component for RotateToPointer {
    fn update(&mut self, siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        let Some(transform) = siblings.get_mut::<Transform>() else {
            return;
        };
        let target = ctx.resources.view.screen_to_world(ctx.resources.input.pointer());
        let delta = target - transform.position;
        if delta.length_squared() > f32::EPSILON {
            transform.rotation = delta.y.atan2(delta.x);
        }
    }
}

// ---------------------------------------------------------------------------
// DirectControl
// ---------------------------------------------------------------------------

/// WASD sets the transform velocity directly. A kinematic body follows it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectControl {
    /// Pixels per second.
    pub speed: f32,
}

impl Default for DirectControl {
    fn default() -> Self {
        Self { speed: 200.0 }
    }
}

impl Component for DirectControl {
    fn update(&mut self, siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        let Some(transform) = siblings.get_mut::<Transform>() else {
            return;
        };
        let input = &ctx.resources.input;
        let axis = |neg: Key, pos: Key| {
            f32::from(u8::from(input.is_key_down(pos))) - f32::from(u8::from(input.is_key_down(neg)))
        };
        let direction = Vec2::new(axis(Key::A, Key::D), axis(Key::W, Key::S));
        transform.velocity = direction.normalize_or_zero() * self.speed;
    }
}
