use glam::Vec2;
use tracing::{debug, warn};

use crate::component::{Component, ComponentRegistry};
use crate::context::TickContext;
use crate::entity::EntityId;
use crate::physics::{BodyDesc, BodyHandle, BodyKind, PhysicsBackend, ShapeDesc, PIXELS_PER_METER};

use super::{Sprite, Transform};

/// Collider size used when neither the config nor a sibling sprite gives one.
const FALLBACK_SIZE: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeKind {
    /// Circle inscribed in the smaller edge.
    #[default]
    Circle,
    /// Ellipse approximated by an 8-point convex hull.
    Ellipse,
}

/// Rigid body parameters. Sizes are in pixels; conversion to meters happens
/// when the body is created.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyConfig {
    /// Static, dynamic or kinematic.
    pub kind: BodyKind,
    /// Collider outline.
    pub shape: ShapeKind,
    /// `None` takes the size of a sibling [`Sprite`] attached earlier.
    pub size: Option<Vec2>,
    /// Multiplier on the collider size, to tighten hit boxes.
    pub collision_scale: f32,
    /// Collider density, mass per square meter.
    pub density: f32,
    /// Coulomb friction coefficient.
    pub friction: f32,
    /// Bounciness, 0 absorbs all energy.
    pub restitution: f32,
    /// Linear velocity decay per second.
    pub linear_damping: f32,
    /// Angular velocity decay per second.
    pub angular_damping: f32,
    /// Keep the body from rotating under contacts.
    pub fixed_rotation: bool,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            shape: ShapeKind::Circle,
            size: None,
            collision_scale: 1.0,
            density: 1.0,
            friction: 0.3,
            restitution: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
        }
    }
}

/// Binds the owner to a physics body.
///
/// The body is created as soon as the entity is spawned, or on the first
/// update if the physics world was unavailable then. Its user data points
/// back at the owner, which is how contact events find their entities.
/// After each physics step the body pose is copied into the sibling
/// transform; with `fixed_rotation` the transform keeps its own rotation.
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    config: BodyConfig,
    owner: Option<EntityId>,
    size: Vec2,
    handle: Option<BodyHandle>,
    warned: bool,
}

impl PhysicsBody {
    pub fn new(config: BodyConfig) -> Self {
        Self {
            size: config.size.unwrap_or(Vec2::splat(FALLBACK_SIZE)),
            config,
            owner: None,
            handle: None,
            warned: false,
        }
    }

    pub fn handle(&self) -> Option<BodyHandle> {
        self.handle
    }

    /// Collider size in pixels, after scaling.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    fn describe(&self, transform: &Transform) -> BodyDesc {
        let half = self.size / (2.0 * PIXELS_PER_METER);
        let shape = match self.config.shape {
            ShapeKind::Circle => ShapeDesc::Circle {
                radius: half.min_element(),
            },
            ShapeKind::Ellipse => ShapeDesc::Ellipse { half_extents: half },
        };
        BodyDesc {
            kind: self.config.kind,
            position: transform.position / PIXELS_PER_METER,
            rotation: transform.rotation,
            shape,
            density: self.config.density,
            friction: self.config.friction,
            restitution: self.config.restitution,
            linear_damping: self.config.linear_damping,
            angular_damping: self.config.angular_damping,
            fixed_rotation: self.config.fixed_rotation,
        }
    }

    fn ensure_body(&mut self, siblings: &ComponentRegistry, physics: &mut dyn PhysicsBackend) -> Option<BodyHandle> {
        if self.handle.is_some() {
            return self.handle;
        }
        let owner = self.owner?;
        let transform = siblings.get::<Transform>()?;
        if !physics.is_valid() {
            if !self.warned {
                warn!(entity = %owner, "physics world unavailable, body creation deferred");
                self.warned = true;
            }
            return None;
        }

        let handle = physics.create_body(&self.describe(transform))?;
        physics.set_user_data(handle, owner);
        debug!(entity = %owner, body = handle.0, "physics body created");
        self.handle = Some(handle);
        self.handle
    }
}

impl Component for PhysicsBody {
    fn init(&mut self, owner: EntityId, siblings: &ComponentRegistry) {
        self.owner = Some(owner);
        let base = self
            .config
            .size
            .or_else(|| siblings.get::<Sprite>().map(Sprite::size))
            .unwrap_or(Vec2::splat(FALLBACK_SIZE));
        self.size = base * self.config.collision_scale;
        if !siblings.contains::<Transform>() {
            debug!(entity = %owner, "physics body attached without a transform; it stays inert");
        }
    }

    fn spawned(&mut self, siblings: &ComponentRegistry, physics: &mut dyn PhysicsBackend) {
        self.ensure_body(siblings, physics);
    }

    fn update(&mut self, siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        let physics = ctx.physics();
        let Some(handle) = self.ensure_body(siblings, physics) else {
            return;
        };
        let Some(transform) = siblings.get_mut::<Transform>() else {
            return;
        };

        if self.config.kind == BodyKind::Kinematic {
            physics.set_linear_velocity(handle, transform.velocity / PIXELS_PER_METER);
        }
        if let Some(position) = physics.position(handle) {
            transform.position = position * PIXELS_PER_METER;
        }
        if !self.config.fixed_rotation {
            if let Some(rotation) = physics.rotation(handle) {
                transform.rotation = rotation;
            }
        }
    }

    fn teardown(&mut self, physics: &mut dyn PhysicsBackend) {
        if let Some(handle) = self.handle.take() {
            physics.destroy_body(handle);
        }
    }
}
