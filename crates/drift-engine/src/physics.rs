//! Physics backend abstraction and its rapier2d implementation.
//!
//! Gameplay code talks to physics only through [`PhysicsBackend`]: create
//! and destroy bodies, read and nudge their motion, and read the contacts
//! that *began* during the last step. Bodies carry a back-reference to the
//! owning entity as user data, which is how a contact between two shapes is
//! traced back to two game objects.
//!
//! Units are meters, seconds and radians. Gameplay works in pixels and
//! converts at the boundary with [`PIXELS_PER_METER`].
//!
//! # Determinism
//!
//! rapier2d is compiled with `enhanced-determinism`, and contact events are
//! sorted after each step, so the same inputs replay to the same contacts.

use std::collections::HashMap;

use glam::Vec2;
use rapier2d::prelude::*;
use tracing::{debug, warn};

use crate::entity::EntityId;

/// Conversion factor between gameplay pixels and physics meters.
pub const PIXELS_PER_METER: f32 = 50.0;

/// Smallest collider extent accepted, in meters.
const MIN_EXTENT: f32 = 0.01;

// ---------------------------------------------------------------------------
// Backend-neutral types
// ---------------------------------------------------------------------------

/// Opaque body identifier issued by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Opaque collision shape identifier issued by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Immovable (asteroids).
    Static,
    /// Fully simulated (the rocket).
    Dynamic,
    /// Moved by gameplay velocity, not by the solver.
    Kinematic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDesc {
    Circle { radius: f32 },
    Ellipse { half_extents: Vec2 },
}

/// Everything needed to create one body with one shape. Meters.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub rotation: f32,
    pub shape: ShapeDesc,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub fixed_rotation: bool,
}

/// The physics engine as seen by the simulation.
///
/// Lookups on unknown or destroyed handles return `None` (or `false` for
/// mutations) instead of panicking.
pub trait PhysicsBackend {
    /// A backend may be unusable, e.g. before its world is created.
    fn is_valid(&self) -> bool {
        true
    }

    /// Advance by `dt` seconds, split into `substeps` equal steps. Replaces
    /// the contact-begin list with the contacts that began during this call.
    fn step(&mut self, dt: f32, substeps: u32);

    /// Shape pairs whose contact began during the last [`step`](Self::step).
    /// Each pair appears once, in a deterministic order.
    fn contact_begin_events(&self) -> &[(ShapeHandle, ShapeHandle)];

    fn body_of(&self, shape: ShapeHandle) -> Option<BodyHandle>;
    fn user_data(&self, body: BodyHandle) -> Option<EntityId>;
    fn set_user_data(&mut self, body: BodyHandle, entity: EntityId) -> bool;

    fn create_body(&mut self, desc: &BodyDesc) -> Option<BodyHandle>;
    fn destroy_body(&mut self, body: BodyHandle) -> bool;

    fn position(&self, body: BodyHandle) -> Option<Vec2>;
    fn rotation(&self, body: BodyHandle) -> Option<f32>;
    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2>;
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool;
    /// Apply a force at the center of mass for the next step only.
    fn apply_force(&mut self, body: BodyHandle, force: Vec2) -> bool;

    fn body_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// RapierWorld
// ---------------------------------------------------------------------------

/// rapier2d-backed physics world.
pub struct RapierWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    bodies: HashMap<BodyHandle, RigidBodyHandle>,
    body_collider: HashMap<BodyHandle, ColliderHandle>,
    collider_shape: HashMap<ColliderHandle, ShapeHandle>,
    shape_body: HashMap<ShapeHandle, BodyHandle>,
    begin_events: Vec<(ShapeHandle, ShapeHandle)>,
    next_id: u64,
}

impl RapierWorld {
    /// Create a world with the given gravity, in m/s^2.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![gravity.x, gravity.y],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            bodies: HashMap::new(),
            body_collider: HashMap::new(),
            collider_shape: HashMap::new(),
            shape_body: HashMap::new(),
            begin_events: Vec::new(),
            next_id: 0,
        }
    }

    /// Create a world without gravity, as in open space.
    pub fn new_zero_gravity() -> Self {
        Self::new(Vec2::ZERO)
    }

    fn body(&self, body: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(&body).and_then(|h| self.rigid_body_set.get(*h))
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut RigidBody> {
        let handle = *self.bodies.get(&body)?;
        self.rigid_body_set.get_mut(handle)
    }

    fn shape_for(desc: &ShapeDesc) -> Option<SharedShape> {
        match *desc {
            ShapeDesc::Circle { radius } => {
                if !radius.is_finite() {
                    return None;
                }
                Some(SharedShape::ball(radius.max(MIN_EXTENT)))
            }
            ShapeDesc::Ellipse { half_extents } => {
                if !half_extents.is_finite() {
                    return None;
                }
                let half = half_extents.max(Vec2::splat(MIN_EXTENT));
                let points: Vec<Point<Real>> = (0..8)
                    .map(|i| {
                        let angle = i as f32 * std::f32::consts::TAU / 8.0;
                        point![half.x * angle.cos(), half.y * angle.sin()]
                    })
                    .collect();
                SharedShape::convex_hull(&points).or_else(|| Some(SharedShape::ball(half.min_element())))
            }
        }
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new_zero_gravity()
    }
}

impl PhysicsBackend for RapierWorld {
    fn step(&mut self, dt: f32, substeps: u32) {
        self.begin_events.clear();
        let substeps = substeps.max(1);
        self.integration_params.dt = dt / substeps as Real;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        for _ in 0..substeps {
            self.pipeline.step(
                &self.gravity,
                &self.integration_params,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                None,
                &(),
                &event_handler,
            );
        }

        // Forces apply to one step, matching a per-tick thrust impulse model.
        for (_, rb) in self.rigid_body_set.iter_mut() {
            rb.reset_forces(false);
        }

        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let a = self.collider_shape.get(&h1).copied();
                let b = self.collider_shape.get(&h2).copied();
                if let (Some(a), Some(b)) = (a, b) {
                    self.begin_events.push((a.min(b), a.max(b)));
                }
            }
        }

        // Channel delivery order is not guaranteed; sort for replayability.
        self.begin_events.sort_unstable();
        self.begin_events.dedup();
    }

    fn contact_begin_events(&self) -> &[(ShapeHandle, ShapeHandle)] {
        &self.begin_events
    }

    fn body_of(&self, shape: ShapeHandle) -> Option<BodyHandle> {
        self.shape_body.get(&shape).copied()
    }

    fn user_data(&self, body: BodyHandle) -> Option<EntityId> {
        match self.body(body)?.user_data {
            0 => None,
            raw => Some(EntityId::from_raw((raw - 1) as u64)),
        }
    }

    fn set_user_data(&mut self, body: BodyHandle, entity: EntityId) -> bool {
        match self.body_mut(body) {
            Some(rb) => {
                // Zero means "unset".
                rb.user_data = u128::from(entity.to_raw()) + 1;
                true
            }
            None => false,
        }
    }

    fn create_body(&mut self, desc: &BodyDesc) -> Option<BodyHandle> {
        if !desc.position.is_finite() || !desc.rotation.is_finite() {
            warn!(?desc, "rejected body with non-finite pose");
            return None;
        }
        let Some(shape) = Self::shape_for(&desc.shape) else {
            warn!(?desc, "rejected body with invalid shape");
            return None;
        };

        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let mut builder = builder
            .translation(vector![desc.position.x, desc.position.y])
            .rotation(desc.rotation)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping);
        if desc.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let rb_handle = self.rigid_body_set.insert(builder.build());

        let collider = ColliderBuilder::new(shape)
            .density(desc.density)
            .friction(desc.friction)
            .restitution(desc.restitution)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, rb_handle, &mut self.rigid_body_set);

        self.next_id += 1;
        let body = BodyHandle(self.next_id);
        let shape = ShapeHandle(self.next_id);
        self.bodies.insert(body, rb_handle);
        self.body_collider.insert(body, collider_handle);
        self.collider_shape.insert(collider_handle, shape);
        self.shape_body.insert(shape, body);
        Some(body)
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        let Some(rb_handle) = self.bodies.remove(&body) else {
            debug!(body = body.0, "destroy of unknown body ignored");
            return false;
        };
        if let Some(collider) = self.body_collider.remove(&body) {
            if let Some(shape) = self.collider_shape.remove(&collider) {
                self.shape_body.remove(&shape);
            }
        }
        self.rigid_body_set
            .remove(
                rb_handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        let t = self.body(body)?.translation();
        Some(Vec2::new(t.x, t.y))
    }

    fn rotation(&self, body: BodyHandle) -> Option<f32> {
        Some(self.body(body)?.rotation().angle())
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        let v = self.body(body)?.linvel();
        Some(Vec2::new(v.x, v.y))
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool {
        match self.body_mut(body) {
            Some(rb) => {
                rb.set_linvel(vector![velocity.x, velocity.y], true);
                true
            }
            None => false,
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) -> bool {
        match self.body_mut(body) {
            Some(rb) => {
                rb.add_force(vector![force.x, force.y], true);
                true
            }
            None => false,
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
