//! Shared fixtures for unit tests.

use std::collections::HashMap;

use glam::Vec2;

use crate::context::Resources;
use crate::entity::EntityId;
use crate::physics::{BodyDesc, BodyHandle, PhysicsBackend, ShapeHandle};
use crate::render::View;

/// In-memory physics stand-in. Bodies never move unless a test moves them,
/// and contact events are whatever the test scripts.
#[derive(Default)]
pub struct NullPhysics {
    pub invalid: bool,
    pub steps: u32,
    pub bodies: HashMap<BodyHandle, FakeBody>,
    pub shapes: HashMap<ShapeHandle, BodyHandle>,
    pub scripted: Vec<Vec<(ShapeHandle, ShapeHandle)>>,
    pub events: Vec<(ShapeHandle, ShapeHandle)>,
    pub destroyed: Vec<BodyHandle>,
    next: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBody {
    pub desc: Option<BodyDesc>,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub force: Vec2,
    pub user: Option<EntityId>,
}

impl NullPhysics {
    pub fn invalid() -> Self {
        Self {
            invalid: true,
            ..Self::default()
        }
    }

    /// Register a bare body with one shape, owned by `entity`.
    pub fn add_body(&mut self, entity: Option<EntityId>, position: Vec2) -> (BodyHandle, ShapeHandle) {
        self.next += 1;
        let body = BodyHandle(self.next);
        let shape = ShapeHandle(self.next);
        self.bodies.insert(
            body,
            FakeBody {
                position,
                user: entity,
                ..FakeBody::default()
            },
        );
        self.shapes.insert(shape, body);
        (body, shape)
    }
}

impl PhysicsBackend for NullPhysics {
    fn is_valid(&self) -> bool {
        !self.invalid
    }

    fn step(&mut self, _dt: f32, _substeps: u32) {
        self.steps += 1;
        self.events = if self.scripted.is_empty() {
            Vec::new()
        } else {
            self.scripted.remove(0)
        };
    }

    fn contact_begin_events(&self) -> &[(ShapeHandle, ShapeHandle)] {
        &self.events
    }

    fn body_of(&self, shape: ShapeHandle) -> Option<BodyHandle> {
        self.shapes.get(&shape).copied()
    }

    fn user_data(&self, body: BodyHandle) -> Option<EntityId> {
        self.bodies.get(&body).and_then(|b| b.user)
    }

    fn set_user_data(&mut self, body: BodyHandle, entity: EntityId) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) => {
                b.user = Some(entity);
                true
            }
            None => false,
        }
    }

    fn create_body(&mut self, desc: &BodyDesc) -> Option<BodyHandle> {
        if self.invalid {
            return None;
        }
        let (body, _) = self.add_body(None, desc.position);
        if let Some(b) = self.bodies.get_mut(&body) {
            b.rotation = desc.rotation;
            b.desc = Some(desc.clone());
        }
        Some(body)
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        self.shapes.retain(|_, b| *b != body);
        let removed = self.bodies.remove(&body).is_some();
        if removed {
            self.destroyed.push(body);
        }
        removed
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn rotation(&self, body: BodyHandle) -> Option<f32> {
        self.bodies.get(&body).map(|b| b.rotation)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) => {
                b.velocity = velocity;
                true
            }
            None => false,
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) => {
                b.force += force;
                true
            }
            None => false,
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

pub fn test_resources() -> Resources {
    Resources::new(
        Box::new(NullPhysics::default()),
        7,
        10_000,
        View::new(Vec2::new(1280.0, 720.0)),
    )
}
