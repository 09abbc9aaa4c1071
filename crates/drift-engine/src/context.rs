//! Per-tick context handed to component updates.
//!
//! [`Resources`] is the shared state that outlives a tick: input, physics,
//! particles, RNG and the camera view. A [`TickContext`] borrows it for one
//! entity's update and adds that entity's identity, a read-only view of the
//! other live entities, and the deferred spawn and deletion queues.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::entity::{Entity, EntityId};
use crate::factory::SpawnRequest;
use crate::input::InputState;
use crate::particles::ParticleEngine;
use crate::physics::PhysicsBackend;
use crate::render::View;

/// Shared simulation state reachable from every component update.
pub struct Resources {
    pub input: InputState,
    pub physics: Box<dyn PhysicsBackend>,
    pub particles: ParticleEngine,
    pub rng: Pcg32,
    pub view: View,
    /// Difficulty multiplier computed at the end of the previous tick.
    pub difficulty: f32,
    pub game_over: bool,
}

impl Resources {
    pub fn new(physics: Box<dyn PhysicsBackend>, seed: u64, max_particles: usize, view: View) -> Self {
        Self {
            input: InputState::default(),
            physics,
            particles: ParticleEngine::new(max_particles),
            rng: Pcg32::seed_from_u64(seed),
            view,
            difficulty: 1.0,
            game_over: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Neighbors
// ---------------------------------------------------------------------------

/// Read-only view of every live entity except the one being updated.
#[derive(Clone, Copy, Default)]
pub struct Neighbors<'a> {
    before: &'a [Entity],
    after: &'a [Entity],
}

impl<'a> Neighbors<'a> {
    pub fn new(before: &'a [Entity], after: &'a [Entity]) -> Self {
        Self { before, after }
    }

    pub fn iter(self) -> impl Iterator<Item = &'a Entity> {
        self.before.iter().chain(self.after.iter())
    }

    pub fn with_tag(self, tag: &'a str) -> impl Iterator<Item = &'a Entity> {
        self.iter().filter(move |e| e.has_tag(tag))
    }

    pub fn get(self, id: EntityId) -> Option<&'a Entity> {
        self.iter().find(|e| e.id() == id)
    }

    pub fn len(self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// TickContext
// ---------------------------------------------------------------------------

/// Everything one entity's update may read or request.
pub struct TickContext<'a> {
    /// Fixed timestep in seconds.
    pub dt: f32,
    /// The entity being updated.
    pub owner: EntityId,
    pub resources: &'a mut Resources,
    neighbors: Neighbors<'a>,
    spawns: &'a mut Vec<SpawnRequest>,
    deletions: &'a mut Vec<EntityId>,
}

impl<'a> TickContext<'a> {
    pub fn new(
        resources: &'a mut Resources,
        owner: EntityId,
        dt: f32,
        spawns: &'a mut Vec<SpawnRequest>,
        deletions: &'a mut Vec<EntityId>,
    ) -> Self {
        Self {
            dt,
            owner,
            resources,
            neighbors: Neighbors::default(),
            spawns,
            deletions,
        }
    }

    pub fn with_neighbors(mut self, neighbors: Neighbors<'a>) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn neighbors(&self) -> Neighbors<'a> {
        self.neighbors
    }

    /// Queue an entity for creation at the end of the tick.
    pub fn queue_spawn(&mut self, request: SpawnRequest) {
        self.spawns.push(request);
    }

    /// Flag an entity (possibly the owner) for removal at the end of the tick.
    pub fn mark_for_deletion(&mut self, id: EntityId) {
        self.deletions.push(id);
    }

    pub fn physics(&mut self) -> &mut dyn PhysicsBackend {
        self.resources.physics.as_mut()
    }
}
