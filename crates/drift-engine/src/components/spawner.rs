use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use crate::component::{Component, ComponentRegistry};
use crate::context::TickContext;
use crate::entity::{EntityId, Entity};
use crate::factory::{kinds, SpawnRequest};

use super::Transform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnerConfig {
    /// Extra distance beyond the visible half-extent at which asteroids appear.
    pub spawn_buffer: f32,
    /// Asteroids farther than this from the owner are removed.
    pub cleanup_distance: f32,
    /// Asteroids per trigger at difficulty 1.0; fractions carry over.
    pub density: f32,
    pub size_min: f32,
    pub size_max: f32,
    /// Forward progress along x that triggers a spawn wave.
    pub trigger_distance: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            spawn_buffer: 500.0,
            cleanup_distance: 1500.0,
            density: 0.25,
            size_min: 60.0,
            size_max: 120.0,
            trigger_distance: 100.0,
        }
    }
}

/// Streams asteroids in ahead of the owner and culls the ones left behind.
///
/// Every `trigger_distance` pixels of forward progress, `density * difficulty`
/// asteroids are queued on an arc of +/-90 degrees around the owner's facing,
/// just outside the visible area.
#[derive(Debug, Clone)]
pub struct AsteroidSpawner {
    config: SpawnerConfig,
    last_spawn_x: Option<f32>,
    carry: f32,
    spawned: u64,
}

impl AsteroidSpawner {
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            config,
            last_spawn_x: None,
            carry: 0.0,
            spawned: 0,
        }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Asteroids queued so far.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    fn is_far(&self, entity: &Entity, from: Vec2) -> bool {
        entity
            .get::<Transform>()
            .is_some_and(|t| t.position.distance(from) > self.config.cleanup_distance)
    }
}

impl Default for AsteroidSpawner {
    fn default() -> Self {
        Self::new(SpawnerConfig::default())
    }
}

impl Component for AsteroidSpawner {
    fn init(&mut self, _owner: EntityId, siblings: &ComponentRegistry) {
        self.last_spawn_x = siblings.get::<Transform>().map(|t| t.position.x);
    }

    fn update(&mut self, siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        let Some(&Transform { position, rotation, .. }) = siblings.get::<Transform>() else {
            return;
        };
        let last_x = *self.last_spawn_x.get_or_insert(position.x);

        if position.x - last_x > self.config.trigger_distance {
            self.carry += self.config.density * ctx.resources.difficulty;
            let wave = self.carry.floor();
            self.carry -= wave;

            let half = ctx.resources.view.half_extent();
            let distance = half.x.max(half.y) + self.config.spawn_buffer;
            for _ in 0..wave as u32 {
                let rng = &mut ctx.resources.rng;
                let size = self.config.size_min + (self.config.size_max - self.config.size_min) * rng.gen::<f32>();
                let angle = rotation + (rng.gen::<f32>() - 0.5) * PI;
                let at = position + Vec2::from_angle(angle) * distance;
                ctx.queue_spawn(SpawnRequest::new(kinds::ASTEROID, at).with_size(size));
                self.spawned += 1;
            }
            self.last_spawn_x = Some(position.x);
        }

        let stale: Vec<EntityId> = ctx
            .neighbors()
            .with_tag(kinds::ASTEROID)
            .filter(|e| !e.is_marked_for_deletion() && self.is_far(e, position))
            .map(Entity::id)
            .collect();
        for id in stale {
            ctx.mark_for_deletion(id);
        }
    }
}
