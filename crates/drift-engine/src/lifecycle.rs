//! Deferred entity lifecycle.
//!
//! The [`LifecycleManager`] owns the live entity list. During a tick nothing
//! is inserted into or removed from that list: gameplay code *marks* entities
//! for deletion and *queues* spawn requests. Both are applied in one drain at
//! the end of the tick:
//!
//! 1. Marked entities are torn down and removed in a single order-preserving
//!    pass.
//! 2. Queued requests are materialized in FIFO order and appended.
//!
//! Entities created by the drain are first updated on the following tick.
//! Entity ids are generational, so a mark aimed at an already removed entity
//! misses instead of hitting whichever entity reused its slot.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::context::{Neighbors, Resources, TickContext};
use crate::entity::{Entity, EntityAllocator, EntityId};
use crate::factory::SpawnRequest;

/// Callbacks the manager uses to assemble and dispose of entities.
pub trait EntityHooks {
    /// Attach components to an entity created for `request`.
    fn build(&mut self, request: &SpawnRequest, entity: &mut Entity);

    /// Called right after `build`.
    fn spawned(&mut self, _entity: &mut Entity) {}

    /// Release external resources before the entity is dropped.
    fn teardown(&mut self, _entity: &mut Entity) {}
}

/// Outcome of one end-of-tick drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub removed: usize,
    pub spawned: usize,
}

#[derive(Debug, Default)]
pub struct LifecycleManager {
    allocator: EntityAllocator,
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    pending: Vec<SpawnRequest>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Immediate structure (setup only) -----------------------------------

    /// Append an empty entity right away. Only for setup outside a tick.
    pub fn create(&mut self, tag: impl Into<String>) -> &mut Entity {
        let id = self.allocator.allocate();
        let idx = self.entities.len();
        self.index.insert(id, idx);
        self.entities.push(Entity::new(id, tag));
        &mut self.entities[idx]
    }

    /// Create and assemble an entity from `request` right away.
    pub fn spawn_now(&mut self, request: &SpawnRequest, hooks: &mut dyn EntityHooks) -> EntityId {
        let entity = self.create(request.kind.clone());
        hooks.build(request, entity);
        hooks.spawned(entity);
        trace!(entity = %entity.id(), kind = %request.kind, "entity spawned");
        entity.id()
    }

    // -- Deferred requests --------------------------------------------------

    /// Queue an entity for creation at the next drain.
    pub fn queue_spawn(&mut self, request: SpawnRequest) {
        self.pending.push(request);
    }

    pub fn pending_spawns(&self) -> &[SpawnRequest] {
        &self.pending
    }

    /// Mark a live entity for removal at the next drain.
    ///
    /// Returns `false` for stale or unknown ids.
    pub fn mark_for_deletion(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.mark_for_deletion();
                true
            }
            None => {
                debug!(entity = %id, "deletion mark for unknown entity ignored");
                false
            }
        }
    }

    // -- Queries ------------------------------------------------------------

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let idx = *self.index.get(&id)?;
        self.entities.get(idx).filter(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let idx = *self.index.get(&id)?;
        self.entities.get_mut(idx).filter(|e| e.id() == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.has_tag(tag))
    }

    pub fn count_tag(&self, tag: &str) -> usize {
        self.entities.iter().filter(|e| e.has_tag(tag)).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // -- Tick phases --------------------------------------------------------

    /// Update every live entity once, in creation order.
    ///
    /// Each entity sees every other entity read-only. Spawn requests land in
    /// the pending queue; deletion marks are applied as soon as the
    /// requesting entity finishes its update, and a marked entity is still
    /// updated this tick.
    pub fn update_all(&mut self, resources: &mut Resources, dt: f32) {
        let mut deletions = Vec::new();
        for idx in 0..self.entities.len() {
            {
                let (before, rest) = self.entities.split_at_mut(idx);
                let Some((current, after)) = rest.split_first_mut() else {
                    break;
                };
                let owner = current.id();
                let mut ctx = TickContext::new(resources, owner, dt, &mut self.pending, &mut deletions)
                    .with_neighbors(Neighbors::new(before, after));
                current.update(&mut ctx);
            }
            for id in deletions.drain(..) {
                self.mark_for_deletion(id);
            }
        }
    }

    /// Remove every marked entity, tearing each down first. Survivors keep
    /// their relative order.
    pub fn cleanup(&mut self, hooks: &mut dyn EntityHooks) -> usize {
        let mut removed = Vec::new();
        self.entities.retain_mut(|entity| {
            if entity.is_marked_for_deletion() {
                hooks.teardown(entity);
                removed.push(entity.id());
                false
            } else {
                true
            }
        });
        if removed.is_empty() {
            return 0;
        }

        for id in &removed {
            self.allocator.deallocate(*id);
            trace!(entity = %id, "entity removed");
        }
        self.reindex();
        removed.len()
    }

    /// Materialize every queued request, in queue order.
    pub fn drain_spawns(&mut self, hooks: &mut dyn EntityHooks) -> usize {
        let requests = std::mem::take(&mut self.pending);
        for request in &requests {
            self.spawn_now(request, hooks);
        }
        requests.len()
    }

    /// End-of-tick drain: removals first, then spawns.
    pub fn drain(&mut self, hooks: &mut dyn EntityHooks) -> DrainReport {
        let removed = self.cleanup(hooks);
        let spawned = self.drain_spawns(hooks);
        DrainReport { removed, spawned }
    }

    /// Tear down and drop every entity and forget queued spawns.
    pub fn clear(&mut self, hooks: &mut dyn EntityHooks) {
        for entity in &mut self.entities {
            hooks.teardown(entity);
            self.allocator.deallocate(entity.id());
        }
        self.entities.clear();
        self.index.clear();
        self.pending.clear();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (idx, entity) in self.entities.iter().enumerate() {
            self.index.insert(entity.id(), idx);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentRegistry};
    use crate::components::Transform;
    use crate::testing::test_resources;
    use glam::Vec2;

    #[derive(Default)]
    struct Hooks {
        built: Vec<String>,
        torn_down: Vec<EntityId>,
    }

    impl EntityHooks for Hooks {
        fn build(&mut self, request: &SpawnRequest, entity: &mut Entity) {
            self.built.push(request.kind.clone());
            entity.add(Transform::at(request.position));
        }

        fn teardown(&mut self, entity: &mut Entity) {
            self.torn_down.push(entity.id());
        }
    }

    /// Queues `spawns` requests per tick and optionally marks a target.
    struct Script {
        spawns: usize,
        mark: Option<EntityId>,
        updates: u32,
    }

    impl Component for Script {
        fn update(&mut self, _siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
            self.updates += 1;
            for _ in 0..self.spawns {
                ctx.queue_spawn(SpawnRequest::new("child", Vec2::ZERO));
            }
            if let Some(target) = self.mark {
                ctx.mark_for_deletion(target);
            }
        }
    }

    fn ids(manager: &LifecycleManager) -> Vec<EntityId> {
        manager.iter().map(Entity::id).collect()
    }

    // -- 1. Deferred spawns -------------------------------------------------

    #[test]
    fn spawns_are_invisible_until_drain() {
        let mut manager = LifecycleManager::new();
        manager.create("spawner").add(Script {
            spawns: 3,
            mark: None,
            updates: 0,
        });
        let mut resources = test_resources();
        let mut hooks = Hooks::default();

        manager.update_all(&mut resources, 1.0 / 60.0);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.pending_spawns().len(), 3);

        let report = manager.drain(&mut hooks);
        assert_eq!(report, DrainReport { removed: 0, spawned: 3 });
        assert_eq!(manager.len(), 4);
        assert_eq!(hooks.built, vec!["child", "child", "child"]);
        assert!(manager.pending_spawns().is_empty());
    }

    #[test]
    fn spawned_entities_update_from_next_tick() {
        let mut manager = LifecycleManager::new();
        manager.create("spawner").add(Script {
            spawns: 1,
            mark: None,
            updates: 0,
        });
        let mut resources = test_resources();
        let mut hooks = Hooks::default();
        manager.update_all(&mut resources, 1.0 / 60.0);
        manager.drain(&mut hooks);
        manager.update_all(&mut resources, 1.0 / 60.0);
        // The spawner ran twice; the child queued nothing of its own.
        assert_eq!(manager.pending_spawns().len(), 1);
        assert_eq!(manager.count_tag("child"), 1);
    }

    // -- 2. Deferred deletion -----------------------------------------------

    #[test]
    fn marked_entity_still_updates_this_tick() {
        let mut manager = LifecycleManager::new();
        let victim = {
            let entity = manager.create("victim");
            entity.add(Script {
                spawns: 0,
                mark: None,
                updates: 0,
            });
            entity.id()
        };
        // A later entity marks the victim after the victim already ran.
        manager.create("killer").add(Script {
            spawns: 0,
            mark: Some(victim),
            updates: 0,
        });
        let mut resources = test_resources();

        manager.update_all(&mut resources, 1.0 / 60.0);
        assert!(manager.get(victim).map(Entity::is_marked_for_deletion).unwrap_or(false));
        assert_eq!(manager.get(victim).and_then(|e| e.get::<Script>()).map(|s| s.updates), Some(1));

        let mut hooks = Hooks::default();
        assert_eq!(manager.drain(&mut hooks).removed, 1);
        assert!(!manager.contains(victim));
        assert_eq!(hooks.torn_down, vec![victim]);
    }

    #[test]
    fn removal_preserves_survivor_order_and_index() {
        let mut manager = LifecycleManager::new();
        let all: Vec<EntityId> = (0..6).map(|i| manager.create(format!("e{i}")).id()).collect();
        for &id in &[all[0], all[2], all[5]] {
            assert!(manager.mark_for_deletion(id));
        }
        let mut hooks = Hooks::default();
        assert_eq!(manager.cleanup(&mut hooks), 3);

        assert_eq!(ids(&manager), vec![all[1], all[3], all[4]]);
        for &id in &[all[1], all[3], all[4]] {
            assert_eq!(manager.get(id).map(Entity::id), Some(id));
        }
        assert_eq!(hooks.torn_down, vec![all[0], all[2], all[5]]);
    }

    #[test]
    fn stale_ids_do_not_hit_recycled_slots() {
        let mut manager = LifecycleManager::new();
        let old = manager.create("old").id();
        manager.mark_for_deletion(old);
        let mut hooks = Hooks::default();
        manager.cleanup(&mut hooks);

        let new = manager.create("new").id();
        assert_eq!(new.index(), old.index());
        assert!(!manager.mark_for_deletion(old));
        assert!(manager.get(old).is_none());
        assert!(!manager.get(new).map(Entity::is_marked_for_deletion).unwrap_or(true));
    }

    #[test]
    fn drain_removes_before_spawning() {
        let mut manager = LifecycleManager::new();
        let doomed = manager.create("doomed").id();
        manager.mark_for_deletion(doomed);
        manager.queue_spawn(SpawnRequest::new("fresh", Vec2::new(1.0, 2.0)));

        let mut hooks = Hooks::default();
        let report = manager.drain(&mut hooks);
        assert_eq!(report, DrainReport { removed: 1, spawned: 1 });
        // The fresh entity may reuse the slot, but under a new generation.
        let fresh = manager.find_by_tag("fresh").map(Entity::id).expect("fresh spawned");
        assert_ne!(fresh, doomed);
        assert_eq!(
            manager.get(fresh).and_then(|e| e.get::<Transform>()).map(|t| t.position),
            Some(Vec2::new(1.0, 2.0))
        );
    }

    #[test]
    fn clear_tears_everything_down() {
        let mut manager = LifecycleManager::new();
        manager.create("a");
        manager.create("b");
        manager.queue_spawn(SpawnRequest::new("c", Vec2::ZERO));
        let mut hooks = Hooks::default();
        manager.clear(&mut hooks);
        assert!(manager.is_empty());
        assert!(manager.pending_spawns().is_empty());
        assert_eq!(hooks.torn_down.len(), 2);
    }
}
