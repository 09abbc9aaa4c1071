//! Entity identifiers, allocation, and the entity container itself.
//!
//! An [`EntityId`] is a 64-bit handle that packs a *generation* counter in the
//! high 32 bits and an *index* in the low 32 bits. The generation is bumped
//! every time an index is recycled, so a reference held by a physics body or
//! a queued deletion can never resolve to a newer entity that reused the slot.
//!
//! An [`Entity`] owns a tag, a deletion mark and its ordered component set.
//! Entities are only created and destroyed by the
//! [`LifecycleManager`](crate::lifecycle::LifecycleManager).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::component::{Component, ComponentRegistry};
use crate::context::TickContext;
use crate::physics::PhysicsBackend;
use crate::render::RenderFrame;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Handle to a live entity.
///
/// Copies of it end up in places that outlive the entity: rapier user data,
/// queued deletions, collision reactions. Resolving a stale copy through the
/// [`LifecycleManager`](crate::lifecycle::LifecycleManager) yields `None`
/// because the slot's generation has moved on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

const GENERATION_SHIFT: u32 = 32;

impl EntityId {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self(u64::from(generation) << GENERATION_SHIFT | u64::from(index))
    }

    /// Slot in the allocator.
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// How many times the slot had been freed when this id was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> GENERATION_SHIFT) as u32
    }

    /// Packed form stored in a physics body's user data.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index(), self.generation())
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({self})")
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Hands out [`EntityId`]s for the lifecycle manager.
///
/// Released slots wait in a FIFO queue, so a slot freed by this tick's sweep
/// is the last one reused.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_indices: VecDeque<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`EntityId`], reusing a released index when one is
    /// available.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_indices.pop_front() {
            // Generation was already bumped on release.
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Release an id so its index can be recycled under a new generation.
    ///
    /// Returns `false` if the id was already released or is stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        true
    }

    /// Returns `true` if `id` is currently allocated with a matching generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == id.generation()
    }

    /// Number of currently allocated ids.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A game object: identity, tag, deletion mark and ordered components.
pub struct Entity {
    id: EntityId,
    tag: String,
    marked: bool,
    components: ComponentRegistry,
}

impl Entity {
    /// Create an empty entity. Normally called by the lifecycle manager with
    /// a freshly allocated id.
    pub fn new(id: EntityId, tag: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.into(),
            marked: false,
            components: ComponentRegistry::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    /// Whether the entity will be removed at the next lifecycle drain.
    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked
    }

    /// Flag the entity for removal. The mark is never cleared.
    pub fn mark_for_deletion(&mut self) {
        self.marked = true;
    }

    /// Attach a component and run its `init` hook against the components
    /// attached before it. A second component of the same type replaces the
    /// first in place.
    pub fn add<T: Component>(&mut self, component: T) {
        self.components.add(self.id, component);
    }

    /// Builder form of [`add`](Self::add).
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.add(component);
        self
    }

    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    pub fn has<T: Component>(&self) -> bool {
        self.components.contains::<T>()
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Run the post-construction hook of every component, in attachment order.
    pub fn spawned(&mut self, physics: &mut dyn PhysicsBackend) {
        self.components.spawn_all(physics);
    }

    /// Update every component in attachment order.
    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        self.components.update_all(ctx);
    }

    /// Render every component in attachment order.
    pub fn render(&self, frame: &mut RenderFrame<'_>) {
        self.components.render_all(frame);
    }

    /// Release external resources held by components, then drop them.
    pub fn teardown(&mut self, physics: &mut dyn PhysicsBackend) {
        self.components.teardown_all(physics);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("marked", &self.marked)
            .field("components", &self.components.type_names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
