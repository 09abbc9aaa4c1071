//! Component trait and the per-entity, type-keyed component registry.
//!
//! Each entity holds at most one component per concrete type. Components are
//! stored in attachment order, and that order is the order in which they are
//! updated and rendered. Lookup by type is a hash probe on [`TypeId`] followed
//! by a downcast.
//!
//! During its own update a component is taken out of its slot, so it can be
//! handed a mutable view of the remaining siblings without aliasing itself.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use tracing::debug;

use crate::context::TickContext;
use crate::entity::EntityId;
use crate::physics::PhysicsBackend;
use crate::render::RenderFrame;

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// Upcast helper so boxed components can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of behavior attached to an entity.
///
/// Every hook has a no-op default, so a component only implements what it
/// needs. Siblings passed to `init` are the components attached earlier;
/// siblings passed to the other hooks are all other components of the owner.
pub trait Component: AsAny {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Called once, when the component is attached to `owner`.
    fn init(&mut self, _owner: EntityId, _siblings: &ComponentRegistry) {}

    /// Called once after the owning entity has been fully built.
    fn spawned(&mut self, _siblings: &ComponentRegistry, _physics: &mut dyn PhysicsBackend) {}

    /// Called once per tick.
    fn update(&mut self, _siblings: &mut ComponentRegistry, _ctx: &mut TickContext<'_>) {}

    /// Called once per rendered frame.
    fn render(&self, _siblings: &ComponentRegistry, _frame: &mut RenderFrame<'_>) {}

    /// Called when the owning entity is destroyed.
    fn teardown(&mut self, _physics: &mut dyn PhysicsBackend) {}
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

struct Slot {
    type_name: &'static str,
    component: Option<Box<dyn Component>>,
}

/// Ordered, type-keyed component storage for a single entity.
#[derive(Default)]
pub struct ComponentRegistry {
    slots: Vec<Slot>,
    by_type: HashMap<TypeId, usize>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `component` for `owner` and run its `init` hook.
    ///
    /// If a component of the same type is already present, the new one takes
    /// its slot (and therefore its update position) and the old one is dropped.
    pub fn add<T: Component>(&mut self, owner: EntityId, component: T) {
        let type_id = TypeId::of::<T>();
        let existing = self.by_type.get(&type_id).copied();
        if let Some(idx) = existing {
            debug!(
                entity = %owner,
                component = self.slots[idx].type_name,
                "replacing component of the same type"
            );
            self.slots[idx].component = None;
        }

        let mut boxed: Box<dyn Component> = Box::new(component);
        boxed.init(owner, self);

        match existing {
            Some(idx) => self.slots[idx].component = Some(boxed),
            None => {
                self.by_type.insert(type_id, self.slots.len());
                self.slots.push(Slot {
                    type_name: std::any::type_name::<T>(),
                    component: Some(boxed),
                });
            }
        }
    }

    /// Look up a component by concrete type.
    pub fn get<T: Component>(&self) -> Option<&T> {
        let idx = *self.by_type.get(&TypeId::of::<T>())?;
        self.slots[idx]
            .component
            .as_deref()
            .and_then(|c| c.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        let idx = *self.by_type.get(&TypeId::of::<T>())?;
        self.slots[idx]
            .component
            .as_deref_mut()
            .and_then(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// Whether a component of type `T` is attached and currently accessible.
    pub fn contains<T: Component>(&self) -> bool {
        self.get::<T>().is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Type names in attachment order.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.type_name).collect()
    }

    pub(crate) fn spawn_all(&mut self, physics: &mut dyn PhysicsBackend) {
        for idx in 0..self.slots.len() {
            let Some(mut component) = self.slots[idx].component.take() else {
                continue;
            };
            component.spawned(self, physics);
            self.slots[idx].component = Some(component);
        }
    }

    /// Update every component in attachment order.
    pub fn update_all(&mut self, ctx: &mut TickContext<'_>) {
        // Components attached during this pass are first updated next tick.
        let count = self.slots.len();
        for idx in 0..count {
            let Some(mut component) = self.slots[idx].component.take() else {
                continue;
            };
            component.update(self, ctx);
            self.slots[idx].component = Some(component);
        }
    }

    pub fn render_all(&self, frame: &mut RenderFrame<'_>) {
        for slot in &self.slots {
            if let Some(component) = &slot.component {
                component.render(self, frame);
            }
        }
    }

    /// Run every teardown hook, then drop all components.
    pub fn teardown_all(&mut self, physics: &mut dyn PhysicsBackend) {
        for slot in &mut self.slots {
            if let Some(component) = slot.component.as_mut() {
                component.teardown(physics);
            }
        }
        self.slots.clear();
        self.by_type.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
