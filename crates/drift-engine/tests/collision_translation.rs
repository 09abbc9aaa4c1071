//! Contact translation against a scripted physics backend.
//!
//! The backend creates bodies on request but never simulates; the test
//! decides which contacts begin on which step. This pins down the
//! translator's bookkeeping independently of the solver:
//! 1. One begin event yields one reaction, however long the contact lasts.
//! 2. Several begin events in one step each yield a reaction.
//! 3. Events naming destroyed bodies are skipped.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use drift_engine::prelude::*;

// ---------------------------------------------------------------------------
// Scripted backend
// ---------------------------------------------------------------------------

type Script = Rc<RefCell<VecDeque<Vec<(ShapeHandle, ShapeHandle)>>>>;

#[derive(Default)]
struct ScriptedPhysics {
    script: Script,
    events: Vec<(ShapeHandle, ShapeHandle)>,
    bodies: HashMap<BodyHandle, (Vec2, Option<EntityId>)>,
    next: u64,
}

impl PhysicsBackend for ScriptedPhysics {
    fn step(&mut self, _dt: f32, _substeps: u32) {
        self.events = self.script.borrow_mut().pop_front().unwrap_or_default();
    }

    fn contact_begin_events(&self) -> &[(ShapeHandle, ShapeHandle)] {
        &self.events
    }

    fn body_of(&self, shape: ShapeHandle) -> Option<BodyHandle> {
        let body = BodyHandle(shape.0);
        self.bodies.contains_key(&body).then_some(body)
    }

    fn user_data(&self, body: BodyHandle) -> Option<EntityId> {
        self.bodies.get(&body).and_then(|(_, user)| *user)
    }

    fn set_user_data(&mut self, body: BodyHandle, entity: EntityId) -> bool {
        match self.bodies.get_mut(&body) {
            Some((_, user)) => {
                *user = Some(entity);
                true
            }
            None => false,
        }
    }

    fn create_body(&mut self, desc: &BodyDesc) -> Option<BodyHandle> {
        self.next += 1;
        let body = BodyHandle(self.next);
        self.bodies.insert(body, (desc.position, None));
        Some(body)
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        self.bodies.remove(&body).is_some()
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|(position, _)| *position)
    }

    fn rotation(&self, body: BodyHandle) -> Option<f32> {
        self.bodies.get(&body).map(|_| 0.0)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|_| Vec2::ZERO)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, _velocity: Vec2) -> bool {
        self.bodies.contains_key(&body)
    }

    fn apply_force(&mut self, body: BodyHandle, _force: Vec2) -> bool {
        self.bodies.contains_key(&body)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

fn shape_of(driver: &SimulationDriver, tag: &str) -> ShapeHandle {
    let body = driver
        .lifecycle()
        .iter()
        .find(|e| e.has_tag(tag))
        .and_then(|e| e.get::<PhysicsBody>())
        .and_then(PhysicsBody::handle)
        .expect("entity has a body");
    ShapeHandle(body.0)
}

fn scripted_driver(level: Level) -> (SimulationDriver, Script) {
    let physics = ScriptedPhysics::default();
    let script = Rc::clone(&physics.script);
    let mut driver = SimulationDriver::new(&Settings::default(), Box::new(physics), Collaborators::default());
    driver.load_level(level);
    (driver, script)
}

fn player_and_asteroids(asteroids: usize) -> Level {
    let mut entities = vec![SpawnRequest::new(kinds::PLAYER, Vec2::new(50.0, 0.0))];
    for i in 0..asteroids {
        entities.push(SpawnRequest::new(kinds::ASTEROID, Vec2::new(100.0 * i as f32, 300.0)));
    }
    Level { entities }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn one_begin_event_then_silent_contact_reacts_once() {
    let (mut driver, script) = scripted_driver(player_and_asteroids(1));
    let pair = (shape_of(&driver, kinds::PLAYER), shape_of(&driver, kinds::ASTEROID));
    script.borrow_mut().push_back(vec![pair]);

    let first = driver.tick();
    assert_eq!(first.reactions.len(), 1);
    // The scripted body never moved, so the location is its spawn point.
    assert!((first.reactions[0].location - Vec2::new(50.0, 0.0)).length() < 1e-3);

    // The contact persists but no new begin events arrive.
    let later: usize = driver.run_ticks(100).iter().map(|r| r.reactions.len()).sum();
    assert_eq!(later, 0);
    assert_eq!(driver.translator().reactions(), 1);
}

#[test]
fn every_begin_event_in_a_step_reacts() {
    let (mut driver, script) = scripted_driver(player_and_asteroids(2));
    let player = shape_of(&driver, kinds::PLAYER);
    let asteroids: Vec<ShapeHandle> = driver
        .lifecycle()
        .iter()
        .filter(|e| e.has_tag(kinds::ASTEROID))
        .filter_map(|e| e.get::<PhysicsBody>().and_then(PhysicsBody::handle))
        .map(|b| ShapeHandle(b.0))
        .collect();
    assert_eq!(asteroids.len(), 2);
    script
        .borrow_mut()
        .push_back(vec![(player, asteroids[0]), (asteroids[1], player)]);

    let report = driver.tick();
    assert_eq!(report.reactions.len(), 2);
    assert!(report.reactions[0].ended_run);
    assert!(!report.reactions[1].ended_run);
    // Two explosions queued, one player removed.
    assert_eq!(report.spawned, 2);
    assert_eq!(report.removed, 1);
}

#[test]
fn events_for_destroyed_bodies_are_skipped() {
    let (mut driver, script) = scripted_driver(player_and_asteroids(1));
    let pair = (shape_of(&driver, kinds::PLAYER), shape_of(&driver, kinds::ASTEROID));
    script.borrow_mut().push_back(vec![pair]);
    driver.tick();

    // The player's body is gone; replaying the same pair must do nothing.
    script.borrow_mut().push_back(vec![pair]);
    let report = driver.tick();
    assert!(report.reactions.is_empty());
    assert!(driver.translator().skipped() >= 1);
}
