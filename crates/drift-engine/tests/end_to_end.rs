//! End-to-end runs through the real rapier2d world.
//!
//! Validates:
//! 1. A player spawned on top of an asteroid produces exactly one reaction
//!    on the first tick and is gone after the drain.
//! 2. The explosion queued by the reaction appears, bursts, and expires.
//! 3. Nothing reacts again once the player is gone.
//! 4. Identical seeds and input give identical runs.

use drift_engine::prelude::*;

fn driver_with(level: Level) -> SimulationDriver {
    let mut driver = SimulationDriver::new(
        &Settings::default(),
        Box::new(RapierWorld::new_zero_gravity()),
        Collaborators {
            audio: Box::new(RecordingAudio::default()),
            ..Collaborators::default()
        },
    );
    driver.load_level(level);
    driver
}

fn collision_level() -> Level {
    Level {
        entities: vec![
            SpawnRequest::new(kinds::PLAYER, Vec2::ZERO),
            SpawnRequest::new(kinds::ASTEROID, Vec2::ZERO).with_size(80.0),
        ],
    }
}

// ---------------------------------------------------------------------------
// Test 1: overlapping player and asteroid
// ---------------------------------------------------------------------------

#[test]
fn overlapping_player_and_asteroid_react_once() {
    let mut driver = driver_with(collision_level());
    assert_eq!(driver.physics().body_count(), 2);
    let player = driver.player().map(Entity::id).expect("player spawned");

    let report = driver.tick();
    assert!(report.physics_stepped);
    assert_eq!(report.reactions.len(), 1);
    let reaction = &report.reactions[0];
    assert_eq!(reaction.player, player);
    assert!(reaction.ended_run);
    assert!(reaction.location.length() < 20.0);

    // The drain removed the player and materialized the explosion.
    assert_eq!(report.removed, 1);
    assert_eq!(report.spawned, 1);
    assert!(driver.player().is_none());
    assert!(!driver.lifecycle().contains(player));
    assert_eq!(driver.lifecycle().count_tag(kinds::EXPLOSION), 1);
    assert_eq!(driver.lifecycle().count_tag(kinds::ASTEROID), 1);
    assert_eq!(driver.physics().body_count(), 1);
    assert!(driver.score().is_game_over());
}

// ---------------------------------------------------------------------------
// Test 2: the explosion bursts and expires
// ---------------------------------------------------------------------------

#[test]
fn explosion_bursts_then_expires() {
    let mut driver = driver_with(collision_level());
    driver.tick();

    // The burst runs over the next ticks.
    driver.run_ticks(15);
    assert!(!driver.particles().is_empty());

    // One second of explosion lifetime, plus slack.
    driver.run_ticks(60);
    assert_eq!(driver.lifecycle().count_tag(kinds::EXPLOSION), 0);
}

// ---------------------------------------------------------------------------
// Test 3: no further reactions
// ---------------------------------------------------------------------------

#[test]
fn no_reactions_after_player_is_gone() {
    let mut driver = driver_with(collision_level());
    driver.tick();
    let later: usize = driver.run_ticks(100).iter().map(|r| r.reactions.len()).sum();
    assert_eq!(later, 0);
    assert_eq!(driver.translator().reactions(), 1);

    let mut sink = RecordingSink::default();
    driver.render(&mut sink);
    assert!(matches!(
        sink.commands.last(),
        Some(DrawCommand::Hud { game_over: true, .. })
    ));
}

#[test]
fn restart_after_crash_starts_a_clean_run() {
    let mut driver = driver_with(collision_level());
    driver.tick();
    assert!(driver.score().is_game_over());

    driver.set_input(InputSnapshot::new().with_key(Key::R));
    let report = driver.tick();
    // The restart rebuilt the overlapping level, so it crashes again at once.
    assert_eq!(report.reactions.len(), 1);
    assert!(report.reactions[0].ended_run);
}

// ---------------------------------------------------------------------------
// Test 4: determinism
// ---------------------------------------------------------------------------

#[test]
fn same_seed_same_run() {
    fn run() -> (Vec<Vec2>, usize, i64) {
        let mut driver = driver_with(Level {
            entities: vec![
                SpawnRequest::new(kinds::PLAYER, Vec2::ZERO),
                SpawnRequest::new(kinds::ASTEROID, Vec2::new(600.0, 40.0)).with_size(60.0),
            ],
        });
        driver.set_input(
            InputSnapshot::new()
                .with_button(MouseButton::Left)
                .at_pointer(Vec2::new(1200.0, 380.0)),
        );
        driver.run_ticks(120);
        let positions = driver
            .lifecycle()
            .iter()
            .filter_map(|e| e.get::<Transform>())
            .map(|t| t.position)
            .collect();
        (positions, driver.particles().len(), driver.score().score())
    }

    assert_eq!(run(), run());
}
