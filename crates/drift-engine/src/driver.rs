//! The simulation driver: owns every subsystem and runs the fixed tick.
//!
//! Each tick runs seven phases in a fixed order:
//!
//! 1. Refresh the input snapshot.
//! 2. Step physics (skipped while the world reports itself invalid).
//! 3. Translate contact-begin events into reactions.
//! 4. Update every live entity, in creation order.
//! 5. Update particles.
//! 6. Recompute score and difficulty.
//! 7. Drain the lifecycle manager: removals, then queued spawns.
//!
//! Per rendered frame the driver feeds the wall-clock delta to the
//! [`SimulationClock`], runs however many ticks are due and renders the
//! now-stable entity list once.
//!
//! # Example
//!
//! ```
//! use drift_engine::prelude::*;
//!
//! let settings = Settings::default();
//! let mut driver = SimulationDriver::new(
//!     &settings,
//!     Box::new(RapierWorld::new_zero_gravity()),
//!     Collaborators::default(),
//! );
//! driver.load_level(Level {
//!     entities: vec![SpawnRequest::new(kinds::PLAYER, Vec2::ZERO)],
//! });
//!
//! let mut sink = RecordingSink::default();
//! let ticks = driver.run_frame(0.06, &mut sink);
//! assert_eq!(ticks, 3);
//! assert_eq!(driver.tick_count(), 3);
//! assert!(driver.player().is_some());
//! ```

use std::time::{Duration, Instant};

use glam::Vec2;
use tracing::{debug, debug_span, info, warn};

use crate::assets::{AssetCatalog, AssetManifest};
use crate::audio::{AudioSink, NullAudio};
use crate::clock::SimulationClock;
use crate::collision::{CollisionReaction, CollisionTranslator};
use crate::components::Transform;
use crate::config::Settings;
use crate::context::Resources;
use crate::entity::Entity;
use crate::factory::{kinds, EntityFactory, Level, SpawnRequest};
use crate::input::{InputSnapshot, Key};
use crate::lifecycle::{DrainReport, EntityHooks, LifecycleManager};
use crate::particles::ParticleEngine;
use crate::physics::PhysicsBackend;
use crate::render::{DrawCommand, RenderFrame, RenderSink, View};
use crate::score::{HighScoreStore, MemoryHighScore, ScoreKeeper};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Platform services the driver consumes but does not implement.
pub struct Collaborators {
    pub assets: Box<dyn AssetCatalog>,
    pub audio: Box<dyn AudioSink>,
    pub high_scores: Box<dyn HighScoreStore>,
}

impl Default for Collaborators {
    /// Empty manifest, silent audio, in-memory high score.
    fn default() -> Self {
        Self {
            assets: Box::new(AssetManifest::default()),
            audio: Box::new(NullAudio),
            high_scores: Box::new(MemoryHighScore::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics / TickReport
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per phase, in execution order.
    pub phase_times: Vec<(&'static str, Duration)>,
    /// Total time for the tick.
    pub total_time: Duration,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Index of the tick, starting at 0.
    pub tick: u64,
    pub physics_stepped: bool,
    pub reactions: Vec<CollisionReaction>,
    pub removed: usize,
    pub spawned: usize,
}

// ---------------------------------------------------------------------------
// Entity assembly
// ---------------------------------------------------------------------------

/// Lifecycle hooks that build entities through the factory and bind their
/// bodies to the physics world.
struct Assembler<'a> {
    physics: &'a mut dyn PhysicsBackend,
    factory: &'a EntityFactory,
    assets: &'a dyn AssetCatalog,
}

impl EntityHooks for Assembler<'_> {
    fn build(&mut self, request: &SpawnRequest, entity: &mut Entity) {
        self.factory.build(request, entity, self.assets);
    }

    fn spawned(&mut self, entity: &mut Entity) {
        entity.spawned(self.physics);
    }

    fn teardown(&mut self, entity: &mut Entity) {
        entity.teardown(self.physics);
    }
}

// ---------------------------------------------------------------------------
// SimulationDriver
// ---------------------------------------------------------------------------

pub struct SimulationDriver {
    settings: Settings,
    clock: SimulationClock,
    resources: Resources,
    lifecycle: LifecycleManager,
    translator: CollisionTranslator,
    score: ScoreKeeper,
    factory: EntityFactory,
    assets: Box<dyn AssetCatalog>,
    audio: Box<dyn AudioSink>,
    level: Level,
    input: InputSnapshot,
    tick_counter: u64,
    last_diagnostics: TickDiagnostics,
    physics_warned: bool,
}

impl SimulationDriver {
    /// Build a driver around `physics`. The settings are sanitized first.
    pub fn new(settings: &Settings, physics: Box<dyn PhysicsBackend>, collaborators: Collaborators) -> Self {
        let settings = settings.clone().sanitized();
        let view = View::new(Vec2::new(settings.width as f32, settings.height as f32));
        let resources = Resources::new(physics, settings.seed, settings.max_particles, view);
        info!(
            logic_fps = settings.logic_fps,
            render_fps = settings.render_fps,
            substeps = settings.physics_substeps,
            seed = settings.seed,
            "simulation driver created"
        );
        Self {
            clock: SimulationClock::new(settings.clock_config()),
            resources,
            lifecycle: LifecycleManager::new(),
            translator: CollisionTranslator::new(),
            score: ScoreKeeper::new(collaborators.high_scores),
            factory: EntityFactory::default(),
            assets: collaborators.assets,
            audio: collaborators.audio,
            level: Level::default(),
            input: InputSnapshot::default(),
            tick_counter: 0,
            last_diagnostics: TickDiagnostics::default(),
            physics_warned: false,
            settings,
        }
    }

    /// Replace the entity factory used for every later spawn.
    pub fn with_factory(mut self, factory: EntityFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Remember `level` and start a run from it.
    pub fn load_level(&mut self, level: Level) {
        self.level = level;
        self.restart();
    }

    /// Start a new run from the loaded level. The high score survives;
    /// entities, particles, score and difficulty do not.
    pub fn restart(&mut self) {
        let mut hooks = Assembler {
            physics: self.resources.physics.as_mut(),
            factory: &self.factory,
            assets: self.assets.as_ref(),
        };
        self.lifecycle.clear(&mut hooks);
        for request in &self.level.entities {
            self.lifecycle.spawn_now(request, &mut hooks);
        }

        self.resources.particles.clear();
        self.resources.view.center = Vec2::ZERO;
        self.score.reset();
        self.resources.difficulty = self.score.difficulty();
        self.resources.game_over = false;
        self.clock.reset();
        info!(entities = self.lifecycle.len(), "run started");
    }

    /// Input state to use from the next tick on.
    pub fn set_input(&mut self, snapshot: InputSnapshot) {
        self.input = snapshot;
    }

    // -- Tick ---------------------------------------------------------------

    /// Run one fixed tick.
    pub fn tick(&mut self) -> TickReport {
        let span = debug_span!("tick", tick = self.tick_counter);
        let _enter = span.enter();

        let dt = self.clock.fixed_dt() as f32;
        let tick_start = Instant::now();
        let mut phase_times = Vec::with_capacity(7);

        // Phase 1: input.
        let phase = Instant::now();
        self.resources.input.refresh(&self.input);
        if self.score.is_game_over() && self.resources.input.key_just_pressed(Key::R) {
            self.restart();
        }
        phase_times.push(("input", phase.elapsed()));

        // Phase 2: physics.
        let phase = Instant::now();
        let physics_stepped = self.step_physics(dt);
        phase_times.push(("physics", phase.elapsed()));

        // Phase 3: collisions. A skipped step leaves stale events behind.
        let phase = Instant::now();
        let reactions = if physics_stepped {
            self.translator.translate(
                self.resources.physics.as_ref(),
                &mut self.lifecycle,
                &mut self.score,
                self.audio.as_mut(),
            )
        } else {
            Vec::new()
        };
        phase_times.push(("collisions", phase.elapsed()));

        // Phase 4: entities.
        let phase = Instant::now();
        self.lifecycle.update_all(&mut self.resources, dt);
        phase_times.push(("entities", phase.elapsed()));

        // Phase 5: particles.
        let phase = Instant::now();
        self.resources.particles.update(dt);
        phase_times.push(("particles", phase.elapsed()));

        // Phase 6: score and difficulty.
        let phase = Instant::now();
        let player_x = self
            .lifecycle
            .find_by_tag(kinds::PLAYER)
            .filter(|player| !player.is_marked_for_deletion())
            .and_then(|player| player.get::<Transform>())
            .map(|transform| transform.position.x);
        self.score.recompute(player_x);
        self.resources.difficulty = self.score.difficulty();
        self.resources.game_over = self.score.is_game_over();
        phase_times.push(("score", phase.elapsed()));

        // Phase 7: lifecycle drain.
        let phase = Instant::now();
        let DrainReport { removed, spawned } = {
            let mut hooks = Assembler {
                physics: self.resources.physics.as_mut(),
                factory: &self.factory,
                assets: self.assets.as_ref(),
            };
            self.lifecycle.drain(&mut hooks)
        };
        phase_times.push(("lifecycle", phase.elapsed()));

        let tick = self.tick_counter;
        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            phase_times,
            total_time: tick_start.elapsed(),
        };
        debug!(
            entities = self.lifecycle.len(),
            particles = self.resources.particles.len(),
            removed,
            spawned,
            "tick complete"
        );

        TickReport {
            tick,
            physics_stepped,
            reactions,
            removed,
            spawned,
        }
    }

    fn step_physics(&mut self, dt: f32) -> bool {
        if !self.resources.physics.is_valid() {
            if !self.physics_warned {
                warn!("physics world invalid, skipping physics until it recovers");
                self.physics_warned = true;
            }
            return false;
        }
        if self.physics_warned {
            info!("physics world recovered");
            self.physics_warned = false;
        }
        self.resources.physics.step(dt, self.settings.physics_substeps);
        true
    }

    /// Run `count` ticks back to back, without rendering.
    pub fn run_ticks(&mut self, count: u64) -> Vec<TickReport> {
        (0..count).map(|_| self.tick()).collect()
    }

    // -- Frames -------------------------------------------------------------

    /// Feed one frame's wall-clock delta to the clock, run the ticks it
    /// makes due, then render once. Returns the number of ticks run.
    pub fn run_frame(&mut self, wall_dt: f64, sink: &mut dyn RenderSink) -> u32 {
        let ticks = self.clock.advance(wall_dt);
        for _ in 0..ticks {
            self.tick();
        }
        self.render(sink);
        ticks
    }

    /// Real-time frame loop for `duration` of wall time, paced to the
    /// render rate. `before_frame` runs ahead of every frame, e.g. to feed
    /// input. Returns the number of ticks run.
    pub fn run_for(
        &mut self,
        duration: Duration,
        sink: &mut dyn RenderSink,
        mut before_frame: impl FnMut(&mut Self),
    ) -> u64 {
        let started = Instant::now();
        let mut ticks = 0u64;
        self.clock.measure_frame();
        while started.elapsed() < duration {
            let frame_started = Instant::now();
            before_frame(self);
            let wall_dt = self.clock.measure_frame();
            ticks += u64::from(self.run_frame(wall_dt, sink));
            self.clock.pace(frame_started);
        }
        ticks
    }

    /// Draw entities in creation order, then particles, then the HUD.
    pub fn render(&self, sink: &mut dyn RenderSink) {
        sink.begin_frame();
        {
            let mut frame = RenderFrame::new(
                &self.resources.view,
                self.assets.as_ref(),
                sink,
                self.clock.alpha() as f32,
            );
            for entity in self.lifecycle.iter() {
                entity.render(&mut frame);
            }
            self.resources.particles.render(&mut frame);
            frame.draw(DrawCommand::Hud {
                score: self.score.score(),
                high_score: self.score.high_score(),
                game_over: self.score.is_game_over(),
            });
        }
        sink.end_frame();
    }

    // -- Accessors ----------------------------------------------------------

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds, computed from the tick count.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.clock.fixed_dt()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Mutable lifecycle access, for setup outside a tick.
    pub fn lifecycle_mut(&mut self) -> &mut LifecycleManager {
        &mut self.lifecycle
    }

    pub fn particles(&self) -> &ParticleEngine {
        &self.resources.particles
    }

    pub fn score(&self) -> &ScoreKeeper {
        &self.score
    }

    pub fn translator(&self) -> &CollisionTranslator {
        &self.translator
    }

    pub fn view(&self) -> &View {
        &self.resources.view
    }

    pub fn physics(&self) -> &dyn PhysicsBackend {
        self.resources.physics.as_ref()
    }

    /// The live player entity, if any.
    pub fn player(&self) -> Option<&Entity> {
        self.lifecycle.find_by_tag(kinds::PLAYER)
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;
    use crate::render::RecordingSink;
    use crate::score::MemoryHighScore;
    use crate::testing::NullPhysics;

    fn driver(physics: NullPhysics) -> SimulationDriver {
        SimulationDriver::new(&Settings::default(), Box::new(physics), Collaborators::default())
    }

    fn level() -> Level {
        Level {
            entities: vec![
                SpawnRequest::new(kinds::BACKGROUND, Vec2::ZERO),
                SpawnRequest::new(kinds::PLAYER, Vec2::ZERO),
            ],
        }
    }

    // -- 1. Ticks and time --------------------------------------------------

    #[test]
    fn tick_advances_counter_and_time() {
        let mut driver = driver(NullPhysics::default());
        let reports = driver.run_ticks(120);
        assert_eq!(driver.tick_count(), 120);
        assert_eq!(reports.last().map(|r| r.tick), Some(119));
        assert!((driver.sim_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn diagnostics_record_every_phase_in_order() {
        let mut driver = driver(NullPhysics::default());
        driver.tick();
        let names: Vec<&str> = driver.last_diagnostics().phase_times.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["input", "physics", "collisions", "entities", "particles", "score", "lifecycle"]
        );
        let sum: Duration = driver.last_diagnostics().phase_times.iter().map(|(_, d)| *d).sum();
        assert!(driver.last_diagnostics().total_time >= sum);
    }

    #[test]
    fn run_frame_runs_due_ticks_and_renders_once() {
        let mut driver = driver(NullPhysics::default());
        let mut sink = RecordingSink::default();
        assert_eq!(driver.run_frame(0.06, &mut sink), 3);
        assert_eq!(driver.run_frame(0.0, &mut sink), 0);
        assert_eq!(sink.frames, 2);
        // A stalled frame is clamped to the 0.25 s ceiling.
        assert_eq!(driver.run_frame(10.0, &mut sink), 15);
    }

    // -- 2. Physics validity ------------------------------------------------

    #[test]
    fn invalid_physics_skips_step_but_not_the_rest() {
        let mut driver = driver(NullPhysics::invalid());
        driver.load_level(level());
        let report = driver.tick();
        assert!(!report.physics_stepped);
        assert!(report.reactions.is_empty());
        assert_eq!(driver.tick_count(), 1);
        assert!(driver.player().is_some());
    }

    #[test]
    fn valid_physics_is_stepped() {
        let mut driver = driver(NullPhysics::default());
        assert!(driver.tick().physics_stepped);
    }

    // -- 3. Levels and restart ----------------------------------------------

    #[test]
    fn load_level_spawns_in_order() {
        let mut driver = driver(NullPhysics::default());
        driver.load_level(level());
        let tags: Vec<&str> = driver.lifecycle().iter().map(|e| e.tag()).collect();
        assert_eq!(tags, vec![kinds::BACKGROUND, kinds::PLAYER]);
        assert_eq!(driver.physics().body_count(), 1);
    }

    #[test]
    fn restart_rebuilds_level_and_releases_bodies() {
        let mut driver = driver(NullPhysics::default());
        driver.load_level(level());
        driver.run_ticks(30);
        driver.restart();
        assert_eq!(driver.lifecycle().len(), 2);
        assert_eq!(driver.physics().body_count(), 1);
        assert!(driver.particles().is_empty());
        assert_eq!(driver.score().score(), 0);
    }

    #[test]
    fn thrust_moves_player_forward_and_scores() {
        let mut driver = SimulationDriver::new(
            &Settings::default(),
            Box::new(crate::physics::RapierWorld::new_zero_gravity()),
            Collaborators {
                high_scores: Box::new(MemoryHighScore::new(0)),
                ..Collaborators::default()
            },
        );
        driver.load_level(Level {
            entities: vec![SpawnRequest::new(kinds::PLAYER, Vec2::ZERO)],
        });
        // Pointer right of the screen center: the rocket faces +x.
        driver.set_input(
            InputSnapshot::new()
                .with_button(MouseButton::Left)
                .at_pointer(Vec2::new(1280.0, 360.0)),
        );
        driver.run_ticks(90);

        let x = driver
            .player()
            .and_then(|p| p.get::<Transform>())
            .map(|t| t.position.x)
            .unwrap_or_default();
        assert!(x > 100.0, "player barely moved: {x}");
        assert!(driver.score().score() >= 1);
        assert!(driver.score().difficulty() > 1.0);
        assert!(!driver.particles().is_empty());
    }

    // -- 4. Rendering -------------------------------------------------------

    #[test]
    fn render_ends_with_hud() {
        let mut driver = driver(NullPhysics::default());
        driver.load_level(level());
        let mut sink = RecordingSink::default();
        driver.render(&mut sink);
        assert_eq!(
            sink.commands.last(),
            Some(&DrawCommand::Hud {
                score: 0,
                high_score: 0,
                game_over: false
            })
        );
        // The player's sprite falls back to a flat rect without a manifest.
        assert!(sink
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Rect { .. })));
        assert_eq!(sink.frames, 1);
    }
}
