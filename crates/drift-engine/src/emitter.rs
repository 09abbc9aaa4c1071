//! Particle emitter component.
//!
//! An emitter samples particles relative to its owner's [`Transform`] and
//! pushes them into the shared [`ParticleEngine`](crate::particles::ParticleEngine).
//!
//! Two emission styles share one sampler:
//!
//! - **Continuous**: `spawn_rate` particles per second. Fractional particles
//!   are carried as credit between ticks, so over `T` seconds exactly
//!   `floor(spawn_rate * T)` particles appear (within one).
//! - **Burst**: a triggered cycle that emits `burst_count` particles spread
//!   over `burst_duration` seconds. Each tick emits
//!   `ceil(burst_count / burst_duration * dt)` particles, at least one and at
//!   most what is left; the tick that closes the window takes the remainder.
//!   Burst speed eases from fast to slow across the window.
//!
//! The emission gate ties continuous output to input, e.g. an engine trail
//! that only burns while thrust is held. A closed gate emits nothing and
//! keeps the accrued credit.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::{Component, ComponentRegistry};
use crate::components::Transform;
use crate::context::TickContext;
use crate::entity::EntityId;
use crate::input::{InputState, Key, MouseButton};
use crate::particles::{Particle, ParticleEngine};
use crate::render::Color;

/// Maximum lifetime jitter, as a fraction of the configured lifetime.
const LIFETIME_JITTER: f32 = 0.3;
/// Maximum size jitter for continuous emission.
const CONTINUOUS_SIZE_JITTER: f32 = 0.3;
/// Maximum size jitter for bursts.
const BURST_SIZE_JITTER: f32 = 0.5;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmitterMode {
    #[default]
    Continuous,
    /// Emits only when a burst is triggered.
    Burst,
}

/// Condition under which continuous emission runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmitGate {
    #[default]
    Always,
    WhileButtonHeld(MouseButton),
    WhileKeyHeld(Key),
}

impl EmitGate {
    pub fn is_open(self, input: &InputState) -> bool {
        match self {
            EmitGate::Always => true,
            EmitGate::WhileButtonHeld(button) => input.is_button_down(button),
            EmitGate::WhileKeyHeld(key) => input.is_key_down(key),
        }
    }
}

/// Emitter parameters. Angles are in degrees, relative to the owner's facing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub mode: EmitterMode,
    /// Particles per second in continuous mode.
    pub spawn_rate: f32,
    pub burst_count: u32,
    /// Seconds over which a burst spreads its particles.
    pub burst_duration: f32,
    pub lifetime: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub size: f32,
    /// Width of the emission cone.
    pub spread_deg: f32,
    /// Center of the emission cone. 180 points out the back.
    pub direction_offset_deg: f32,
    /// Spawn point in the owner's local frame.
    pub offset: Vec2,
    pub start_color: Color,
    pub end_color: Color,
    pub gate: EmitGate,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            mode: EmitterMode::Continuous,
            spawn_rate: 50.0,
            burst_count: 30,
            burst_duration: 0.15,
            lifetime: 0.5,
            speed_min: 50.0,
            speed_max: 150.0,
            size: 3.0,
            spread_deg: 360.0,
            direction_offset_deg: 180.0,
            offset: Vec2::ZERO,
            start_color: Color::ORANGE,
            end_color: Color::RED_CLEAR,
            gate: EmitGate::Always,
        }
    }
}

// ---------------------------------------------------------------------------
// ParticleEmitter
// ---------------------------------------------------------------------------

/// Observable emitter state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmitterState {
    Idle,
    Continuous,
    Burst { elapsed: f32, emitted: u32 },
}

#[derive(Debug, Clone, Copy)]
struct BurstCycle {
    elapsed: f32,
    emitted: u32,
}

#[derive(Debug, Clone, Copy)]
enum SpeedProfile {
    Uniform,
    /// Eased by burst progress `t` in `0.0..=1.0`.
    Eased(f32),
}

/// Owner pose at emission time.
#[derive(Debug, Clone, Copy)]
struct Origin {
    position: Vec2,
    facing: f32,
}

#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    config: EmitterConfig,
    active: bool,
    has_transform: bool,
    credit: f64,
    burst: Option<BurstCycle>,
    gate_open: bool,
    emitted_total: u64,
}

impl ParticleEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            active: true,
            has_transform: false,
            credit: 0.0,
            burst: None,
            gate_open: false,
            emitted_total: 0,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start a fresh burst cycle, discarding any cycle in progress.
    ///
    /// Without a sibling transform there is nothing to emit from, so the
    /// trigger is ignored.
    pub fn trigger_burst(&mut self) {
        if !self.has_transform {
            debug!("burst trigger ignored: emitter has no transform");
            return;
        }
        self.burst = Some(BurstCycle {
            elapsed: 0.0,
            emitted: 0,
        });
    }

    pub fn is_bursting(&self) -> bool {
        self.burst.is_some()
    }

    pub fn state(&self) -> EmitterState {
        match self.burst {
            Some(cycle) => EmitterState::Burst {
                elapsed: cycle.elapsed,
                emitted: cycle.emitted,
            },
            None if self.active && self.config.mode == EmitterMode::Continuous && self.gate_open => {
                EmitterState::Continuous
            }
            None => EmitterState::Idle,
        }
    }

    /// Particles emitted over the emitter's lifetime.
    pub fn emitted_total(&self) -> u64 {
        self.emitted_total
    }

    /// Fractional particles carried into the next tick.
    pub fn credit(&self) -> f64 {
        self.credit
    }

    fn emit_continuous(&mut self, origin: Origin, dt: f32, input: &InputState, rng: &mut Pcg32, pool: &mut ParticleEngine) -> u32 {
        self.gate_open = self.config.gate.is_open(input);
        if !self.gate_open {
            return 0;
        }
        self.credit += f64::from(dt) * f64::from(self.config.spawn_rate.max(0.0));
        let whole = self.credit.floor();
        self.credit -= whole;

        let count = whole as u32;
        for _ in 0..count {
            let particle = self.sample(origin, SpeedProfile::Uniform, CONTINUOUS_SIZE_JITTER, rng);
            pool.spawn(particle);
        }
        count
    }

    fn advance_burst(&mut self, origin: Origin, dt: f32, rng: &mut Pcg32, pool: &mut ParticleEngine) -> u32 {
        let Some(mut cycle) = self.burst else {
            return 0;
        };
        let total = self.config.burst_count;
        let duration = self.config.burst_duration;

        cycle.elapsed += dt;
        let finished = cycle.elapsed >= duration;
        let t = if duration > 0.0 {
            (cycle.elapsed / duration).min(1.0)
        } else {
            1.0
        };

        let remaining = total.saturating_sub(cycle.emitted);
        let quota = match remaining {
            0 => 0,
            _ if finished => remaining,
            _ => Self::burst_quota(total, duration, dt).clamp(1, remaining),
        };

        for _ in 0..quota {
            let particle = self.sample(origin, SpeedProfile::Eased(t), BURST_SIZE_JITTER, rng);
            pool.spawn(particle);
        }
        cycle.emitted += quota;

        self.burst = if finished || cycle.emitted >= total {
            None
        } else {
            Some(cycle)
        };
        quota
    }

    /// Particles one tick of length `dt` owes to a burst of `total` spread
    /// over `duration` seconds, before clamping.
    fn burst_quota(total: u32, duration: f32, dt: f32) -> u32 {
        let rate = total as f32 / duration;
        (rate * dt).ceil() as u32
    }

    fn sample(&self, origin: Origin, speed: SpeedProfile, size_jitter: f32, rng: &mut Pcg32) -> Particle {
        let c = &self.config;
        let position = origin.position + Vec2::from_angle(origin.facing).rotate(c.offset);

        let spread = c.spread_deg.to_radians();
        let angle = origin.facing + c.direction_offset_deg.to_radians() + rng.gen::<f32>() * spread
            - spread / 2.0;

        let span = c.speed_max - c.speed_min;
        let speed = match speed {
            SpeedProfile::Uniform => c.speed_min + span * rng.gen::<f32>(),
            SpeedProfile::Eased(t) => c.speed_min + span * (0.5 * rng.gen::<f32>() + 0.5 * (1.0 - t)),
        };

        Particle {
            position,
            velocity: Vec2::from_angle(angle) * speed,
            age: 0.0,
            lifetime: c.lifetime * (1.0 + rng.gen::<f32>() * LIFETIME_JITTER),
            size: c.size * (1.0 + rng.gen::<f32>() * size_jitter),
            start_color: c.start_color,
            end_color: c.end_color,
        }
    }
}

impl Default for ParticleEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}

impl Component for ParticleEmitter {
    fn init(&mut self, owner: EntityId, siblings: &ComponentRegistry) {
        self.has_transform = siblings.contains::<Transform>();
        if !self.has_transform {
            debug!(entity = %owner, "particle emitter attached without a transform; it will stay idle");
        }
    }

    fn update(&mut self, siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        if !self.active || !self.has_transform {
            return;
        }
        let Some(transform) = siblings.get::<Transform>() else {
            return;
        };
        let origin = Origin {
            position: transform.position,
            facing: transform.rotation,
        };

        let dt = ctx.dt;
        let res = &mut *ctx.resources;
        let mut emitted = 0;
        if self.config.mode == EmitterMode::Continuous {
            emitted += self.emit_continuous(origin, dt, &res.input, &mut res.rng, &mut res.particles);
        }
        emitted += self.advance_burst(origin, dt, &mut res.rng, &mut res.particles);
        self.emitted_total += u64::from(emitted);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
