//! Fixed-timestep clock with an accumulator and frame pacing.
//!
//! Wall-clock frame time is fed into an accumulator; every whole multiple of
//! `fixed_dt` becomes one simulation tick. A single frame's contribution is
//! clamped to [`MAX_FRAME_TIME`] so a stall (debugger, window drag) cannot
//! trigger an unbounded catch-up burst.
//!
//! # Example
//!
//! ```
//! use drift_engine::clock::{ClockConfig, SimulationClock};
//!
//! let mut clock = SimulationClock::new(ClockConfig::default());
//! let ticks: u32 = (0..60).map(|_| clock.advance(1.0 / 60.0)).sum();
//! assert!((59..=60).contains(&ticks));
//! ```

use std::time::{Duration, Instant};

/// Upper bound on the wall time a single frame may add to the accumulator.
pub const MAX_FRAME_TIME: f64 = 0.25;

// ---------------------------------------------------------------------------
// ClockConfig
// ---------------------------------------------------------------------------

/// Logic and render rates in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockConfig {
    /// Simulation ticks per second. Must be positive and finite.
    pub logic_rate_hz: f64,
    /// Target presented frames per second, used only for pacing.
    pub render_rate_hz: f64,
}

impl Default for ClockConfig {
    /// 60 Hz logic, 60 Hz rendering.
    fn default() -> Self {
        Self {
            logic_rate_hz: 60.0,
            render_rate_hz: 60.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationClock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimulationClock {
    fixed_dt: f64,
    frame_budget: Duration,
    accumulator: f64,
    last_frame: Option<Instant>,
    ticks: u64,
}

impl SimulationClock {
    /// # Panics
    ///
    /// Panics if either rate is not positive and finite.
    pub fn new(config: ClockConfig) -> Self {
        assert!(
            config.logic_rate_hz > 0.0 && config.logic_rate_hz.is_finite(),
            "logic rate must be positive and finite, got {}",
            config.logic_rate_hz
        );
        assert!(
            config.render_rate_hz > 0.0 && config.render_rate_hz.is_finite(),
            "render rate must be positive and finite, got {}",
            config.render_rate_hz
        );
        Self {
            fixed_dt: 1.0 / config.logic_rate_hz,
            frame_budget: Duration::from_secs_f64(1.0 / config.render_rate_hz),
            accumulator: 0.0,
            last_frame: None,
            ticks: 0,
        }
    }

    /// Seconds per simulation tick.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Add one frame's wall time and return how many ticks to run now.
    ///
    /// Negative or non-finite input counts as zero; anything above
    /// [`MAX_FRAME_TIME`] is clamped.
    pub fn advance(&mut self, frame_dt: f64) -> u32 {
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_TIME)
        } else {
            0.0
        };
        self.accumulator += frame_dt;

        let mut due = 0;
        while self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            due += 1;
        }
        self.ticks += u64::from(due);
        due
    }

    /// Fraction of a tick currently held in the accumulator, in `0.0..1.0`.
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.fixed_dt
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Total ticks handed out by [`advance`](Self::advance).
    pub fn ticks_due(&self) -> u64 {
        self.ticks
    }

    /// Wall time since the previous call, measured with [`Instant`].
    /// The first call returns zero.
    pub fn measure_frame(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = self
            .last_frame
            .map(|previous| now.duration_since(previous).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        elapsed
    }

    /// Sleep out the rest of the render frame budget, if any is left.
    pub fn pace(&self, frame_started: Instant) {
        let elapsed = frame_started.elapsed();
        if let Some(rest) = self.frame_budget.checked_sub(elapsed) {
            std::thread::sleep(rest);
        }
    }

    /// Forget accumulated time, e.g. after a restart.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_frame = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
