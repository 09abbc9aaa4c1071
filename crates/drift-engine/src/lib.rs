//! Drift Engine -- fixed-timestep 2D simulation kernel for a side-scrolling
//! rocket arcade game.
//!
//! Game objects are [`Entity`](entity::Entity) values that carry an ordered,
//! type-keyed set of [`Component`](component::Component)s. The
//! [`SimulationDriver`](driver::SimulationDriver) advances the world in
//! fixed ticks:
//!
//! 1. Refresh the input snapshot.
//! 2. Step physics.
//! 3. Translate contact-begin events into gameplay reactions.
//! 4. Update every live entity in creation order.
//! 5. Update the particle engine.
//! 6. Recompute score and difficulty.
//! 7. Remove marked entities, then materialize queued spawns.
//!
//! Structural changes to the live entity list only happen in phase 7, so
//! every loop in phases 3 to 6 sees a stable collection.
//!
//! # Quick Start
//!
//! ```
//! use drift_engine::prelude::*;
//!
//! let mut clock = SimulationClock::new(ClockConfig::default());
//! // A 60 ms frame at 60 Hz runs three ticks and carries the remainder.
//! assert_eq!(clock.advance(0.06), 3);
//! assert!((clock.alpha() - 0.6).abs() < 1e-6);
//! ```

#![deny(unsafe_code)]

pub mod assets;
pub mod audio;
pub mod clock;
pub mod collision;
pub mod component;
pub mod components;
pub mod config;
pub mod context;
pub mod driver;
pub mod emitter;
pub mod entity;
pub mod factory;
pub mod input;
pub mod lifecycle;
pub mod particles;
pub mod physics;
pub mod render;
pub mod score;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading or persisting engine data.
///
/// Simulation itself never fails: bad runtime input degrades to a logged
/// no-op. Only file-backed configuration, levels, manifests and the high
/// score store surface errors.
#[derive(Debug, thiserror::Error)]
pub enum DriftError {
    /// A file could not be read or written.
    #[error("failed to {action} '{}': {source}", path.display())]
    Io {
        /// What was being attempted, e.g. "read settings".
        action: &'static str,
        /// File involved.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was read but its JSON content is malformed.
    #[error("malformed {what} in '{}': {source}", path.display())]
    Parse {
        /// Kind of document, e.g. "level".
        what: &'static str,
        /// File involved.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for persistence.
    #[error("failed to encode {what}: {source}")]
    Encode {
        /// Kind of value being encoded.
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::assets::{AssetCatalog, AssetManifest, TextureInfo};
    pub use crate::audio::{AudioSink, LoggingAudio, NullAudio, RecordingAudio};
    pub use crate::clock::{ClockConfig, SimulationClock, MAX_FRAME_TIME};
    pub use crate::collision::{classify, CollisionReaction, CollisionTranslator, PairClass};
    pub use crate::component::{Component, ComponentRegistry};
    pub use crate::components::{
        AsteroidSpawner, Background, CameraFollow, DirectControl, Lifetime, PhysicsBody,
        RotateToPointer, Sprite, Thrust, Transform,
    };
    pub use crate::config::Settings;
    pub use crate::context::{Neighbors, Resources, TickContext};
    pub use crate::driver::{Collaborators, SimulationDriver, TickDiagnostics, TickReport};
    pub use crate::emitter::{EmitGate, EmitterConfig, EmitterMode, EmitterState, ParticleEmitter};
    pub use crate::entity::{Entity, EntityAllocator, EntityId};
    pub use crate::factory::{kinds, EntityFactory, Level, SpawnRequest};
    pub use crate::input::{InputSnapshot, InputState, Key, MouseButton};
    pub use crate::lifecycle::{DrainReport, EntityHooks, LifecycleManager};
    pub use crate::particles::{Particle, ParticleEngine};
    pub use crate::physics::{
        BodyDesc, BodyHandle, BodyKind, PhysicsBackend, RapierWorld, ShapeDesc, ShapeHandle,
        PIXELS_PER_METER,
    };
    pub use crate::render::{Color, DrawCommand, RecordingSink, RenderFrame, RenderSink, View};
    pub use crate::score::{FileHighScore, HighScoreStore, MemoryHighScore, ScoreKeeper};
    pub use crate::DriftError;
    pub use glam::Vec2;
}
