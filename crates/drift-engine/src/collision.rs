//! Translation of physics contacts into gameplay reactions.
//!
//! After each physics step the translator walks the contact-begin events,
//! resolves each shape to its owning entity through body user data, and
//! classifies the pair by entity tags. Only a player touching an asteroid
//! means anything today: the player is marked for deletion, the run ends,
//! the high score is persisted if beaten, an explosion is queued where the
//! player was, and the explosion cue plays.
//!
//! Everything is deferred. Marks and spawns take effect when the lifecycle
//! manager drains at the end of the tick, so the entity list stays stable
//! while events are processed. Events whose shapes no longer resolve to a
//! live entity are skipped.

use glam::Vec2;
use tracing::{debug, info};

use crate::audio::AudioSink;
use crate::components::Transform;
use crate::entity::EntityId;
use crate::factory::{kinds, SpawnRequest};
use crate::lifecycle::LifecycleManager;
use crate::physics::{PhysicsBackend, ShapeHandle, PIXELS_PER_METER};
use crate::score::ScoreKeeper;

/// Sound cue played when the player is destroyed.
pub const EXPLOSION_CUE: &str = "explosion";

/// Gameplay meaning of a contact pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairClass {
    PlayerAsteroid { player: EntityId, asteroid: EntityId },
    Unrecognized,
}

/// Classify an unordered pair of `(entity, tag)`.
pub fn classify(a: (EntityId, &str), b: (EntityId, &str)) -> PairClass {
    match (a.1, b.1) {
        (kinds::PLAYER, kinds::ASTEROID) => PairClass::PlayerAsteroid {
            player: a.0,
            asteroid: b.0,
        },
        (kinds::ASTEROID, kinds::PLAYER) => PairClass::PlayerAsteroid {
            player: b.0,
            asteroid: a.0,
        },
        _ => PairClass::Unrecognized,
    }
}

/// What happened in response to one contact.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReaction {
    pub player: EntityId,
    pub asteroid: EntityId,
    /// Where the explosion was queued, in pixels.
    pub location: Vec2,
    /// Whether this contact ended the run (false if it was already over).
    pub ended_run: bool,
    pub new_high_score: bool,
}

/// Stateless apart from counters; one per driver.
#[derive(Debug, Default)]
pub struct CollisionTranslator {
    reactions: u64,
    skipped: u64,
}

impl CollisionTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total reactions produced.
    pub fn reactions(&self) -> u64 {
        self.reactions
    }

    /// Events dropped because a side did not resolve or the pair meant nothing.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Process the contacts that began during the last physics step.
    pub fn translate(
        &mut self,
        physics: &dyn PhysicsBackend,
        lifecycle: &mut LifecycleManager,
        score: &mut ScoreKeeper,
        audio: &mut dyn AudioSink,
    ) -> Vec<CollisionReaction> {
        let mut reactions = Vec::new();
        for &(shape_a, shape_b) in physics.contact_begin_events() {
            let (Some(a), Some(b)) = (
                Self::resolve(physics, lifecycle, shape_a),
                Self::resolve(physics, lifecycle, shape_b),
            ) else {
                debug!(?shape_a, ?shape_b, "contact with unresolved side skipped");
                self.skipped += 1;
                continue;
            };

            let class = {
                let tag_a = lifecycle.get(a).map(|e| e.tag()).unwrap_or_default();
                let tag_b = lifecycle.get(b).map(|e| e.tag()).unwrap_or_default();
                classify((a, tag_a), (b, tag_b))
            };
            match class {
                PairClass::PlayerAsteroid { player, asteroid } => {
                    let location = Self::player_location(physics, lifecycle, shape_a, shape_b, player);
                    reactions.push(self.player_hit(player, asteroid, location, lifecycle, score, audio));
                }
                PairClass::Unrecognized => self.skipped += 1,
            }
        }
        reactions
    }

    fn resolve(physics: &dyn PhysicsBackend, lifecycle: &LifecycleManager, shape: ShapeHandle) -> Option<EntityId> {
        let body = physics.body_of(shape)?;
        let entity = physics.user_data(body)?;
        lifecycle.get(entity).map(|e| e.id())
    }

    /// The player's body position if the physics world still has it, else
    /// its transform.
    fn player_location(
        physics: &dyn PhysicsBackend,
        lifecycle: &LifecycleManager,
        shape_a: ShapeHandle,
        shape_b: ShapeHandle,
        player: EntityId,
    ) -> Vec2 {
        [shape_a, shape_b]
            .into_iter()
            .filter_map(|s| physics.body_of(s))
            .find(|&body| physics.user_data(body) == Some(player))
            .and_then(|body| physics.position(body))
            .map(|p| p * PIXELS_PER_METER)
            .or_else(|| lifecycle.get(player).and_then(|e| e.get::<Transform>()).map(|t| t.position))
            .unwrap_or(Vec2::ZERO)
    }

    fn player_hit(
        &mut self,
        player: EntityId,
        asteroid: EntityId,
        location: Vec2,
        lifecycle: &mut LifecycleManager,
        score: &mut ScoreKeeper,
        audio: &mut dyn AudioSink,
    ) -> CollisionReaction {
        lifecycle.mark_for_deletion(player);
        let ended_run = score.trigger_game_over();
        let new_high_score = score.commit_high_score();
        lifecycle.queue_spawn(SpawnRequest::new(kinds::EXPLOSION, location));
        audio.play(EXPLOSION_CUE);
        self.reactions += 1;

        info!(
            %player,
            %asteroid,
            x = location.x,
            y = location.y,
            score = score.score(),
            new_high_score,
            "player destroyed"
        );
        CollisionReaction {
            player,
            asteroid,
            location,
            ended_run,
            new_high_score,
        }
    }
}
