//! Spawn descriptors, level files, and the entity factory.
//!
//! A [`SpawnRequest`] is a plain description of an entity to create: a kind
//! string, a pose, an optional size and free-form attributes. Requests come
//! from level files and from gameplay code at runtime. The
//! [`EntityFactory`] turns a request into a fully assembled entity.
//!
//! Unknown kinds and malformed attributes never fail: they are logged and
//! replaced by defaults, and unknown kinds become a flat placeholder.

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::assets::AssetCatalog;
use crate::components::{
    AsteroidSpawner, Background, BodyConfig, CameraFollow, DirectControl, Lifetime, PhysicsBody, RotateToPointer,
    ShapeKind, SpawnerConfig, Sprite, Thrust, Transform,
};
use crate::emitter::{EmitGate, EmitterConfig, EmitterMode, ParticleEmitter};
use crate::entity::Entity;
use crate::input::MouseButton;
use crate::physics::BodyKind;
use crate::render::Color;
use crate::DriftError;

/// Well-known entity kinds. An entity's tag equals the kind it was built from.
pub mod kinds {
    pub const PLAYER: &str = "player";
    pub const ASTEROID: &str = "asteroid";
    pub const EXPLOSION: &str = "explosion";
    pub const BACKGROUND: &str = "background";
}

// ---------------------------------------------------------------------------
// SpawnRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub kind: String,
    /// World position in pixels.
    #[serde(default)]
    pub position: Vec2,
    #[serde(default)]
    pub rotation_deg: f32,
    /// Primary extent in pixels; each kind has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl SpawnRequest {
    pub fn new(kind: impl Into<String>, position: Vec2) -> Self {
        Self {
            kind: kind.into(),
            position,
            rotation_deg: 0.0,
            size: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_rotation_deg(mut self, degrees: f32) -> Self {
        self.rotation_deg = degrees;
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Numeric attribute, or `default` if absent or not a finite number.
    pub fn attr_f32(&self, key: &str, default: f32) -> f32 {
        match self.attributes.get(key) {
            None => default,
            Some(value) => match value.as_f64() {
                Some(n) if n.is_finite() => n as f32,
                _ => {
                    warn!(kind = %self.kind, key, %value, "attribute is not a number, using default");
                    default
                }
            },
        }
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    fn size_or(&self, default: f32) -> f32 {
        match self.size {
            Some(size) if size.is_finite() && size > 0.0 => size,
            Some(size) => {
                warn!(kind = %self.kind, size, "size must be positive, using default");
                default
            }
            None => default,
        }
    }

    fn pose(&self) -> Transform {
        let position = if self.position.is_finite() {
            self.position
        } else {
            warn!(kind = %self.kind, "non-finite spawn position, using origin");
            Vec2::ZERO
        };
        Transform::at(position).with_rotation(self.rotation_deg.to_radians())
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Ordered list of entities to create when a run starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub entities: Vec<SpawnRequest>,
}

impl Level {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriftError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DriftError::Io {
            action: "read level",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DriftError::Parse {
            what: "level",
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// EntityFactory
// ---------------------------------------------------------------------------

/// Assembles entities from spawn requests.
#[derive(Debug, Clone)]
pub struct EntityFactory {
    /// Emitter template for player engine trails.
    pub trail: EmitterConfig,
    /// Emitter template for explosions.
    pub explosion: EmitterConfig,
    /// Seconds an explosion entity lives before removal.
    pub explosion_lifetime: f32,
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self {
            trail: EmitterConfig {
                spawn_rate: 60.0,
                lifetime: 0.4,
                speed_min: 60.0,
                speed_max: 140.0,
                size: 2.5,
                spread_deg: 30.0,
                direction_offset_deg: 180.0,
                gate: EmitGate::WhileButtonHeld(MouseButton::Left),
                ..EmitterConfig::default()
            },
            explosion: EmitterConfig {
                mode: EmitterMode::Burst,
                burst_count: 60,
                burst_duration: 0.15,
                lifetime: 0.6,
                speed_min: 80.0,
                speed_max: 260.0,
                size: 4.0,
                spread_deg: 360.0,
                ..EmitterConfig::default()
            },
            explosion_lifetime: 1.0,
        }
    }
}

impl EntityFactory {
    /// Attach the components for `request.kind` to a freshly created entity.
    pub fn build(&self, request: &SpawnRequest, entity: &mut Entity, assets: &dyn AssetCatalog) {
        match request.kind.as_str() {
            kinds::PLAYER => self.player(request, entity, assets),
            kinds::ASTEROID => self.asteroid(request, entity, assets),
            kinds::EXPLOSION => self.explosion(request, entity),
            kinds::BACKGROUND => self.background(request, entity, assets),
            other => {
                warn!(kind = other, entity = %entity.id(), "unknown entity kind, spawning placeholder");
                entity.add(request.pose());
                entity.add(Sprite::flat(Vec2::splat(request.size_or(32.0)), Color::MAGENTA));
            }
        }
    }

    fn player(&self, request: &SpawnRequest, entity: &mut Entity, assets: &dyn AssetCatalog) {
        let texture = request.attr_str("texture").unwrap_or("rocket");
        let sprite = Sprite::sized_to_texture(texture, request.size_or(64.0), true, assets);
        let length = sprite.size().x;

        // "direct" steers a kinematic body with WASD instead of thrusting.
        let direct = request.attr_str("control") == Some("direct");

        entity.add(request.pose());
        entity.add(sprite);
        entity.add(PhysicsBody::new(BodyConfig {
            kind: if direct { BodyKind::Kinematic } else { BodyKind::Dynamic },
            shape: ShapeKind::Ellipse,
            collision_scale: request.attr_f32("collisionScale", 0.8),
            linear_damping: request.attr_f32("damping", 0.5),
            fixed_rotation: true,
            ..BodyConfig::default()
        }));
        if direct {
            entity.add(DirectControl {
                speed: request.attr_f32("speed", DirectControl::default().speed),
            });
        } else {
            entity.add(RotateToPointer);
            entity.add(Thrust {
                force: request.attr_f32("thrust", Thrust::default().force),
                max_speed: request.attr_f32("maxSpeed", Thrust::default().max_speed),
                ..Thrust::default()
            });
        }
        entity.add(ParticleEmitter::new(EmitterConfig {
            spawn_rate: request.attr_f32("trailRate", self.trail.spawn_rate),
            offset: Vec2::new(-length / 2.0, 0.0),
            ..self.trail.clone()
        }));
        entity.add(CameraFollow);
        let defaults = SpawnerConfig::default();
        entity.add(AsteroidSpawner::new(SpawnerConfig {
            density: request.attr_f32("asteroidDensity", defaults.density),
            spawn_buffer: request.attr_f32("spawnBuffer", defaults.spawn_buffer),
            cleanup_distance: request.attr_f32("cleanupDistance", defaults.cleanup_distance),
            ..defaults
        }));
    }

    fn asteroid(&self, request: &SpawnRequest, entity: &mut Entity, assets: &dyn AssetCatalog) {
        let texture = request.attr_str("texture").unwrap_or("asteroid");
        entity.add(request.pose());
        entity.add(Sprite::sized_to_texture(texture, request.size_or(80.0), true, assets).with_color(Color::GREY));
        entity.add(PhysicsBody::new(BodyConfig {
            kind: BodyKind::Static,
            shape: ShapeKind::Circle,
            collision_scale: request.attr_f32("collisionScale", 0.9),
            ..BodyConfig::default()
        }));
    }

    fn explosion(&self, request: &SpawnRequest, entity: &mut Entity) {
        entity.add(request.pose());
        let count = request.attr_f32("count", self.explosion.burst_count as f32).max(0.0) as u32;
        entity.add(ParticleEmitter::new(EmitterConfig {
            burst_count: count,
            ..self.explosion.clone()
        }));
        if let Some(emitter) = entity.get_mut::<ParticleEmitter>() {
            emitter.trigger_burst();
        }
        entity.add(Lifetime::new(request.attr_f32("lifetime", self.explosion_lifetime)));
    }

    fn background(&self, request: &SpawnRequest, entity: &mut Entity, assets: &dyn AssetCatalog) {
        let texture = request.attr_str("texture").unwrap_or("background");
        let tile = assets
            .texture_size(texture)
            .map(|(w, h)| Vec2::new(w as f32, h as f32))
            .unwrap_or(Vec2::new(512.0, 512.0));
        entity.add(Background::new(texture, tile, request.attr_f32("parallax", 0.5)));
    }
}
