//! Gameplay components.
//!
//! Each component reads and writes its owner through sibling lookups, so a
//! component that needs a [`Transform`] resolves it by type rather than
//! holding a reference.

mod background;
mod body;
mod camera;
mod control;
mod lifetime;
mod spawner;
mod sprite;
mod transform;

pub use background::Background;
pub use body::{BodyConfig, PhysicsBody, ShapeKind};
pub use camera::CameraFollow;
pub use control::{DirectControl, RotateToPointer, Thrust};
pub use lifetime::Lifetime;
pub use spawner::{AsteroidSpawner, SpawnerConfig};
pub use sprite::Sprite;
pub use transform::Transform;
