//! Particle pool.
//!
//! Particles are plain data: no identity, no components, no physics. They
//! move ballistically, fade from a start color to an end color over their
//! lifetime, and are dropped the tick their age reaches that lifetime.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use tracing::trace;

use crate::render::{Color, DrawCommand, RenderFrame};

/// Default pool capacity when no setting overrides it.
pub const DEFAULT_MAX_PARTICLES: usize = 4096;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub age: f32,
    pub lifetime: f32,
    /// Half of the rendered edge length, in world units.
    pub size: f32,
    pub start_color: Color,
    pub end_color: Color,
}

impl Particle {
    pub fn is_alive(&self) -> bool {
        self.age < self.lifetime
    }

    /// Normalized age in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    pub fn color(&self) -> Color {
        self.start_color.lerp(self.end_color, self.progress())
    }
}

/// Parameters for a one-shot radial burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstSpec {
    pub count: u32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub lifetime: f32,
    pub size: f32,
    pub start_color: Color,
    pub end_color: Color,
}

// ---------------------------------------------------------------------------
// ParticleEngine
// ---------------------------------------------------------------------------

/// Bounded pool of live particles.
#[derive(Debug, Clone)]
pub struct ParticleEngine {
    particles: Vec<Particle>,
    capacity: usize,
    dropped: u64,
}

impl Default for ParticleEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARTICLES)
    }
}

impl ParticleEngine {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Add a particle. When the pool is full the particle is discarded.
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.particles.len() >= self.capacity {
            self.dropped += 1;
            trace!(capacity = self.capacity, "particle pool full");
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// Emit `spec.count` particles in all directions from `origin`.
    ///
    /// Lifetime is jittered up to +30% and size up to +50% per particle.
    pub fn spawn_burst(&mut self, origin: Vec2, spec: &BurstSpec, rng: &mut impl Rng) -> u32 {
        let mut spawned = 0;
        for _ in 0..spec.count {
            let angle = rng.gen::<f32>() * TAU;
            let speed = spec.speed_min + (spec.speed_max - spec.speed_min) * rng.gen::<f32>();
            let particle = Particle {
                position: origin,
                velocity: Vec2::from_angle(angle) * speed,
                age: 0.0,
                lifetime: spec.lifetime * (1.0 + rng.gen::<f32>() * 0.3),
                size: spec.size * (1.0 + rng.gen::<f32>() * 0.5),
                start_color: spec.start_color,
                end_color: spec.end_color,
            };
            if self.spawn(particle) {
                spawned += 1;
            }
        }
        spawned
    }

    /// Age and move every particle, then drop the expired ones.
    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.age += dt;
            p.position += p.velocity * dt;
        }
        self.particles.retain(Particle::is_alive);
    }

    /// Draw each particle as a flat square centered on its position.
    pub fn render(&self, frame: &mut RenderFrame<'_>) {
        for p in &self.particles {
            let center = frame.view.world_to_screen(p.position);
            let edge = p.size * 2.0 * frame.view.scale;
            frame.draw(DrawCommand::Rect {
                center,
                size: Vec2::splat(edge),
                rotation: 0.0,
                color: p.color(),
            });
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Particles discarded because the pool was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetManifest;
    use crate::render::{RecordingSink, View};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn particle(lifetime: f32) -> Particle {
        Particle {
            position: Vec2::ZERO,
            velocity: Vec2::new(60.0, 0.0),
            age: 0.0,
            lifetime,
            size: 2.0,
            start_color: Color::from_rgba8(255, 128, 0, 255),
            end_color: Color::from_rgba8(255, 0, 0, 0),
        }
    }

    #[test]
    fn particle_color_follows_age() {
        let mut p = particle(1.0);
        assert_eq!(p.color().to_rgba8(), [255, 128, 0, 255]);
        p.age = 0.5;
        assert_eq!(p.color().to_rgba8(), [255, 64, 0, 128]);
        p.age = 1.0;
        assert_eq!(p.color().to_rgba8(), [255, 0, 0, 0]);
    }

    #[test]
    fn update_moves_and_expires() {
        let mut engine = ParticleEngine::default();
        engine.spawn(particle(0.5));
        engine.spawn(particle(10.0));

        engine.update(0.25);
        assert_eq!(engine.len(), 2);
        assert!((engine.particles()[0].position.x - 15.0).abs() < 1e-4);

        engine.update(0.25);
        // Age equal to lifetime means dead.
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.particles()[0].lifetime, 10.0);
    }

    #[test]
    fn zero_lifetime_particle_never_survives_an_update() {
        let mut engine = ParticleEngine::default();
        engine.spawn(particle(0.0));
        engine.update(1.0 / 60.0);
        assert!(engine.is_empty());
    }

    #[test]
    fn pool_capacity_is_enforced() {
        let mut engine = ParticleEngine::new(3);
        for _ in 0..5 {
            engine.spawn(particle(1.0));
        }
        assert_eq!(engine.len(), 3);
        assert_eq!(engine.dropped(), 2);
        engine.clear();
        assert!(engine.is_empty());
    }

    #[test]
    fn burst_is_radial_with_jitter() {
        let mut engine = ParticleEngine::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let spec = BurstSpec {
            count: 40,
            speed_min: 50.0,
            speed_max: 150.0,
            lifetime: 1.0,
            size: 2.0,
            start_color: Color::WHITE,
            end_color: Color::RED_CLEAR,
        };
        assert_eq!(engine.spawn_burst(Vec2::new(5.0, 5.0), &spec, &mut rng), 40);
        for p in engine.particles() {
            let speed = p.velocity.length();
            assert!((49.99..=150.01).contains(&speed));
            assert!((1.0..=1.3).contains(&p.lifetime));
            assert!((2.0..=3.0).contains(&p.size));
            assert_eq!(p.position, Vec2::new(5.0, 5.0));
        }
    }

    #[test]
    fn render_emits_one_rect_per_particle() {
        let mut engine = ParticleEngine::default();
        engine.spawn(particle(1.0));
        let view = View::new(Vec2::new(100.0, 100.0));
        let assets = AssetManifest::new();
        let mut sink = RecordingSink::default();
        let mut frame = RenderFrame::new(&view, &assets, &mut sink, 0.0);
        engine.render(&mut frame);

        assert_eq!(
            sink.commands,
            vec![DrawCommand::Rect {
                center: Vec2::new(50.0, 50.0),
                size: Vec2::splat(4.0),
                rotation: 0.0,
                color: Color::from_rgba8(255, 128, 0, 255),
            }]
        );
    }
}
