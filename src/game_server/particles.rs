//! Particles - Dust kicked up behind moving vehicles
//!
//! Particles live in a bounded FIFO: inserting into a full buffer drops the
//! oldest particle. The random source is supplied by the caller.

use std::collections::VecDeque;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::game_server::config::{ParticleConfig, Span};

/// A single dust particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    /// Remaining lifetime in seconds
    pub lifetime: f32,
    pub size: f32,
}

impl Particle {
    /// Integrate one step. Returns false once expired.
    pub fn tick(&mut self, delta: f32, gravity: f32) -> bool {
        for axis in 0..3 {
            self.position[axis] += self.velocity[axis] * delta;
        }
        self.lifetime -= delta;
        self.velocity[1] -= gravity * delta;
        self.lifetime > 0.0
    }
}

/// Bounded collection of live particles
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    config: ParticleConfig,
    particles: VecDeque<Particle>,
    evicted: u64,
}

impl ParticleSystem {
    /// Most slots reserved up front; the deque grows past this on demand
    const PREALLOCATE: usize = 1024;

    pub fn new(config: ParticleConfig) -> Self {
        let particles = VecDeque::with_capacity(config.capacity.min(Self::PREALLOCATE));
        Self {
            config,
            particles,
            evicted: 0,
        }
    }

    /// Emit a burst of dust at the given origin.
    ///
    /// Returns the number of particles emitted; zero when the source moves
    /// slower than the spawn threshold.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, origin_x: f32, origin_z: f32, speed: f32) -> usize {
        if speed.abs() < self.config.spawn_threshold {
            return 0;
        }

        let cfg = &self.config;
        let mut emitted = Vec::with_capacity(cfg.burst);
        for _ in 0..cfg.burst {
            emitted.push(Particle {
                position: [
                    origin_x + sample(rng, cfg.jitter_x),
                    cfg.ground_height,
                    origin_z - cfg.trail_offset + sample(rng, cfg.jitter_z),
                ],
                velocity: [
                    sample(rng, cfg.velocity_x),
                    sample(rng, cfg.velocity_y),
                    -speed * cfg.trail_factor + sample(rng, cfg.velocity_z),
                ],
                lifetime: sample(rng, cfg.lifetime),
                size: sample(rng, cfg.size),
            });
        }

        let count = emitted.len();
        for particle in emitted {
            self.push(particle);
        }
        count
    }

    /// Insert a particle, evicting the oldest one when full
    pub fn push(&mut self, particle: Particle) {
        if self.particles.len() >= self.config.capacity {
            self.particles.pop_front();
            self.evicted += 1;
            log::trace!("Particle buffer full, evicted oldest ({} total)", self.evicted);
        }
        self.particles.push_back(particle);
    }

    /// Advance all particles and drop the expired ones
    pub fn update(&mut self, delta: f32) {
        let gravity = self.config.gravity;
        self.particles.retain_mut(|p| p.tick(delta, gravity));
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Particles dropped to make room since creation
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Live particles, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Render view of the live particles, oldest first
    pub fn snapshot(&self) -> Vec<ParticleSnapshot> {
        let max_lifetime = self.config.lifetime.max;
        self.particles
            .iter()
            .map(|p| ParticleSnapshot {
                position: p.position,
                size: p.size,
                life_ratio: if max_lifetime > 0.0 {
                    (p.lifetime / max_lifetime).clamp(0.0, 1.0)
                } else {
                    0.0
                },
            })
            .collect()
    }
}

/// Uniform sample from `[min, max)`; a degenerate span yields `min`
fn sample<R: Rng + ?Sized>(rng: &mut R, span: Span) -> f32 {
    if span.max > span.min {
        rng.gen_range(span.min..span.max)
    } else {
        span.min
    }
}

/// Compact particle state for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    pub position: [f32; 3],
    pub size: f32,
    /// Remaining lifetime relative to the longest possible lifetime
    pub life_ratio: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn system() -> ParticleSystem {
        ParticleSystem::new(ParticleConfig::default())
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn slow_source_spawns_nothing() {
        let mut particles = system();
        let mut rng = rng();
        assert_eq!(particles.spawn(&mut rng, 0.0, 0.0, 0.0), 0);
        assert_eq!(particles.spawn(&mut rng, 0.0, 0.0, 0.09), 0);
        assert_eq!(particles.spawn(&mut rng, 0.0, 0.0, -0.05), 0);
        assert!(particles.is_empty());
    }

    #[test]
    fn burst_stays_within_ranges() {
        let mut particles = system();
        let mut rng = rng();
        let speed = 40.0;
        assert_eq!(particles.spawn(&mut rng, -1.0, 100.0, speed), 5);
        assert_eq!(particles.len(), 5);

        for p in particles.iter() {
            assert!(p.position[0] >= -1.25 && p.position[0] < -0.75);
            assert_eq!(p.position[1], 0.1);
            assert!(p.position[2] >= 99.35 && p.position[2] < 99.65);
            assert!(p.velocity[0] >= -0.5 && p.velocity[0] < 0.5);
            assert!(p.velocity[1] >= 0.0 && p.velocity[1] < 2.0);
            let trail = -speed * 0.3;
            assert!(p.velocity[2] >= trail - 0.25 && p.velocity[2] < trail + 0.25);
            assert!(p.lifetime >= 0.5 && p.lifetime < 1.0);
            assert!(p.size >= 0.05 && p.size < 0.15);
        }
    }

    #[test]
    fn same_seed_same_dust() {
        let mut a = system();
        let mut b = system();
        a.spawn(&mut rng(), 0.0, 10.0, 20.0);
        b.spawn(&mut rng(), 0.0, 10.0, 20.0);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn update_integrates_and_ages() {
        let mut particles = system();
        particles.push(Particle {
            position: [0.0, 0.1, 0.0],
            velocity: [1.0, 2.0, -3.0],
            lifetime: 0.8,
            size: 0.1,
        });
        particles.update(0.1);

        let p = particles.iter().next().unwrap();
        assert_relative_eq!(p.position[0], 0.1, epsilon = 1e-6);
        assert_relative_eq!(p.position[1], 0.3, epsilon = 1e-6);
        assert_relative_eq!(p.position[2], -0.3, epsilon = 1e-6);
        assert_relative_eq!(p.lifetime, 0.7, epsilon = 1e-6);
        assert_relative_eq!(p.velocity[1], 1.95, epsilon = 1e-6);
    }

    #[test]
    fn expired_particles_are_removed() {
        let mut particles = system();
        let mut rng = rng();
        particles.spawn(&mut rng, 0.0, 0.0, 10.0);
        particles.update(0.4);
        assert_eq!(particles.len(), 5);
        particles.update(0.65);
        assert!(particles.is_empty());
    }

    #[test]
    fn lifetime_decreases_every_frame_until_removed() {
        let mut particles = system();
        particles.spawn(&mut rng(), 0.0, 0.0, 10.0);
        let mut previous: Vec<f32> = particles.iter().map(|p| p.lifetime).collect();
        while !particles.is_empty() {
            particles.update(0.05);
            for p in particles.iter() {
                assert!(p.lifetime > 0.0);
            }
            let current: Vec<f32> = particles.iter().map(|p| p.lifetime).collect();
            for life in &current {
                assert!(previous.iter().any(|prev| (prev - 0.05 - life).abs() < 1e-5));
            }
            previous = current;
        }
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut config = ParticleConfig::default();
        config.capacity = 12;
        let mut particles = ParticleSystem::new(config);
        let mut rng = rng();

        particles.spawn(&mut rng, 0.0, 0.0, 10.0);
        particles.spawn(&mut rng, 0.0, 100.0, 10.0);
        particles.spawn(&mut rng, 0.0, 200.0, 10.0);

        assert_eq!(particles.len(), 12);
        assert_eq!(particles.evicted(), 3);
        // The three oldest came from the first burst at z = 0
        let from_first = particles.iter().filter(|p| p.position[2] < 50.0).count();
        assert_eq!(from_first, 2);
        assert!(particles.iter().next().unwrap().position[2] < 50.0);
        assert!(particles.iter().last().unwrap().position[2] > 150.0);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut particles = system();
        let mut rng = rng();
        for frame in 0..500 {
            particles.update(1.0 / 60.0);
            particles.spawn(&mut rng, -1.0, frame as f32, 45.0);
            particles.spawn(&mut rng, -3.0, frame as f32, 35.0);
            assert!(particles.len() <= particles.capacity());
        }
        assert_eq!(particles.len(), 200);
    }

    #[test]
    fn huge_capacity_is_not_reserved_up_front() {
        let mut config = ParticleConfig::default();
        config.capacity = usize::MAX;
        let mut particles = ParticleSystem::new(config);
        assert_eq!(particles.capacity(), usize::MAX);
        assert!(particles.particles.capacity() < usize::MAX);

        let mut rng = rng();
        for frame in 0..300 {
            particles.spawn(&mut rng, 0.0, frame as f32, 40.0);
        }
        assert_eq!(particles.len(), 1500);
        assert_eq!(particles.evicted(), 0);
    }

    #[test]
    fn snapshot_ratio_in_unit_range() {
        let mut particles = system();
        particles.spawn(&mut rng(), 0.0, 0.0, 10.0);
        particles.update(0.2);
        for p in particles.snapshot() {
            assert!(p.life_ratio > 0.0 && p.life_ratio <= 1.0);
        }
    }
}
