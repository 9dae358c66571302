//! Frame - Per-frame orchestration of vehicles, race and dust
//!
//! A frame runs strictly in this order: sanitise dt, advance vehicles,
//! evaluate the race, update existing dust, spawn new dust, snapshot.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use crate::game_server::config::SimConfig;
use crate::game_server::particles::{ParticleSnapshot, ParticleSystem};
use crate::game_server::race::{standings, RaceOutcome, RaceResult, RaceSnapshot, RaceState, Standing};
use crate::game_server::vehicle::{Throttle, Vehicle, VehicleSnapshot, VehicleState};

/// Immutable view of one frame, handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub vehicles: Vec<VehicleSnapshot>,
    pub particles: Vec<ParticleSnapshot>,
    pub race: RaceSnapshot,
}

/// Owns the whole simulation state
pub struct Simulation<R = ChaCha8Rng> {
    config: SimConfig,
    vehicles: Vec<VehicleState>,
    particles: ParticleSystem,
    race: RaceState,
    rng: R,
    frame: u64,
}

impl Simulation<ChaCha8Rng> {
    /// Create a simulation seeded from the config, or from entropy when unseeded
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Simulation<R> {
    /// Create a simulation with an explicit random source for the dust
    pub fn with_rng(config: SimConfig, rng: R) -> Self {
        let vehicles = config
            .vehicles
            .iter()
            .enumerate()
            .map(|(i, v)| VehicleState::new(i as u32, v))
            .collect();
        let particles = ParticleSystem::new(config.particles.clone());

        Self {
            config,
            vehicles,
            particles,
            race: RaceState::new(),
            rng,
            frame: 0,
        }
    }

    /// Fire the start signal; scripted vehicles pick up their cruise speed
    pub fn start_race(&mut self) -> bool {
        if !self.race.start() {
            return false;
        }
        for vehicle in self.vehicles.iter_mut().filter(|v| !v.player) {
            vehicle.speed = vehicle.target_speed;
        }
        true
    }

    /// Apply a player speed command. Ignored before the start and without a player.
    pub fn apply_throttle(&mut self, throttle: Throttle) -> bool {
        if !self.race.is_started() {
            log::debug!("{:?} ignored before the start", throttle);
            return false;
        }
        match self.vehicles.iter_mut().find(|v| v.player) {
            Some(player) => {
                Vehicle::apply_throttle(player, throttle, &self.config.input);
                true
            }
            None => false,
        }
    }

    /// Run one frame and return its snapshot
    pub fn step(&mut self, delta: f32) -> FrameSnapshot {
        let delta = self.clamp_delta(delta);
        let track = &self.config.track;

        if self.race.is_started() {
            for vehicle in &mut self.vehicles {
                if self.config.hold_scripted_speed {
                    Vehicle::redrive(vehicle, track);
                }
                Vehicle::advance(vehicle, delta, track, self.config.decay_factor);
            }

            let finished = self.race.evaluate(&mut self.vehicles, track.finish_line, delta);
            if finished > 0 && self.race.is_complete() {
                if let Some(outcome) = self.race.outcome(&self.vehicles) {
                    log::info!("Player outcome: {:?}", outcome);
                }
            }
        }

        self.particles.update(delta);
        for vehicle in &self.vehicles {
            self.particles
                .spawn(&mut self.rng, vehicle.lane, vehicle.position, vehicle.speed);
        }

        self.frame += 1;
        self.snapshot()
    }

    fn clamp_delta(&self, delta: f32) -> f32 {
        if delta.is_nan() || delta < 0.0 {
            log::debug!("Discarding invalid frame delta {}", delta);
            return 0.0;
        }
        if delta > self.config.max_frame_dt {
            log::debug!("Clamping frame delta {:.3}s to {:.3}s", delta, self.config.max_frame_dt);
            return self.config.max_frame_dt;
        }
        delta
    }

    /// Current state without advancing
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            vehicles: self.vehicles.iter().map(VehicleSnapshot::from).collect(),
            particles: self.particles.snapshot(),
            race: self.race.get_snapshot(&self.vehicles),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn vehicles(&self) -> &[VehicleState] {
        &self.vehicles
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn race(&self) -> &RaceState {
        &self.race
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn results(&self) -> &[RaceResult] {
        self.race.results()
    }

    pub fn standings(&self) -> Vec<Standing> {
        standings(&self.vehicles)
    }

    pub fn outcome(&self) -> Option<RaceOutcome> {
        self.race.outcome(&self.vehicles)
    }
}
