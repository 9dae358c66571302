//! Config - Simulation constants
//!
//! Every tunable of the simulation lives here. Defaults reproduce the
//! two-car desert demo; a JSON file can override any subset of fields.

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// Upper bound accepted for `particles.capacity`
pub const MAX_PARTICLE_CAPACITY: usize = 100_000;

/// Inclusive-exclusive uniform range `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Symmetric span around zero
    pub const fn centered(half_width: f32) -> Self {
        Self {
            min: -half_width,
            max: half_width,
        }
    }

    fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Track geometry along the direction of travel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Position at which a vehicle is considered finished
    pub finish_line: f32,
    /// Lower clamp for vehicle positions
    pub track_start: f32,
    /// Upper clamp for vehicle positions; speed is zeroed when passed
    pub track_end: f32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            finish_line: 450.0,
            track_start: -45.0,
            track_end: 450.0,
        }
    }
}

/// Dust emission and lifecycle parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Maximum number of live particles
    pub capacity: usize,
    /// Minimum absolute speed that produces dust
    pub spawn_threshold: f32,
    /// Particles emitted per spawn call
    pub burst: usize,
    /// Downward velocity bias per second
    pub gravity: f32,
    /// Height particles are emitted at
    pub ground_height: f32,
    /// Distance behind the vehicle origin the dust cloud is centred on
    pub trail_offset: f32,
    /// Fraction of vehicle speed thrown backwards
    pub trail_factor: f32,
    pub jitter_x: Span,
    pub jitter_z: Span,
    pub velocity_x: Span,
    pub velocity_y: Span,
    pub velocity_z: Span,
    pub lifetime: Span,
    pub size: Span,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: 200,
            spawn_threshold: 0.1,
            burst: 5,
            gravity: 0.5,
            ground_height: 0.1,
            trail_offset: 0.5,
            trail_factor: 0.3,
            jitter_x: Span::centered(0.25),
            jitter_z: Span::centered(0.15),
            velocity_x: Span::centered(0.5),
            velocity_y: Span::new(0.0, 2.0),
            velocity_z: Span::centered(0.25),
            lifetime: Span::new(0.5, 1.0),
            size: Span::new(0.05, 0.15),
        }
    }
}

/// Speed increments applied by player commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub accelerate: f32,
    pub brake: f32,
    pub boost: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            accelerate: 2.5,
            brake: 2.0,
            boost: 20.0,
        }
    }
}

/// One vehicle taking part in the race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub name: String,
    /// Lateral x coordinate of the vehicle's lane
    pub lane: f32,
    /// Cruise speed assigned at race start (ignored for the player)
    #[serde(default)]
    pub target_speed: f32,
    #[serde(default)]
    pub player: bool,
}

impl VehicleConfig {
    pub fn player(name: &str, lane: f32) -> Self {
        Self {
            name: name.to_owned(),
            lane,
            target_speed: 0.0,
            player: true,
        }
    }

    pub fn scripted(name: &str, lane: f32, target_speed: f32) -> Self {
        Self {
            name: name.to_owned(),
            lane,
            target_speed,
            player: false,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub track: TrackConfig,
    pub particles: ParticleConfig,
    pub input: InputConfig,
    pub vehicles: Vec<VehicleConfig>,
    /// Multiplicative speed damping applied once per frame
    pub decay_factor: f32,
    /// Largest frame step fed to the simulation (seconds)
    pub max_frame_dt: f32,
    /// Re-assert scripted vehicles' target speed before every frame
    pub hold_scripted_speed: bool,
    /// Seed for dust randomisation; entropy when absent
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            track: TrackConfig::default(),
            particles: ParticleConfig::default(),
            input: InputConfig::default(),
            vehicles: vec![
                VehicleConfig::player("Player", -1.0),
                VehicleConfig::scripted("Rival", -3.0, 35.0),
            ],
            decay_factor: 0.95,
            max_frame_dt: 0.1,
            hold_scripted_speed: true,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Read and validate a JSON configuration file
    pub fn load(filepath: &Path) -> anyhow::Result<SimConfig> {
        let fh = OpenOptions::new()
            .read(true)
            .open(filepath)
            .with_context(|| format!("Failed to open config file {}!", filepath.display()))?;
        let config: SimConfig = serde_json::from_reader(&fh)
            .with_context(|| format!("Failed to parse config file {}!", filepath.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}!", filepath.display()))?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration string
    pub fn from_json_str(json: &str) -> anyhow::Result<SimConfig> {
        let config: SimConfig = serde_json::from_str(json).context("Failed to parse config!")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let track = &self.track;
        ensure!(!self.vehicles.is_empty(), "vehicles: at least one vehicle is required");
        ensure!(
            self.vehicles.iter().filter(|v| v.player).count() <= 1,
            "vehicles: at most one vehicle can be player-controlled"
        );
        ensure!(
            self.vehicles.iter().all(|v| v.target_speed.is_finite() && v.target_speed >= 0.0),
            "vehicles: target_speed must be a non-negative number"
        );
        ensure!(
            track.track_start <= track.finish_line && track.finish_line <= track.track_end,
            "track: expected track_start <= finish_line <= track_end, got {} / {} / {}",
            track.track_start,
            track.finish_line,
            track.track_end
        );
        ensure!(
            track.track_start <= 0.0,
            "track.track_start: vehicles are placed at 0, so it must not be above 0, got {}",
            track.track_start
        );
        ensure!(
            self.decay_factor > 0.0 && self.decay_factor <= 1.0,
            "decay_factor: must be in (0, 1], got {}",
            self.decay_factor
        );
        ensure!(
            self.max_frame_dt > 0.0 && self.max_frame_dt.is_finite(),
            "max_frame_dt: must be positive, got {}",
            self.max_frame_dt
        );

        let particles = &self.particles;
        ensure!(
            particles.capacity > 0 && particles.capacity <= MAX_PARTICLE_CAPACITY,
            "particles.capacity: expected 1..={}, got {}",
            MAX_PARTICLE_CAPACITY,
            particles.capacity
        );
        ensure!(
            particles.spawn_threshold >= 0.0,
            "particles.spawn_threshold: must not be negative"
        );
        ensure!(particles.gravity >= 0.0, "particles.gravity: must not be negative");
        for (name, span) in [
            ("jitter_x", particles.jitter_x),
            ("jitter_z", particles.jitter_z),
            ("velocity_x", particles.velocity_x),
            ("velocity_y", particles.velocity_y),
            ("velocity_z", particles.velocity_z),
            ("lifetime", particles.lifetime),
            ("size", particles.size),
        ] {
            ensure!(
                span.is_well_formed(),
                "particles.{}: expected min <= max, got [{}, {})",
                name,
                span.min,
                span.max
            );
        }
        ensure!(
            particles.lifetime.min > 0.0,
            "particles.lifetime: minimum must be positive"
        );
        Ok(())
    }

    /// Index of the player-controlled vehicle, if any
    pub fn player_index(&self) -> Option<usize> {
        self.vehicles.iter().position(|v| v.player)
    }
}
