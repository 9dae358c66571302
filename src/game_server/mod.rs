//! Game Server Module
//!
//! Per-frame simulation core for the dust racer: vehicle kinematics, dust
//! particles, the race state machine and the frame loop that ties them
//! together. Rendering consumes the snapshots produced here.

pub mod config;
pub mod frame;
pub mod input;
pub mod particles;
pub mod race;
pub mod simulation;
pub mod vehicle;

pub use config::SimConfig;
pub use frame::{FrameSnapshot, Simulation};
pub use input::{Command, ViewState};
pub use particles::{Particle, ParticleSystem};
pub use race::{RaceOutcome, RaceState, RaceStatus};
pub use simulation::{GameServer, GameState};
pub use vehicle::{Vehicle, VehicleState};
