//! Vehicle - Longitudinal kinematics for each car on the track
//!
//! Every vehicle moves along a single axis. Speed is damped once per frame
//! and positions are clamped to the track bounds.

use serde::{Deserialize, Serialize};
use crate::game_server::config::{InputConfig, TrackConfig, VehicleConfig};

/// Complete state for a single vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    /// Setup-order index, also the finish tie-break order
    pub id: u32,
    pub name: String,
    /// Lateral lane coordinate
    pub lane: f32,
    /// Distance along the track
    pub position: f32,
    /// Current longitudinal speed
    pub speed: f32,
    /// Cruise speed for scripted vehicles
    pub target_speed: f32,
    /// Wheel rotation in degrees, [0, 360)
    pub wheel_angle: f32,
    /// 0 while racing, otherwise the 1-based finishing place
    pub place: u32,
    pub player: bool,
}

impl VehicleState {
    /// Create a vehicle parked at the origin
    pub fn new(id: u32, config: &VehicleConfig) -> Self {
        Self {
            id,
            name: config.name.clone(),
            lane: config.lane,
            position: 0.0,
            speed: 0.0,
            target_speed: config.target_speed,
            wheel_angle: 0.0,
            place: 0,
            player: config.player,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.place > 0
    }
}

/// Speed change requested by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Throttle {
    Accelerate,
    Brake,
    Boost,
}

/// Vehicle simulation logic
pub struct Vehicle;

impl Vehicle {
    /// Wheel radius used to turn distance into wheel rotation
    const WHEEL_RADIUS: f32 = 0.25;

    /// Advance a vehicle by one frame
    pub fn advance(state: &mut VehicleState, delta: f32, track: &TrackConfig, decay_factor: f32) {
        let before = state.position;

        state.position += state.speed * delta;
        state.speed *= decay_factor;

        if state.position > track.track_end {
            state.position = track.track_end;
            state.speed = 0.0;
        }
        if state.position < track.track_start {
            state.position = track.track_start;
        }

        let travelled = state.position - before;
        let turned = (travelled / Self::WHEEL_RADIUS).to_degrees();
        state.wheel_angle = (state.wheel_angle + turned).rem_euclid(360.0);
    }

    /// Apply a player speed increment; braking never reverses the car
    pub fn apply_throttle(state: &mut VehicleState, throttle: Throttle, input: &InputConfig) {
        state.speed = match throttle {
            Throttle::Accelerate => state.speed + input.accelerate,
            Throttle::Brake => (state.speed - input.brake).max(0.0),
            Throttle::Boost => state.speed + input.boost,
        };
    }

    /// Reset a scripted vehicle to its cruise speed while it still has track ahead
    pub fn redrive(state: &mut VehicleState, track: &TrackConfig) {
        if !state.player && state.position < track.track_end {
            state.speed = state.target_speed;
        }
    }
}

/// Vehicle state handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: u32,
    pub name: String,
    pub lane: f32,
    pub position: f32,
    pub speed: f32,
    pub wheel_angle: f32,
    pub place: u32,
    pub player: bool,
}

impl From<&VehicleState> for VehicleSnapshot {
    fn from(state: &VehicleState) -> Self {
        Self {
            id: state.id,
            name: state.name.clone(),
            lane: state.lane,
            position: state.position,
            speed: state.speed,
            wheel_angle: state.wheel_angle,
            place: state.place,
            player: state.player,
        }
    }
}
