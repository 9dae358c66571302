//! Race - Race state machine and finish bookkeeping
//!
//! Handles the start signal, finish detection and the finishing order.

use serde::{Deserialize, Serialize};
use crate::game_server::vehicle::VehicleState;

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    NotStarted,
    Running,
    Complete,
}

/// End-of-race result for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceOutcome {
    Win,
    Lose,
}

/// One finish-line crossing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub vehicle_id: u32,
    pub vehicle_name: String,
    pub finish_time: f32,
    pub place: u32,
}

/// A row of the live ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub vehicle_id: u32,
    pub vehicle_name: String,
    pub position: f32,
    /// None while the vehicle is still racing
    pub place: Option<u32>,
    pub player: bool,
}

/// Race progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceState {
    /// Current race status
    pub status: RaceStatus,
    /// Elapsed race time since the start signal (seconds)
    pub elapsed_time: f32,
    /// Number of vehicles that crossed the finish line
    finish_counter: u32,
    /// Crossings in the order they happened
    finish_order: Vec<RaceResult>,
}

impl RaceState {
    pub fn new() -> Self {
        Self {
            status: RaceStatus::NotStarted,
            elapsed_time: 0.0,
            finish_counter: 0,
            finish_order: Vec::new(),
        }
    }

    /// Fire the start signal. Returns false if the race was already started.
    pub fn start(&mut self) -> bool {
        if self.status != RaceStatus::NotStarted {
            log::debug!("Start signal ignored, race is {:?}", self.status);
            return false;
        }
        self.status = RaceStatus::Running;
        log::info!("Race started");
        true
    }

    pub fn is_started(&self) -> bool {
        self.status != RaceStatus::NotStarted
    }

    pub fn is_complete(&self) -> bool {
        self.status == RaceStatus::Complete
    }

    /// Assign places to vehicles that reached the finish line this frame.
    ///
    /// Vehicles are evaluated in slice order, which is the tie-break for
    /// simultaneous crossings. Returns the number of new finishers.
    pub fn evaluate(&mut self, vehicles: &mut [VehicleState], finish_line: f32, delta: f32) -> usize {
        if self.status != RaceStatus::Running {
            return 0;
        }
        self.elapsed_time += delta;

        let mut finished = 0;
        for vehicle in vehicles.iter_mut() {
            if vehicle.place == 0 && vehicle.position >= finish_line {
                self.finish_counter += 1;
                vehicle.place = self.finish_counter;
                finished += 1;

                log::info!(
                    "{} finished in place {} after {:.2}s",
                    vehicle.name,
                    vehicle.place,
                    self.elapsed_time
                );
                self.finish_order.push(RaceResult {
                    vehicle_id: vehicle.id,
                    vehicle_name: vehicle.name.clone(),
                    finish_time: self.elapsed_time,
                    place: vehicle.place,
                });
            }
        }

        if vehicles.iter().all(VehicleState::is_finished) {
            self.status = RaceStatus::Complete;
            log::info!("Race complete, {} finishers", self.finish_counter);
        }
        finished
    }

    /// Player result, available once the race is complete and a player exists
    pub fn outcome(&self, vehicles: &[VehicleState]) -> Option<RaceOutcome> {
        if !self.is_complete() {
            return None;
        }
        vehicles.iter().find(|v| v.player).map(|player| {
            if player.place == 1 {
                RaceOutcome::Win
            } else {
                RaceOutcome::Lose
            }
        })
    }

    /// Finishing order so far
    pub fn results(&self) -> &[RaceResult] {
        &self.finish_order
    }

    pub fn finisher_count(&self) -> u32 {
        self.finish_counter
    }

    /// Get compact snapshot for the renderer
    pub fn get_snapshot(&self, vehicles: &[VehicleState]) -> RaceSnapshot {
        let outcome = self.outcome(vehicles);
        RaceSnapshot {
            status: self.status,
            started: self.is_started(),
            complete: self.is_complete(),
            elapsed_time: self.elapsed_time,
            finisher_count: self.finish_counter,
            places: vehicles.iter().map(|v| v.place).collect(),
            outcome,
            player_won: outcome == Some(RaceOutcome::Win),
        }
    }
}

impl Default for RaceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Ranking of all vehicles: finished by place, then the rest by track position
pub fn standings(vehicles: &[VehicleState]) -> Vec<Standing> {
    let mut ranked: Vec<&VehicleState> = vehicles.iter().collect();
    ranked.sort_by(|a, b| match (a.place, b.place) {
        (0, 0) => b.position.total_cmp(&a.position),
        (0, _) => std::cmp::Ordering::Greater,
        (_, 0) => std::cmp::Ordering::Less,
        (pa, pb) => pa.cmp(&pb),
    });

    ranked
        .into_iter()
        .map(|v| Standing {
            vehicle_id: v.id,
            vehicle_name: v.name.clone(),
            position: v.position,
            place: (v.place > 0).then_some(v.place),
            player: v.player,
        })
        .collect()
}

/// Compact race state for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub started: bool,
    pub complete: bool,
    pub elapsed_time: f32,
    pub finisher_count: u32,
    /// Finishing place per vehicle in setup order, 0 while racing
    pub places: Vec<u32>,
    pub outcome: Option<RaceOutcome>,
    pub player_won: bool,
}
