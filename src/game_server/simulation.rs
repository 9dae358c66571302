//! Simulation - Game server and tick loop
//!
//! Manages the race session, feeds commands and elapsed time into the
//! frame orchestrator, and keeps tick statistics.

use std::collections::VecDeque;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use crate::game_server::config::SimConfig;
use crate::game_server::frame::{FrameSnapshot, Simulation};
use crate::game_server::input::{Command, ViewState};
use crate::game_server::race::{RaceOutcome, RaceResult, Standing};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Idle,
    Ready,
    Racing,
    Results,
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub tick_rate: f32,
    pub avg_tick_time_ms: f32,
    pub vehicle_count: u32,
    pub particle_count: u32,
    pub game_state: GameState,
}

/// Snapshot plus the view state the renderer needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSnapshot {
    pub state: GameState,
    pub view: ViewState,
    pub frame: FrameSnapshot,
}

/// Main game server
pub struct GameServer {
    /// Current game state
    state: GameState,
    /// Active race (if any)
    sim: Option<Simulation>,
    /// Camera state forwarded to the renderer
    view: ViewState,
    /// Target tick rate (ticks per second)
    tick_rate: f32,
    /// Last tick timestamp
    last_tick: Instant,
    /// Recent tick durations for averaging
    tick_times: VecDeque<f32>,
    /// Whether the simulation advances on tick
    running: bool,
}

impl GameServer {
    const TICK_WINDOW: usize = 60;

    /// Create a new game server
    pub fn new() -> Self {
        Self {
            state: GameState::Idle,
            sim: None,
            view: ViewState::default(),
            tick_rate: 60.0,
            last_tick: Instant::now(),
            tick_times: VecDeque::with_capacity(Self::TICK_WINDOW),
            running: false,
        }
    }

    /// Set up a fresh race with the given config
    pub fn init_race(&mut self, config: SimConfig) {
        log::info!("Race initialized with {} vehicles", config.vehicles.len());
        self.sim = Some(Simulation::new(config));
        self.state = GameState::Ready;
        self.running = false;
        self.tick_times.clear();
    }

    /// Fire the start signal
    pub fn start_race(&mut self) -> Result<(), String> {
        let sim = self.sim.as_mut().ok_or("No race initialized")?;
        if sim.start_race() {
            self.state = GameState::Racing;
            self.running = true;
            self.view.chase_cam = true;
            self.last_tick = Instant::now();
        }
        Ok(())
    }

    /// Dispatch an input command
    pub fn handle_command(&mut self, command: Command) -> Result<(), String> {
        if self.view.apply(command) {
            return Ok(());
        }
        if command == Command::StartRace {
            return self.start_race();
        }

        let sim = self.sim.as_mut().ok_or("No race initialized")?;
        if let Some(throttle) = command.throttle() {
            sim.apply_throttle(throttle);
        }
        Ok(())
    }

    /// Perform a tick using wall-clock time since the previous tick
    pub fn tick(&mut self) -> Option<FrameSnapshot> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.tick_with(delta)
    }

    /// Perform a tick with an explicit time step
    pub fn tick_with(&mut self, delta: f32) -> Option<FrameSnapshot> {
        if !self.running {
            return self.get_snapshot();
        }

        let tick_start = Instant::now();
        let sim = self.sim.as_mut()?;
        let snapshot = sim.step(delta);

        if snapshot.race.complete && self.state == GameState::Racing {
            self.state = GameState::Results;
            self.running = false;
            match snapshot.race.outcome {
                Some(RaceOutcome::Win) => log::info!("YOU WIN!"),
                Some(RaceOutcome::Lose) => log::info!("YOU LOSE!"),
                None => {}
            }
        }

        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push_back(tick_time);
        if self.tick_times.len() > Self::TICK_WINDOW {
            self.tick_times.pop_front();
        }

        Some(snapshot)
    }

    /// Get current frame snapshot
    pub fn get_snapshot(&self) -> Option<FrameSnapshot> {
        self.sim.as_ref().map(|s| s.snapshot())
    }

    /// Frame snapshot together with session and view state
    pub fn get_server_snapshot(&self) -> Option<ServerSnapshot> {
        self.get_snapshot().map(|frame| ServerSnapshot {
            state: self.state,
            view: self.view,
            frame,
        })
    }

    /// Get race results
    pub fn get_results(&self) -> Option<Vec<RaceResult>> {
        self.sim.as_ref().map(|s| s.results().to_vec())
    }

    pub fn get_standings(&self) -> Option<Vec<Standing>> {
        self.sim.as_ref().map(|s| s.standings())
    }

    pub fn get_outcome(&self) -> Option<RaceOutcome> {
        self.sim.as_ref().and_then(|s| s.outcome())
    }

    /// Get server statistics
    pub fn get_stats(&self) -> ServerStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        ServerStats {
            tick_rate: self.tick_rate,
            avg_tick_time_ms: avg_tick_time,
            vehicle_count: self.sim.as_ref().map(|s| s.vehicles().len() as u32).unwrap_or(0),
            particle_count: self.sim.as_ref().map(|s| s.particles().len() as u32).unwrap_or(0),
            game_state: self.state,
        }
    }

    /// Get current game state
    pub fn get_state(&self) -> GameState {
        self.state
    }

    pub fn get_view(&self) -> ViewState {
        self.view
    }

    /// Reset to idle state
    pub fn reset(&mut self) {
        self.state = GameState::Idle;
        self.sim = None;
        self.running = false;
        self.tick_times.clear();
        log::info!("Race reset");
    }

    /// Pause the simulation
    pub fn pause(&mut self) {
        if self.running {
            log::info!("Race paused");
        }
        self.running = false;
    }

    /// Resume the simulation
    pub fn resume(&mut self) {
        if self.state == GameState::Racing {
            self.running = true;
            self.last_tick = Instant::now();
            log::info!("Race resumed");
        }
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new()
    }
}
