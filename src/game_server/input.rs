//! Input - Discrete commands accepted by the game server

use serde::{Deserialize, Serialize};
use crate::game_server::vehicle::Throttle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Accelerate,
    Brake,
    Boost,
    StartRace,
    ToggleCameraMode,
    ResetView,
    Resize { width: u32, height: u32 },
}

impl Command {
    /// Map a key name to its command (W/S/Q drive, Space starts, C and R drive the camera)
    pub fn from_key(key: &str) -> Option<Command> {
        match key.to_ascii_lowercase().as_str() {
            "w" => Some(Command::Accelerate),
            "s" => Some(Command::Brake),
            "q" => Some(Command::Boost),
            "space" | " " => Some(Command::StartRace),
            "c" => Some(Command::ToggleCameraMode),
            "r" => Some(Command::ResetView),
            _ => None,
        }
    }

    /// Speed change carried by this command, if any
    pub fn throttle(&self) -> Option<Throttle> {
        match self {
            Command::Accelerate => Some(Throttle::Accelerate),
            Command::Brake => Some(Throttle::Brake),
            Command::Boost => Some(Throttle::Boost),
            _ => None,
        }
    }
}

/// Camera state kept for the renderer; the simulation never reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub chase_cam: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            chase_cam: false,
            width: 1024,
            height: 768,
        }
    }
}

impl ViewState {
    /// Apply a view command. Returns false for commands that are not about the view.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::ToggleCameraMode => self.chase_cam = !self.chase_cam,
            Command::ResetView => {
                *self = ViewState {
                    width: self.width,
                    height: self.height,
                    ..ViewState::default()
                }
            }
            Command::Resize { width, height } => {
                self.width = width;
                self.height = height.max(1);
            }
            _ => return false,
        }
        true
    }
}
