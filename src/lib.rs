//! Dust Racer - Simulation backend
//!
//! Provides the game server for the racing demo and a headless runner that
//! drives it from the command line.

pub mod game_server;

use anyhow::Context;
use clap::Parser;
use game_server::config::SimConfig;
use game_server::frame::FrameSnapshot;
use game_server::input::Command;
use game_server::race::RaceOutcome;
use game_server::simulation::{GameServer, GameState};
use std::path::PathBuf;
use std::thread::sleep;
use std::time::{Duration, Instant};

#[derive(Debug, Parser, Clone)]
#[clap(
    name = "dust-racer",
    version = "0.1.0",
    about = "Headless runner for the dust racer simulation"
)]
pub struct RunOpts {
    /// Path to a JSON config file (defaults to the built-in two-car race)
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for the dust randomisation, overrides the config
    #[clap(long)]
    pub seed: Option<u64>,

    /// Fixed simulation time step in seconds
    #[clap(short, long, default_value = "0.0166667")]
    pub timestep: f32,

    /// Give up after this many frames
    #[clap(short, long, default_value = "100000")]
    pub max_frames: u64,

    /// Leave the player car alone instead of flooring it
    #[clap(long)]
    pub idle: bool,

    /// Sleep between frames so the race runs in real time
    #[clap(long)]
    pub realtime: bool,

    /// Print the final snapshot as JSON
    #[clap(long)]
    pub json: bool,
}

/// Build the config for a run from the command line options
pub fn load_config(opts: &RunOpts) -> anyhow::Result<SimConfig> {
    let mut config = match &opts.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    Ok(config)
}

/// Drive a race to completion with a scripted player and return the last frame
pub fn run_race(config: SimConfig, opts: &RunOpts) -> anyhow::Result<FrameSnapshot> {
    let mut server = GameServer::new();
    server.init_race(config);
    server
        .handle_command(Command::StartRace)
        .map_err(anyhow::Error::msg)?;
    if !opts.idle {
        server.handle_command(Command::Boost).map_err(anyhow::Error::msg)?;
    }

    let mut t_print = 0.0;
    let mut last = server.get_snapshot().context("Race was not initialized!")?;
    for _ in 0..opts.max_frames {
        if server.get_state() != GameState::Racing {
            break;
        }
        let t_start = Instant::now();

        if !opts.idle {
            server
                .handle_command(Command::Accelerate)
                .map_err(anyhow::Error::msg)?;
        }
        last = server
            .tick_with(opts.timestep)
            .context("Race disappeared mid-run!")?;

        if last.race.elapsed_time > t_print + 0.9999 {
            let leader = server
                .get_standings()
                .and_then(|s| s.into_iter().next())
                .map(|s| s.vehicle_name)
                .unwrap_or_default();
            log::info!(
                "Simulating... race time {:.2}s, leader {}, {} dust particles",
                last.race.elapsed_time,
                leader,
                last.particles.len()
            );
            t_print = last.race.elapsed_time;
        }

        if opts.realtime {
            let step = Duration::try_from_secs_f32(opts.timestep).unwrap_or_default();
            match step.checked_sub(t_start.elapsed()) {
                Some(remaining) => sleep(remaining),
                None => log::warn!("Could not keep up with real-time!"),
            }
        }
    }

    if server.get_state() == GameState::Racing {
        log::warn!("Stopped after {} frames before every vehicle finished", opts.max_frames);
    }

    for standing in server.get_standings().unwrap_or_default() {
        match standing.place {
            Some(place) => println!("RESULT: {:2}. {}", place, standing.vehicle_name),
            None => println!("RESULT:  -. {} (at {:.1})", standing.vehicle_name, standing.position),
        }
    }
    match server.get_outcome() {
        Some(RaceOutcome::Win) => println!("YOU WIN!"),
        Some(RaceOutcome::Lose) => println!("YOU LOSE!"),
        None => {}
    }

    Ok(last)
}

/// Entry point for the binary
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = RunOpts::parse();
    anyhow::ensure!(
        opts.timestep > 0.0 && opts.timestep.is_finite(),
        "Time step must be positive, got {}",
        opts.timestep
    );
    let config = load_config(&opts)?;
    log::info!("Dust racer initialized");

    let last = run_race(config, &opts)?;
    if opts.json {
        let json = serde_json::to_string_pretty(&last).context("Failed to serialize snapshot!")?;
        println!("{}", json);
    }
    Ok(())
}
