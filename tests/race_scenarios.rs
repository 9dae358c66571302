use clap::Parser;
use dust_racer_lib::game_server::config::{SimConfig, VehicleConfig};
use dust_racer_lib::game_server::frame::Simulation;
use dust_racer_lib::game_server::race::{RaceOutcome, RaceStatus};
use dust_racer_lib::game_server::vehicle::Throttle;
use dust_racer_lib::{load_config, run_race, RunOpts};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn straight(length: f32, vehicles: Vec<VehicleConfig>) -> SimConfig {
    let mut config = SimConfig::default();
    config.track.finish_line = length;
    config.track.track_end = length;
    config.track.track_start = 0.0;
    config.vehicles = vehicles;
    config.seed = Some(11);
    config
}

fn run_until_complete(sim: &mut Simulation, delta: f32, max_frames: usize) -> usize {
    for frame in 0..max_frames {
        if sim.race().is_complete() {
            return frame;
        }
        sim.step(delta);
    }
    panic!("race did not complete within {} frames", max_frames);
}

#[test]
fn single_vehicle_reaches_the_line_first() {
    let config = straight(800.0, vec![VehicleConfig::scripted("Solo", 0.0, 50.0)]);
    let mut sim = Simulation::new(config);
    assert_eq!(sim.vehicles()[0].speed, 0.0);

    sim.start_race();
    assert_eq!(sim.vehicles()[0].speed, 50.0);

    run_until_complete(&mut sim, 0.1, 500);
    assert_eq!(sim.vehicles()[0].place, 1);
    assert_eq!(sim.race().status, RaceStatus::Complete);
    assert_eq!(sim.results().len(), 1);
    // No player vehicle, so no outcome to report
    assert_eq!(sim.outcome(), None);
}

#[test]
fn three_vehicles_finish_in_speed_order() {
    let config = straight(
        800.0,
        vec![
            VehicleConfig::scripted("Fast", -1.0, 50.0),
            VehicleConfig::scripted("Slow", -3.0, 35.0),
            VehicleConfig::scripted("Middle", -5.0, 45.0),
        ],
    );
    let mut sim = Simulation::new(config);
    sim.start_race();
    run_until_complete(&mut sim, 0.1, 1000);

    let places: Vec<u32> = sim.vehicles().iter().map(|v| v.place).collect();
    assert_eq!(places, vec![1, 3, 2]);

    let order: Vec<&str> = sim.results().iter().map(|r| r.vehicle_name.as_str()).collect();
    assert_eq!(order, vec!["Fast", "Middle", "Slow"]);
    let times: Vec<f32> = sim.results().iter().map(|r| r.finish_time).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn identical_cars_tie_break_by_grid_order() {
    let config = straight(
        300.0,
        vec![
            VehicleConfig::scripted("A", -1.0, 40.0),
            VehicleConfig::scripted("B", -3.0, 40.0),
            VehicleConfig::scripted("C", -5.0, 40.0),
        ],
    );
    let mut sim = Simulation::new(config);
    sim.start_race();
    run_until_complete(&mut sim, 0.1, 1000);

    let places: Vec<u32> = sim.vehicles().iter().map(|v| v.place).collect();
    assert_eq!(places, vec![1, 2, 3]);
    let times: Vec<f32> = sim.results().iter().map(|r| r.finish_time).collect();
    assert_eq!(times[0], times[2]);
}

#[test]
fn random_play_respects_every_invariant() {
    let mut driver = ChaCha8Rng::seed_from_u64(2024);
    for _ in 0..20 {
        let config = straight(
            200.0,
            vec![
                VehicleConfig::player("Player", -1.0),
                VehicleConfig::scripted("Rival", -3.0, driver.gen_range(10.0..60.0)),
                VehicleConfig::scripted("Other", -5.0, driver.gen_range(10.0..60.0)),
            ],
        );
        let (start, end, cap) = (config.track.track_start, config.track.track_end, config.particles.capacity);
        let mut sim = Simulation::with_rng(config, ChaCha8Rng::seed_from_u64(driver.gen()));
        sim.start_race();

        let mut previous = sim.snapshot();
        for _ in 0..3000 {
            match driver.gen_range(0..6) {
                0 => {
                    sim.apply_throttle(Throttle::Accelerate);
                }
                1 => {
                    sim.apply_throttle(Throttle::Brake);
                }
                2 if driver.gen_bool(0.1) => {
                    sim.apply_throttle(Throttle::Boost);
                }
                _ => {}
            }
            // Includes occasional hitches well past the frame clamp
            let delta = if driver.gen_bool(0.02) {
                driver.gen_range(0.5..3.0)
            } else {
                driver.gen_range(0.0..0.05)
            };
            let snapshot = sim.step(delta);

            assert!(snapshot.particles.len() <= cap);
            for (now, before) in snapshot.vehicles.iter().zip(&previous.vehicles) {
                assert!(now.position >= start && now.position <= end);
                assert!(now.position >= before.position);
                if before.place > 0 {
                    assert_eq!(now.place, before.place);
                }
            }
            for p in sim.particles().iter() {
                assert!(p.lifetime > 0.0);
            }
            previous = snapshot;
        }

        // A braking player may never finish; places handed out so far are still 1..=k
        let mut places: Vec<u32> = sim.vehicles().iter().map(|v| v.place).filter(|&p| p > 0).collect();
        places.sort_unstable();
        let expected: Vec<u32> = (1..=places.len() as u32).collect();
        assert_eq!(places, expected);
        if sim.race().is_complete() {
            assert_eq!(places, vec![1, 2, 3]);
            assert!(sim.outcome().is_some());
        }
    }
}

#[test]
fn default_race_with_autopilot_is_won() {
    let opts = RunOpts::parse_from(["dust-racer", "--seed", "5", "--timestep", "0.02"]);
    let config = load_config(&opts).unwrap();
    assert_eq!(config.seed, Some(5));

    let last = run_race(config, &opts).unwrap();
    assert!(last.race.complete);
    assert_eq!(last.race.outcome, Some(RaceOutcome::Win));
    assert!(last.race.player_won);
    assert_eq!(last.race.places, vec![1, 2]);
}

#[test]
fn idle_player_loses_the_default_race() {
    let opts = RunOpts::parse_from(["dust-racer", "--idle", "--max-frames", "2000", "--timestep", "0.05"]);
    let config = load_config(&opts).unwrap();
    let last = run_race(config, &opts).unwrap();
    assert!(!last.race.complete);
    assert_eq!(last.race.places, vec![0, 1]);
    assert!(!last.race.player_won);
}

#[test]
fn config_file_round_trip_through_disk() {
    let path = std::env::temp_dir().join(format!("dust-racer-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "track": { "finish_line": 120.0, "track_end": 150.0 },
            "vehicles": [
                { "name": "Me", "lane": -1.0, "player": true },
                { "name": "Bot", "lane": -3.0, "target_speed": 30.0 }
            ],
            "particles": { "capacity": 50 }
        }"#,
    )
    .unwrap();

    let opts = RunOpts::parse_from(["dust-racer", "--config", path.to_str().unwrap(), "--seed", "8"]);
    let config = load_config(&opts).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.track.finish_line, 120.0);
    assert_eq!(config.track.track_end, 150.0);
    assert_eq!(config.particles.capacity, 50);
    assert_eq!(config.particles.burst, 5);
    assert_eq!(config.seed, Some(8));
    assert_eq!(config.vehicles[1].name, "Bot");
}

#[test]
fn missing_config_file_reports_path() {
    let opts = RunOpts::parse_from(["dust-racer", "--config", "/nonexistent/dust.json"]);
    let err = load_config(&opts).unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/dust.json"));
}

#[test]
fn bundled_three_car_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("input/three_car_race.json");
    let config = SimConfig::load(&path).unwrap();
    assert_eq!(config.vehicles.len(), 3);
    assert_eq!(config.player_index(), Some(0));
    assert_eq!(config.particles.capacity, 300);
}
