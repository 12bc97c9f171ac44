//! Fission Reactor Simulator - Main Entry Point
//!
//! Usage: `fission-sim [config.json] [seconds]`
//!
//! Runs the simulation in real time, logging each power sample. Without a
//! duration it runs until interrupted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fission_sim_lib::events::ReactorEvent;
use fission_sim_lib::{ReactorSimulator, SimulationConfig};
use log::{error, info};

fn load_config(path: Option<&String>) -> Result<SimulationConfig, String> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    SimulationConfig::from_json_str(&json).map_err(|e| format!("{}: {}", path, e))
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let config = match load_config(args.get(1)) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let run_for = args.get(2).and_then(|s| s.parse::<f64>().ok()).map(Duration::from_secs_f64);

    let simulator = match ReactorSimulator::new(config) {
        Ok(simulator) => Arc::new(simulator),
        Err(e) => {
            error!("Failed to start reactor: {}", e);
            std::process::exit(1);
        }
    };
    let mut events = simulator.subscribe();

    let started = Instant::now();
    let mut last = started;
    let mut interval = tokio::time::interval(Duration::from_millis(50));
    let mut transitions: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                simulator.advance_realtime((now - last).as_secs_f64(), 1.0);
                last = now;
                if run_for.is_some_and(|limit| started.elapsed() >= limit) {
                    break;
                }
            }
            Some(event) = events.recv() => match event {
                ReactorEvent::FuelRodStateChanged { .. } => transitions += 1,
                other => info!("{:?}", other),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let state = simulator.get_state();
    info!(
        "Stopped after {:.1}s simulated: power {}/{}, {} live neutrons, {} fuel transitions",
        state.time, state.power.current, state.power.target, state.live_neutrons, transitions
    );
    match serde_json::to_string_pretty(&state) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to encode final state: {}", e),
    }
}
