//! Command surface for driving a `ReactorSimulator`.
//!
//! Commands are plain serde values so a front end can send them as JSON.
//! Commands that need a fuel assembly are logged and reported as warnings
//! when none is loaded; the simulation carries on.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::{AssemblyLayout, SimulationConfig};
use crate::error::Result;
use crate::fuel_rod::{FuelRodFlags, FuelRodState};
use crate::reactor::ReactorSnapshot;
use crate::rods::{RodClass, RodCommand};
use crate::simulator::ReactorSimulator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SimulatorCommand {
    GetState,
    Step,
    Run { steps: usize },
    #[serde(rename_all = "camelCase")]
    Realtime { delta_real_time: f64, time_speed: f64 },
    GenerateAssembly { layout: AssemblyLayout },
    ClearAssembly,
    MoveRods { class: RodClass, action: RodCommand },
    SetRodsEnabled { class: RodClass, enabled: bool },
    SetPumpsEnabled { enabled: bool },
    SetTargetPower { target: usize },
    ForceFuelState { index: usize, state: FuelRodState },
    GetFuelRod { index: usize },
    Reset { config: Option<SimulationConfig> },
}

/// Response for every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub state: ReactorSnapshot,
    /// Steps actually run by `Run`/`Realtime`.
    pub steps: usize,
    pub fuel_rod: Option<FuelRodFlags>,
    /// Soft failure, if any.
    pub warning: Option<String>,
}

/// Execute one command. Only fatal errors are returned as `Err`.
pub fn execute(
    simulator: &ReactorSimulator,
    command: SimulatorCommand,
) -> Result<SimulationResponse> {
    let mut steps = 0;
    let mut fuel_rod = None;

    let outcome: Result<()> = match command {
        SimulatorCommand::GetState => Ok(()),
        SimulatorCommand::Step => {
            simulator.step();
            steps = 1;
            Ok(())
        }
        SimulatorCommand::Run { steps: n } => {
            simulator.run(n);
            steps = n;
            Ok(())
        }
        SimulatorCommand::Realtime {
            delta_real_time,
            time_speed,
        } => {
            steps = simulator.advance_realtime(delta_real_time, time_speed);
            Ok(())
        }
        SimulatorCommand::GenerateAssembly { layout } => simulator.generate_assembly(layout),
        SimulatorCommand::ClearAssembly => {
            simulator.clear_assembly();
            Ok(())
        }
        SimulatorCommand::MoveRods { class, action } => simulator.command_rods(class, action),
        SimulatorCommand::SetRodsEnabled { class, enabled } => {
            simulator.set_rods_enabled(class, enabled)
        }
        SimulatorCommand::SetPumpsEnabled { enabled } => simulator.set_pumps_enabled(enabled),
        SimulatorCommand::SetTargetPower { target } => {
            simulator.set_target_power(target);
            Ok(())
        }
        SimulatorCommand::ForceFuelState { index, state } => {
            simulator.force_fuel_state(index, state)
        }
        SimulatorCommand::GetFuelRod { index } => simulator.fuel_rod_flags(index).map(|flags| {
            fuel_rod = Some(flags);
        }),
        SimulatorCommand::Reset { config } => {
            simulator.reset(config.unwrap_or_default()).map(|_| ())
        }
    };

    let warning = match outcome {
        Ok(()) => None,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!("Command failed: {}", e);
            Some(e.to_string())
        }
    };

    Ok(SimulationResponse {
        state: simulator.get_state(),
        steps,
        fuel_rod,
        warning,
    })
}

/// Parse and execute a JSON-encoded command.
pub fn execute_json(simulator: &ReactorSimulator, json: &str) -> Result<SimulationResponse> {
    let command: SimulatorCommand = serde_json::from_str(json)?;
    execute(simulator, command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn simulator() -> ReactorSimulator {
        ReactorSimulator::new(SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_json_run_command() {
        let sim = simulator();
        let response = execute_json(&sim, r#"{"command":"run","steps":5}"#).unwrap();
        assert_eq!(response.steps, 5);
        assert_eq!(response.state.ticks, 5);
        assert!(response.warning.is_none());
    }

    #[test]
    fn test_realtime_uses_camel_case_fields() {
        let json = r#"{"command":"realtime","deltaRealTime":0.1,"timeSpeed":2.0}"#;
        let command: SimulatorCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(
            command,
            SimulatorCommand::Realtime { delta_real_time, time_speed }
                if delta_real_time == 0.1 && time_speed == 2.0
        ));
    }

    #[test]
    fn test_empty_assembly_command_is_a_warning() {
        let sim = simulator();
        execute(&sim, SimulatorCommand::ClearAssembly).unwrap();
        let response = execute(
            &sim,
            SimulatorCommand::MoveRods {
                class: RodClass::Moderator,
                action: RodCommand::Raise,
            },
        )
        .unwrap();
        assert!(response.warning.is_some());
        assert!(!response.state.fuel_present);
    }

    #[test]
    fn test_fuel_rod_lookup() {
        let sim = simulator();
        let response = execute(&sim, SimulatorCommand::GetFuelRod { index: 0 }).unwrap();
        assert!(response.fuel_rod.is_some());
        assert!(matches!(
            execute(&sim, SimulatorCommand::GetFuelRod { index: 100_000 }),
            Err(SimError::InvalidIndex { index: 100_000, .. })
        ));
    }

    #[test]
    fn test_invalid_layout_is_fatal() {
        let sim = simulator();
        let mut layout = AssemblyLayout::default();
        layout.rows = 0;
        let err = execute(&sim, SimulatorCommand::GenerateAssembly { layout }).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
        assert!(!sim.get_state().fuel_present);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let sim = simulator();
        assert!(matches!(
            execute_json(&sim, r#"{"command":"warp"}"#),
            Err(SimError::ConfigParse(_))
        ));
    }
}
