//! End-to-end scenarios against the public reactor API.

use fission_sim_lib::config::{AssemblyLayout, FuelRodParams, MonitorSettings};
use fission_sim_lib::error::SimError;
use fission_sim_lib::events::ReactorEvent;
use fission_sim_lib::fuel_rod::{FuelRodFlags, FuelRodState};
use fission_sim_lib::geometry::Vec2;
use fission_sim_lib::monitor::{control_command, FuelCounts};
use fission_sim_lib::rods::{RodClass, RodCommand, RodLayout, RodSpec};
use fission_sim_lib::{Reactor, SimulationConfig};

fn two_by_two() -> AssemblyLayout {
    AssemblyLayout::new(2, 2, Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0))
}

fn quiet_fuel() -> FuelRodParams {
    FuelRodParams {
        fissile_probability: 0.0,
        random_release_probability: 0.0,
        ..FuelRodParams::default()
    }
}

/// Config where a power reading is taken every tick and a single control
/// rod sits far from the action.
fn controller_config() -> SimulationConfig {
    SimulationConfig {
        fuel: quiet_fuel(),
        layout: AssemblyLayout::new(1, 1, Vec2::new(-50.0, -50.0), Vec2::new(50.0, 50.0)),
        rod_layout: Some(RodLayout {
            rods: vec![RodSpec {
                class: RodClass::Control,
                x: 45.0,
                origin_height: -50.0,
                width: 1.0,
                length: 100.0,
            }],
        }),
        monitor: MonitorSettings {
            sample_interval: 0.02,
            ..MonitorSettings::default()
        },
        ..SimulationConfig::default()
    }
}

#[test]
fn test_generate_two_by_two_assembly() {
    let mut config = SimulationConfig::default();
    config.layout = two_by_two();
    let reactor = Reactor::with_assembly(config).unwrap();

    let positions: Vec<Vec2> = reactor.assembly().iter().map(|r| r.position()).collect();
    assert_eq!(
        positions,
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        ]
    );
    assert!(reactor
        .assembly()
        .iter()
        .all(|r| r.state() == FuelRodState::NonFissile));
    assert_eq!(reactor.tank().len(), 4);
    assert!((reactor.tank().statistics().water_level_percent - 100.0).abs() < 1e-9);
}

#[test]
fn test_forced_fissile_reaction() {
    let mut config = SimulationConfig::default();
    config.layout = two_by_two();
    config.fuel = quiet_fuel();
    let mut reactor = Reactor::with_assembly(config).unwrap();

    reactor.force_fuel_state(2, FuelRodState::Fissile).unwrap();
    assert!(reactor.inject_reaction(2).unwrap());

    let state = reactor.assembly().rod(2).unwrap().state();
    assert!(matches!(
        state,
        FuelRodState::NonFissile | FuelRodState::XenonSaturated
    ));
    // The fission branch releases the full yield either way.
    assert_eq!(reactor.neutron_count(), 3);
    assert_eq!(reactor.counters().spawned, 3);
}

#[test]
fn test_xenon_reaction_yields_nothing() {
    let mut config = SimulationConfig::default();
    config.layout = two_by_two();
    config.fuel = quiet_fuel();
    let mut reactor = Reactor::with_assembly(config).unwrap();

    reactor.force_fuel_state(1, FuelRodState::XenonSaturated).unwrap();
    assert!(reactor.inject_reaction(1).unwrap());
    assert_eq!(reactor.fuel_rod_flags(1).unwrap(), FuelRodFlags::default());
    assert_eq!(reactor.neutron_count(), 0);
    // Non-reactive rods refuse the neutron.
    assert!(!reactor.inject_reaction(1).unwrap());
}

#[test]
fn test_control_law_cases() {
    assert_eq!(control_command(30, 50), RodCommand::Raise);
    assert_eq!(control_command(50, 50), RodCommand::Halt);
    assert_eq!(control_command(70, 50), RodCommand::Lower);
}

#[test]
fn test_controller_drives_control_rods() {
    for (population, moving, raising) in [(30, true, true), (50, false, false), (70, true, false)] {
        let mut reactor = Reactor::with_assembly(controller_config()).unwrap();
        for _ in 0..population {
            reactor.spawn_neutron(Vec2::new(0.0, 0.0), None);
        }
        reactor.step();
        assert_eq!(reactor.power().current, population);
        let status = reactor.rods().status(RodClass::Control);
        assert_eq!(status.moving, moving, "population {}", population);
        if moving {
            assert_eq!(status.raising, raising, "population {}", population);
        }
    }
}

#[test]
fn test_flags_and_counts_hold_through_busy_run() {
    let mut config = SimulationConfig::default();
    config.fuel.fissile_probability = 0.4;
    config.fuel.random_release_probability = 0.5;
    config.fuel.xenon_decay_probability = 0.5;
    let mut reactor = Reactor::with_assembly(config).unwrap();

    for _ in 0..200 {
        reactor.step();
        for rod in reactor.assembly().iter() {
            let flags = rod.flags();
            assert_eq!(flags.is_reactive, flags.is_fissile || flags.is_xenon);
            assert!(!(flags.is_fissile && flags.is_xenon));
        }
        assert_eq!(
            reactor.monitor().counts(),
            FuelCounts::recount(reactor.assembly().iter())
        );
    }
    let counts = reactor.monitor().counts();
    assert_eq!(counts.total, 200);
    assert_eq!(counts.fissile + counts.non_fissile + counts.xenon, counts.total);
}

#[test]
fn test_invalid_configuration_leaves_assembly_empty() {
    let mut reactor = Reactor::with_assembly(SimulationConfig::default()).unwrap();
    for layout in [
        AssemblyLayout::new(0, 3, Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)),
        AssemblyLayout::new(3, 3, Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)),
    ] {
        let err = reactor.generate_assembly(layout).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
        assert!(reactor.assembly().is_empty());
        assert!(reactor.tank().is_empty());
    }

    // A config whose layout is bad still parses; the reactor rejects it when
    // building the assembly.
    let json = r#"{
        "layout": { "rows": 0, "columns": 2, "min": {"x":0,"y":0}, "max": {"x":1,"y":1} }
    }"#;
    let config = SimulationConfig::from_json_str(json).unwrap();
    assert!(matches!(
        Reactor::with_assembly(config),
        Err(SimError::InvalidConfiguration(_))
    ));
    assert!(SimulationConfig::from_json_str(r#"{ "tick_seconds": 0 }"#).is_err());
}

#[test]
fn test_commands_before_assembly_are_no_ops() {
    let mut reactor = Reactor::new(SimulationConfig::default()).unwrap();
    let before = reactor.rods().status(RodClass::Control);

    let err = reactor
        .command_rods(RodClass::Control, RodCommand::Lower)
        .unwrap_err();
    assert!(matches!(err, SimError::EmptyAssembly(_)));
    assert!(!err.is_fatal());
    assert!(reactor.set_pumps_enabled(false).is_err());
    assert!(reactor.set_rods_enabled(RodClass::Moderator, true).is_err());

    reactor.step();
    assert_eq!(reactor.rods().status(RodClass::Control), before);
    assert!(reactor.tank().pumps_enabled());
}

#[test]
fn test_rod_travel_is_bounded() {
    let mut config = SimulationConfig::default();
    config.fuel = quiet_fuel();
    config.monitor.enable_control_rods = false;
    config.monitor.enable_moderator_rods = true;
    let mut reactor = Reactor::with_assembly(config).unwrap();

    reactor
        .command_rods(RodClass::Moderator, RodCommand::Raise)
        .unwrap();
    reactor.run(1500);
    for rod in reactor.rods().rods(RodClass::Moderator) {
        assert!((rod.drive().offset() - 8.0).abs() < 1e-9);
    }

    reactor
        .command_rods(RodClass::Moderator, RodCommand::Lower)
        .unwrap();
    reactor.run(1500);
    for rod in reactor.rods().rods(RodClass::Moderator) {
        assert_eq!(rod.drive().offset(), 0.0);
    }
}

#[test]
fn test_events_delivered_once_per_change() {
    let mut config = SimulationConfig::default();
    config.layout = two_by_two();
    config.fuel = quiet_fuel();
    let mut reactor = Reactor::with_assembly(config).unwrap();
    let mut rx = reactor.subscribe();

    reactor.force_fuel_state(3, FuelRodState::Fissile).unwrap();
    reactor.force_fuel_state(3, FuelRodState::Fissile).unwrap();

    assert_eq!(
        rx.try_recv().unwrap(),
        ReactorEvent::FuelRodStateChanged {
            index: 3,
            from: FuelRodState::NonFissile,
            to: FuelRodState::Fissile,
            flags: FuelRodFlags {
                is_fissile: true,
                is_xenon: false,
                is_reactive: true,
            },
        }
    );
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_same_seed_same_snapshot() {
    let run = || {
        let mut reactor = Reactor::with_assembly(SimulationConfig::default()).unwrap();
        reactor.run(400);
        serde_json::to_string(&reactor.snapshot(1)).unwrap()
    };
    assert_eq!(run(), run());
}
