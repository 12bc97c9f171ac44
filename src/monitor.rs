//! Reactor monitor and rod feedback controller.
//!
//! The monitor samples the live neutron count ("power") on a fixed cadence
//! and, every tick, drives the control rods with a bang-bang law: below
//! target raise them, above target lower them, on target halt. There is no
//! deadband, so power hunting around the setpoint is normal.
//!
//! Fuel counts are seeded by one scan when an assembly is inserted and then
//! kept up to date from state-change events.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::assembly::FuelAssembly;
use crate::config::MonitorSettings;
use crate::coolant_tank::CoolantWaterTank;
use crate::events::ReactorEvent;
use crate::fuel_rod::{FuelRod, FuelRodState};
use crate::rods::{RodArrayController, RodClass, RodCommand};

/// Number of rods in each state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FuelCounts {
    pub total: usize,
    pub fissile: usize,
    pub non_fissile: usize,
    pub xenon: usize,
    pub reactive: usize,
}

impl FuelCounts {
    pub fn recount<'a>(rods: impl IntoIterator<Item = &'a FuelRod>) -> Self {
        let mut counts = FuelCounts::default();
        for rod in rods {
            counts.total += 1;
            counts.add(rod.state());
        }
        counts
    }

    /// Move one rod from the `from` bucket to the `to` bucket.
    pub fn apply(&mut self, from: FuelRodState, to: FuelRodState) {
        self.remove(from);
        self.add(to);
    }

    fn add(&mut self, state: FuelRodState) {
        match state {
            FuelRodState::NonFissile => self.non_fissile += 1,
            FuelRodState::Fissile => self.fissile += 1,
            FuelRodState::XenonSaturated => self.xenon += 1,
        }
        if state.flags().is_reactive {
            self.reactive += 1;
        }
    }

    fn remove(&mut self, state: FuelRodState) {
        let bucket = match state {
            FuelRodState::NonFissile => &mut self.non_fissile,
            FuelRodState::Fissile => &mut self.fissile,
            FuelRodState::XenonSaturated => &mut self.xenon,
        };
        *bucket = bucket.saturating_sub(1);
        if state.flags().is_reactive {
            self.reactive = self.reactive.saturating_sub(1);
        }
    }
}

/// Fuel counts with 0-1 fractions and 0-100 percentages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FuelStatistics {
    pub counts: FuelCounts,
    pub fissile_fraction: f64,
    pub non_fissile_fraction: f64,
    pub xenon_fraction: f64,
    pub reactive_fraction: f64,
    pub percent_fissile: f64,
    pub percent_non_fissile: f64,
    pub percent_xenon: f64,
    pub percent_reactive: f64,
}

impl FuelStatistics {
    pub fn from_counts(counts: FuelCounts) -> Self {
        let fraction = |n: usize| {
            if counts.total == 0 {
                0.0
            } else {
                n as f64 / counts.total as f64
            }
        };
        let (f, n, x, r) = (
            fraction(counts.fissile),
            fraction(counts.non_fissile),
            fraction(counts.xenon),
            fraction(counts.reactive),
        );
        Self {
            counts,
            fissile_fraction: f,
            non_fissile_fraction: n,
            xenon_fraction: x,
            reactive_fraction: r,
            percent_fissile: round1(f * 100.0),
            percent_non_fissile: round1(n * 100.0),
            percent_xenon: round1(x * 100.0),
            percent_reactive: round1(r * 100.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerReading {
    /// Live neutrons at the last sample.
    pub current: usize,
    pub target: usize,
    /// `current - target`: positive when over-powered.
    pub difference: i64,
    /// Current power as a percentage of target.
    pub percent: f64,
}

impl PowerReading {
    pub fn new(current: usize, target: usize) -> Self {
        Self {
            current,
            target,
            difference: current as i64 - target as i64,
            percent: if target == 0 {
                0.0
            } else {
                round1(current as f64 / target as f64 * 100.0)
            },
        }
    }
}

/// Everything the monitor publishes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitorStatistics {
    pub fuel_present: bool,
    pub fuel: FuelStatistics,
    pub power: PowerReading,
    /// Average coolant temperature [F], one decimal; `None` without coolant.
    pub average_water_temp_f: Option<f64>,
    /// Same in [C].
    pub average_water_temp_c: Option<f64>,
    pub samples_taken: u64,
}

/// The feedback law: raise below target, lower above, halt on target.
pub fn control_command(current: usize, target: usize) -> RodCommand {
    match current.cmp(&target) {
        std::cmp::Ordering::Less => RodCommand::Raise,
        std::cmp::Ordering::Greater => RodCommand::Lower,
        std::cmp::Ordering::Equal => RodCommand::Halt,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

#[derive(Debug)]
pub struct ReactorMonitor {
    settings: MonitorSettings,
    applied_control_rods: bool,
    applied_moderator_rods: bool,
    applied_pumps: bool,
    sample_remaining: f64,
    counts: FuelCounts,
    statistics: MonitorStatistics,
}

impl ReactorMonitor {
    /// The rod array and tank are expected to start with the same enable
    /// flags as `settings`; only later changes are propagated.
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            applied_control_rods: settings.enable_control_rods,
            applied_moderator_rods: settings.enable_moderator_rods,
            applied_pumps: settings.enable_pumps,
            sample_remaining: settings.sample_interval,
            counts: FuelCounts::default(),
            statistics: MonitorStatistics {
                power: PowerReading::new(0, settings.target_power),
                ..MonitorStatistics::default()
            },
            settings,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn statistics(&self) -> MonitorStatistics {
        self.statistics
    }

    pub fn counts(&self) -> FuelCounts {
        self.counts
    }

    pub fn current_power(&self) -> usize {
        self.statistics.power.current
    }

    pub fn target_power(&self) -> usize {
        self.settings.target_power
    }

    pub fn fuel_present(&self) -> bool {
        self.statistics.fuel_present
    }

    pub fn set_target_power(&mut self, target: usize) {
        self.settings.target_power = target;
        self.statistics.power = PowerReading::new(self.statistics.power.current, target);
    }

    pub fn set_control_rods_enabled(&mut self, enabled: bool) {
        self.settings.enable_control_rods = enabled;
    }

    pub fn set_moderator_rods_enabled(&mut self, enabled: bool) {
        self.settings.enable_moderator_rods = enabled;
    }

    pub fn set_pumps_enabled(&mut self, enabled: bool) {
        self.settings.enable_pumps = enabled;
    }

    /// Seed the counts from a full scan of a freshly inserted assembly.
    pub fn on_assembly_inserted(&mut self, assembly: &FuelAssembly) {
        self.counts = FuelCounts::recount(assembly.iter());
        self.statistics.fuel_present = self.counts.total > 0;
        self.statistics.fuel = FuelStatistics::from_counts(self.counts);
    }

    pub fn on_assembly_destroyed(&mut self) {
        self.counts = FuelCounts::default();
        self.statistics.fuel_present = false;
        self.statistics.fuel = FuelStatistics::default();
    }

    pub fn handle_event(&mut self, event: &ReactorEvent) {
        if let ReactorEvent::FuelRodStateChanged { from, to, .. } = event {
            if self.statistics.fuel_present {
                self.counts.apply(*from, *to);
            }
        }
    }

    /// Incremental counts agree with a full recount of `assembly`.
    pub fn reconcile(&self, assembly: &FuelAssembly) -> bool {
        self.counts == FuelCounts::recount(assembly.iter())
    }

    /// End-of-tick work: refresh fuel statistics, run the sample timer, apply
    /// the control law and propagate enable-flag edges.
    ///
    /// Returns true when a power sample was taken this tick.
    pub fn tick(
        &mut self,
        dt: f64,
        live_neutrons: usize,
        rods: &mut RodArrayController,
        tank: &mut CoolantWaterTank,
    ) -> bool {
        self.statistics.fuel = FuelStatistics::from_counts(self.counts);

        let mut sampled = false;
        self.sample_remaining -= dt;
        while self.sample_remaining <= 0.0 {
            self.sample_remaining += self.settings.sample_interval;
            sampled = true;
        }
        if sampled {
            self.sample(live_neutrons, tank);
        }

        if self.settings.enable_control_rods && self.statistics.fuel_present {
            let command =
                control_command(self.statistics.power.current, self.settings.target_power);
            rods.command(RodClass::Control, command);
        }

        self.propagate_edges(rods, tank);
        sampled
    }

    fn sample(&mut self, live_neutrons: usize, tank: &mut CoolantWaterTank) {
        self.statistics.power = PowerReading::new(live_neutrons, self.settings.target_power);
        self.statistics.samples_taken += 1;

        let tank_stats = tank.update_measurements();
        if tank_stats.cell_count > 0 {
            let f = round1(tank_stats.average_temperature);
            self.statistics.average_water_temp_f = Some(f);
            self.statistics.average_water_temp_c = Some(round1(fahrenheit_to_celsius(f)));
        } else {
            self.statistics.average_water_temp_f = None;
            self.statistics.average_water_temp_c = None;
        }

        let p = self.statistics.power;
        info!(
            "power {}/{} ({:.1}%), fissile {:.1}%, xenon {:.1}%, water level {:.1}%",
            p.current,
            p.target,
            p.percent,
            self.statistics.fuel.percent_fissile,
            self.statistics.fuel.percent_xenon,
            tank_stats.water_level_percent
        );
    }

    fn propagate_edges(&mut self, rods: &mut RodArrayController, tank: &mut CoolantWaterTank) {
        if self.applied_control_rods != self.settings.enable_control_rods {
            rods.set_enabled(RodClass::Control, self.settings.enable_control_rods);
            self.applied_control_rods = self.settings.enable_control_rods;
        }
        if self.applied_moderator_rods != self.settings.enable_moderator_rods {
            rods.set_enabled(RodClass::Moderator, self.settings.enable_moderator_rods);
            self.applied_moderator_rods = self.settings.enable_moderator_rods;
        }
        if self.applied_pumps != self.settings.enable_pumps {
            if self.settings.enable_pumps {
                tank.enable_pumps();
            } else {
                tank.disable_pumps();
            }
            self.applied_pumps = self.settings.enable_pumps;
            debug!("pump enable edge applied: {}", self.applied_pumps);
        }
    }
}
