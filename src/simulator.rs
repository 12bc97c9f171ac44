//! Thread-safe handle around a `Reactor`.
//!
//! The reactor sits behind a mutex so any number of tasks can drive or
//! observe it through `&self`. After every mutation a fresh
//! `ReactorSnapshot` is published; readers always see the last complete
//! step, never a half-applied one.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::{AssemblyLayout, SimulationConfig};
use crate::error::Result;
use crate::events::ReactorEvent;
use crate::fuel_rod::{FuelRodFlags, FuelRodState};
use crate::reactor::{Reactor, ReactorSnapshot};
use crate::rods::{RodClass, RodCommand};

/// Upper bound on steps run by one realtime advance.
pub const MAX_STEPS_PER_ADVANCE: usize = 1000;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Converts wall-clock time into whole fixed steps, carrying the remainder.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealtimeClock {
    accumulated: f64,
}

impl RealtimeClock {
    /// Number of steps of length `dt` owed for `delta_real` seconds at
    /// `time_speed`x. Capped at `MAX_STEPS_PER_ADVANCE`.
    pub fn advance(&mut self, delta_real: f64, time_speed: f64, dt: f64) -> usize {
        let delta = delta_real * time_speed;
        if !delta.is_finite() || delta <= 0.0 || dt <= 0.0 {
            return 0;
        }
        self.accumulated += delta;
        let steps = (self.accumulated / dt).floor() as usize;
        self.accumulated -= steps as f64 * dt;
        steps.min(MAX_STEPS_PER_ADVANCE)
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }
}

pub struct ReactorSimulator {
    reactor: Mutex<Reactor>,
    published: Mutex<ReactorSnapshot>,
    clock: Mutex<RealtimeClock>,
}

impl ReactorSimulator {
    /// Build a simulator with the configured assembly already generated.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self::from_reactor(Reactor::with_assembly(config)?))
    }

    pub fn from_reactor(reactor: Reactor) -> Self {
        let snapshot = reactor.snapshot(0);
        Self {
            reactor: Mutex::new(reactor),
            published: Mutex::new(snapshot),
            clock: Mutex::new(RealtimeClock::default()),
        }
    }

    fn publish(&self, reactor: &Reactor) -> ReactorSnapshot {
        let mut published = lock(&self.published);
        let snapshot = reactor.snapshot(published.generation + 1);
        *published = snapshot.clone();
        snapshot
    }

    /// Run `f` against the reactor, then publish.
    fn mutate<R>(&self, f: impl FnOnce(&mut Reactor) -> R) -> R {
        let mut reactor = lock(&self.reactor);
        let result = f(&mut reactor);
        self.publish(&reactor);
        result
    }

    /// Read access without publishing.
    pub fn with_reactor<R>(&self, f: impl FnOnce(&Reactor) -> R) -> R {
        f(&lock(&self.reactor))
    }

    /// Latest published snapshot.
    pub fn get_state(&self) -> ReactorSnapshot {
        lock(&self.published).clone()
    }

    pub fn step(&self) -> ReactorSnapshot {
        self.run(1)
    }

    pub fn run(&self, steps: usize) -> ReactorSnapshot {
        let mut reactor = lock(&self.reactor);
        reactor.run(steps);
        self.publish(&reactor)
    }

    /// Advance by real elapsed time scaled by `time_speed`. Returns the
    /// number of steps run.
    pub fn advance_realtime(&self, delta_real: f64, time_speed: f64) -> usize {
        let mut reactor = lock(&self.reactor);
        let dt = reactor.config().tick_seconds;
        let steps = lock(&self.clock).advance(delta_real, time_speed, dt);
        if steps > 0 {
            reactor.run(steps);
            self.publish(&reactor);
        }
        steps
    }

    /// Discard the reactor and start over from `config`. Existing
    /// subscribers stay attached and see the old assembly destroyed and the
    /// new one inserted. A rejected config leaves the current reactor alone.
    pub fn reset(&self, config: SimulationConfig) -> Result<ReactorSnapshot> {
        let layout = config.layout.clone();
        layout.validate()?;
        let mut fresh = Reactor::new(config)?;

        let mut reactor = lock(&self.reactor);
        reactor.clear_assembly();
        fresh.adopt_subscribers(reactor.take_subscribers());
        fresh.generate_assembly(layout)?;
        *reactor = fresh;
        *lock(&self.clock) = RealtimeClock::default();
        Ok(self.publish(&reactor))
    }

    pub fn subscribe(&self) -> UnboundedReceiver<ReactorEvent> {
        lock(&self.reactor).subscribe()
    }

    pub fn generate_assembly(&self, layout: AssemblyLayout) -> Result<()> {
        self.mutate(|r| r.generate_assembly(layout).map(|_| ()))
    }

    pub fn clear_assembly(&self) {
        self.mutate(Reactor::clear_assembly)
    }

    pub fn command_rods(&self, class: RodClass, command: RodCommand) -> Result<()> {
        self.mutate(|r| r.command_rods(class, command))
    }

    pub fn set_rods_enabled(&self, class: RodClass, enabled: bool) -> Result<()> {
        self.mutate(|r| r.set_rods_enabled(class, enabled))
    }

    pub fn set_pumps_enabled(&self, enabled: bool) -> Result<()> {
        self.mutate(|r| r.set_pumps_enabled(enabled))
    }

    pub fn set_target_power(&self, target: usize) {
        self.mutate(|r| r.set_target_power(target))
    }

    pub fn force_fuel_state(&self, index: usize, state: FuelRodState) -> Result<()> {
        self.mutate(|r| r.force_fuel_state(index, state))
    }

    pub fn fuel_rod_flags(&self, index: usize) -> Result<FuelRodFlags> {
        self.with_reactor(|r| r.fuel_rod_flags(index))
    }
}
