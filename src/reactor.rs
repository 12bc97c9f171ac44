//! Fission reactor simulation core.
//!
//! `Reactor` owns the fuel assembly, the coolant tank, the rod array and
//! every live neutron, and advances them together one fixed step at a time.
//! Within a step:
//!
//! 1. fuel-rod timers run (spontaneous fission / stray neutrons),
//! 2. neutrons move and interact with rods, fuel and coolant,
//! 3. coolant is pumped and rods move,
//! 4. queued events are delivered, newborn neutrons join the arena,
//! 5. the monitor samples power and drives the control rods.
//!
//! Neutrons released during a step only start moving on the next one, and
//! statistics are taken after every transition of the step has landed.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::assembly::{generate_grids, FuelAssembly};
use crate::config::{AssemblyLayout, SimulationConfig};
use crate::coolant_tank::{CoolantWaterTank, TankStatistics};
use crate::error::{Result, SimError};
use crate::events::{EventBus, ReactorEvent};
use crate::fuel_rod::{FuelRod, FuelRodActivity, FuelRodFlags, FuelRodState};
use crate::geometry::{Rect, Vec2};
use crate::monitor::{FuelStatistics, PowerReading, ReactorMonitor};
use crate::neutron::{Neutron, NeutronFate};
use crate::random::RandomSource;
use crate::rods::{RodArrayController, RodClass, RodCommand, RodGroupStatus, RodLayout};

/// Cumulative neutron bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NeutronCounters {
    pub spawned: u64,
    pub moderated: u64,
    pub escaped: u64,
    pub absorbed: u64,
    pub reacted: u64,
}

impl NeutronCounters {
    fn record(&mut self, fate: NeutronFate) {
        match fate {
            NeutronFate::Moderated => self.moderated += 1,
            NeutronFate::Escaped => self.escaped += 1,
            NeutronFate::Absorbed => self.absorbed += 1,
            NeutronFate::Reacted => self.reacted += 1,
        }
    }
}

/// Read-only view published after each step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactorSnapshot {
    /// Bumped on every publish.
    pub generation: u64,
    pub time: f64,
    pub ticks: u64,
    pub fuel_present: bool,
    pub rows: usize,
    pub columns: usize,
    pub power: PowerReading,
    pub fuel: FuelStatistics,
    pub tank: Option<TankStatistics>,
    pub average_water_temp_f: Option<f64>,
    pub average_water_temp_c: Option<f64>,
    pub control_rods: RodGroupStatus,
    pub moderator_rods: RodGroupStatus,
    pub live_neutrons: usize,
    pub counters: NeutronCounters,
    /// Per-rod flags in flattened order.
    pub fuel_rods: Vec<FuelRodFlags>,
}

#[derive(Debug)]
pub struct Reactor {
    config: SimulationConfig,
    master: RandomSource,
    assembly: FuelAssembly,
    tank: CoolantWaterTank,
    rods: RodArrayController,
    monitor: ReactorMonitor,
    events: EventBus,
    neutrons: Vec<Neutron>,
    next_neutron_id: u64,
    assembly_generation: u64,
    arena: Option<Rect>,
    counters: NeutronCounters,
    time: f64,
    ticks: u64,
}

fn record_activity(
    events: &mut EventBus,
    births: &mut Vec<Vec2>,
    rod: &FuelRod,
    activity: FuelRodActivity,
) {
    if let Some(t) = activity.transition {
        events.publish(ReactorEvent::FuelRodStateChanged {
            index: rod.index(),
            from: t.from,
            to: t.to,
            flags: t.to.flags(),
        });
    }
    births.extend(std::iter::repeat(rod.position()).take(activity.emitted as usize));
}

/// Rods from the explicit layout, or interleaved between the columns of
/// `assembly` when none is configured.
fn build_rods(
    config: &SimulationConfig,
    assembly: &AssemblyLayout,
    enable_control: bool,
    enable_moderator: bool,
) -> RodArrayController {
    let layout = config
        .rod_layout
        .clone()
        .unwrap_or_else(|| RodLayout::interleaved(assembly, config.rods.width_fraction));
    RodArrayController::from_layout(&layout, &config.rods, enable_control, enable_moderator)
}

impl Reactor {
    /// Build an empty reactor: rods in place, no fuel, no coolant.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let rods = build_rods(
            &config,
            &config.layout,
            config.monitor.enable_control_rods,
            config.monitor.enable_moderator_rods,
        );
        Ok(Self {
            master: RandomSource::new(config.seed),
            assembly: FuelAssembly::default(),
            tank: CoolantWaterTank::new(config.monitor.enable_pumps),
            rods,
            monitor: ReactorMonitor::new(config.monitor.clone()),
            events: EventBus::default(),
            neutrons: Vec::new(),
            next_neutron_id: 0,
            assembly_generation: 0,
            arena: None,
            counters: NeutronCounters::default(),
            time: 0.0,
            ticks: 0,
            config,
        })
    }

    /// Build a reactor and generate the configured assembly.
    pub fn with_assembly(config: SimulationConfig) -> Result<Self> {
        let layout = config.layout.clone();
        let mut reactor = Self::new(config)?;
        reactor.generate_assembly(layout)?;
        Ok(reactor)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn assembly(&self) -> &FuelAssembly {
        &self.assembly
    }

    pub fn tank(&self) -> &CoolantWaterTank {
        &self.tank
    }

    pub fn rods(&self) -> &RodArrayController {
        &self.rods
    }

    pub fn monitor(&self) -> &ReactorMonitor {
        &self.monitor
    }

    pub fn neutrons(&self) -> &[Neutron] {
        &self.neutrons
    }

    pub fn neutron_count(&self) -> usize {
        self.neutrons.len()
    }

    pub fn counters(&self) -> NeutronCounters {
        self.counters
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn arena(&self) -> Option<Rect> {
        self.arena
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<ReactorEvent> {
        self.events.subscribe()
    }

    /// Detach every subscriber, e.g. to hand them to a replacement reactor.
    pub fn take_subscribers(&mut self) -> Vec<UnboundedSender<ReactorEvent>> {
        self.events.take_subscribers()
    }

    pub fn adopt_subscribers(&mut self, subscribers: Vec<UnboundedSender<ReactorEvent>>) {
        self.events.adopt_subscribers(subscribers);
    }

    // ------------------------------------------------------------------
    // Assembly commands
    // ------------------------------------------------------------------

    /// Replace the current assembly with a fresh one for `layout`.
    ///
    /// An invalid layout leaves the reactor with no assembly at all. Without
    /// an explicit rod layout the rods are re-placed around the new grid.
    pub fn generate_assembly(&mut self, layout: AssemblyLayout) -> Result<&FuelAssembly> {
        self.clear_assembly();
        if let Err(e) = layout.validate() {
            warn!("Rejected fuel assembly layout: {}", e);
            return Err(e);
        }

        self.assembly_generation += 1;
        let (rods, water) = generate_grids(
            &layout,
            &self.config.fuel,
            &self.config.coolant,
            &self.master,
            self.assembly_generation,
        )?;

        if self.config.rod_layout.is_none() {
            let settings = self.monitor.settings();
            self.rods = build_rods(
                &self.config,
                &layout,
                settings.enable_control_rods,
                settings.enable_moderator_rods,
            );
        }

        let half_spacing = layout.spacing() * 0.5;
        self.arena = Some(
            Rect::new(layout.min - half_spacing, layout.max + half_spacing)
                .expand(self.config.arena_margin),
        );
        let (rows, columns) = (layout.rows, layout.columns);
        self.assembly
            .insert_fuel_rods(layout, rods, self.config.fuel.cell_fraction);
        self.tank.insert_water(water);
        self.monitor.on_assembly_inserted(&self.assembly);
        self.events
            .publish(ReactorEvent::FuelAssemblyInserted { rows, columns });
        self.dispatch_events();
        info!("Generated {}x{} fuel assembly", rows, columns);
        Ok(&self.assembly)
    }

    /// Remove the assembly, its coolant and every neutron in flight.
    pub fn clear_assembly(&mut self) {
        self.neutrons.clear();
        self.arena = None;
        if self.assembly.is_empty() {
            return;
        }
        self.assembly.destroy_fuel_rods();
        self.tank.clear_water();
        self.monitor.on_assembly_destroyed();
        self.events.publish(ReactorEvent::FuelAssemblyDestroyed);
        self.dispatch_events();
    }

    fn require_assembly(&self, operation: &'static str) -> Result<()> {
        if self.assembly.is_empty() {
            Err(SimError::EmptyAssembly(operation))
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Rod and coolant commands
    // ------------------------------------------------------------------

    /// Drive one rod class directly. With control rods enabled the monitor's
    /// feedback law will override manual control-rod commands on the next step.
    pub fn command_rods(&mut self, class: RodClass, command: RodCommand) -> Result<()> {
        self.require_assembly("rod command")?;
        self.rods.command(class, command);
        Ok(())
    }

    /// Request a rod class enabled or disabled; applied on the next step.
    pub fn set_rods_enabled(&mut self, class: RodClass, enabled: bool) -> Result<()> {
        self.require_assembly("rod enable")?;
        match class {
            RodClass::Control => self.monitor.set_control_rods_enabled(enabled),
            RodClass::Moderator => self.monitor.set_moderator_rods_enabled(enabled),
        }
        Ok(())
    }

    /// Request the coolant pumps on or off; applied on the next step.
    pub fn set_pumps_enabled(&mut self, enabled: bool) -> Result<()> {
        self.require_assembly("pump command")?;
        self.monitor.set_pumps_enabled(enabled);
        Ok(())
    }

    pub fn set_target_power(&mut self, target: usize) {
        self.monitor.set_target_power(target);
    }

    // ------------------------------------------------------------------
    // Per-rod access
    // ------------------------------------------------------------------

    pub fn fuel_rod_flags(&self, index: usize) -> Result<FuelRodFlags> {
        Ok(self.assembly.rod(index)?.flags())
    }

    /// Put one fuel rod into `state`, publishing the transition.
    pub fn force_fuel_state(&mut self, index: usize, state: FuelRodState) -> Result<()> {
        let rod = self.assembly.rod_mut(index)?;
        let activity = FuelRodActivity {
            transition: rod.force_state(state),
            emitted: 0,
        };
        let mut births = Vec::new();
        record_activity(&mut self.events, &mut births, rod, activity);
        self.dispatch_events();
        Ok(())
    }

    /// Hit one fuel rod with a slow neutron right now. Released neutrons join
    /// the arena immediately. Returns whether the rod reacted.
    pub fn inject_reaction(&mut self, index: usize) -> Result<bool> {
        let rod = self.assembly.rod_mut(index)?;
        let Some(activity) = rod.neutron_reaction() else {
            return Ok(false);
        };
        let mut births = Vec::new();
        record_activity(&mut self.events, &mut births, rod, activity);
        self.dispatch_events();
        self.spawn_all(births);
        Ok(true)
    }

    /// Place a fast neutron, optionally with a fixed heading. Returns its id.
    pub fn spawn_neutron(&mut self, position: Vec2, direction: Option<Vec2>) -> u64 {
        let id = self.next_neutron_id;
        self.next_neutron_id += 1;
        let neutron = match direction {
            Some(dir) => Neutron::with_direction(id, position, dir, &self.config.neutron),
            None => Neutron::spawn(id, position, &self.config.neutron, &self.master),
        };
        self.neutrons.push(neutron);
        self.counters.spawned += 1;
        id
    }

    fn spawn_all(&mut self, births: Vec<Vec2>) {
        for position in births {
            self.spawn_neutron(position, None);
        }
    }

    fn dispatch_events(&mut self) {
        for event in self.events.flush() {
            self.monitor.handle_event(&event);
        }
    }

    // ------------------------------------------------------------------
    // Simulation step
    // ------------------------------------------------------------------

    /// Advance the whole reactor by one fixed step.
    pub fn step(&mut self) {
        let dt = self.config.tick_seconds;
        let mut births: Vec<Vec2> = Vec::new();

        for rod in self.assembly.iter_mut() {
            let activity = rod.advance_timer(dt);
            record_activity(&mut self.events, &mut births, rod, activity);
        }

        self.move_neutrons(dt, &mut births);

        self.tank.cool(dt);
        self.rods.integrate(dt);

        self.dispatch_events();
        self.spawn_all(births);

        self.monitor
            .tick(dt, self.neutrons.len(), &mut self.rods, &mut self.tank);
        self.tank.update_measurements();

        self.time += dt;
        self.ticks += 1;
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    fn move_neutrons(&mut self, dt: f64, births: &mut Vec<Vec2>) {
        let params = &self.config.neutron;
        let radius = params.radius;
        let layout = self.assembly.layout().cloned();

        for neutron in self.neutrons.iter_mut() {
            neutron.advance(dt, params);
            if !neutron.is_alive() {
                continue;
            }
            let pos = neutron.position();
            if !self.arena.is_some_and(|arena| arena.contains(pos)) {
                neutron.remove(NeutronFate::Escaped);
                continue;
            }

            if neutron.is_fast() {
                if self.rods.touches_moderator_rod(pos, radius) {
                    neutron.reflect_off_moderator(params);
                }
            } else if self.rods.touches_control_rod(pos, radius) {
                neutron.remove(NeutronFate::Absorbed);
                continue;
            }

            let Some((row, column)) = layout.as_ref().and_then(|l| l.nearest_cell(pos)) else {
                neutron.enter_fuel_cell(None);
                continue;
            };

            let in_fuel = self
                .assembly
                .fuel_bounds(row, column)
                .is_some_and(|b| b.overlaps_circle(pos, radius));
            let cell_index = layout.as_ref().map(|l| l.flat_index(row, column));
            let entered = neutron.enter_fuel_cell(if in_fuel { cell_index } else { None });
            if entered && neutron.is_slow() {
                if let Some(rod) = self.assembly.get_mut(row, column) {
                    if let Some(activity) = rod.neutron_reaction() {
                        record_activity(&mut self.events, births, rod, activity);
                        neutron.remove(NeutronFate::Reacted);
                        continue;
                    }
                }
            }

            if let Some(water) = self.tank.cell_mut(row, column) {
                if water.is_collidable() && water.bounds().overlaps_circle(pos, radius) {
                    water.heat(neutron.speed(), dt);
                    neutron.moderate(dt, params);
                }
            }
        }

        for neutron in &self.neutrons {
            if let Some(fate) = neutron.fate() {
                self.counters.record(fate);
            }
        }
        self.neutrons.retain(Neutron::is_alive);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn power(&self) -> PowerReading {
        self.monitor.statistics().power
    }

    pub fn snapshot(&self, generation: u64) -> ReactorSnapshot {
        let stats = self.monitor.statistics();
        ReactorSnapshot {
            generation,
            time: self.time,
            ticks: self.ticks,
            fuel_present: stats.fuel_present,
            rows: self.assembly.rows(),
            columns: self.assembly.columns(),
            power: stats.power,
            fuel: stats.fuel,
            tank: (!self.tank.is_empty()).then(|| self.tank.statistics()),
            average_water_temp_f: stats.average_water_temp_f,
            average_water_temp_c: stats.average_water_temp_c,
            control_rods: self.rods.status(RodClass::Control),
            moderator_rods: self.rods.status(RodClass::Moderator),
            live_neutrons: self.neutrons.len(),
            counters: self.counters,
            fuel_rods: self.assembly.iter().map(FuelRod::flags).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuelRodParams;
    use crate::rods::RodSpec;

    /// Deterministic config: no spontaneous activity, no rods unless added.
    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            fuel: FuelRodParams {
                fissile_probability: 0.0,
                random_release_probability: 0.0,
                xenon_decay_probability: 0.0,
                ..FuelRodParams::default()
            },
            rod_layout: Some(RodLayout::default()),
            layout: AssemblyLayout::new(2, 2, Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_generate_populates_grids_and_events() {
        let mut reactor = Reactor::new(quiet_config()).unwrap();
        let mut rx = reactor.subscribe();
        let layout = reactor.config().layout.clone();
        reactor.generate_assembly(layout).unwrap();
        assert_eq!(reactor.assembly().len(), 4);
        assert_eq!(reactor.tank().len(), 4);
        assert!(reactor.monitor().fuel_present());
        assert_eq!(
            rx.try_recv().unwrap(),
            ReactorEvent::FuelAssemblyInserted { rows: 2, columns: 2 }
        );
    }

    #[test]
    fn test_invalid_layout_leaves_reactor_empty() {
        let mut reactor = Reactor::with_assembly(quiet_config()).unwrap();
        let bad = AssemblyLayout::new(2, 2, Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0));
        assert!(matches!(
            reactor.generate_assembly(bad),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(reactor.assembly().is_empty());
        assert!(reactor.tank().is_empty());
        assert!(!reactor.monitor().fuel_present());
    }

    #[test]
    fn test_commands_on_empty_assembly_are_soft_errors() {
        let mut reactor = Reactor::new(quiet_config()).unwrap();
        let err = reactor
            .command_rods(RodClass::Control, RodCommand::Raise)
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(reactor.set_pumps_enabled(false).is_err());
        assert!(reactor.monitor().settings().enable_pumps);
    }

    #[test]
    fn test_fast_neutron_escapes_arena() {
        let mut reactor = Reactor::with_assembly(quiet_config()).unwrap();
        // Start outside the coolant so nothing slows it.
        reactor.spawn_neutron(Vec2::new(1.9, 0.5), Some(Vec2::new(1.0, 0.0)));
        for _ in 0..100 {
            reactor.step();
        }
        assert_eq!(reactor.neutron_count(), 0);
        assert_eq!(reactor.counters().escaped, 1);
    }

    #[test]
    fn test_coolant_moderates_to_exhaustion() {
        let mut config = quiet_config();
        // One big cell so the neutron stays in water the whole time.
        config.layout = AssemblyLayout::new(1, 1, Vec2::new(-50.0, -50.0), Vec2::new(50.0, 50.0));
        config.neutron.water_slow_rate = 1.0;
        let mut reactor = Reactor::with_assembly(config).unwrap();
        reactor.spawn_neutron(Vec2::new(5.0, 0.0), Some(Vec2::new(1.0, 0.0)));

        let mut last_speed = f64::MAX;
        while reactor.neutron_count() > 0 {
            let speed = reactor.neutrons()[0].speed();
            assert!(speed <= last_speed);
            last_speed = speed;
            reactor.step();
            assert!(reactor.ticks() < 10_000);
        }
        assert_eq!(reactor.counters().moderated, 1);
        let stats = reactor.tank().statistics();
        assert!(stats.max_temperature > 32.0);
    }

    #[test]
    fn test_fast_neutron_passes_control_rod() {
        let mut config = quiet_config();
        config.rod_layout = Some(RodLayout {
            rods: vec![RodSpec {
                class: RodClass::Control,
                x: 1.5,
                origin_height: -1.0,
                width: 0.2,
                length: 3.0,
            }],
        });
        let mut reactor = Reactor::with_assembly(config).unwrap();
        reactor.spawn_neutron(Vec2::new(1.3, 0.5), Some(Vec2::new(1.0, 0.0)));
        reactor.run(100);
        let counters = reactor.counters();
        assert_eq!(counters.absorbed, 0);
        assert_eq!(counters.escaped, 1);
    }

    #[test]
    fn test_moderator_then_control_rod() {
        let mut config = quiet_config();
        config.rod_layout = Some(RodLayout {
            rods: vec![
                RodSpec {
                    class: RodClass::Moderator,
                    x: 1.6,
                    origin_height: -1.0,
                    width: 0.1,
                    length: 3.0,
                },
                RodSpec {
                    class: RodClass::Control,
                    x: -0.6,
                    origin_height: -1.0,
                    width: 0.1,
                    length: 3.0,
                },
            ],
        });
        let mut reactor = Reactor::with_assembly(config).unwrap();
        // Between the rows, heading right: bounce off the moderator, come
        // back slow, and get absorbed by the control rod on the left.
        reactor.spawn_neutron(Vec2::new(1.3, 0.5), Some(Vec2::new(1.0, 0.0)));
        for _ in 0..400 {
            reactor.step();
            if reactor.neutron_count() == 0 {
                break;
            }
        }
        let counters = reactor.counters();
        assert_eq!(counters.absorbed, 1);
        assert_eq!(counters.reacted + counters.moderated + counters.escaped, 0);
    }

    #[test]
    fn test_slow_neutron_reacts_with_fissile_rod() {
        let mut config = quiet_config();
        config.layout = AssemblyLayout::new(1, 3, Vec2::new(0.0, 0.0), Vec2::new(2.0, 1.0));
        config.rod_layout = Some(RodLayout {
            rods: vec![RodSpec {
                class: RodClass::Moderator,
                x: 0.6,
                origin_height: -1.0,
                width: 0.1,
                length: 3.0,
            }],
        });
        let mut reactor = Reactor::with_assembly(config).unwrap();
        reactor.force_fuel_state(0, FuelRodState::Fissile).unwrap();

        // Heads right, bounces off the moderator slow, then flies back into rod 0.
        reactor.spawn_neutron(Vec2::new(0.4, 0.5), Some(Vec2::new(1.0, 0.0)));
        for _ in 0..100 {
            reactor.step();
            if reactor.counters().reacted > 0 {
                break;
            }
        }

        let counters = reactor.counters();
        assert_eq!(counters.reacted, 1);
        assert_eq!(counters.spawned, 1 + 3);
        assert_eq!(reactor.neutron_count(), 3);
        assert!(!reactor.fuel_rod_flags(0).unwrap().is_fissile);
        assert!(reactor.monitor().reconcile(reactor.assembly()));
    }

    #[test]
    fn test_evaporated_coolant_lets_neutrons_through() {
        let mut config = quiet_config();
        config.layout = AssemblyLayout::new(1, 1, Vec2::new(-50.0, -50.0), Vec2::new(50.0, 50.0));
        config.coolant.heat_factor = 1.0e4;
        config.monitor.enable_pumps = false;
        let mut reactor = Reactor::with_assembly(config).unwrap();
        reactor.spawn_neutron(Vec2::new(5.0, 0.0), Some(Vec2::new(1.0, 0.0)));

        // One contact is enough to boil the cell.
        reactor.step();
        assert!(reactor.tank().cell(0, 0).unwrap().is_evaporated());

        let speed = reactor.neutrons()[0].speed();
        for _ in 0..10 {
            reactor.step();
            assert_eq!(reactor.neutrons()[0].speed(), speed);
        }
        assert!(reactor.tank().cell(0, 0).unwrap().is_evaporated());
    }

    #[test]
    fn test_default_rods_follow_new_assembly() {
        let mut config = quiet_config();
        config.rod_layout = None;
        let mut reactor = Reactor::with_assembly(config).unwrap();
        // 2x2 grid: a single gap, holding one moderator rod.
        assert_eq!(reactor.rods().status(RodClass::Moderator).rod_count, 1);
        assert_eq!(reactor.rods().status(RodClass::Control).rod_count, 0);

        let layout = AssemblyLayout::new(2, 4, Vec2::new(100.0, 0.0), Vec2::new(103.0, 1.0));
        reactor.generate_assembly(layout).unwrap();
        assert_eq!(reactor.rods().status(RodClass::Moderator).rod_count, 2);
        assert_eq!(reactor.rods().status(RodClass::Control).rod_count, 1);
        assert!(reactor.rods().status(RodClass::Control).enabled);
        for class in [RodClass::Control, RodClass::Moderator] {
            for rod in reactor.rods().rods(class) {
                let bounds = rod.bounds();
                assert!(bounds.min.x > 100.0 && bounds.max.x < 103.0);
            }
        }
    }

    #[test]
    fn test_subscribers_survive_handover() {
        let mut old = Reactor::with_assembly(quiet_config()).unwrap();
        let mut rx = old.subscribe();
        let mut fresh = Reactor::with_assembly(quiet_config()).unwrap();
        fresh.adopt_subscribers(old.take_subscribers());
        fresh.force_fuel_state(0, FuelRodState::Fissile).unwrap();
        assert!(matches!(
            rx.try_recv().unwrap(),
            ReactorEvent::FuelRodStateChanged { index: 0, .. }
        ));
    }

    #[test]
    fn test_inject_reaction_on_fissile_rod() {
        let mut reactor = Reactor::with_assembly(quiet_config()).unwrap();
        reactor.force_fuel_state(0, FuelRodState::Fissile).unwrap();
        assert!(reactor.fuel_rod_flags(0).unwrap().is_fissile);
        assert!(reactor.inject_reaction(0).unwrap());
        assert_eq!(reactor.neutron_count(), 3);
        assert!(reactor.monitor().reconcile(reactor.assembly()));
        assert!(!reactor.inject_reaction(1).unwrap());
        assert!(matches!(
            reactor.inject_reaction(9),
            Err(SimError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn test_counts_reconcile_after_busy_run() {
        let mut config = SimulationConfig::default();
        config.fuel.fissile_probability = 0.3;
        config.fuel.random_release_probability = 0.5;
        config.fuel.xenon_decay_probability = 0.3;
        let mut reactor = Reactor::with_assembly(config).unwrap();
        for _ in 0..250 {
            reactor.step();
            assert!(reactor.monitor().reconcile(reactor.assembly()));
        }
        assert!(reactor.counters().spawned > 0);
    }

    #[test]
    fn test_same_seed_same_history() {
        let mut a = Reactor::with_assembly(SimulationConfig::default()).unwrap();
        let mut b = Reactor::with_assembly(SimulationConfig::default()).unwrap();
        a.run(300);
        b.run(300);
        assert_eq!(a.counters(), b.counters());
        assert_eq!(a.snapshot(0).fuel_rods, b.snapshot(0).fuel_rods);
    }

    #[test]
    fn test_pump_request_applied_next_step() {
        let mut reactor = Reactor::with_assembly(quiet_config()).unwrap();
        reactor.set_pumps_enabled(false).unwrap();
        assert!(reactor.tank().pumps_enabled());
        reactor.step();
        assert!(!reactor.tank().pumps_enabled());
    }

    #[test]
    fn test_clear_assembly_publishes_destroyed() {
        let mut reactor = Reactor::with_assembly(quiet_config()).unwrap();
        let mut rx = reactor.subscribe();
        reactor.clear_assembly();
        assert_eq!(rx.try_recv().unwrap(), ReactorEvent::FuelAssemblyDestroyed);
        // A second clear has nothing to destroy.
        reactor.clear_assembly();
        assert!(rx.try_recv().is_err());
    }
}
