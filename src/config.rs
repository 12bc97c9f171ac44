//! Simulation configuration.
//!
//! All tuning lives here as plain serde structs. Loading and saving is the
//! job of whoever embeds the simulation; the core only parses strings handed
//! to it and validates the values.

use serde::{Deserialize, Serialize};

use crate::coolant::WaterKind;
use crate::error::{Result, SimError};
use crate::geometry::{Rect, Vec2};
use crate::rods::RodLayout;

/// Default tuning values
pub mod constants {
    pub const DEFAULT_SEED: u64 = 42;
    pub const TICK_SECONDS: f64 = 0.02;
    pub const ARENA_MARGIN: f64 = 1.0;

    pub const FISSILE_PROBABILITY: f64 = 0.01;
    pub const RANDOM_RELEASE_PROBABILITY: f64 = 0.001;
    pub const XENON_DECAY_PROBABILITY: f64 = 0.05;
    pub const FISSION_NEUTRON_COUNT: u32 = 3;
    pub const SPONTANEOUS_INTERVAL_SECONDS: f64 = 1.0;
    pub const FUEL_CELL_FRACTION: f64 = 0.3;

    pub const SLOW_SPEED: f64 = 1.0;
    pub const FAST_SPEED: f64 = 2.0;
    pub const WATER_SLOW_RATE: f64 = 0.1;
    pub const NEUTRON_RADIUS: f64 = 0.05;

    pub const COOL_TEMPERATURE: f64 = 32.0; // [F]
    pub const HOT_TEMPERATURE: f64 = 100.0; // [F]
    pub const EVAPORATION_TEMPERATURE: f64 = 112.0; // [F]
    pub const HEAVY_WATER_FACTOR: f64 = 1.1;
    pub const HEAT_FACTOR: f64 = 1.1;
    pub const COOL_FACTOR: f64 = 1.0;

    pub const ROD_SPEED: f64 = 0.5;
    pub const ROD_MAX_RAISE: f64 = 8.0;
    pub const ROD_WIDTH_FRACTION: f64 = 0.2;

    pub const TARGET_POWER: usize = 50;
    pub const SAMPLE_INTERVAL_SECONDS: f64 = 5.0;

    pub const DEFAULT_ROWS: usize = 10;
    pub const DEFAULT_COLUMNS: usize = 20;
}

/// Fuel-rod state machine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelRodParams {
    pub fissile_probability: f64,
    pub random_release_probability: f64,
    pub xenon_decay_probability: f64,
    /// Neutrons released by one fission.
    pub neutron_count: u32,
    /// Period of the spontaneous-transition timer [s].
    pub spontaneous_interval: f64,
    /// Half-size of a fuel cell's reactive surface, as a fraction of the lattice spacing.
    pub cell_fraction: f64,
}

impl Default for FuelRodParams {
    fn default() -> Self {
        Self {
            fissile_probability: constants::FISSILE_PROBABILITY,
            random_release_probability: constants::RANDOM_RELEASE_PROBABILITY,
            xenon_decay_probability: constants::XENON_DECAY_PROBABILITY,
            neutron_count: constants::FISSION_NEUTRON_COUNT,
            spontaneous_interval: constants::SPONTANEOUS_INTERVAL_SECONDS,
            cell_fraction: constants::FUEL_CELL_FRACTION,
        }
    }
}

/// Neutron kinematics tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutronParams {
    pub slow_speed: f64,
    pub fast_speed: f64,
    /// Speed lost per second while inside condensed coolant.
    pub water_slow_rate: f64,
    pub radius: f64,
}

impl NeutronParams {
    /// Below this a neutron is fully moderated and removed.
    pub fn minimum_speed(&self) -> f64 {
        0.75 * self.slow_speed
    }

    /// Highest speed at which a neutron counts as slow (thermalised).
    pub fn max_reaction_speed(&self) -> f64 {
        1.5 * self.slow_speed
    }
}

impl Default for NeutronParams {
    fn default() -> Self {
        Self {
            slow_speed: constants::SLOW_SPEED,
            fast_speed: constants::FAST_SPEED,
            water_slow_rate: constants::WATER_SLOW_RATE,
            radius: constants::NEUTRON_RADIUS,
        }
    }
}

/// Coolant thermal tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoolantParams {
    pub cool_temperature: f64,
    pub base_hot_temperature: f64,
    pub base_evaporation_temperature: f64,
    /// Threshold multiplier applied for heavy water.
    pub heavy_water_factor: f64,
    pub heat_factor: f64,
    pub cool_factor: f64,
    pub water_kind: WaterKind,
}

impl Default for CoolantParams {
    fn default() -> Self {
        Self {
            cool_temperature: constants::COOL_TEMPERATURE,
            base_hot_temperature: constants::HOT_TEMPERATURE,
            base_evaporation_temperature: constants::EVAPORATION_TEMPERATURE,
            heavy_water_factor: constants::HEAVY_WATER_FACTOR,
            heat_factor: constants::HEAT_FACTOR,
            cool_factor: constants::COOL_FACTOR,
            water_kind: WaterKind::Light,
        }
    }
}

/// Rod drive tuning, shared by control and moderator rods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RodParams {
    /// Travel speed [units/s].
    pub speed: f64,
    /// Maximum offset above the origin height.
    pub max_raise_distance: f64,
    /// Rod width as a fraction of the column spacing, used by the default layout.
    pub width_fraction: f64,
}

impl Default for RodParams {
    fn default() -> Self {
        Self {
            speed: constants::ROD_SPEED,
            max_raise_distance: constants::ROD_MAX_RAISE,
            width_fraction: constants::ROD_WIDTH_FRACTION,
        }
    }
}

/// Feedback controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Desired number of live neutrons.
    pub target_power: usize,
    /// Period between power samples [s].
    pub sample_interval: f64,
    pub enable_control_rods: bool,
    pub enable_moderator_rods: bool,
    pub enable_pumps: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            target_power: constants::TARGET_POWER,
            sample_interval: constants::SAMPLE_INTERVAL_SECONDS,
            enable_control_rods: true,
            enable_moderator_rods: false,
            enable_pumps: true,
        }
    }
}

/// Fuel assembly placement: a rows x columns lattice between two corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyLayout {
    pub rows: usize,
    pub columns: usize,
    pub min: Vec2,
    pub max: Vec2,
}

impl AssemblyLayout {
    pub fn new(rows: usize, columns: usize, min: Vec2, max: Vec2) -> Self {
        Self {
            rows,
            columns,
            min,
            max,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.min, self.max)
    }

    /// Reject empty grids and zero-area or inverted bounds.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(SimError::invalid_config(format!(
                "row and column counts must be positive (got {}x{})",
                self.rows, self.columns
            )));
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(SimError::invalid_config("placement bounds must be finite"));
        }
        let bounds = self.bounds();
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "placement bounds ({}, {})-({}, {}) have zero area",
                self.min.x, self.min.y, self.max.x, self.max.y
            )));
        }
        Ok(())
    }

    /// Distance between neighbouring columns and rows. A single column or row
    /// spans the full bound width or height.
    pub fn spacing(&self) -> Vec2 {
        let span = |lo: f64, hi: f64, count: usize| {
            if count > 1 {
                (hi - lo) / (count as f64 - 1.0)
            } else {
                hi - lo
            }
        };
        Vec2::new(
            span(self.min.x, self.max.x, self.columns),
            span(self.min.y, self.max.y, self.rows),
        )
    }
}

impl Default for AssemblyLayout {
    fn default() -> Self {
        Self {
            rows: constants::DEFAULT_ROWS,
            columns: constants::DEFAULT_COLUMNS,
            min: Vec2::new(-9.5, -4.5),
            max: Vec2::new(9.5, 4.5),
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Fixed simulation step [s].
    pub tick_seconds: f64,
    /// How far past the assembly bounds a neutron may travel before it is lost.
    pub arena_margin: f64,
    pub fuel: FuelRodParams,
    pub neutron: NeutronParams,
    pub coolant: CoolantParams,
    pub rods: RodParams,
    pub monitor: MonitorSettings,
    pub layout: AssemblyLayout,
    /// Explicit rod placement. When absent, rods are interleaved between fuel columns.
    pub rod_layout: Option<RodLayout>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: constants::DEFAULT_SEED,
            tick_seconds: constants::TICK_SECONDS,
            arena_margin: constants::ARENA_MARGIN,
            fuel: FuelRodParams::default(),
            neutron: NeutronParams::default(),
            coolant: CoolantParams::default(),
            rods: RodParams::default(),
            monitor: MonitorSettings::default(),
            layout: AssemblyLayout::default(),
            rod_layout: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check tuning values. The assembly layout is checked separately at
    /// generation time.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::invalid_config(format!("{name} must be positive (got {value})")))
            }
        }
        fn probability(name: &str, value: f64) -> Result<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(SimError::invalid_config(format!("{name} must lie in [0, 1] (got {value})")))
            }
        }

        positive("tick_seconds", self.tick_seconds)?;
        if !(self.arena_margin.is_finite() && self.arena_margin >= 0.0) {
            return Err(SimError::invalid_config("arena_margin must be non-negative"));
        }

        probability("fissile_probability", self.fuel.fissile_probability)?;
        probability("random_release_probability", self.fuel.random_release_probability)?;
        probability("xenon_decay_probability", self.fuel.xenon_decay_probability)?;
        positive("spontaneous_interval", self.fuel.spontaneous_interval)?;
        positive("cell_fraction", self.fuel.cell_fraction)?;

        positive("slow_speed", self.neutron.slow_speed)?;
        positive("fast_speed", self.neutron.fast_speed)?;
        if self.neutron.fast_speed <= self.neutron.max_reaction_speed() {
            return Err(SimError::invalid_config(
                "fast_speed must exceed 1.5x slow_speed",
            ));
        }
        if !(self.neutron.water_slow_rate >= 0.0 && self.neutron.radius >= 0.0) {
            return Err(SimError::invalid_config(
                "water_slow_rate and radius must be non-negative",
            ));
        }

        let c = &self.coolant;
        positive("heavy_water_factor", c.heavy_water_factor)?;
        positive("heat_factor", c.heat_factor)?;
        if !(c.cool_factor >= 0.0) {
            return Err(SimError::invalid_config("cool_factor must be non-negative"));
        }
        if !(c.cool_temperature < c.base_hot_temperature
            && c.base_hot_temperature <= c.base_evaporation_temperature)
        {
            return Err(SimError::invalid_config(
                "coolant temperatures must satisfy cool < hot <= evaporation",
            ));
        }

        if !(self.rods.speed >= 0.0 && self.rods.max_raise_distance >= 0.0) {
            return Err(SimError::invalid_config(
                "rod speed and raise distance must be non-negative",
            ));
        }
        positive("sample_interval", self.monitor.sample_interval)?;
        Ok(())
    }
}
