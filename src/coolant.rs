//! Coolant water cells.
//!
//! Each fuel site sits in one coolant cell. Neutrons passing through heat
//! the cell and lose speed; the pumps pull heat back out. A cell at or above
//! its evaporation temperature turns to steam and stops interacting with
//! neutrons until it cools back down.

use serde::{Deserialize, Serialize};

use crate::config::CoolantParams;
use crate::geometry::{map_range, Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaterKind {
    /// Evaporates at the base thresholds.
    #[default]
    Light,
    /// Thresholds scaled up by the heavy-water factor.
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoolantPhase {
    Condensed,
    Evaporated,
}

/// Coarse temperature band, for whoever colours the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThermalBand {
    Cool,
    Hot,
    Evaporated,
}

#[derive(Debug, Clone)]
pub struct CoolantWater {
    index: usize,
    bounds: Rect,
    kind: WaterKind,
    cool_temperature: f64,
    hot_temperature: f64,
    evaporation_temperature: f64,
    max_temperature: f64,
    heat_factor: f64,
    cool_factor: f64,
    temperature: f64,
    phase: CoolantPhase,
    capacity_remaining: f64,
    cooling_enabled: bool,
}

impl CoolantWater {
    pub fn new(index: usize, center: Vec2, half_extent: Vec2, params: &CoolantParams) -> Self {
        let scale = match params.water_kind {
            WaterKind::Light => 1.0,
            WaterKind::Heavy => params.heavy_water_factor,
        };
        let evaporation_temperature = params.base_evaporation_temperature * scale;
        let mut cell = Self {
            index,
            bounds: Rect::from_center(center, half_extent.x, half_extent.y),
            kind: params.water_kind,
            cool_temperature: params.cool_temperature,
            hot_temperature: params.base_hot_temperature * scale,
            evaporation_temperature,
            max_temperature: 2.0 * evaporation_temperature,
            heat_factor: params.heat_factor,
            cool_factor: params.cool_factor,
            temperature: params.cool_temperature,
            phase: CoolantPhase::Condensed,
            capacity_remaining: 1.0,
            cooling_enabled: true,
        };
        cell.change_temperature(0.0);
        cell
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn kind(&self) -> WaterKind {
        self.kind
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn evaporation_temperature(&self) -> f64 {
        self.evaporation_temperature
    }

    pub fn max_temperature(&self) -> f64 {
        self.max_temperature
    }

    pub fn phase(&self) -> CoolantPhase {
        self.phase
    }

    pub fn is_evaporated(&self) -> bool {
        self.phase == CoolantPhase::Evaporated
    }

    /// Steam does not moderate or absorb neutrons.
    pub fn is_collidable(&self) -> bool {
        self.phase == CoolantPhase::Condensed
    }

    /// Cooling headroom in `[0, 1]`: 1 at the cool temperature, 0 at evaporation.
    pub fn capacity_remaining(&self) -> f64 {
        self.capacity_remaining
    }

    pub fn cooling_enabled(&self) -> bool {
        self.cooling_enabled
    }

    pub fn set_pump_state(&mut self, enabled: bool) {
        self.cooling_enabled = enabled;
    }

    pub fn band(&self) -> ThermalBand {
        if self.is_evaporated() {
            ThermalBand::Evaporated
        } else if self.temperature >= self.hot_temperature {
            ThermalBand::Hot
        } else {
            ThermalBand::Cool
        }
    }

    /// Heat from a passing neutron; slower neutrons deposit less.
    pub fn heat(&mut self, amount: f64, dt: f64) {
        self.change_temperature(amount * self.heat_factor * dt);
    }

    /// Dissipate heat through the pumps. Does nothing with pumps off.
    pub fn cool(&mut self, dt: f64) {
        if self.cooling_enabled {
            self.change_temperature(-(self.cool_factor * dt));
        }
    }

    fn change_temperature(&mut self, delta: f64) {
        self.temperature =
            (self.temperature + delta).clamp(self.cool_temperature, self.max_temperature);
        self.capacity_remaining = (1.0
            - map_range(
                self.temperature,
                self.cool_temperature,
                self.evaporation_temperature,
                0.0,
                1.0,
            ))
        .clamp(0.0, 1.0);

        match self.phase {
            CoolantPhase::Condensed if self.temperature >= self.evaporation_temperature => {
                self.phase = CoolantPhase::Evaporated;
            }
            CoolantPhase::Evaporated if self.temperature < self.evaporation_temperature => {
                self.phase = CoolantPhase::Condensed;
            }
            _ => {}
        }
    }
}
