//! Coolant tank: owns every coolant cell and summarises them.

use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::coolant::CoolantWater;

/// Tank-wide readings. Temperatures hold `f64::MIN` while the tank is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankStatistics {
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub average_temperature: f64,
    /// Remaining cooling capacity over all cells, 0-100.
    pub water_level_percent: f64,
    pub cell_count: usize,
    pub evaporated_cells: usize,
    pub pumps_enabled: bool,
}

impl TankStatistics {
    fn empty(pumps_enabled: bool) -> Self {
        Self {
            min_temperature: f64::MIN,
            max_temperature: f64::MIN,
            average_temperature: f64::MIN,
            water_level_percent: 0.0,
            cell_count: 0,
            evaporated_cells: 0,
            pumps_enabled,
        }
    }
}

#[derive(Debug)]
pub struct CoolantWaterTank {
    water: Option<Array2<CoolantWater>>,
    pumps_enabled: bool,
    statistics: TankStatistics,
}

impl Default for CoolantWaterTank {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CoolantWaterTank {
    pub fn new(pumps_enabled: bool) -> Self {
        Self {
            water: None,
            pumps_enabled,
            statistics: TankStatistics::empty(pumps_enabled),
        }
    }

    /// Take ownership of a fresh coolant grid, parallel to the fuel grid.
    pub fn insert_water(&mut self, mut water: Array2<CoolantWater>) {
        for cell in water.iter_mut() {
            cell.set_pump_state(self.pumps_enabled);
        }
        self.water = Some(water);
        self.update_measurements();
    }

    pub fn clear_water(&mut self) {
        self.water = None;
        self.statistics = TankStatistics::empty(self.pumps_enabled);
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.water.as_ref().map_or(0, |w| w.len())
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &CoolantWater> {
        self.water.iter().flat_map(|w| w.iter())
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CoolantWater> {
        self.water.as_ref()?.get((row, column))
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut CoolantWater> {
        self.water.as_mut()?.get_mut((row, column))
    }

    pub fn pumps_enabled(&self) -> bool {
        self.pumps_enabled
    }

    pub fn enable_pumps(&mut self) {
        self.set_pumps(true);
    }

    pub fn disable_pumps(&mut self) {
        self.set_pumps(false);
    }

    fn set_pumps(&mut self, enabled: bool) {
        self.pumps_enabled = enabled;
        self.statistics.pumps_enabled = enabled;
        if let Some(water) = self.water.as_mut() {
            for cell in water.iter_mut() {
                cell.set_pump_state(enabled);
            }
        }
        debug!("coolant pumps {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Run the pumps on every cell for one step.
    pub fn cool(&mut self, dt: f64) {
        if let Some(water) = self.water.as_mut() {
            for cell in water.iter_mut() {
                cell.cool(dt);
            }
        }
    }

    pub fn statistics(&self) -> TankStatistics {
        self.statistics
    }

    /// Recompute the tank-wide readings from the current cells.
    pub fn update_measurements(&mut self) -> TankStatistics {
        let Some(water) = self.water.as_ref().filter(|w| !w.is_empty()) else {
            self.statistics = TankStatistics::empty(self.pumps_enabled);
            return self.statistics;
        };

        let mut sum = 0.0;
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        let mut capacity = 0.0;
        let mut evaporated = 0;
        for cell in water.iter() {
            let t = cell.temperature();
            sum += t;
            min = min.min(t);
            max = max.max(t);
            capacity += cell.capacity_remaining();
            if cell.is_evaporated() {
                evaporated += 1;
            }
        }
        let count = water.len();

        self.statistics = TankStatistics {
            min_temperature: min,
            max_temperature: max,
            average_temperature: sum / count as f64,
            water_level_percent: capacity / count as f64 * 100.0,
            cell_count: count,
            evaporated_cells: evaporated,
            pumps_enabled: self.pumps_enabled,
        };
        self.statistics
    }
}
