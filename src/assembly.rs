//! Fuel assembly: the owning grid of fuel rods and its lattice geometry.
//!
//! Rods sit on a row-major lattice between the layout's min and max
//! corners. Index 0 is the bottom-left cell; indices grow to the right and
//! then upward:
//!
//! ```text
//!            col 0  col 1  col 2
//!   row 2      6      7      8
//!   row 1      3      4      5
//!   row 0      0      1      2
//! ```

use log::info;
use ndarray::Array2;

use crate::config::{AssemblyLayout, CoolantParams, FuelRodParams};
use crate::coolant::CoolantWater;
use crate::error::{Result, SimError};
use crate::fuel_rod::FuelRod;
use crate::geometry::{lerp, Rect, Vec2};
use crate::random::RandomSource;

/// Tag bit keeping fuel-rod stream identities apart from neutron ids.
const FUEL_STREAM_TAG: u64 = 1 << 63;

impl AssemblyLayout {
    /// Lattice position of a cell. A single row or column is centred.
    pub fn cell_position(&self, row: usize, column: usize) -> Vec2 {
        let t = |i: usize, count: usize| {
            if count > 1 {
                i as f64 / (count as f64 - 1.0)
            } else {
                0.5
            }
        };
        Vec2::new(
            lerp(self.min.x, self.max.x, t(column, self.columns)),
            lerp(self.min.y, self.max.y, t(row, self.rows)),
        )
    }

    /// Lattice cell whose centre is nearest to `p`, if `p` lies within half a
    /// spacing of the grid.
    pub fn nearest_cell(&self, p: Vec2) -> Option<(usize, usize)> {
        let origin = self.cell_position(0, 0);
        let spacing = self.spacing();
        let snap = |offset: f64, step: f64, count: usize| {
            let i = (offset / step).round();
            (i >= 0.0 && i < count as f64).then_some(i as usize)
        };
        let column = snap(p.x - origin.x, spacing.x, self.columns)?;
        let row = snap(p.y - origin.y, spacing.y, self.rows)?;
        Some((row, column))
    }

    pub fn flat_index(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }
}

/// Build a fuel grid and its parallel coolant grid for `layout`.
///
/// Each rod draws from its own stream derived from `master`, the assembly
/// `generation` and the rod's flat index.
pub fn generate_grids(
    layout: &AssemblyLayout,
    fuel: &FuelRodParams,
    coolant: &CoolantParams,
    master: &RandomSource,
    generation: u64,
) -> Result<(Array2<FuelRod>, Array2<CoolantWater>)> {
    layout.validate()?;
    let shape = (layout.rows, layout.columns);
    let half_cell = layout.spacing() * 0.5;

    let rods = Array2::from_shape_fn(shape, |(row, column)| {
        let index = layout.flat_index(row, column);
        let identity = FUEL_STREAM_TAG | (generation << 32) | index as u64;
        FuelRod::new(index, layout.cell_position(row, column), fuel, master.derive(identity))
    });
    let water = Array2::from_shape_fn(shape, |(row, column)| {
        CoolantWater::new(
            layout.flat_index(row, column),
            layout.cell_position(row, column),
            half_cell,
            coolant,
        )
    });
    Ok((rods, water))
}

/// Owning container for the fuel-rod grid.
#[derive(Debug, Default)]
pub struct FuelAssembly {
    layout: Option<AssemblyLayout>,
    rods: Option<Array2<FuelRod>>,
    /// Half-size of each rod's reactive square.
    fuel_half_extent: f64,
}

impl FuelAssembly {
    pub fn insert_fuel_rods(
        &mut self,
        layout: AssemblyLayout,
        rods: Array2<FuelRod>,
        cell_fraction: f64,
    ) {
        let spacing = layout.spacing();
        self.fuel_half_extent = spacing.x.min(spacing.y) * cell_fraction;
        info!("Inserted {} fuel rods ({}x{})", rods.len(), layout.rows, layout.columns);
        self.layout = Some(layout);
        self.rods = Some(rods);
    }

    pub fn destroy_fuel_rods(&mut self) {
        if let Some(rods) = self.rods.take() {
            info!("Destroyed {} fuel rods", rods.len());
        }
        self.layout = None;
    }

    pub fn layout(&self) -> Option<&AssemblyLayout> {
        self.layout.as_ref()
    }

    pub fn rows(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.rows)
    }

    pub fn columns(&self) -> usize {
        self.layout.as_ref().map_or(0, |l| l.columns)
    }

    pub fn len(&self) -> usize {
        self.rods.as_ref().map_or(0, |r| r.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rods in flattened (row-major) order.
    pub fn iter(&self) -> impl Iterator<Item = &FuelRod> {
        self.rods.iter().flat_map(|r| r.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FuelRod> {
        self.rods.iter_mut().flat_map(|r| r.iter_mut())
    }

    pub fn rod(&self, index: usize) -> Result<&FuelRod> {
        let len = self.len();
        let columns = self.columns();
        if index >= len {
            return Err(SimError::InvalidIndex { index, len });
        }
        self.rods
            .as_ref()
            .and_then(|r| r.get((index / columns, index % columns)))
            .ok_or(SimError::InvalidIndex { index, len })
    }

    pub fn rod_mut(&mut self, index: usize) -> Result<&mut FuelRod> {
        let len = self.len();
        let columns = self.columns();
        if index >= len {
            return Err(SimError::InvalidIndex { index, len });
        }
        self.rods
            .as_mut()
            .and_then(|r| r.get_mut((index / columns, index % columns)))
            .ok_or(SimError::InvalidIndex { index, len })
    }

    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut FuelRod> {
        self.rods.as_mut()?.get_mut((row, column))
    }

    /// Reactive square of the rod at (`row`, `column`).
    pub fn fuel_bounds(&self, row: usize, column: usize) -> Option<Rect> {
        let layout = self.layout.as_ref()?;
        let h = self.fuel_half_extent;
        Some(Rect::from_center(layout.cell_position(row, column), h, h))
    }
}
