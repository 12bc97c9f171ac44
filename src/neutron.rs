//! Neutron kinematics.
//!
//! Neutrons are born fast and travel in a straight line fixed at spawn.
//! Coolant bleeds speed off them; once at or below 1.5x the slow speed they
//! become slow (thermalised) and can react with fuel or be absorbed by
//! control rods. Below 0.75x the slow speed they are fully moderated and
//! disappear.

use serde::{Deserialize, Serialize};

use crate::config::NeutronParams;
use crate::geometry::Vec2;
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyState {
    /// Too fast to react; only moderators interact with it.
    Fast,
    /// Thermalised: reacts with fuel, absorbed by control rods.
    Slow,
}

/// Why a neutron left the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeutronFate {
    Moderated,
    Escaped,
    Absorbed,
    Reacted,
}

#[derive(Debug, Clone)]
pub struct Neutron {
    id: u64,
    position: Vec2,
    direction: Vec2,
    speed: f64,
    energy: EnergyState,
    fate: Option<NeutronFate>,
    /// Fuel cell currently overlapped, for enter-only reactions.
    fuel_contact: Option<usize>,
}

impl Neutron {
    /// Fast neutron at `position` heading in a random direction drawn from
    /// the stream derived for `id`.
    pub fn spawn(id: u64, position: Vec2, params: &NeutronParams, master: &RandomSource) -> Self {
        let direction = master.derive(id).direction();
        Self::with_direction(id, position, direction, params)
    }

    pub fn with_direction(
        id: u64,
        position: Vec2,
        direction: Vec2,
        params: &NeutronParams,
    ) -> Self {
        Self {
            id,
            position,
            direction: direction.try_normalize().unwrap_or(Vec2::new(1.0, 0.0)),
            speed: params.fast_speed,
            energy: EnergyState::Fast,
            fate: None,
            fuel_contact: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn energy(&self) -> EnergyState {
        self.energy
    }

    pub fn is_fast(&self) -> bool {
        self.energy == EnergyState::Fast
    }

    pub fn is_slow(&self) -> bool {
        self.energy == EnergyState::Slow
    }

    pub fn fate(&self) -> Option<NeutronFate> {
        self.fate
    }

    pub fn is_alive(&self) -> bool {
        self.fate.is_none()
    }

    /// Move one step along the travel direction, then apply the speed thresholds.
    pub fn advance(&mut self, dt: f64, params: &NeutronParams) {
        if !self.is_alive() {
            return;
        }
        self.position += self.direction * (self.speed * dt);
        self.apply_speed_thresholds(params);
    }

    /// Bleed speed while overlapping condensed coolant.
    pub fn moderate(&mut self, dt: f64, params: &NeutronParams) {
        if !self.is_alive() {
            return;
        }
        self.speed = (self.speed - params.water_slow_rate * dt).max(0.0);
        self.apply_speed_thresholds(params);
    }

    /// Contact with a moderator rod: a fast neutron bounces back horizontally
    /// and is forced slow. Slow neutrons pass straight through.
    pub fn reflect_off_moderator(&mut self, params: &NeutronParams) -> bool {
        if !self.is_alive() || !self.is_fast() {
            return false;
        }
        self.direction.x = -self.direction.x;
        self.make_slow(params);
        true
    }

    /// Record the fuel cell the neutron now overlaps. Returns true when this
    /// is a fresh entry into `cell`.
    pub fn enter_fuel_cell(&mut self, cell: Option<usize>) -> bool {
        let entered = cell.is_some() && cell != self.fuel_contact;
        self.fuel_contact = cell;
        entered
    }

    pub fn remove(&mut self, fate: NeutronFate) {
        if self.fate.is_none() {
            self.fate = Some(fate);
        }
    }

    fn apply_speed_thresholds(&mut self, params: &NeutronParams) {
        if self.is_fast() && self.speed <= params.max_reaction_speed() {
            self.make_slow(params);
        }
        if self.speed <= params.minimum_speed() {
            self.remove(NeutronFate::Moderated);
        }
    }

    fn make_slow(&mut self, params: &NeutronParams) {
        self.energy = EnergyState::Slow;
        self.speed = self.speed.min(params.max_reaction_speed());
    }
}
