//! Fuel rod state machine.
//!
//! A rod is NonFissile, Fissile or XenonSaturated. NonFissile rods run a
//! recurring countdown; each expiry may make the rod fissile or release a
//! single stray neutron. Slow neutrons drive the remaining transitions
//! through [`FuelRod::neutron_reaction`].
//!
//! Rods never spawn neutrons themselves. They report how many should be
//! emitted and the owning reactor places them, which keeps every rod free of
//! references into the neutron arena.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::FuelRodParams;
use crate::geometry::Vec2;
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelRodState {
    NonFissile,
    Fissile,
    XenonSaturated,
}

impl FuelRodState {
    pub fn flags(self) -> FuelRodFlags {
        match self {
            FuelRodState::NonFissile => FuelRodFlags {
                is_fissile: false,
                is_xenon: false,
                is_reactive: false,
            },
            FuelRodState::Fissile => FuelRodFlags {
                is_fissile: true,
                is_xenon: false,
                is_reactive: true,
            },
            FuelRodState::XenonSaturated => FuelRodFlags {
                is_fissile: false,
                is_xenon: true,
                is_reactive: true,
            },
        }
    }
}

/// The (fissile, xenon, reactive) triple published on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FuelRodFlags {
    pub is_fissile: bool,
    pub is_xenon: bool,
    pub is_reactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: FuelRodState,
    pub to: FuelRodState,
}

/// What a rod did during one timer advance or reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FuelRodActivity {
    pub transition: Option<Transition>,
    /// Neutrons to release at the rod's position.
    pub emitted: u32,
}

#[derive(Debug, Clone)]
pub struct FuelRod {
    index: usize,
    position: Vec2,
    state: FuelRodState,
    rng: RandomSource,
    fissile_probability: f64,
    random_release_probability: f64,
    xenon_decay_probability: f64,
    neutron_count: u32,
    interval: f64,
    /// Seconds until the spontaneous timer fires; `None` while cancelled.
    timer: Option<f64>,
}

impl FuelRod {
    pub fn new(index: usize, position: Vec2, params: &FuelRodParams, rng: RandomSource) -> Self {
        Self {
            index,
            position,
            state: FuelRodState::NonFissile,
            rng,
            fissile_probability: params.fissile_probability,
            random_release_probability: params.random_release_probability,
            xenon_decay_probability: params.xenon_decay_probability,
            neutron_count: params.neutron_count,
            interval: params.spontaneous_interval,
            timer: Some(params.spontaneous_interval),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn state(&self) -> FuelRodState {
        self.state
    }

    pub fn flags(&self) -> FuelRodFlags {
        self.state.flags()
    }

    pub fn is_fissile(&self) -> bool {
        self.flags().is_fissile
    }

    pub fn is_xenon(&self) -> bool {
        self.flags().is_xenon
    }

    pub fn is_reactive(&self) -> bool {
        self.flags().is_reactive
    }

    pub fn neutron_count(&self) -> u32 {
        self.neutron_count
    }

    /// Remaining time on the spontaneous-transition timer.
    pub fn timer_remaining(&self) -> Option<f64> {
        self.timer
    }

    /// Advance the spontaneous-transition countdown by `dt` seconds.
    ///
    /// Each expiry first rolls the fissile probability; on success the rod
    /// becomes Fissile, which cancels the timer. Otherwise the release
    /// probability is rolled for a single stray neutron and the timer
    /// restarts from the leftover time.
    pub fn advance_timer(&mut self, dt: f64) -> FuelRodActivity {
        let mut activity = FuelRodActivity::default();
        let Some(mut remaining) = self.timer else {
            return activity;
        };

        remaining -= dt;
        while remaining <= 0.0 {
            if self.rng.chance(self.fissile_probability) {
                activity.transition = self.set_state(FuelRodState::Fissile);
                return activity;
            }
            if self.rng.chance(self.random_release_probability) {
                activity.emitted += 1;
            }
            remaining += self.interval;
        }
        self.timer = Some(remaining);
        activity
    }

    /// React with a slow neutron.
    ///
    /// Returns `None` when the rod is not reactive; the neutron is then left
    /// untouched. A xenon-saturated rod swallows the neutron and returns to
    /// NonFissile. A fissile rod always releases its fission yield and then
    /// either saturates with xenon or returns to NonFissile.
    pub fn neutron_reaction(&mut self) -> Option<FuelRodActivity> {
        match self.state {
            FuelRodState::NonFissile => None,
            FuelRodState::XenonSaturated => Some(FuelRodActivity {
                transition: self.set_state(FuelRodState::NonFissile),
                emitted: 0,
            }),
            FuelRodState::Fissile => {
                let next = if self.rng.chance(self.xenon_decay_probability) {
                    FuelRodState::XenonSaturated
                } else {
                    FuelRodState::NonFissile
                };
                Some(FuelRodActivity {
                    emitted: self.neutron_count,
                    transition: self.set_state(next),
                })
            }
        }
    }

    /// Put the rod into `state` from outside the state machine.
    pub fn force_state(&mut self, state: FuelRodState) -> Option<Transition> {
        self.set_state(state)
    }

    fn set_state(&mut self, next: FuelRodState) -> Option<Transition> {
        if next == self.state {
            return None;
        }
        let from = self.state;
        self.state = next;
        self.timer = match next {
            FuelRodState::NonFissile => Some(self.interval),
            FuelRodState::Fissile | FuelRodState::XenonSaturated => None,
        };
        trace!("fuel rod {} {:?} -> {:?}", self.index, from, next);
        Some(Transition { from, to: next })
    }
}
