//! Fission Reactor Simulation Library
//!
//! Discrete-time simulation of a small fission reactor: a grid of fuel rods,
//! free-flying neutrons, a coolant tank, control and moderator rods, and a
//! monitor that steers the control rods toward a target neutron population.

pub mod assembly;
pub mod commands;
pub mod config;
pub mod coolant;
pub mod coolant_tank;
pub mod error;
pub mod events;
pub mod fuel_rod;
pub mod geometry;
pub mod monitor;
pub mod neutron;
pub mod random;
pub mod reactor;
pub mod rods;
pub mod simulator;

pub use config::SimulationConfig;
pub use error::{Result, SimError};
pub use reactor::{Reactor, ReactorSnapshot};
pub use simulator::ReactorSimulator;
