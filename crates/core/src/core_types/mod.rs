//! Core types and utilities

pub mod cell;
pub mod environment;

// Re-export
pub use cell::{CellState, SPREAD_BURN_DURATION};
pub use environment::{parse_unit_interval, EnvironmentParams, ParameterInputs};
