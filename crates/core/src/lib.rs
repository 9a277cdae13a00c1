//! Forest Fire Simulation Core Library
//!
//! A stochastic cellular-automaton wildfire model on a rectangular grid of
//! trees, ground, rock and water. Fire spreads between Moore neighbours with
//! a probability shaped by humidity, precipitation and wind; rain can put
//! burning cells out, and every cell slowly loses moisture.
//!
//! ## Workflow
//!
//! - Generate a [`Landscape`] with a [`LandscapeGenerator`]
//! - Ignite it with [`ignite_random`] or [`ignite_at`]
//! - Step it to termination with [`run`] or a [`Simulation`]
//! - Explore the parameter space with a [`SweepPlan`] writing to a [`ResultSink`]

// Core types and utilities
pub mod config;
pub mod core_types;
pub mod error;

// Landscape storage and generation
pub mod grid;

// Spread engine and run control
pub mod simulation;
pub mod solver;

// Re-export core types
pub use config::SimulationConfig;
pub use core_types::{CellState, EnvironmentParams, ParameterInputs};
pub use error::SimError;

// Re-export grid types
pub use grid::{FieldData, Landscape, LandscapeConfig, LandscapeGenerator, WaterClusterParams};

// Re-export engine types
pub use simulation::{
    run, run_sweep, CancellationToken, ChannelObserver, CsvResultSink, Frame, LandscapeSource,
    MemorySink, NullObserver, ResultSink, RunMetrics, RunOutcome, RunRecord, Simulation,
    StepObserver, SweepPlan, SweepSummary,
};
pub use solver::{ignite_at, ignite_random, step, IgnitionPoint, StepSummary};
