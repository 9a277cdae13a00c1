//! Fire spread solver
//!
//! The cellular-automaton step ([`step`]) and the ignition helpers that put
//! the first burning cell on a landscape.

pub mod ignition;
pub mod spread;

// Re-exports
pub use ignition::{ignite_at, ignite_random, IgnitionPoint};
pub use spread::{step, StepSummary};
