//! Initial ignition of a landscape
//!
//! Random ignition samples from the candidate list computed when the
//! landscape was finalized, skipping candidates that are no longer
//! flammable. It therefore always terminates and reports an error instead of
//! searching forever on a landscape with nothing left to burn.

use crate::core_types::CellState;
use crate::error::SimError;
use crate::grid::Landscape;
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where and how a fire was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnitionPoint {
    pub x: usize,
    pub y: usize,
    /// Tree subtype before ignition
    pub fuel: CellState,
    /// Burn timer assigned on ignition
    pub burn_time: u8,
}

/// Set the tree at `(x, y)` alight with its subtype's ignition duration.
///
/// # Errors
/// [`SimError::InvalidState`] if `(x, y)` is outside the grid or not a tree.
pub fn ignite_at(landscape: &mut Landscape, x: usize, y: usize) -> Result<IgnitionPoint, SimError> {
    if x >= landscape.width() || y >= landscape.height() {
        return Err(SimError::InvalidState(format!(
            "ignition point ({x}, {y}) outside {}x{} grid",
            landscape.width(),
            landscape.height()
        )));
    }
    let fuel = landscape.cells.get(x, y);
    let burn_time = fuel.ignition_duration().ok_or_else(|| {
        SimError::InvalidState(format!("cannot ignite {fuel:?} cell at ({x}, {y})"))
    })?;

    landscape.cells.set(x, y, CellState::Burning);
    landscape.burn_timers.set(x, y, burn_time);
    Ok(IgnitionPoint {
        x,
        y,
        fuel,
        burn_time,
    })
}

/// Ignite one uniformly chosen flammable cell.
///
/// # Errors
/// [`SimError::NoIgnitionCandidates`] when no candidate cell is still flammable.
pub fn ignite_random<R: Rng + ?Sized>(
    landscape: &mut Landscape,
    rng: &mut R,
) -> Result<IgnitionPoint, SimError> {
    let index = landscape
        .ignition_candidates()
        .iter()
        .copied()
        .filter(|&i| landscape.cells.as_slice()[i].is_flammable())
        .choose(rng)
        .ok_or(SimError::NoIgnitionCandidates)?;

    let (x, y) = landscape.cells.coords(index);
    let point = ignite_at(landscape, x, y)?;
    info!(
        "Ignited {:?} at ({}, {}) burning for {} steps",
        point.fuel, point.x, point.y, point.burn_time
    );
    Ok(point)
}
