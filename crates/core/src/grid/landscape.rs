//! Landscape snapshot: cell states, moisture and burn timers
//!
//! A [`Landscape`] is produced once per generation and kept as the read-only
//! initial snapshot. Runs operate on deep copies of it.

use super::fields::FieldData;
use crate::core_types::CellState;
use crate::error::SimError;
use std::sync::Arc;

/// Grid of cells with its moisture and burn timer fields
#[derive(Debug, Clone, PartialEq)]
pub struct Landscape {
    /// Cell states
    pub cells: FieldData<CellState>,
    /// Local dampness per cell (0.0-1.0)
    pub moisture: FieldData<f32>,
    /// Remaining burn steps, non-zero only for `Burning` cells
    pub burn_timers: FieldData<u8>,
    /// Fuel-carrying cells when the landscape was finalized
    total_flammable: usize,
    /// Flat indices of cells that were flammable when the landscape was finalized
    ignition_candidates: Arc<[usize]>,
}

impl Landscape {
    /// Assemble a landscape from its three fields.
    ///
    /// The flammable-cell denominator and the ignition candidate list are
    /// computed here, once. Cells already `Burning` or `Burnt` count towards
    /// the denominator so the burned fraction can never exceed 1.
    ///
    /// # Errors
    /// [`SimError::InvalidState`] when field dimensions differ, a moisture
    /// value is outside `[0, 1]`, or a burn timer disagrees with its cell state.
    pub fn from_fields(
        cells: FieldData<CellState>,
        moisture: FieldData<f32>,
        burn_timers: FieldData<u8>,
    ) -> Result<Self, SimError> {
        let dims = (cells.width, cells.height);
        if (moisture.width, moisture.height) != dims || (burn_timers.width, burn_timers.height) != dims
        {
            return Err(SimError::InvalidState(format!(
                "field dimensions differ: cells {}x{}, moisture {}x{}, timers {}x{}",
                cells.width,
                cells.height,
                moisture.width,
                moisture.height,
                burn_timers.width,
                burn_timers.height
            )));
        }
        if let Some(bad) = moisture.as_slice().iter().find(|m| !(0.0..=1.0).contains(*m)) {
            return Err(SimError::InvalidState(format!(
                "moisture {bad} outside [0, 1]"
            )));
        }
        for (index, (&state, &timer)) in cells
            .as_slice()
            .iter()
            .zip(burn_timers.as_slice())
            .enumerate()
        {
            if state.is_burning() != (timer > 0) {
                let (x, y) = cells.coords(index);
                return Err(SimError::InvalidState(format!(
                    "cell ({x}, {y}) is {state:?} with burn timer {timer}"
                )));
            }
        }

        let ignition_candidates: Arc<[usize]> = cells
            .as_slice()
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_flammable().then_some(i))
            .collect();
        let total_flammable = cells.count_where(|s| {
            s.is_flammable() || matches!(s, CellState::Burning | CellState::Burnt)
        });

        Ok(Self {
            cells,
            moisture,
            burn_timers,
            total_flammable,
            ignition_candidates,
        })
    }

    /// Landscape with the given cells, zero moisture and zero timers.
    ///
    /// # Errors
    /// [`SimError::InvalidState`] if `cells` contains `Burning` cells, which
    /// would need a timer.
    pub fn from_cells(cells: FieldData<CellState>) -> Result<Self, SimError> {
        let (width, height) = (cells.width, cells.height);
        Self::from_fields(
            cells,
            FieldData::new(width, height),
            FieldData::new(width, height),
        )
    }

    /// Uniform landscape of a single state.
    ///
    /// # Errors
    /// [`SimError::InvalidState`] if `state` is `Burning`.
    pub fn filled(width: usize, height: usize, state: CellState) -> Result<Self, SimError> {
        Self::from_cells(FieldData::with_value(width, height, state))
    }

    /// Grid width (columns)
    #[inline]
    pub fn width(&self) -> usize {
        self.cells.width
    }

    /// Grid height (rows)
    #[inline]
    pub fn height(&self) -> usize {
        self.cells.height
    }

    /// Number of fuel-carrying cells counted when the landscape was finalized
    #[inline]
    pub fn total_flammable(&self) -> usize {
        self.total_flammable
    }

    /// Flat indices that were flammable when the landscape was finalized
    pub fn ignition_candidates(&self) -> &[usize] {
        &self.ignition_candidates
    }

    /// Number of cells in `state`
    pub fn count(&self, state: CellState) -> usize {
        self.cells.count_where(|s| s == state)
    }

    pub fn burning_count(&self) -> usize {
        self.count(CellState::Burning)
    }

    pub fn burnt_count(&self) -> usize {
        self.count(CellState::Burnt)
    }

    /// Current number of flammable cells (changes as the fire spreads)
    pub fn flammable_count(&self) -> usize {
        self.cells.count_where(CellState::is_flammable)
    }

    /// Replace the mutable fields, keeping the generation-time bookkeeping.
    pub(crate) fn with_fields(
        &self,
        cells: FieldData<CellState>,
        moisture: FieldData<f32>,
        burn_timers: FieldData<u8>,
    ) -> Self {
        Self {
            cells,
            moisture,
            burn_timers,
            total_flammable: self.total_flammable,
            ignition_candidates: Arc::clone(&self.ignition_candidates),
        }
    }
}
