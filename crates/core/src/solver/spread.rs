//! Stochastic neighbour-ignition step
//!
//! One call to [`step`] advances a landscape by one time step:
//!
//! - A burning cell is put out by heavy rain (`precipitation_strength > 0.6`
//!   while rain is active), otherwise its timer drops by one and it becomes
//!   `Burnt` at zero.
//! - A burning cell that survives the step tries to ignite each of its 8
//!   flammable neighbours independently with
//!   [`EnvironmentParams::ignition_probability`]. Ignited trees burn for
//!   [`SPREAD_BURN_DURATION`] steps regardless of subtype.
//! - Moisture drops everywhere by `drying_effect * wind_strength`.
//!
//! The step is pure: it reads the pre-step landscape and writes fresh
//! buffers. Neighbour ignition is evaluated as a gather from the target's
//! point of view (one Bernoulli trial per surviving burning neighbour), which
//! has the same outcome distribution as scattering from each burning cell and
//! lets every row be computed in parallel into its own output slice.

use crate::core_types::{CellState, EnvironmentParams, SPREAD_BURN_DURATION};
use crate::grid::{FieldData, Landscape};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

/// Cell transitions during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Cells burning after the step
    pub burning: usize,
    /// Trees newly set alight by a neighbour
    pub ignited: usize,
    /// Burning cells that became `Burnt` (timer expiry or rain)
    pub extinguished: usize,
}

impl StepSummary {
    fn merge(self, other: Self) -> Self {
        Self {
            burning: self.burning + other.burning,
            ignited: self.ignited + other.ignited,
            extinguished: self.extinguished + other.extinguished,
        }
    }
}

/// Whether a cell is still burning after this step and can spread fire.
#[inline]
fn keeps_burning(state: CellState, timer: u8, rain_kills: bool) -> bool {
    state.is_burning() && !rain_kills && timer > 1
}

/// Advance `landscape` by one step.
///
/// `rng` provides one seed per step; row `y` draws from `ChaCha8` stream `y`
/// of that seed, so the result depends only on the caller's RNG state and
/// not on how rows are scheduled across threads.
///
/// A landscape without burning cells only loses moisture.
pub fn step<R: Rng + ?Sized>(
    landscape: &Landscape,
    env: &EnvironmentParams,
    rain_active: bool,
    rng: &mut R,
) -> (Landscape, StepSummary) {
    let width = landscape.width();
    let height = landscape.height();
    let cells = landscape.cells.as_slice();
    let timers = landscape.burn_timers.as_slice();

    let rain_kills = rain_active && env.rain_extinguishes();
    let probability = env.ignition_probability();
    let step_seed: u64 = rng.random();

    let mut next_cells = landscape.cells.clone();
    let mut next_timers = landscape.burn_timers.clone();

    let summary = if width == 0 {
        StepSummary::default()
    } else {
        next_cells
            .as_mut_slice()
            .par_chunks_mut(width)
            .zip(next_timers.as_mut_slice().par_chunks_mut(width))
            .enumerate()
            .map(|(y, (cell_row, timer_row))| {
                let mut row_rng = ChaCha8Rng::seed_from_u64(step_seed);
                row_rng.set_stream(y as u64);
                let mut summary = StepSummary::default();

                for x in 0..width {
                    let idx = y * width + x;
                    let state = cells[idx];

                    if state.is_burning() {
                        let timer = timers[idx];
                        if keeps_burning(state, timer, rain_kills) {
                            timer_row[x] = timer - 1;
                            summary.burning += 1;
                        } else {
                            cell_row[x] = CellState::Burnt;
                            timer_row[x] = 0;
                            summary.extinguished += 1;
                        }
                        continue;
                    }

                    if !state.is_flammable() || probability <= 0.0 {
                        continue;
                    }

                    let spreading_neighbors = landscape
                        .cells
                        .moore_neighbors(x, y)
                        .filter(|&(nx, ny)| {
                            let n = ny * width + nx;
                            keeps_burning(cells[n], timers[n], rain_kills)
                        })
                        .count();

                    let ignites =
                        (0..spreading_neighbors).any(|_| row_rng.random::<f32>() < probability);
                    if ignites {
                        cell_row[x] = CellState::Burning;
                        timer_row[x] = SPREAD_BURN_DURATION;
                        summary.burning += 1;
                        summary.ignited += 1;
                    }
                }
                summary
            })
            .reduce(StepSummary::default, StepSummary::merge)
    };

    let loss = env.moisture_loss();
    let moisture = FieldData {
        data: landscape
            .moisture
            .as_slice()
            .iter()
            .map(|m| (m - loss).clamp(0.0, 1.0))
            .collect(),
        width,
        height,
    };

    debug!(
        "Step: rain={}, p={:.3}, burning={}, ignited={}, extinguished={}",
        rain_active, probability, summary.burning, summary.ignited, summary.extinguished
    );

    (
        landscape.with_fields(next_cells, moisture, next_timers),
        summary,
    )
}
