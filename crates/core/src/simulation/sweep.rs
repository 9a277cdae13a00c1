//! Parameter sweep over every combination of the four environment scalars
//!
//! Combinations are enumerated in lexicographic order with humidity as the
//! most significant digit, then precipitation strength, precipitation chance
//! and wind strength. Each combination runs once on a fresh copy of the
//! landscape with a newly drawn ignition point.

use super::cancel::CancellationToken;
use super::observer::NullObserver;
use super::results::{ResultSink, RunRecord};
use super::run::{run, RunOutcome};
use crate::core_types::EnvironmentParams;
use crate::error::SimError;
use crate::grid::{Landscape, LandscapeGenerator};
use crate::solver::{ignite_random, IgnitionPoint};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

/// 0.0 to 1.0 in steps of 0.1
pub const DEFAULT_SWEEP_VALUES: [f32; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Where each sweep run gets its landscape from
#[derive(Debug, Clone)]
pub enum LandscapeSource {
    /// Copy the same snapshot for every combination
    Reuse(Arc<Landscape>),
    /// Generate a new landscape for every combination
    Regenerate(LandscapeGenerator),
}

impl LandscapeSource {
    /// Produce the landscape for the next run.
    ///
    /// # Errors
    /// Propagates generation errors.
    pub fn obtain<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Landscape, SimError> {
        match self {
            LandscapeSource::Reuse(snapshot) => Ok((**snapshot).clone()),
            LandscapeSource::Regenerate(generator) => generator.generate(rng),
        }
    }
}

/// Values to sweep and the landscape they run on
#[derive(Debug, Clone)]
pub struct SweepPlan {
    values: Vec<f32>,
    source: LandscapeSource,
}

impl SweepPlan {
    /// # Errors
    /// [`SimError::InvalidInput`] if `values` is empty or any value lies
    /// outside `[0, 1]`.
    pub fn new(values: Vec<f32>, source: LandscapeSource) -> Result<Self, SimError> {
        if values.is_empty() {
            return Err(SimError::invalid_input("sweep_values", "at least one value is required"));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || !(0.0..=1.0).contains(*v)) {
            return Err(SimError::invalid_input(
                "sweep_values",
                format!("{bad} is outside [0, 1]"),
            ));
        }
        Ok(Self { values, source })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn source(&self) -> &LandscapeSource {
        &self.source
    }

    /// `values.len()` to the fourth power
    pub fn total_combinations(&self) -> usize {
        self.values.len().pow(4)
    }

    /// Environment of the zero-based `index`-th combination, or `None` past the end.
    pub fn combination(&self, index: usize) -> Option<EnvironmentParams> {
        if index >= self.total_combinations() {
            return None;
        }
        let n = self.values.len();
        let wind = index % n;
        let chance = (index / n) % n;
        let strength = (index / (n * n)) % n;
        let humidity = index / (n * n * n);
        Some(EnvironmentParams::new(
            self.values[humidity],
            self.values[strength],
            self.values[chance],
            self.values[wind],
        ))
    }

    /// Lazily run every combination in order.
    pub fn iter<'a, R: Rng + ?Sized>(
        &'a self,
        rng: &'a mut R,
        cancel: &CancellationToken,
    ) -> Sweep<'a, R> {
        Sweep {
            plan: self,
            rng,
            cancel: cancel.clone(),
            next_index: 0,
            failed: false,
            cancelled: false,
        }
    }
}

/// Outcome of one sweep combination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRecord {
    /// One-based position in the sweep
    pub index: usize,
    pub total: usize,
    pub ignition: IgnitionPoint,
    pub record: RunRecord,
}

/// Iterator over sweep results
///
/// Yields one item per combination. Iteration ends after the first error or
/// when the cancellation token is set; [`Sweep::was_cancelled`] tells the
/// two natural endings apart.
pub struct Sweep<'a, R: Rng + ?Sized> {
    plan: &'a SweepPlan,
    rng: &'a mut R,
    cancel: CancellationToken,
    next_index: usize,
    failed: bool,
    cancelled: bool,
}

impl<R: Rng + ?Sized> Sweep<'_, R> {
    /// Skip the first `completed` combinations, typically the rows already in
    /// a result file.
    #[must_use]
    pub fn skip_completed(mut self, completed: usize) -> Self {
        self.next_index = completed.min(self.plan.total_combinations());
        self
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    fn run_combination(
        &mut self,
        index: usize,
        env: EnvironmentParams,
    ) -> Result<Option<SweepRecord>, SimError> {
        let mut landscape = self.plan.source.obtain(&mut *self.rng)?;
        let ignition = ignite_random(&mut landscape, &mut *self.rng)?;
        match run(&mut landscape, &env, &mut *self.rng, &self.cancel, &mut NullObserver)? {
            RunOutcome::Completed(metrics) => Ok(Some(SweepRecord {
                index: index + 1,
                total: self.plan.total_combinations(),
                ignition,
                record: RunRecord::new(&env, &metrics),
            })),
            RunOutcome::Cancelled { .. } => Ok(None),
        }
    }
}

impl<R: Rng + ?Sized> Iterator for Sweep<'_, R> {
    type Item = Result<SweepRecord, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cancelled {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.cancelled = true;
            return None;
        }
        let index = self.next_index;
        let env = self.plan.combination(index)?;
        self.next_index += 1;

        match self.run_combination(index, env) {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.cancelled = true;
                None
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Totals of a [`run_sweep`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    /// Combinations skipped at the start
    pub skipped: usize,
    /// Combinations run and written in this call
    pub completed: usize,
    pub cancelled: bool,
}

/// Run the plan, appending each record to `sink` as soon as it completes.
///
/// # Errors
/// The first run or sink error; records appended before it stay in the sink.
pub fn run_sweep<R: Rng + ?Sized>(
    plan: &SweepPlan,
    rng: &mut R,
    cancel: &CancellationToken,
    sink: &mut dyn ResultSink,
    skip: usize,
) -> Result<SweepSummary, SimError> {
    let total = plan.total_combinations();
    let skipped = skip.min(total);
    if skipped > 0 {
        info!("Resuming sweep: {} of {} combinations already done", skipped, total);
    }

    let mut sweep = plan.iter(rng, cancel).skip_completed(skipped);
    let mut completed = 0;
    for item in sweep.by_ref() {
        let result = item?;
        let r = &result.record;
        info!(
            "{}/{} h={:.1} ps={:.1} pc={:.1} w={:.1}: {} burned ({:.2}%) in {} steps",
            result.index,
            result.total,
            r.humidity,
            r.precipitation_strength,
            r.precipitation_chance,
            r.wind_strength,
            r.burned_count,
            r.burned_fraction * 100.0,
            r.steps_taken
        );
        sink.append(r)?;
        completed += 1;
    }

    let cancelled = sweep.was_cancelled();
    if cancelled {
        warn!(
            "Sweep cancelled after {} of {} combinations",
            skipped + completed,
            total
        );
    }
    Ok(SweepSummary {
        total,
        skipped,
        completed,
        cancelled,
    })
}
