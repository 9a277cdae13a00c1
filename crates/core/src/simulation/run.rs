//! Run controller: step until the fire is out, then measure the burn
//!
//! [`run`] drives the spread engine on a working landscape. Before every
//! step it checks the cancellation token and whether anything is still
//! burning; rain is drawn independently for each step from the
//! precipitation chance.
//!
//! [`Simulation`] bundles a read-only initial snapshot with a working copy,
//! so a landscape can be ignited, run and restored as often as needed.

use super::cancel::CancellationToken;
use super::observer::{NullObserver, StepObserver};
use crate::core_types::EnvironmentParams;
use crate::error::SimError;
use crate::grid::{Landscape, LandscapeGenerator};
use crate::solver::{ignite_at, ignite_random, step, IgnitionPoint};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Burn extent of a run that ended naturally
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Cells `Burnt` at termination
    pub burned_count: usize,
    /// `burned_count / total_flammable`
    pub burned_fraction: f64,
    /// Steps applied before no cell was burning
    pub steps_taken: usize,
    /// Flammable cells when the landscape was generated
    pub total_flammable: usize,
}

impl RunMetrics {
    /// Burned fraction as a percentage
    pub fn burned_percent(&self) -> f64 {
        self.burned_fraction * 100.0
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// No cell is burning any more
    Completed(RunMetrics),
    /// Stopped through the cancellation token; burn metrics are not meaningful
    Cancelled {
        steps_taken: usize,
        burning_remaining: usize,
    },
}

impl RunOutcome {
    pub fn metrics(&self) -> Option<&RunMetrics> {
        match self {
            RunOutcome::Completed(metrics) => Some(metrics),
            RunOutcome::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled { .. })
    }

    pub fn steps_taken(&self) -> usize {
        match self {
            RunOutcome::Completed(metrics) => metrics.steps_taken,
            RunOutcome::Cancelled { steps_taken, .. } => *steps_taken,
        }
    }
}

/// Step `landscape` until no cell is burning or `cancel` is set.
///
/// The landscape is left in its final (or, when cancelled, current) state.
/// A landscape with nothing burning completes immediately with zero steps,
/// so callers should ignite it first.
///
/// # Errors
/// - [`SimError::InvalidInput`] if `env` is out of range
/// - [`SimError::InvalidState`] if the landscape had no flammable cells at
///   generation time (the burned fraction would be undefined)
pub fn run<R, O>(
    landscape: &mut Landscape,
    env: &EnvironmentParams,
    rng: &mut R,
    cancel: &CancellationToken,
    observer: &mut O,
) -> Result<RunOutcome, SimError>
where
    R: Rng + ?Sized,
    O: StepObserver + ?Sized,
{
    env.validate()?;
    let total_flammable = landscape.total_flammable();
    if total_flammable == 0 {
        return Err(SimError::InvalidState(
            "landscape has no flammable cells to burn".into(),
        ));
    }

    let mut steps_taken = 0;
    let mut burning = landscape.burning_count();
    observer.observe(0, false, landscape);

    loop {
        if cancel.is_cancelled() {
            info!(
                "Run cancelled after {} steps with {} cells still burning",
                steps_taken, burning
            );
            return Ok(RunOutcome::Cancelled {
                steps_taken,
                burning_remaining: burning,
            });
        }
        if burning == 0 {
            break;
        }

        let rain_active = rng.random::<f32>() < env.precipitation_chance;
        let (next, summary) = step(landscape, env, rain_active, rng);
        *landscape = next;
        steps_taken += 1;
        burning = summary.burning;
        observer.observe(steps_taken, rain_active, landscape);
    }

    observer.finished(steps_taken, landscape);

    let burned_count = landscape.burnt_count();
    let metrics = RunMetrics {
        burned_count,
        burned_fraction: burned_count as f64 / total_flammable as f64,
        steps_taken,
        total_flammable,
    };
    info!(
        "Fire has stopped spreading after {} steps: {} of {} cells burned ({:.2}%)",
        steps_taken,
        burned_count,
        total_flammable,
        metrics.burned_percent()
    );
    Ok(RunOutcome::Completed(metrics))
}

/// A landscape snapshot plus the working copy a run mutates
#[derive(Debug, Clone)]
pub struct Simulation {
    initial: Arc<Landscape>,
    working: Landscape,
    env: EnvironmentParams,
    ignition: Option<IgnitionPoint>,
}

impl Simulation {
    /// Capture `initial` as the read-only snapshot and start from a copy of it.
    ///
    /// # Errors
    /// [`SimError::InvalidInput`] if `env` is out of range.
    pub fn new(initial: Landscape, env: EnvironmentParams) -> Result<Self, SimError> {
        Self::from_snapshot(Arc::new(initial), env)
    }

    /// Share an existing snapshot.
    ///
    /// # Errors
    /// [`SimError::InvalidInput`] if `env` is out of range.
    pub fn from_snapshot(initial: Arc<Landscape>, env: EnvironmentParams) -> Result<Self, SimError> {
        env.validate()?;
        let working = (*initial).clone();
        Ok(Self {
            initial,
            working,
            env,
            ignition: None,
        })
    }

    /// Generate a fresh landscape and capture it.
    ///
    /// # Errors
    /// Propagates generation and parameter validation errors.
    pub fn generate<R: Rng + ?Sized>(
        generator: &LandscapeGenerator,
        env: EnvironmentParams,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        Self::new(generator.generate(rng)?, env)
    }

    pub fn initial(&self) -> &Arc<Landscape> {
        &self.initial
    }

    /// Current working landscape
    pub fn landscape(&self) -> &Landscape {
        &self.working
    }

    pub fn environment(&self) -> &EnvironmentParams {
        &self.env
    }

    /// Replace the environment for subsequent runs.
    ///
    /// # Errors
    /// [`SimError::InvalidInput`] if `env` is out of range; the previous
    /// environment is kept.
    pub fn set_environment(&mut self, env: EnvironmentParams) -> Result<(), SimError> {
        env.validate()?;
        self.env = env;
        Ok(())
    }

    /// Last ignition point since the previous restart
    pub fn ignition(&self) -> Option<IgnitionPoint> {
        self.ignition
    }

    /// Restore the working landscape from the initial snapshot.
    pub fn restart(&mut self) {
        debug!("Restoring landscape from initial snapshot");
        self.working = (*self.initial).clone();
        self.ignition = None;
    }

    /// Ignite a random tree on the working landscape.
    ///
    /// # Errors
    /// [`SimError::NoIgnitionCandidates`] when nothing is left to ignite.
    pub fn ignite_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<IgnitionPoint, SimError> {
        let point = ignite_random(&mut self.working, rng)?;
        self.ignition = Some(point);
        Ok(point)
    }

    /// Ignite the tree at `(x, y)` on the working landscape.
    ///
    /// # Errors
    /// [`SimError::InvalidState`] if the cell is outside the grid or not a tree.
    pub fn ignite_at(&mut self, x: usize, y: usize) -> Result<IgnitionPoint, SimError> {
        let point = ignite_at(&mut self.working, x, y)?;
        self.ignition = Some(point);
        Ok(point)
    }

    /// Run the working landscape to termination.
    ///
    /// # Errors
    /// See [`run`].
    pub fn run<R, O>(
        &mut self,
        rng: &mut R,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> Result<RunOutcome, SimError>
    where
        R: Rng + ?Sized,
        O: StepObserver + ?Sized,
    {
        run(&mut self.working, &self.env, rng, cancel, observer)
    }

    /// Restore the snapshot, ignite a random tree and run without observation.
    ///
    /// # Errors
    /// See [`Simulation::ignite_random`] and [`run`].
    pub fn run_fresh<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, SimError> {
        self.restart();
        self.ignite_random(rng)?;
        self.run(rng, cancel, &mut NullObserver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::CellState;
    use crate::grid::{FieldData, LandscapeConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn island(fuel: CellState) -> Landscape {
        let mut cells = FieldData::with_value(100, 100, CellState::Water);
        cells.set(50, 50, fuel);
        Landscape::from_cells(cells).unwrap()
    }

    #[test]
    fn test_isolated_secondary_tree_burns_in_three_steps() {
        let mut landscape = island(CellState::TreeSecondary);
        ignite_at(&mut landscape, 50, 50).unwrap();
        let env = EnvironmentParams::new(0.0, 0.0, 0.0, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = run(
            &mut landscape,
            &env,
            &mut rng,
            &CancellationToken::new(),
            &mut NullObserver,
        )
        .unwrap();
        let metrics = outcome.metrics().copied().unwrap();
        assert_eq!(metrics.steps_taken, 3);
        assert_eq!(metrics.burned_count, 1);
        assert_eq!(metrics.burned_fraction, 1.0);
    }

    #[test]
    fn test_isolated_primary_tree_burns_for_its_timer() {
        let mut landscape = island(CellState::TreePrimary);
        ignite_at(&mut landscape, 50, 50).unwrap();
        let env = EnvironmentParams::new(0.5, 0.5, 0.0, 0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let outcome = run(
            &mut landscape,
            &env,
            &mut rng,
            &CancellationToken::new(),
            &mut NullObserver,
        )
        .unwrap();
        assert_eq!(outcome.steps_taken(), 10);
        assert_eq!(outcome.metrics().unwrap().burned_count, 1);
    }

    #[test]
    fn test_heavy_rain_ends_run_in_one_step() {
        let mut landscape = island(CellState::TreePrimary);
        ignite_at(&mut landscape, 50, 50).unwrap();
        let env = EnvironmentParams::new(0.0, 1.0, 1.0, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let outcome = run(
            &mut landscape,
            &env,
            &mut rng,
            &CancellationToken::new(),
            &mut NullObserver,
        )
        .unwrap();
        assert_eq!(outcome.steps_taken(), 1);
        assert_eq!(outcome.metrics().unwrap().burned_count, 1);
    }

    #[test]
    fn test_nothing_burning_reports_zero_steps() {
        let mut landscape = island(CellState::TreePrimary);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let outcome = run(
            &mut landscape,
            &EnvironmentParams::default(),
            &mut rng,
            &CancellationToken::new(),
            &mut NullObserver,
        )
        .unwrap();
        let metrics = outcome.metrics().unwrap();
        assert_eq!(metrics.steps_taken, 0);
        assert_eq!(metrics.burned_count, 0);
    }

    #[test]
    fn test_no_flammable_cells_fails_fast() {
        let mut landscape = Landscape::filled(10, 10, CellState::Rock).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let result = run(
            &mut landscape,
            &EnvironmentParams::default(),
            &mut rng,
            &CancellationToken::new(),
            &mut NullObserver,
        );
        assert!(matches!(result, Err(SimError::InvalidState(_))));
    }

    #[test]
    fn test_invalid_environment_rejected() {
        let mut landscape = island(CellState::TreePrimary);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let env = EnvironmentParams::new(0.0, 0.0, 2.0, 0.0);
        let result = run(
            &mut landscape,
            &env,
            &mut rng,
            &CancellationToken::new(),
            &mut NullObserver,
        );
        assert!(matches!(result, Err(SimError::InvalidInput { .. })));
    }

    #[test]
    fn test_pre_cancelled_run_takes_no_step() {
        let mut landscape = island(CellState::TreePrimary);
        ignite_at(&mut landscape, 50, 50).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let outcome = run(
            &mut landscape,
            &EnvironmentParams::default(),
            &mut rng,
            &cancel,
            &mut NullObserver,
        )
        .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Cancelled {
                steps_taken: 0,
                burning_remaining: 1
            }
        );
        assert!(outcome.metrics().is_none());
        assert_eq!(landscape.burning_count(), 1);
    }

    #[test]
    fn test_simulation_restart_restores_snapshot() {
        let generator = LandscapeGenerator::new(LandscapeConfig {
            rows: 30,
            cols: 30,
            ..Default::default()
        })
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut sim = Simulation::generate(&generator, EnvironmentParams::default(), &mut rng)
            .unwrap();

        sim.ignite_random(&mut rng).unwrap();
        sim.run(&mut rng, &CancellationToken::new(), &mut NullObserver)
            .unwrap();
        assert!(sim.landscape().burnt_count() >= 1);

        sim.restart();
        assert_eq!(sim.landscape(), sim.initial().as_ref());
        assert!(sim.ignition().is_none());
    }

    #[test]
    fn test_set_environment_keeps_previous_on_error() {
        let mut sim = Simulation::new(island(CellState::TreePrimary), EnvironmentParams::default())
            .unwrap();
        let bad = EnvironmentParams::new(-0.1, 0.0, 0.0, 0.0);
        assert!(sim.set_environment(bad).is_err());
        assert_eq!(*sim.environment(), EnvironmentParams::default());
    }

    #[test]
    fn test_run_fresh_repeats_from_snapshot() {
        let mut sim = Simulation::new(island(CellState::TreeSecondary), EnvironmentParams::default())
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let cancel = CancellationToken::new();
        for _ in 0..3 {
            let outcome = sim.run_fresh(&mut rng, &cancel).unwrap();
            assert_eq!(outcome.metrics().unwrap().burned_count, 1);
        }
    }
}
