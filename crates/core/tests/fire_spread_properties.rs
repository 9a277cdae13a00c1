//! Whole-run properties of the fire spread engine
//!
//! These tests drive generated and hand-built landscapes through complete
//! runs and check the conservation rules every step must respect.

use approx::assert_relative_eq;
use ctor::ctor;
use forest_fire_core::{
    ignite_at, run, step, CancellationToken, CellState, EnvironmentParams, FieldData, Landscape,
    LandscapeConfig, LandscapeGenerator, NullObserver, RunOutcome, Simulation, StepObserver,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn generated(seed: u64, rows: usize, cols: usize) -> (Landscape, ChaCha8Rng) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let generator = LandscapeGenerator::new(LandscapeConfig {
        rows,
        cols,
        ..Default::default()
    })
    .unwrap();
    let landscape = generator.generate(&mut rng).unwrap();
    (landscape, rng)
}

/// Checks the per-step invariants against the previous frame
struct InvariantObserver {
    previous: Option<FieldData<CellState>>,
    total_flammable: usize,
    burnt_history: Vec<usize>,
}

impl InvariantObserver {
    fn new(total_flammable: usize) -> Self {
        Self {
            previous: None,
            total_flammable,
            burnt_history: Vec::new(),
        }
    }
}

impl StepObserver for InvariantObserver {
    fn observe(&mut self, _step: usize, _rain_active: bool, landscape: &Landscape) {
        let cells = landscape.cells.as_slice();
        let timers = landscape.burn_timers.as_slice();

        for (&state, &timer) in cells.iter().zip(timers) {
            assert_eq!(state.is_burning(), timer > 0, "{state:?} with timer {timer}");
            assert!(timer <= 10);
        }
        for &m in landscape.moisture.as_slice() {
            assert!((0.0..=1.0).contains(&m));
        }

        // Trees, fire and ash together are exactly the original fuel
        let fuel = landscape.flammable_count() + landscape.burning_count() + landscape.burnt_count();
        assert_eq!(fuel, self.total_flammable);

        if let Some(previous) = &self.previous {
            for (&before, &after) in previous.as_slice().iter().zip(cells) {
                match before {
                    CellState::Burning => {
                        assert!(matches!(after, CellState::Burning | CellState::Burnt));
                    }
                    CellState::Burnt | CellState::Ground | CellState::Rock | CellState::Water => {
                        assert_eq!(after, before);
                    }
                    CellState::TreePrimary | CellState::TreeSecondary => {
                        assert!(after == before || after == CellState::Burning);
                    }
                }
            }
        }

        self.burnt_history.push(landscape.burnt_count());
        self.previous = Some(landscape.cells.clone());
    }
}

#[test]
fn test_full_run_respects_step_invariants() {
    let (mut landscape, mut rng) = generated(2024, 60, 60);
    forest_fire_core::ignite_random(&mut landscape, &mut rng).unwrap();
    let env = EnvironmentParams::new(0.2, 0.3, 0.2, 0.8);
    let mut observer = InvariantObserver::new(landscape.total_flammable());

    let outcome = run(
        &mut landscape,
        &env,
        &mut rng,
        &CancellationToken::new(),
        &mut observer,
    )
    .unwrap();

    let metrics = outcome.metrics().copied().unwrap();
    assert_eq!(landscape.burning_count(), 0);
    assert_eq!(metrics.burned_count, landscape.burnt_count());
    assert!(metrics.burned_fraction > 0.0 && metrics.burned_fraction <= 1.0);
    assert_relative_eq!(
        metrics.burned_fraction,
        metrics.burned_count as f64 / metrics.total_flammable as f64
    );
    assert!(observer.burnt_history.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(observer.burnt_history.len(), metrics.steps_taken + 1);
}

#[test]
fn test_step_without_fire_only_dries() {
    let (width, height) = (6, 4);
    let mut cells = FieldData::with_value(width, height, CellState::TreePrimary);
    cells.set(2, 2, CellState::Rock);
    cells.set(3, 1, CellState::Burnt);
    let landscape = Landscape::from_fields(
        cells,
        FieldData::with_value(width, height, 0.5),
        FieldData::new(width, height),
    )
    .unwrap();
    let env = EnvironmentParams::new(0.0, 0.0, 0.0, 0.5).with_drying_effect(0.4);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let (next, summary) = step(&landscape, &env, true, &mut rng);
    assert_eq!(summary.burning, 0);
    assert_eq!(next.cells, landscape.cells);
    assert_eq!(next.burn_timers, landscape.burn_timers);
    for &m in next.moisture.as_slice() {
        assert_relative_eq!(m, 0.3, epsilon = 1e-6);
    }
}

#[test]
fn test_tree_surrounded_by_water_goes_out_quickly() {
    for seed in 0..8 {
        let mut cells = FieldData::with_value(100, 100, CellState::Water);
        cells.set(50, 50, CellState::TreeSecondary);
        let mut landscape = Landscape::from_cells(cells).unwrap();
        ignite_at(&mut landscape, 50, 50).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let outcome = run(
            &mut landscape,
            &EnvironmentParams::new(0.0, 0.9, 0.5, 1.0),
            &mut rng,
            &CancellationToken::new(),
            &mut NullObserver,
        )
        .unwrap();
        let metrics = outcome.metrics().unwrap();
        assert!(metrics.steps_taken <= 3, "took {} steps", metrics.steps_taken);
        assert_eq!(metrics.burned_count, 1);
        assert_eq!(metrics.burned_fraction, 1.0);
    }
}

#[test]
fn test_same_seed_same_outcome() {
    let env = EnvironmentParams::new(0.1, 0.5, 0.3, 0.6);
    let outcomes: Vec<(RunOutcome, Landscape)> = (0..2)
        .map(|_| {
            let (landscape, mut rng) = generated(99, 40, 40);
            let mut sim = Simulation::new(landscape, env).unwrap();
            let outcome = sim.run_fresh(&mut rng, &CancellationToken::new()).unwrap();
            (outcome, sim.landscape().clone())
        })
        .collect();

    assert_eq!(outcomes[0].0, outcomes[1].0);
    assert_eq!(outcomes[0].1, outcomes[1].1);
}

#[test]
fn test_dense_forest_in_dry_wind_burns_most_of_it() {
    let mut landscape = Landscape::filled(30, 30, CellState::TreePrimary).unwrap();
    ignite_at(&mut landscape, 15, 15).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    // p = 0.65 + 0.6 clamps to 1, so every neighbour of a live fire ignites
    let outcome = run(
        &mut landscape,
        &EnvironmentParams::new(0.0, 0.0, 0.0, 1.0),
        &mut rng,
        &CancellationToken::new(),
        &mut NullObserver,
    )
    .unwrap();
    let metrics = outcome.metrics().unwrap();
    assert_eq!(metrics.burned_count, 900);
    assert_eq!(metrics.burned_fraction, 1.0);
}

#[test]
fn test_cancel_from_observer_stops_run() {
    struct StopAt {
        at: usize,
        token: CancellationToken,
    }
    impl StepObserver for StopAt {
        fn observe(&mut self, step: usize, _rain_active: bool, _landscape: &Landscape) {
            if step == self.at {
                self.token.cancel();
            }
        }
    }

    let mut landscape = Landscape::filled(50, 50, CellState::TreePrimary).unwrap();
    ignite_at(&mut landscape, 0, 0).unwrap();
    let token = CancellationToken::new();
    let mut observer = StopAt {
        at: 4,
        token: token.clone(),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(6);

    let outcome = run(
        &mut landscape,
        &EnvironmentParams::new(0.0, 0.0, 0.0, 1.0),
        &mut rng,
        &token,
        &mut observer,
    )
    .unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(outcome.steps_taken(), 4);
    assert!(landscape.burning_count() > 0);
}
