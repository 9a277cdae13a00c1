//! Synthetic landscape generation
//!
//! Generation runs in three passes over a fresh grid:
//!
//! 1. Base fill: every cell is a `TreePrimary` (p = 0.6) or `TreeSecondary`,
//!    moisture is uniform in `[0, 1)`, timers are zero.
//! 2. Rock overlay: square clusters dropped at random anchors.
//! 3. Water overlay: a blurred Bernoulli mask thresholded into water bodies.
//!
//! All randomness comes from the caller's RNG, so a seeded RNG reproduces a
//! landscape exactly.

use super::fields::FieldData;
use super::landscape::Landscape;
use super::smoothing::gaussian_blur;
use crate::core_types::CellState;
use crate::error::SimError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Water body overlay parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterClusterParams {
    /// Per-cell probability of seeding the water mask (0.0-1.0)
    pub probability: f32,
    /// Standard deviation of the smoothing kernel, in cells
    pub sigma: f32,
    /// Smoothed mask values strictly above this become water
    pub threshold: f32,
}

impl Default for WaterClusterParams {
    fn default() -> Self {
        Self {
            probability: 0.15,
            sigma: 3.0,
            threshold: 0.2,
        }
    }
}

/// Landscape generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandscapeConfig {
    /// Grid rows (height)
    pub rows: usize,
    /// Grid columns (width)
    pub cols: usize,
    /// Probability that a base cell is `TreePrimary` rather than `TreeSecondary`
    pub primary_tree_probability: f32,
    /// Number of rock clusters dropped on the grid
    pub rock_clusters: usize,
    /// Largest rock cluster edge length, in cells
    pub max_rock_cluster_size: usize,
    /// Water body overlay
    pub water: WaterClusterParams,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            rows: 100,
            cols: 100,
            primary_tree_probability: 0.6,
            rock_clusters: 50,
            max_rock_cluster_size: 5,
            water: WaterClusterParams::default(),
        }
    }
}

impl LandscapeConfig {
    /// Check dimensions and probabilities.
    ///
    /// # Errors
    /// [`SimError::InvalidConfig`] describing the first inconsistent value.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SimError::InvalidConfig(format!(
                "grid must have at least one cell, got {}x{}",
                self.rows, self.cols
            )));
        }
        if !(0.0..=1.0).contains(&self.primary_tree_probability) {
            return Err(SimError::InvalidConfig(format!(
                "primary_tree_probability must be in [0, 1], got {}",
                self.primary_tree_probability
            )));
        }
        if self.rock_clusters > 0 && self.max_rock_cluster_size == 0 {
            return Err(SimError::InvalidConfig(
                "max_rock_cluster_size must be at least 1 when rock clusters are requested".into(),
            ));
        }
        let water = &self.water;
        if !(0.0..=1.0).contains(&water.probability) {
            return Err(SimError::InvalidConfig(format!(
                "water probability must be in [0, 1], got {}",
                water.probability
            )));
        }
        if !(water.sigma.is_finite() && water.sigma >= 0.0) || !water.threshold.is_finite() {
            return Err(SimError::InvalidConfig(format!(
                "water smoothing needs a finite sigma >= 0 and finite threshold, got sigma {} threshold {}",
                water.sigma, water.threshold
            )));
        }
        Ok(())
    }
}

/// Produces fresh random landscapes from a [`LandscapeConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeGenerator {
    config: LandscapeConfig,
}

impl LandscapeGenerator {
    /// Create a generator after validating `config`.
    ///
    /// # Errors
    /// [`SimError::InvalidConfig`] if the configuration is inconsistent.
    pub fn new(config: LandscapeConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LandscapeConfig {
        &self.config
    }

    /// Generate a new landscape: base fill, rock clusters, water clusters.
    ///
    /// # Errors
    /// Only if the assembled fields violate a landscape invariant, which
    /// indicates a bug in the passes above.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Landscape, SimError> {
        let cfg = &self.config;
        let (mut cells, moisture, burn_timers) =
            base_fill(cfg.cols, cfg.rows, cfg.primary_tree_probability, rng);
        add_rock_clusters(&mut cells, cfg.rock_clusters, cfg.max_rock_cluster_size, rng);
        add_water_clusters(&mut cells, &cfg.water, rng);

        let landscape = Landscape::from_fields(cells, moisture, burn_timers)?;
        info!(
            "Generated {}x{} landscape: {} flammable cells, {} rock, {} water",
            landscape.height(),
            landscape.width(),
            landscape.total_flammable(),
            landscape.count(CellState::Rock),
            landscape.count(CellState::Water)
        );
        Ok(landscape)
    }
}

/// Base fill: random tree subtypes, uniform moisture, zero timers.
pub fn base_fill<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    primary_tree_probability: f32,
    rng: &mut R,
) -> (FieldData<CellState>, FieldData<f32>, FieldData<u8>) {
    let mut cells = FieldData::with_value(width, height, CellState::TreeSecondary);
    for cell in cells.as_mut_slice() {
        if rng.random::<f32>() < primary_tree_probability {
            *cell = CellState::TreePrimary;
        }
    }

    let mut moisture = FieldData::new(width, height);
    for m in moisture.as_mut_slice() {
        *m = rng.random::<f32>();
    }

    (cells, moisture, FieldData::new(width, height))
}

/// Drop `count` square rock clusters with edge lengths in `[1, max_size]`.
///
/// Each cluster extends right and down from a uniformly chosen anchor and is
/// clipped at the grid border. Overlapping clusters simply merge.
pub fn add_rock_clusters<R: Rng + ?Sized>(
    cells: &mut FieldData<CellState>,
    count: usize,
    max_size: usize,
    rng: &mut R,
) {
    if cells.is_empty() || max_size == 0 {
        return;
    }
    for _ in 0..count {
        let anchor_x = rng.random_range(0..cells.width);
        let anchor_y = rng.random_range(0..cells.height);
        let size = rng.random_range(1..=max_size);
        debug!("Rock cluster at ({anchor_x}, {anchor_y}) size {size}");

        for y in anchor_y..(anchor_y + size).min(cells.height) {
            for x in anchor_x..(anchor_x + size).min(cells.width) {
                cells.set(x, y, CellState::Rock);
            }
        }
    }
}

/// Overlay water bodies from a smoothed Bernoulli mask.
///
/// Cells whose smoothed mask value exceeds the threshold become `Water`,
/// overwriting trees and rock. A zero probability never produces water.
pub fn add_water_clusters<R: Rng + ?Sized>(
    cells: &mut FieldData<CellState>,
    params: &WaterClusterParams,
    rng: &mut R,
) {
    if params.probability <= 0.0 || cells.is_empty() {
        return;
    }

    let mut mask = FieldData::new(cells.width, cells.height);
    for m in mask.as_mut_slice() {
        if rng.random::<f32>() < params.probability {
            *m = 1.0_f32;
        }
    }
    let smoothed = gaussian_blur(&mask, params.sigma);

    for (cell, &value) in cells.as_mut_slice().iter_mut().zip(smoothed.as_slice()) {
        if value > params.threshold {
            *cell = CellState::Water;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_base_fill_only_trees() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (cells, moisture, timers) = base_fill(50, 40, 0.6, &mut rng);

        assert_eq!((cells.width, cells.height), (50, 40));
        assert!(cells.as_slice().iter().all(|s| s.is_flammable()));
        assert!(moisture.as_slice().iter().all(|m| (0.0..=1.0).contains(m)));
        assert!(timers.as_slice().iter().all(|&t| t == 0));

        // 2000 draws at p = 0.6
        let primary = cells.count_where(|s| s == CellState::TreePrimary) as f32 / 2000.0;
        assert!((0.5..0.7).contains(&primary), "primary share {primary}");
    }

    #[test]
    fn test_rock_clusters_bounded_by_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut cells = FieldData::with_value(20, 20, CellState::TreePrimary);
        add_rock_clusters(&mut cells, 1, 3, &mut rng);
        let rock = cells.count_where(|s| s == CellState::Rock);
        assert!((1..=9).contains(&rock), "rock cells {rock}");
    }

    #[test]
    fn test_rock_clusters_clip_at_border() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut cells = FieldData::with_value(1, 1, CellState::TreePrimary);
        add_rock_clusters(&mut cells, 5, 5, &mut rng);
        assert_eq!(cells.get(0, 0), CellState::Rock);
    }

    #[test]
    fn test_zero_probability_water_never_appears() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut cells = FieldData::with_value(30, 30, CellState::TreePrimary);
        for threshold in [-1.0, 0.0, 0.2] {
            let params = WaterClusterParams {
                probability: 0.0,
                sigma: 3.0,
                threshold,
            };
            add_water_clusters(&mut cells, &params, &mut rng);
        }
        assert_eq!(cells.count_where(|s| s == CellState::Water), 0);
    }

    #[test]
    fn test_full_probability_water_covers_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut cells = FieldData::with_value(10, 10, CellState::Rock);
        let params = WaterClusterParams {
            probability: 1.0,
            sigma: 1.0,
            threshold: 0.5,
        };
        add_water_clusters(&mut cells, &params, &mut rng);
        assert!(cells.as_slice().iter().all(|&s| s == CellState::Water));
    }

    #[test]
    fn test_generate_is_reproducible_from_seed() {
        let generator = LandscapeGenerator::new(LandscapeConfig::default()).unwrap();
        let a = generator.generate(&mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = generator.generate(&mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!((a.width(), a.height()), (100, 100));
        assert!(a.total_flammable() > 0);
        assert!(a.count(CellState::Rock) > 0);
        assert_eq!(a.burning_count(), 0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = LandscapeConfig {
            rows: 0,
            ..Default::default()
        };
        assert!(LandscapeGenerator::new(config.clone()).is_err());

        config.rows = 10;
        config.water.probability = 1.5;
        assert!(matches!(
            LandscapeGenerator::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
