//! Landscape grid: field storage, generation and smoothing

pub mod fields;
pub mod generator;
pub mod landscape;
pub mod smoothing;

// Re-export main types
pub use fields::{FieldData, MOORE_OFFSETS};
pub use generator::{
    add_rock_clusters, add_water_clusters, base_fill, LandscapeConfig, LandscapeGenerator,
    WaterClusterParams,
};
pub use landscape::Landscape;
pub use smoothing::gaussian_blur;
