//! Separable Gaussian smoothing of scalar fields
//!
//! Used to turn an uncorrelated Bernoulli mask into a spatially correlated
//! field, so thresholding it yields organic water bodies instead of speckle.
//!
//! The kernel is truncated at `floor(4σ + 0.5)` cells and borders are
//! half-sample symmetric (`d c b a | a b c d | d c b a`), the conventions of
//! the usual scientific `gaussian_filter`.

use super::fields::FieldData;
use rayon::prelude::*;

/// Kernel extent in standard deviations
const TRUNCATE_SIGMAS: f32 = 4.0;

/// Normalized 1D Gaussian kernel of length `2 * radius + 1`.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = kernel_radius(sigma);
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-(radius as i32)..=radius as i32)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Half-width of the kernel used for `sigma`.
#[inline]
pub fn kernel_radius(sigma: f32) -> usize {
    (TRUNCATE_SIGMAS * sigma + 0.5).floor().max(0.0) as usize
}

/// Map an out-of-range index back into `[0, len)` by half-sample reflection.
#[inline]
fn reflect_index(index: i64, len: usize) -> usize {
    let period = 2 * len as i64;
    let wrapped = index.rem_euclid(period);
    if wrapped >= len as i64 {
        (period - 1 - wrapped) as usize
    } else {
        wrapped as usize
    }
}

/// Blur `field` with an isotropic Gaussian of standard deviation `sigma` (in cells).
///
/// Non-positive or non-finite `sigma` returns an unchanged copy. Both passes
/// run row-parallel; each task writes only its own output row.
pub fn gaussian_blur(field: &FieldData<f32>, sigma: f32) -> FieldData<f32> {
    if !(sigma.is_finite() && sigma > 0.0) || field.is_empty() {
        return field.clone();
    }

    let width = field.width;
    let height = field.height;
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as i64;
    let input = field.as_slice();

    // Horizontal pass
    let mut horizontal = vec![0.0_f32; width * height];
    horizontal
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let src = &input[y * width..(y + 1) * width];
            for (x, out) in row.iter_mut().enumerate() {
                *out = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * src[reflect_index(x as i64 + k as i64 - radius, width)])
                    .sum();
            }
        });

    // Vertical pass
    let mut blurred = vec![0.0_f32; width * height];
    blurred
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let sy = reflect_index(y as i64 + k as i64 - radius, height);
                        w * horizontal[sy * width + x]
                    })
                    .sum();
            }
        });

    FieldData {
        data: blurred,
        width,
        height,
    }
}
