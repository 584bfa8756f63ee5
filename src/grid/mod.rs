//! Sampling grid, neighbor window and normalization for projection images.
//!
//! The grid is derived in fixed stages, see [`stages`]:
//! `Unconfigured → GridBuilt → NeighborsComputed → GridParameters`.
//! Each stage consumes the previous one, so the derivation cannot run out of
//! order and the final [`GridParameters`] is immutable and shared read-only by
//! every image of a run.

pub mod stages;

use crate::error::{ImageGenError, Result};
use serde::{Deserialize, Serialize};

pub use stages::{GridBuilt, GridParameters, NeighborsComputed, Unconfigured};

/// Half-window size in units of sigma; Gaussian tails beyond it are dropped.
pub const NEIGHBOR_SIGMAS: f64 = 3.0;

/// Physical image configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageParams {
    /// Pixels per image side.
    pub n_pixels: usize,
    /// Pixel edge length in the coordinate unit (Angstrom).
    pub pixel_size: f64,
    /// Standard deviation of the per-atom Gaussian.
    pub sigma: f64,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            n_pixels: 64,
            pixel_size: 1.0,
            sigma: 1.0,
        }
    }
}

impl ImageParams {
    pub fn validate(&self) -> Result<()> {
        check_pixels(self.n_pixels, self.pixel_size)?;
        check_sigma(self.sigma)
    }
}

fn check_pixels(n_pixels: usize, pixel_size: f64) -> Result<()> {
    if n_pixels == 0 {
        return Err(ImageGenError::config("pixel count must be positive"));
    }
    if !(pixel_size.is_finite() && pixel_size > 0.0) {
        return Err(ImageGenError::config(format!(
            "pixel size must be positive and finite, got {pixel_size}"
        )));
    }
    Ok(())
}

fn check_sigma(sigma: f64) -> Result<()> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(ImageGenError::config(format!(
            "sigma must be positive and finite, got {sigma}"
        )));
    }
    Ok(())
}

/// Sample coordinates centered on the origin, ascending from
/// `-pixel_size * (n_pixels - 1) / 2` in steps of `pixel_size`.
///
/// Samples are computed from their index rather than accumulated, so the
/// middle sample of an odd grid is exactly zero.
pub fn build_grid(n_pixels: usize, pixel_size: f64) -> Result<Vec<f64>> {
    check_pixels(n_pixels, pixel_size)?;
    let grid_min = -pixel_size * (n_pixels - 1) as f64 * 0.5;
    Ok((0..n_pixels)
        .map(|i| grid_min + i as f64 * pixel_size)
        .collect())
}

/// Integer half-window covering [`NEIGHBOR_SIGMAS`] standard deviations.
pub fn compute_neighbor_radius(sigma: f64, pixel_size: f64) -> Result<usize> {
    check_sigma(sigma)?;
    if !(pixel_size.is_finite() && pixel_size > 0.0) {
        return Err(ImageGenError::config(format!(
            "pixel size must be positive and finite, got {pixel_size}"
        )));
    }
    Ok((NEIGHBOR_SIGMAS * sigma / pixel_size).ceil() as usize)
}

/// Scalar applied to every pixel after accumulation: `1 / (2π σ² N)`.
///
/// A full 2D Gaussian integrates to `2π σ²`, so each atom contributes a mass
/// of `1 / N` and the whole projection integrates to one. An empty atom set
/// is treated as `N = 1`.
pub fn compute_norm(sigma: f64, n_atoms: usize) -> Result<f64> {
    check_sigma(sigma)?;
    let n = n_atoms.max(1) as f64;
    Ok(1.0 / (2.0 * std::f64::consts::PI * sigma * sigma * n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_centered_and_ascending() {
        let grid = build_grid(5, 0.5).unwrap();
        assert_eq!(grid, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);

        let even = build_grid(4, 2.0).unwrap();
        assert_eq!(even, vec![-3.0, -1.0, 1.0, 3.0]);
        assert!(even.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn odd_grid_has_exact_zero_center() {
        for &ps in &[0.1, 0.37, 1.3, 2.2] {
            let grid = build_grid(129, ps).unwrap();
            assert_eq!(grid[64], 0.0, "pixel_size={ps}");
        }
    }

    #[test]
    fn zero_pixels_is_a_configuration_error() {
        assert!(matches!(
            build_grid(0, 1.0),
            Err(ImageGenError::Configuration(_))
        ));
        assert!(build_grid(8, 0.0).is_err());
        assert!(build_grid(8, f64::NAN).is_err());
    }

    #[test]
    fn neighbor_radius_covers_three_sigma() {
        assert_eq!(compute_neighbor_radius(1.0, 1.0).unwrap(), 3);
        assert_eq!(compute_neighbor_radius(0.5, 1.0).unwrap(), 2);
        assert_eq!(compute_neighbor_radius(2.0, 0.7).unwrap(), 9);
        assert!(compute_neighbor_radius(0.0, 1.0).is_err());
        assert!(compute_neighbor_radius(-1.0, 1.0).is_err());
    }

    #[test]
    fn norm_is_bit_reproducible() {
        let a = compute_norm(1.7, 1234).unwrap();
        for _ in 0..16 {
            assert_eq!(compute_norm(1.7, 1234).unwrap().to_bits(), a.to_bits());
        }
        let expected = 1.0 / (2.0 * std::f64::consts::PI * 1.7 * 1.7 * 1234.0);
        assert_eq!(a, expected);
    }

    #[test]
    fn norm_of_empty_set_stays_finite() {
        assert!(compute_norm(1.0, 0).unwrap().is_finite());
        assert!(compute_norm(0.0, 10).is_err());
    }
}
