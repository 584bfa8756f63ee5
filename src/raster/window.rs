//! 1D truncated Gaussian windows around an atom's nearest grid sample.
use crate::grid::GridParameters;

/// Nearest grid index along one axis.
///
/// Measured as the absolute distance from the *first* grid sample, which is
/// the coordinate minimum for the centered ascending grid; a grid that does
/// not start at its minimum would pick the wrong cell here. NaN maps to index
/// 0 and infinities saturate, so a degenerate coordinate still runs through
/// the kernel arithmetic instead of being filtered out.
#[inline]
pub fn nearest_index(coord: f64, grid: &[f64], pixel_size: f64) -> i64 {
    let first = grid.first().copied().unwrap_or(0.0);
    ((coord - first).abs() / pixel_size).round() as i64
}

/// Unnormalized Gaussian weights over the part of the `2 * n_neigh + 3`
/// index window around an atom that lies inside the grid.
///
/// Window slots outside the grid would carry zero weight, so only the
/// in-grid run `start..start + weights.len()` is stored; its length never
/// exceeds `n_pixels` however large the radius is.
#[derive(Clone, Debug)]
pub struct AxisWindow {
    start: usize,
    weights: Vec<f64>,
}

impl AxisWindow {
    pub fn new(params: &GridParameters) -> Self {
        Self {
            start: 0,
            weights: Vec::with_capacity(params.window_len().min(params.n_pixels())),
        }
    }

    /// Recenter on `coord` and recompute every in-grid slot.
    pub fn fill(&mut self, coord: f64, params: &GridParameters) {
        let grid = params.grid();
        let m = nearest_index(coord, grid, params.pixel_size());
        let reach = i64::try_from(params.n_neigh())
            .unwrap_or(i64::MAX)
            .saturating_add(1);
        let lo = m.saturating_sub(reach).max(0);
        let hi = m.saturating_add(reach).min(grid.len() as i64 - 1);

        self.weights.clear();
        self.start = 0;
        if lo > hi {
            return;
        }
        self.start = lo as usize;
        let inv_sigma = 1.0 / params.sigma();
        self.weights.extend(grid[lo as usize..=hi as usize].iter().map(|&g| {
            let e = (g - coord) * inv_sigma;
            (-0.5 * e * e).exp()
        }));
    }

    /// `(grid index, weight)` for every slot that lies inside the grid.
    pub fn taps(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.weights
            .iter()
            .enumerate()
            .map(|(k, &w)| (self.start + k, w))
    }

    /// Weights of the in-grid slots, in grid order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}
