//! Separable Gaussian splatting of atom sets onto the projection grid.
//!
//! Every atom contributes `gx[i] * gy[j]` to pixel `(row = x index,
//! col = y index)` where `gx`, `gy` are 1D Gaussians truncated to a window of
//! `2 * n_neigh + 3` samples around the atom's nearest grid index (see
//! [`window`]). This costs `O(window)` exponentials and `O(window²)`
//! multiply-adds per atom instead of a dense 2D evaluation.
//!
//! Threading: atoms are split into one contiguous slice per thread, each slice
//! accumulates into its own zeroed full-size buffer, and the buffers are
//! summed element-wise. Only once that reduction has returned is every pixel
//! scaled by the normalization constant. Summation order depends on the thread
//! count, so results agree with the single-threaded path to rounding only.

pub mod dense;
pub mod window;

use crate::error::Result;
use crate::grid::GridParameters;
use crate::image::IntensityImage;
use crate::types::AtomSet;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use window::AxisWindow;

#[cfg(feature = "parallel")]
use crate::error::ImageGenError;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use dense::rasterize_dense;

/// Which kernel evaluation to use for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelMode {
    /// Truncated window around each atom, multi-threaded.
    #[default]
    Windowed,
    /// Full-grid evaluation, single-threaded reference.
    Dense,
}

/// Windowed rasterizer bound to a fixed thread count.
pub struct Rasterizer {
    threads: usize,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl Rasterizer {
    /// Build a rasterizer using `threads` worker threads (at least one).
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("raster-{i}"))
            .build()
            .map_err(|e| ImageGenError::config(format!("failed to start thread pool: {e}")))?;
        Ok(Self {
            threads,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Rasterize with the windowed kernel and return normalized intensities.
    pub fn rasterize(&self, atoms: &AtomSet, params: &GridParameters) -> IntensityImage {
        let n = params.n_pixels();
        let positions = atoms.positions();
        let chunk = positions.len().div_ceil(self.threads).max(1);
        let mut data = self.accumulate_slices(positions, chunk, params);
        // The reduction above has fully returned: scaling never sees partial sums.
        self.scale(&mut data, params.norm());
        IntensityImage { n, data }
    }

    /// Select the kernel at run time.
    pub fn rasterize_with(
        &self,
        mode: KernelMode,
        atoms: &AtomSet,
        params: &GridParameters,
    ) -> IntensityImage {
        match mode {
            KernelMode::Windowed => self.rasterize(atoms, params),
            KernelMode::Dense => rasterize_dense(atoms, params),
        }
    }

    #[cfg(feature = "parallel")]
    fn accumulate_slices(
        &self,
        positions: &[Vector3<f64>],
        chunk: usize,
        params: &GridParameters,
    ) -> Vec<f64> {
        let len = params.n_pixels() * params.n_pixels();
        self.pool.install(|| {
            positions
                .par_chunks(chunk)
                .map(|slice| accumulate(slice, params))
                .reduce(|| vec![0.0; len], sum_into)
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn accumulate_slices(
        &self,
        positions: &[Vector3<f64>],
        chunk: usize,
        params: &GridParameters,
    ) -> Vec<f64> {
        let len = params.n_pixels() * params.n_pixels();
        positions
            .chunks(chunk)
            .map(|slice| accumulate(slice, params))
            .fold(vec![0.0; len], sum_into)
    }

    #[cfg(feature = "parallel")]
    fn scale(&self, data: &mut [f64], norm: f64) {
        let min_len = (data.len() / self.threads).max(1);
        self.pool.install(|| {
            data.par_iter_mut()
                .with_min_len(min_len)
                .for_each(|v| *v *= norm)
        });
    }

    #[cfg(not(feature = "parallel"))]
    fn scale(&self, data: &mut [f64], norm: f64) {
        data.iter_mut().for_each(|v| *v *= norm);
    }
}

/// Single-threaded windowed rasterization; the numerical baseline for the
/// threaded path.
pub fn rasterize_serial(atoms: &AtomSet, params: &GridParameters) -> IntensityImage {
    let mut data = accumulate(atoms.positions(), params);
    let norm = params.norm();
    data.iter_mut().for_each(|v| *v *= norm);
    IntensityImage {
        n: params.n_pixels(),
        data,
    }
}

/// Unnormalized splat of `positions` into a fresh zeroed buffer.
fn accumulate(positions: &[Vector3<f64>], params: &GridParameters) -> Vec<f64> {
    let n = params.n_pixels();
    let mut buf = vec![0.0; n * n];
    let mut wx = AxisWindow::new(params);
    let mut wy = AxisWindow::new(params);
    for p in positions {
        wx.fill(p.x, params);
        wy.fill(p.y, params);
        splat(&mut buf, n, &wx, &wy);
    }
    buf
}

/// Add the outer product of two windows into a row-major `n × n` buffer.
#[inline]
fn splat(buf: &mut [f64], n: usize, wx: &AxisWindow, wy: &AxisWindow) {
    for (row, gx) in wx.taps() {
        let dst = &mut buf[row * n..(row + 1) * n];
        for (col, gy) in wy.taps() {
            dst[col] += gx * gy;
        }
    }
}

fn sum_into(mut acc: Vec<f64>, part: Vec<f64>) -> Vec<f64> {
    for (a, b) in acc.iter_mut().zip(&part) {
        *a += b;
    }
    acc
}
