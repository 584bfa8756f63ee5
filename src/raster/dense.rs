//! Untruncated reference kernel: every atom is evaluated over the whole grid.
use crate::grid::GridParameters;
use crate::image::IntensityImage;
use crate::types::AtomSet;

/// Dense single-threaded rasterization with the same normalization as the
/// windowed path. Cost is `O(N · n²)`; meant for validation and small runs.
pub fn rasterize_dense(atoms: &AtomSet, params: &GridParameters) -> IntensityImage {
    let n = params.n_pixels();
    let grid = params.grid();
    let inv_sigma = 1.0 / params.sigma();
    let mut img = IntensityImage::new(n);
    let mut gauss_x = vec![0.0; n];
    let mut gauss_y = vec![0.0; n];

    for p in atoms.positions() {
        for (i, &g) in grid.iter().enumerate() {
            let ex = (g - p.x) * inv_sigma;
            gauss_x[i] = (-0.5 * ex * ex).exp();
            let ey = (g - p.y) * inv_sigma;
            gauss_y[i] = (-0.5 * ey * ey).exp();
        }
        for (row, &gx) in gauss_x.iter().enumerate() {
            let dst = &mut img.data[row * n..(row + 1) * n];
            for (v, &gy) in dst.iter_mut().zip(&gauss_y) {
                *v += gx * gy;
            }
        }
    }

    let norm = params.norm();
    img.data.iter_mut().for_each(|v| *v *= norm);
    img
}
