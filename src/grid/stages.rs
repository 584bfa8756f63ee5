//! Type-state derivation of [`GridParameters`].
use super::{build_grid, compute_neighbor_radius, compute_norm, ImageParams};
use crate::error::Result;
use log::debug;

/// Validated physical configuration, nothing derived yet.
#[derive(Clone, Debug)]
pub struct Unconfigured {
    params: ImageParams,
}

/// Grid samples available.
#[derive(Clone, Debug)]
pub struct GridBuilt {
    params: ImageParams,
    grid: Vec<f64>,
}

/// Grid samples plus neighbor half-window.
#[derive(Clone, Debug)]
pub struct NeighborsComputed {
    params: ImageParams,
    grid: Vec<f64>,
    n_neigh: usize,
}

/// Fully derived, immutable rasterization parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GridParameters {
    n_pixels: usize,
    pixel_size: f64,
    sigma: f64,
    n_neigh: usize,
    grid: Vec<f64>,
    norm: f64,
}

impl Unconfigured {
    pub fn new(params: ImageParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn build_grid(self) -> Result<GridBuilt> {
        let grid = build_grid(self.params.n_pixels, self.params.pixel_size)?;
        debug!(
            "grid: {} samples in [{:.4}, {:.4}]",
            grid.len(),
            grid.first().copied().unwrap_or_default(),
            grid.last().copied().unwrap_or_default()
        );
        Ok(GridBuilt {
            params: self.params,
            grid,
        })
    }
}

impl GridBuilt {
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn compute_neighbors(self) -> Result<NeighborsComputed> {
        let n_neigh = compute_neighbor_radius(self.params.sigma, self.params.pixel_size)?;
        debug!("neighbor half-window: {n_neigh} px");
        Ok(NeighborsComputed {
            params: self.params,
            grid: self.grid,
            n_neigh,
        })
    }
}

impl NeighborsComputed {
    pub fn n_neigh(&self) -> usize {
        self.n_neigh
    }

    /// Final stage; the scalar depends on the atom count of the structure.
    pub fn normalize(self, n_atoms: usize) -> Result<GridParameters> {
        let norm = compute_norm(self.params.sigma, n_atoms)?;
        debug!("normalization for {n_atoms} atoms: {norm:e}");
        Ok(GridParameters {
            n_pixels: self.params.n_pixels,
            pixel_size: self.params.pixel_size,
            sigma: self.params.sigma,
            n_neigh: self.n_neigh,
            grid: self.grid,
            norm,
        })
    }
}

impl GridParameters {
    /// Run every stage in order.
    pub fn derive(params: ImageParams, n_atoms: usize) -> Result<Self> {
        Unconfigured::new(params)?
            .build_grid()?
            .compute_neighbors()?
            .normalize(n_atoms)
    }

    pub fn n_pixels(&self) -> usize {
        self.n_pixels
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn n_neigh(&self) -> usize {
        self.n_neigh
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// Length of a 1D kernel window: `2 * n_neigh + 3`, saturating.
    pub fn window_len(&self) -> usize {
        self.n_neigh.saturating_mul(2).saturating_add(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageGenError;

    fn params() -> ImageParams {
        ImageParams {
            n_pixels: 32,
            pixel_size: 1.5,
            sigma: 2.0,
        }
    }

    #[test]
    fn stages_chain_into_parameters() {
        let built = Unconfigured::new(params()).unwrap().build_grid().unwrap();
        assert_eq!(built.grid().len(), 32);
        let neigh = built.compute_neighbors().unwrap();
        assert_eq!(neigh.n_neigh(), 4);
        let p = neigh.normalize(100).unwrap();
        assert_eq!(p.window_len(), 11);
        assert_eq!(p, GridParameters::derive(params(), 100).unwrap());
    }

    #[test]
    fn invalid_sigma_is_rejected_before_any_stage() {
        let bad = ImageParams {
            sigma: -1.0,
            ..params()
        };
        assert!(matches!(
            Unconfigured::new(bad),
            Err(ImageGenError::Configuration(_))
        ));
    }
}
