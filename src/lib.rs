#![doc = include_str!("../README.md")]

pub mod config;
pub mod ctf;
pub mod error;
pub mod grid;
pub mod image;
pub mod noise;
pub mod orchestrator;
pub mod orientation;
pub mod raster;
pub mod rotate;
pub mod sink;
pub mod types;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{ImageGenError, Result};
pub use crate::grid::{GridParameters, ImageParams};
pub use crate::image::IntensityImage;
pub use crate::orchestrator::{run_worker, WorkerSummary};
pub use crate::orientation::OrientationSampler;
pub use crate::raster::{rasterize_dense, rasterize_serial, KernelMode, Rasterizer};
pub use crate::rotate::rotate;
pub use crate::sink::{FileSink, ImageSink, MemorySink};
pub use crate::types::{AtomSet, Image};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use em_image_gen::prelude::*;
/// use nalgebra::Vector3;
///
/// # fn main() -> em_image_gen::Result<()> {
/// let atoms = AtomSet::from_positions(vec![Vector3::new(0.0, 0.0, 0.0)]);
/// let params = GridParameters::derive(ImageParams::default(), atoms.len())?;
/// let mut sampler = OrientationSampler::new(Some(1));
/// let q = sampler.sample();
/// let img = Rasterizer::new(4)?.rasterize(&rotate(&q, &atoms)?, &params);
/// println!("total intensity {:.4}", img.total());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        rotate, AtomSet, GridParameters, ImageParams, IntensityImage, OrientationSampler,
        Rasterizer,
    };
}
