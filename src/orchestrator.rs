//! Splits a run into per-worker image blocks and drives each image through
//! orientation → rotation → rasterization → (noise) → sink.
//!
//! Workers own disjoint contiguous index blocks of `n_imgs / world_size`
//! images and never communicate. Images past the last full block are not
//! generated by anyone.
use crate::config::{LaunchConfig, RunConfig};
use crate::ctf::CtfFilter;
use crate::error::{ImageGenError, Result};
use crate::grid::GridParameters;
use crate::noise::add_noise;
use crate::orientation::OrientationSampler;
use crate::raster::Rasterizer;
use crate::rotate::rotate;
use crate::sink::ImageSink;
use crate::types::{AtomSet, Image};
use log::{debug, info, warn};
use nalgebra::Quaternion;
use serde::Serialize;
use std::ops::Range;
use std::path::PathBuf;
use std::time::Instant;

/// Images handled by every worker; the remainder is dropped.
pub fn images_per_worker(n_imgs: usize, world_size: usize) -> Result<usize> {
    if world_size == 0 {
        return Err(ImageGenError::config("world size must be at least 1"));
    }
    let per = n_imgs / world_size;
    if per < 1 {
        return Err(ImageGenError::config(format!(
            "the number of images ({n_imgs}) must be at least the number of processes ({world_size})"
        )));
    }
    Ok(per)
}

/// Global image indices owned by `rank`.
pub fn worker_range(n_imgs: usize, world_size: usize, rank: usize) -> Result<Range<usize>> {
    let per = images_per_worker(n_imgs, world_size)?;
    if rank >= world_size {
        return Err(ImageGenError::config(format!(
            "rank {rank} is outside world size {world_size}"
        )));
    }
    let start = rank * per;
    Ok(start..start + per)
}

/// Output file of image `index`: `<prefix><index>.txt`.
pub fn image_path(prefix: &str, index: usize) -> PathBuf {
    PathBuf::from(format!("{prefix}{index}.txt"))
}

/// Per-worker seed so ranks sharing a base seed draw different streams.
fn worker_seed(seed: Option<u64>, rank: usize) -> Option<u64> {
    seed.map(|s| s.wrapping_add((rank as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSummary {
    pub rank: usize,
    pub indices: Range<usize>,
    pub written: usize,
    pub threads: usize,
    pub elapsed_ms: f64,
}

/// Generate and hand off every image of this worker's block.
pub fn run_worker(
    config: &RunConfig,
    atoms: &AtomSet,
    launch: &LaunchConfig,
    sink: &mut dyn ImageSink,
) -> Result<WorkerSummary> {
    let start = Instant::now();
    let generation = &config.generation;
    let indices = worker_range(generation.n_imgs, launch.world_size, launch.rank)?;
    let dropped = generation.n_imgs % launch.world_size;
    if dropped > 0 && launch.rank == 0 {
        warn!(
            "{dropped} of {} requested images do not fill a worker block and are skipped",
            generation.n_imgs
        );
    }

    let params = GridParameters::derive(config.image, atoms.len())?;
    let rasterizer = Rasterizer::new(launch.threads)?;
    let ctf = generation
        .ctf
        .map(|p| CtfFilter::new(p, &params))
        .transpose()?;
    if let Some(filter) = &ctf {
        debug!("ctf: padded to {} px", filter.padded_size());
    }
    let mut sampler = OrientationSampler::new(worker_seed(generation.seed, launch.rank));
    info!(
        "worker {}/{}: images {}..{} ({} atoms, {} px, {} threads)",
        launch.rank,
        launch.world_size,
        indices.start,
        indices.end,
        atoms.len(),
        params.n_pixels(),
        rasterizer.threads()
    );

    let quats = if generation.with_rot {
        sampler.generate(indices.len())
    } else {
        vec![Quaternion::identity(); indices.len()]
    };
    // Without rotation every view is the same projection.
    let fixed = (!generation.with_rot)
        .then(|| rasterizer.rasterize_with(generation.kernel, atoms, &params));

    if launch.rank == 0 {
        info!("Generating images...");
    }
    let mut written = 0usize;
    for (index, quat) in indices.clone().zip(quats) {
        let img_start = Instant::now();
        let clean = match &fixed {
            Some(img) => img.clone(),
            None => {
                let rotated = rotate(&quat, atoms)?;
                rasterizer.rasterize_with(generation.kernel, &rotated, &params)
            }
        };
        let clean = match &ctf {
            Some(filter) => filter.apply(&clean, sampler.rng_mut()),
            None => clean,
        };
        let intensity = match generation.snr {
            Some(snr) => {
                add_noise(&clean, snr, generation.noise_radius_coef, sampler.rng_mut())?
            }
            None => clean,
        };
        let image = Image {
            index,
            fname: image_path(&config.output.img_pfx, index),
            quat,
            intensity,
        };
        sink.write(&image)?;
        written += 1;
        debug!(
            "image {index}: q=[{:.4}, {:.4}, {:.4}, {:.4}] in {:.3} ms",
            quat.w,
            quat.i,
            quat.j,
            quat.k,
            img_start.elapsed().as_secs_f64() * 1000.0
        );
    }
    if launch.rank == 0 {
        info!("...done");
    }

    Ok(WorkerSummary {
        rank: launch.rank,
        indices,
        written,
        threads: rasterizer.threads(),
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}
