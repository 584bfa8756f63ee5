//! Random viewing orientations as unit quaternions.
//!
//! Quaternions are drawn uniformly from the 4-ball by rejection (components
//! in `[-1, 1)`, accepted when `0.2 <= |q| <= 1`) and projected onto the unit
//! sphere, which gives a uniform distribution over 3D rotations. The lower
//! bound keeps the normalization well conditioned.
use nalgebra::Quaternion;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MIN_ACCEPT_NORM: f64 = 0.2;
const MAX_ACCEPT_NORM: f64 = 1.0;

/// Seedable source of random orientations.
pub struct OrientationSampler {
    rng: StdRng,
}

impl OrientationSampler {
    /// `Some(seed)` gives a reproducible stream, `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Draw `count` independent unit quaternions. `count == 0` is empty.
    pub fn generate(&mut self, count: usize) -> Vec<Quaternion<f64>> {
        (0..count).map(|_| self.sample()).collect()
    }

    pub fn sample(&mut self) -> Quaternion<f64> {
        loop {
            let q = Quaternion::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            );
            let norm = q.norm();
            if (MIN_ACCEPT_NORM..=MAX_ACCEPT_NORM).contains(&norm) {
                return q / norm;
            }
        }
    }

    /// The underlying generator, shared with other per-worker random stages.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
