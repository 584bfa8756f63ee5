//! Additive white Gaussian noise at a target signal-to-noise ratio.
//!
//! The signal level is the RMS intensity inside a centered circular mask of
//! radius `n_pixels * radius_coef`; noise is drawn with standard deviation
//! `signal_rms / sqrt(snr)`.
use crate::error::{ImageGenError, Result};
use crate::image::IntensityImage;
use rand::Rng;

/// Default mask radius as a fraction of the image side.
pub const DEFAULT_RADIUS_COEF: f64 = 0.5;

/// Pixels strictly inside the circle of radius `radius` (in pixels) around
/// the image center, row-major.
pub fn circular_mask(n_pixels: usize, radius: f64) -> Vec<bool> {
    let half = 0.5 * (n_pixels as f64 - 1.0);
    let r2 = radius * radius;
    let mut mask = Vec::with_capacity(n_pixels * n_pixels);
    for row in 0..n_pixels {
        let dy = row as f64 - half;
        for col in 0..n_pixels {
            let dx = col as f64 - half;
            mask.push(dx * dx + dy * dy < r2);
        }
    }
    mask
}

/// RMS of the pixels selected by `mask`.
pub fn masked_rms(image: &IntensityImage, mask: &[bool]) -> f64 {
    let (sum_sq, count) = image
        .data
        .iter()
        .zip(mask)
        .filter(|(_, m)| **m)
        .fold((0.0, 0usize), |(s, c), (&v, _)| (s + v * v, c + 1));
    if count == 0 {
        0.0
    } else {
        (sum_sq / count as f64).sqrt()
    }
}

/// Return a noisy copy of `image`.
pub fn add_noise<R: Rng + ?Sized>(
    image: &IntensityImage,
    snr: f64,
    radius_coef: f64,
    rng: &mut R,
) -> Result<IntensityImage> {
    if !(snr.is_finite() && snr > 0.0) {
        return Err(ImageGenError::config(format!(
            "SNR must be positive and finite, got {snr}"
        )));
    }
    if !(radius_coef.is_finite() && radius_coef > 0.0) {
        return Err(ImageGenError::config(format!(
            "noise mask radius coefficient must be positive, got {radius_coef}"
        )));
    }
    let mask = circular_mask(image.n, image.n as f64 * radius_coef);
    let noise_std = masked_rms(image, &mask) / snr.sqrt();
    let data = image
        .data
        .iter()
        .map(|&v| v + noise_std * standard_normal(rng))
        .collect();
    Ok(IntensityImage { n: image.n, data })
}

/// Box–Muller draw from N(0, 1).
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
