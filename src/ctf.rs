//! Contrast transfer function of the microscope, applied in Fourier space.
//!
//! The image is zero-padded by `ceil(0.1 n) + 1` pixels per side, transformed,
//! multiplied by
//!
//! ```text
//! ctf(f) = (A cos(φ f²/2) − sqrt(1 − A²) sin(φ f²/2)) · exp(−B f²/2) / A
//! φ      = 2π · 10⁴ · defocus · λ
//! ```
//!
//! with `f` the spatial frequency (1/Å, `fftfreq` layout), `A` the amplitude
//! contrast, `B` the B-factor, defocus in µm and λ the electron wavelength in
//! Å, transformed back and cropped to the original size. The transfer
//! function is real, so only the real part of the inverse transform is kept.
use crate::error::{ImageGenError, Result};
use crate::grid::GridParameters;
use crate::image::IntensityImage;
use rand::Rng;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Defocus in µm: a fixed value or a `[min, max]` range sampled per image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Defocus {
    Fixed(f64),
    Range([f64; 2]),
}

impl Defocus {
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Defocus::Fixed(d) => d,
            Defocus::Range([lo, hi]) => lo + rng.gen::<f64>() * (hi - lo),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CtfParams {
    pub defocus: Defocus,
    /// Envelope decay (Å²).
    #[serde(default)]
    pub b_factor: f64,
    /// Amplitude contrast in `(0, 1]`.
    pub amp: f64,
    /// Electron wavelength (Å).
    pub elecwave: f64,
}

impl CtfParams {
    pub fn validate(&self) -> Result<()> {
        let bounds = match self.defocus {
            Defocus::Fixed(d) => [d, d],
            Defocus::Range(r) => r,
        };
        if !bounds.iter().all(|d| d.is_finite()) || bounds[0] > bounds[1] {
            return Err(ImageGenError::config(format!(
                "defocus must be finite with min <= max, got {:?}",
                self.defocus
            )));
        }
        if !(self.amp > 0.0 && self.amp <= 1.0) {
            return Err(ImageGenError::config(format!(
                "amplitude contrast must lie in (0, 1], got {}",
                self.amp
            )));
        }
        if !(self.b_factor.is_finite() && self.b_factor >= 0.0) {
            return Err(ImageGenError::config(format!(
                "B-factor must be finite and non-negative, got {}",
                self.b_factor
            )));
        }
        if !(self.elecwave.is_finite() && self.elecwave > 0.0) {
            return Err(ImageGenError::config(format!(
                "electron wavelength must be positive, got {}",
                self.elecwave
            )));
        }
        Ok(())
    }
}

/// Zero padding added on each side before filtering.
pub fn pad_width(n_pixels: usize) -> usize {
    (n_pixels as f64 * 0.1).ceil() as usize + 1
}

/// Sample frequencies of an `n`-point DFT with spacing `d`, in the usual
/// `[0, 1, ..., -2, -1] / (n d)` order.
pub fn fft_freq(n: usize, d: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * d);
    (0..n)
        .map(|k| {
            let k = if k < n.div_ceil(2) {
                k as f64
            } else {
                k as f64 - n as f64
            };
            k * scale
        })
        .collect()
}

/// Transfer function on the `size × size` frequency grid, row-major.
pub fn calc_ctf(params: &CtfParams, defocus: f64, size: usize, pixel_size: f64) -> Vec<f64> {
    let freq = fft_freq(size, pixel_size);
    let phase = defocus * std::f64::consts::PI * 2.0 * 10_000.0 * params.elecwave;
    let phase_contrast = (1.0 - params.amp * params.amp).sqrt();
    let mut ctf = Vec::with_capacity(size * size);
    for fx in &freq {
        for fy in &freq {
            let f2 = fx * fx + fy * fy;
            let arg = phase * f2 * 0.5;
            let env = (-params.b_factor * f2 * 0.5).exp();
            ctf.push((params.amp * arg.cos() - phase_contrast * arg.sin()) * env / params.amp);
        }
    }
    ctf
}

/// Pads, filters and crops images of one grid size. FFT plans are built once.
pub struct CtfFilter {
    params: CtfParams,
    n: usize,
    pad: usize,
    pixel_size: f64,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    /// Cached transfer function for a fixed defocus.
    fixed: Option<Vec<f64>>,
}

impl CtfFilter {
    pub fn new(params: CtfParams, grid: &GridParameters) -> Result<Self> {
        params.validate()?;
        let n = grid.n_pixels();
        let pad = pad_width(n);
        let size = n + 2 * pad;
        let mut planner = FftPlanner::<f64>::new();
        let fixed = match params.defocus {
            Defocus::Fixed(d) => Some(calc_ctf(&params, d, size, grid.pixel_size())),
            Defocus::Range(_) => None,
        };
        Ok(Self {
            params,
            n,
            pad,
            pixel_size: grid.pixel_size(),
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
            fixed,
        })
    }

    pub fn padded_size(&self) -> usize {
        self.n + 2 * self.pad
    }

    /// Filter one image, drawing the defocus from `rng` when it is a range.
    pub fn apply<R: Rng + ?Sized>(&self, image: &IntensityImage, rng: &mut R) -> IntensityImage {
        match &self.fixed {
            Some(ctf) => self.apply_transfer(image, ctf),
            None => {
                let defocus = self.params.defocus.draw(rng);
                let ctf = calc_ctf(&self.params, defocus, self.padded_size(), self.pixel_size);
                self.apply_transfer(image, &ctf)
            }
        }
    }

    fn apply_transfer(&self, image: &IntensityImage, ctf: &[f64]) -> IntensityImage {
        let size = self.padded_size();
        let mut buf = vec![Complex::new(0.0, 0.0); size * size];
        for row in 0..self.n {
            let dst = (row + self.pad) * size + self.pad;
            for (b, &v) in buf[dst..dst + self.n]
                .iter_mut()
                .zip(&image.data[row * self.n..(row + 1) * self.n])
            {
                b.re = v;
            }
        }

        fft2(&mut buf, size, self.forward.as_ref());
        for (b, &c) in buf.iter_mut().zip(ctf) {
            *b *= c;
        }
        fft2(&mut buf, size, self.inverse.as_ref());

        let scale = 1.0 / (size * size) as f64;
        let mut out = IntensityImage::new(self.n);
        for row in 0..self.n {
            let src = (row + self.pad) * size + self.pad;
            for (o, b) in out.data[row * self.n..(row + 1) * self.n]
                .iter_mut()
                .zip(&buf[src..src + self.n])
            {
                *o = b.re * scale;
            }
        }
        out
    }
}

/// Unnormalized 2D transform of a square row-major buffer: rows, then
/// columns through a transpose.
fn fft2(buf: &mut [Complex<f64>], size: usize, fft: &dyn Fft<f64>) {
    fft.process(buf);
    transpose(buf, size);
    fft.process(buf);
    transpose(buf, size);
}

fn transpose(buf: &mut [Complex<f64>], size: usize) {
    for r in 0..size {
        for c in r + 1..size {
            buf.swap(r * size + c, c * size + r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ImageParams;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(n_pixels: usize) -> GridParameters {
        GridParameters::derive(
            ImageParams {
                n_pixels,
                pixel_size: 1.0,
                sigma: 1.0,
            },
            1,
        )
        .unwrap()
    }

    fn test_image(n: usize) -> IntensityImage {
        let data = (0..n * n)
            .map(|i| {
                let (r, c) = ((i / n) as f64, (i % n) as f64);
                (-0.05 * ((r - 7.0).powi(2) + (c - 9.0).powi(2))).exp() + 0.01 * r
            })
            .collect();
        IntensityImage::from_vec(n, data).unwrap()
    }

    fn params(defocus: Defocus, b_factor: f64) -> CtfParams {
        CtfParams {
            defocus,
            b_factor,
            amp: 0.1,
            elecwave: 0.019866,
        }
    }

    #[test]
    fn fft_freq_matches_numpy_layout() {
        assert_eq!(fft_freq(4, 0.5), vec![0.0, 0.5, -1.0, -0.5]);
        assert_eq!(fft_freq(5, 1.0), vec![0.0, 0.2, 0.4, -0.4, -0.2]);
    }

    #[test]
    fn zero_defocus_without_envelope_is_identity() {
        let g = grid(20);
        let filter = CtfFilter::new(params(Defocus::Fixed(0.0), 0.0), &g).unwrap();
        assert_eq!(filter.padded_size(), 20 + 2 * 3);
        let img = test_image(20);
        let out = filter.apply(&img, &mut StdRng::seed_from_u64(0));
        for (a, b) in out.data.iter().zip(&img.data) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn defocus_changes_the_image() {
        let g = grid(16);
        let filter = CtfFilter::new(params(Defocus::Fixed(1.5), 1.0), &g).unwrap();
        let img = test_image(16);
        let out = filter.apply(&img, &mut StdRng::seed_from_u64(0));
        let diff: f64 = out.data.iter().zip(&img.data).map(|(a, b)| (a - b).abs()).sum();
        assert!(diff > 1e-3, "diff={diff}");
        assert!(!out.has_non_finite());
    }

    #[test]
    fn defocus_range_is_sampled_inside_bounds() {
        let d = Defocus::Range([0.5, 2.0]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let v = d.draw(&mut rng);
            assert!((0.5..=2.0).contains(&v));
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let g = grid(8);
        let mut p = params(Defocus::Fixed(1.0), 0.0);
        p.amp = 0.0;
        assert!(CtfFilter::new(p, &g).is_err());
        let p = params(Defocus::Range([2.0, 1.0]), 0.0);
        assert!(CtfFilter::new(p, &g).is_err());
        let mut p = params(Defocus::Fixed(1.0), -1.0);
        assert!(p.validate().is_err());
        p.b_factor = 0.0;
        p.elecwave = 0.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn config_accepts_scalar_or_range_defocus() {
        let fixed: CtfParams =
            serde_json::from_str(r#"{ "defocus": 1.5, "amp": 0.1, "elecwave": 0.0197 }"#)
                .unwrap();
        assert_eq!(fixed.defocus, Defocus::Fixed(1.5));
        assert_eq!(fixed.b_factor, 0.0);
        let range: CtfParams = serde_json::from_str(
            r#"{ "defocus": [0.5, 2.0], "b_factor": 1.0, "amp": 0.1, "elecwave": 0.0197 }"#,
        )
        .unwrap();
        assert_eq!(range.defocus, Defocus::Range([0.5, 2.0]));
    }
}
