// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Perturbation engine.
//!
//! Adds level-calibrated noise to an image, in four stages applied to an
//! `f64` working copy:
//!
//! 1. Spatial Gaussian noise, `sigma = noise_strength`.
//! 2. High-pass frequency noise: per channel, complex Gaussian noise is
//!    added to the centered spectrum outside a radius of
//!    `min(height, width) / 4`. The real part of the inverse transform is
//!    the channel's contribution and is added at `0.3` weight. It carries
//!    the channel itself, so every output is brightened by roughly 30%
//!    before clamping.
//! 3. `gradient_iterations` unit-norm random steps of length 2.0.
//! 4. Optional deterministic sinusoidal texture (MEDIUM and HIGH only).
//!
//! The result is rounded and clamped to `[0, 255]`.
//!
//! This is a heuristic. Stage 3 uses random directions, not the gradient of
//! any real model, and no claim of adversarial robustness is made.
//!
//! Every call owns its own ChaCha20 generator, so concurrent calls never
//! share RNG state. Frequency noise for channel `c` is drawn from stream `c`
//! of a ChaCha20 key taken from that generator, so the `parallel` feature
//! does not change the output.

pub mod fft2d;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::decision::ProtectionLevel;
use crate::error::Result;
use crate::raster::{ImageBuffer, CHANNELS};
use fft2d::{fft2d, fftshift, ifft2d, ifftshift};

/// Weight of the frequency-domain contribution relative to spatial noise.
const FREQUENCY_MIX: f64 = 0.3;

/// Frequency noise amplitude per unit of `noise_strength`.
const FREQUENCY_SCALE: f64 = 10.0;

/// Length of each random directional step.
const GRADIENT_STEP: f64 = 2.0;

/// Added to the field norm before dividing.
const NORM_EPSILON: f64 = 1e-8;

/// Peak amplitude of the robustness texture.
const TEXTURE_AMPLITUDE: f64 = 0.5;

/// Phase range (radians) the texture sweeps across each image axis.
const TEXTURE_PHASE_SPAN: f64 = 50.0;

/// Perturbation parameters for one protection level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProtectionParams {
    pub noise_strength: f64,
    pub gradient_iterations: u32,
    pub enhance_robustness: bool,
}

impl ProtectionParams {
    /// Fixed policy table.
    pub const fn for_level(level: ProtectionLevel) -> Self {
        match level {
            ProtectionLevel::Low => Self { noise_strength: 3.0, gradient_iterations: 1, enhance_robustness: false },
            ProtectionLevel::Medium => Self { noise_strength: 6.0, gradient_iterations: 3, enhance_robustness: true },
            ProtectionLevel::High => Self { noise_strength: 10.0, gradient_iterations: 5, enhance_robustness: true },
        }
    }
}

/// Perturb `img` with a freshly seeded generator.
///
/// # Errors
/// [`GuardError::ContentUnavailable`](crate::GuardError::ContentUnavailable)
/// if `img` has no samples.
pub fn perturb(img: &ImageBuffer, level: ProtectionLevel) -> Result<(ImageBuffer, ProtectionParams)> {
    perturb_seeded(img, level, rand::random())
}

/// Perturb `img` reproducibly from `seed`.
pub fn perturb_seeded(img: &ImageBuffer, level: ProtectionLevel, seed: u64) -> Result<(ImageBuffer, ProtectionParams)> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    perturb_with_rng(img, level, &mut rng)
}

/// Perturb `img` drawing all randomness from `rng`.
///
/// The input is never modified; a new buffer is returned on success.
pub fn perturb_with_rng<R: Rng + ?Sized>(
    img: &ImageBuffer,
    level: ProtectionLevel,
    rng: &mut R,
) -> Result<(ImageBuffer, ProtectionParams)> {
    img.ensure_content()?;
    let params = ProtectionParams::for_level(level);
    let (width, height) = (img.width(), img.height());

    debug!(
        "perturb: {width}x{height} level={level} strength={} iterations={} enhance={}",
        params.noise_strength, params.gradient_iterations, params.enhance_robustness
    );

    let mut work: Vec<f64> = img.samples().iter().map(|&v| v as f64).collect();
    let planes: Vec<Vec<f64>> = (0..CHANNELS)
        .map(|ch| work.iter().skip(ch).step_by(CHANNELS).copied().collect())
        .collect();

    // 1. Spatial noise.
    for w in work.iter_mut() {
        let z: f64 = rng.sample(StandardNormal);
        *w += z * params.noise_strength;
    }

    // 2. Frequency noise, computed from the unmodified channels.
    let key: [u8; 32] = rng.gen();
    let frequency = frequency_noise(key, &planes, width, height, params.noise_strength);
    drop(planes);
    for (ch, contribution) in frequency.iter().enumerate() {
        for (i, f) in contribution.iter().enumerate() {
            work[i * CHANNELS + ch] += FREQUENCY_MIX * f;
        }
    }

    // 3. Directional steps.
    for _ in 0..params.gradient_iterations {
        let field = gaussian_field(rng, work.len(), 1.0);
        let norm = field.iter().map(|v| v * v).sum::<f64>().sqrt();
        let scale = GRADIENT_STEP / (norm + NORM_EPSILON);
        for (w, d) in work.iter_mut().zip(&field) {
            *w += d * scale;
        }
    }

    // 4. Robustness texture, identical on every channel.
    if params.enhance_robustness {
        let texture = robustness_texture(width, height);
        for (px, t) in work.chunks_exact_mut(CHANNELS).zip(&texture) {
            for v in px {
                *v += t;
            }
        }
    }

    let data = work.iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect();
    let out = ImageBuffer::new(width, height, data)?;
    Ok((out, params))
}

/// `len` independent normal samples with standard deviation `sigma`.
fn gaussian_field<R: Rng + ?Sized>(rng: &mut R, len: usize, sigma: f64) -> Vec<f64> {
    (0..len)
        .map(|_| {
            let z: f64 = rng.sample(StandardNormal);
            z * sigma
        })
        .collect()
}

/// Circular high-pass mask over a centered spectrum: `true` where the bin
/// lies farther than `min(height, width) / 4` from `(height / 2, width / 2)`.
pub fn high_pass_mask(width: usize, height: usize) -> Vec<bool> {
    let (cy, cx) = ((height / 2) as f64, (width / 2) as f64);
    let radius = width.min(height) as f64 / 4.0;
    let mut mask = Vec::with_capacity(width * height);
    for r in 0..height {
        for c in 0..width {
            let (dy, dx) = (r as f64 - cy, c as f64 - cx);
            mask.push((dy * dy + dx * dx).sqrt() > radius);
        }
    }
    mask
}

/// Per-channel frequency contributions, one plane per channel.
///
/// Channel `ch` draws its noise from stream `ch` of `key`, inside its own
/// transform, so no noise buffer is held for the whole image.
fn frequency_noise(key: [u8; 32], planes: &[Vec<f64>], width: usize, height: usize, strength: f64) -> Vec<Vec<f64>> {
    let scale = strength * FREQUENCY_SCALE;
    let mask = high_pass_mask(width, height);

    let run = |(ch, plane): (usize, &Vec<f64>)| {
        let mut rng = ChaCha20Rng::from_seed(key);
        rng.set_stream(ch as u64);
        channel_contribution(plane, &mut rng, &mask, scale, width, height)
    };

    #[cfg(feature = "parallel")]
    let contributions = planes.par_iter().enumerate().map(run).collect();
    #[cfg(not(feature = "parallel"))]
    let contributions = planes.iter().enumerate().map(run).collect();
    contributions
}

/// Noise one channel in the centered spectrum and return the real part of
/// the inverse transform.
fn channel_contribution<R: Rng + ?Sized>(
    plane: &[f64],
    rng: &mut R,
    mask: &[bool],
    scale: f64,
    width: usize,
    height: usize,
) -> Vec<f64> {
    let mut centered = fftshift(&fft2d(plane, width, height));
    for (bin, &keep) in centered.data.iter_mut().zip(mask) {
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        if keep {
            bin.re += re * scale;
            bin.im += im * scale;
        }
    }
    ifft2d(&ifftshift(&centered))
}

/// Deterministic low-frequency texture, one value per pixel (row-major):
/// `0.5 * sin(ry) * sin(rx)` with `ry`, `rx` swept linearly from 0 to 50
/// radians across the rows and columns, endpoints included.
pub fn robustness_texture(width: usize, height: usize) -> Vec<f64> {
    let ramp = |n: usize| -> Vec<f64> {
        if n <= 1 {
            return vec![0.0; n];
        }
        let step = TEXTURE_PHASE_SPAN / (n - 1) as f64;
        (0..n).map(|i| (i as f64 * step).sin()).collect()
    };
    let rows = ramp(height);
    let cols = ramp(width);

    let mut texture = Vec::with_capacity(width * height);
    for r in &rows {
        for c in &cols {
            texture.push(TEXTURE_AMPLITUDE * r * c);
        }
    }
    texture
}
