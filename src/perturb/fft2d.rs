// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! 2D FFT/IFFT over real images, plus spectrum centering.
//!
//! - Radix-2 Cooley-Tukey for power-of-2 lengths
//! - Bluestein's chirp-z transform for arbitrary lengths
//!
//! Every 1D length gets a plan with precomputed twiddles (and, for
//! Bluestein, precomputed chirp and FFT(b)), reused across all rows or
//! columns. Columns use gather-FFT-scatter with a single column buffer, so
//! no transposed copy of the spectrum is ever allocated.

use num_complex::Complex64;
use std::f64::consts::PI;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// 2D complex spectrum, row-major.
#[derive(Clone)]
pub struct Spectrum2D {
    pub data: Vec<Complex64>,
    pub width: usize,
    pub height: usize,
}

// ──────────────────────────────────────────────────────────────────────────
// 1D plans
// ──────────────────────────────────────────────────────────────────────────

/// Twiddle table for an in-place radix-2 transform of length `n`.
struct Radix2Plan {
    n: usize,
    /// `twiddles[k] = exp(sign * 2πi * k / n)` for `k < n/2`.
    twiddles: Vec<Complex64>,
}

impl Radix2Plan {
    fn new(n: usize, sign: f64) -> Self {
        debug_assert!(n.is_power_of_two());
        let twiddles = (0..n / 2)
            .map(|k| {
                let (s, c) = (sign * 2.0 * PI * k as f64 / n as f64).sin_cos();
                Complex64::new(c, s)
            })
            .collect();
        Radix2Plan { n, twiddles }
    }

    /// Unnormalized in-place transform. `data.len()` must equal the plan length.
    fn execute(&self, data: &mut [Complex64]) {
        let n = self.n;
        debug_assert_eq!(data.len(), n);
        if n <= 1 {
            return;
        }

        // Bit-reversal permutation
        let mut j = 0usize;
        for i in 1..n {
            let mut bit = n >> 1;
            while j & bit != 0 {
                j ^= bit;
                bit >>= 1;
            }
            j ^= bit;
            if i < j {
                data.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let stride = n / len;
            for start in (0..n).step_by(len) {
                for k in 0..half {
                    let w = self.twiddles[k * stride];
                    let u = data[start + k];
                    let v = data[start + k + half] * w;
                    data[start + k] = u + v;
                    data[start + k + half] = u - v;
                }
            }
            len <<= 1;
        }
    }
}

/// Precomputed chirp factors and FFT(b_hat) for an arbitrary length `n`.
struct BluesteinPlan {
    n: usize,
    chirp: Vec<Complex64>,
    b_hat: Vec<Complex64>,
    forward: Radix2Plan,
    inverse: Radix2Plan,
}

impl BluesteinPlan {
    fn new(n: usize, sign: f64) -> Self {
        let m = (2 * n - 1).next_power_of_two();

        // w_k = exp(sign * i * pi * k^2 / n); k^2 reduced mod 2n to keep the
        // angle small for long rows.
        let chirp: Vec<Complex64> = (0..n)
            .map(|k| {
                let k2 = (k as u64 * k as u64) % (2 * n as u64);
                let (s, c) = (sign * PI * k2 as f64 / n as f64).sin_cos();
                Complex64::new(c, s)
            })
            .collect();

        // b[k] = conj(chirp[k]), wrapped for negative indices, zero-padded.
        let mut b = vec![ZERO; m];
        b[0] = chirp[0].conj();
        for k in 1..n {
            b[k] = chirp[k].conj();
            b[m - k] = chirp[k].conj();
        }

        let forward = Radix2Plan::new(m, -1.0);
        let inverse = Radix2Plan::new(m, 1.0);
        forward.execute(&mut b);

        BluesteinPlan { n, chirp, b_hat: b, forward, inverse }
    }

    /// `X_k = chirp[k] * sum_t (x_t * chirp[t]) * conj(chirp[k - t])`, since
    /// `k*t = (k^2 + t^2 - (k - t)^2) / 2`.
    fn execute(&self, data: &mut [Complex64]) {
        debug_assert_eq!(data.len(), self.n);
        let m = self.b_hat.len();

        let mut a = vec![ZERO; m];
        for k in 0..self.n {
            a[k] = data[k] * self.chirp[k];
        }

        self.forward.execute(&mut a);
        for (x, b) in a.iter_mut().zip(&self.b_hat) {
            *x *= *b;
        }
        self.inverse.execute(&mut a);

        let inv_m = 1.0 / m as f64;
        for k in 0..self.n {
            data[k] = a[k] * inv_m * self.chirp[k];
        }
    }
}

/// Plan for one axis of a 2D transform.
enum LinePlan {
    Trivial,
    Radix2(Radix2Plan),
    Bluestein(BluesteinPlan),
}

impl LinePlan {
    /// `sign`: -1.0 for forward, +1.0 for inverse (unnormalized).
    fn new(n: usize, sign: f64) -> Self {
        if n <= 1 {
            LinePlan::Trivial
        } else if n.is_power_of_two() {
            LinePlan::Radix2(Radix2Plan::new(n, sign))
        } else {
            LinePlan::Bluestein(BluesteinPlan::new(n, sign))
        }
    }

    fn execute(&self, data: &mut [Complex64]) {
        match self {
            LinePlan::Trivial => {}
            LinePlan::Radix2(p) => p.execute(data),
            LinePlan::Bluestein(p) => p.execute(data),
        }
    }
}

fn transform_2d(data: &mut [Complex64], width: usize, height: usize, sign: f64) {
    let row_plan = LinePlan::new(width, sign);
    let col_plan = LinePlan::new(height, sign);

    for row in data.chunks_exact_mut(width) {
        row_plan.execute(row);
    }

    let mut col_buf = vec![ZERO; height];
    for col in 0..width {
        for r in 0..height {
            col_buf[r] = data[r * width + col];
        }
        col_plan.execute(&mut col_buf);
        for r in 0..height {
            data[r * width + col] = col_buf[r];
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Public API
// ──────────────────────────────────────────────────────────────────────────

/// Real-valued row-major plane -> 2D complex spectrum.
pub fn fft2d(pixels: &[f64], width: usize, height: usize) -> Spectrum2D {
    assert_eq!(pixels.len(), width * height);
    let mut data: Vec<Complex64> = pixels.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    if width > 0 && height > 0 {
        transform_2d(&mut data, width, height, -1.0);
    }
    Spectrum2D { data, width, height }
}

/// 2D complex spectrum -> real parts of the inverse, normalized by `1/(width*height)`.
pub fn ifft2d(spectrum: &Spectrum2D) -> Vec<f64> {
    let (width, height) = (spectrum.width, spectrum.height);
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let mut data = spectrum.data.clone();
    transform_2d(&mut data, width, height, 1.0);

    let norm = 1.0 / (width * height) as f64;
    data.iter().map(|c| c.re * norm).collect()
}

/// Cyclically roll a spectrum by `dy` rows and `dx` columns.
fn roll(spectrum: &Spectrum2D, dy: usize, dx: usize) -> Spectrum2D {
    let (w, h) = (spectrum.width, spectrum.height);
    let mut out = vec![ZERO; spectrum.data.len()];
    for r in 0..h {
        let nr = (r + dy) % h;
        for c in 0..w {
            out[nr * w + (c + dx) % w] = spectrum.data[r * w + c];
        }
    }
    Spectrum2D { data: out, width: w, height: h }
}

/// Move the zero-frequency bin to `(height / 2, width / 2)`.
pub fn fftshift(spectrum: &Spectrum2D) -> Spectrum2D {
    roll(spectrum, spectrum.height / 2, spectrum.width / 2)
}

/// Exact inverse of [`fftshift`], also for odd dimensions.
pub fn ifftshift(spectrum: &Spectrum2D) -> Spectrum2D {
    let (w, h) = (spectrum.width, spectrum.height);
    roll(spectrum, h - h / 2, w - w / 2)
}
