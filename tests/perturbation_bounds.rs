// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Perturbation engine: noise scale per level and presence of the
//! robustness texture only where the policy enables it.

use veil_core::perturb::robustness_texture;
use veil_core::{perturb_seeded, protect, GuardError, ImageBuffer, ProtectionLevel};

fn sample_mean(img: &ImageBuffer) -> f64 {
    img.samples().iter().map(|&v| v as f64).sum::<f64>() / img.sample_count() as f64
}

/// Least-squares coefficient of the texture in `out - input`, averaged over seeds.
fn texture_coefficient(level: ProtectionLevel, seeds: std::ops::Range<u64>) -> f64 {
    let (w, h) = (192, 192);
    let img = ImageBuffer::filled(w, h, [128, 128, 128]);
    let texture = robustness_texture(w, h);
    let energy: f64 = texture.iter().map(|t| t * t).sum::<f64>() * 3.0;

    let n = seeds.end - seeds.start;
    let mut total = 0.0;
    for seed in seeds {
        let (out, _) = perturb_seeded(&img, level, seed).unwrap();
        let mean = sample_mean(&out);
        let mut dot = 0.0;
        for (px, t) in out.samples().chunks_exact(3).zip(&texture) {
            for &v in px {
                dot += (v as f64 - mean) * t;
            }
        }
        total += dot / energy;
    }
    total / n as f64
}

#[test]
fn low_level_never_adds_texture() {
    let c = texture_coefficient(ProtectionLevel::Low, 0..4);
    assert!(c.abs() < 0.15, "texture coefficient at LOW: {c}");
}

#[test]
fn medium_level_adds_texture() {
    let c = texture_coefficient(ProtectionLevel::Medium, 0..4);
    assert!(c > 0.3, "texture coefficient at MEDIUM: {c}");
}

fn residual_std(level: ProtectionLevel) -> f64 {
    let img = ImageBuffer::filled(64, 64, [128, 128, 128]);
    let (out, _) = perturb_seeded(&img, level, 99).unwrap();
    let mean = sample_mean(&out);
    let n = out.sample_count() as f64;
    let var = out.samples().iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

#[test]
fn noise_grows_with_level() {
    let low = residual_std(ProtectionLevel::Low);
    let medium = residual_std(ProtectionLevel::Medium);
    let high = residual_std(ProtectionLevel::High);
    assert!((2.0..4.5).contains(&low), "LOW std {low}");
    assert!(low < medium && medium < high, "{low} {medium} {high}");
    assert!((8.0..13.0).contains(&high), "HIGH std {high}");
}

#[test]
fn frequency_mix_brightens_by_thirty_percent() {
    for level in [ProtectionLevel::Low, ProtectionLevel::Medium, ProtectionLevel::High] {
        let img = ImageBuffer::filled(64, 48, [100, 100, 100]);
        let (out, _) = perturb_seeded(&img, level, 11).unwrap();
        let mean = sample_mean(&out);
        assert!((mean - 130.0).abs() < 1.0, "{level}: mean {mean}");
    }
}

#[test]
fn odd_dimensions_are_supported() {
    let img = ImageBuffer::from_fn(37, 23, |x, y| [(x * 6) as u8, (y * 10) as u8, 77]);
    let (out, params) = protect(&img, ProtectionLevel::High).unwrap();
    assert_eq!((out.width(), out.height()), (37, 23));
    assert_eq!(params.gradient_iterations, 5);
}

#[test]
fn single_pixel_image() {
    let img = ImageBuffer::filled(1, 1, [250, 5, 128]);
    let (out, _) = perturb_seeded(&img, ProtectionLevel::Medium, 0).unwrap();
    assert_eq!(out.sample_count(), 3);
}

#[test]
fn absent_content_is_rejected() {
    assert!(matches!(
        protect(&ImageBuffer::empty(), ProtectionLevel::Low),
        Err(GuardError::ContentUnavailable)
    ));
}

#[test]
fn input_buffer_is_untouched() {
    let img = ImageBuffer::filled(16, 16, [10, 20, 30]);
    let copy = img.clone();
    let _ = perturb_seeded(&img, ProtectionLevel::High, 5).unwrap();
    assert_eq!(img, copy);
}
