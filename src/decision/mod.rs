// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Protection-level decision engine.
//!
//! Two independent signals are fused into one [`ProtectionLevel`]:
//!
//! - **Filename risk**: case-insensitive keyword match on the upload name.
//! - **Content risk**: a point score over [`FeatureSet`] (faces, size,
//!   brightness), mapped to a level by fixed thresholds.
//!
//! The final level is the maximum of the two. Either signal can escalate,
//! neither can de-escalate. The function is total: empty names and absent
//! content both resolve to [`ProtectionLevel::Low`].

pub mod features;

use core::fmt;

use log::debug;
use serde::Serialize;

use crate::raster::ImageBuffer;
pub use features::{extract_features, FaceBounds, FaceDetector, FeatureSet, NoFaceDetector};

/// Keywords that put a filename at HIGH risk. Checked first.
const HIGH_RISK_KEYWORDS: [&str; 3] = ["profile", "headshot", "portrait"];

/// Keywords that put a filename at MEDIUM risk.
const MEDIUM_RISK_KEYWORDS: [&str; 3] = ["selfie", "avatar", "photo"];

/// Points awarded when at least one face is detected.
const FACE_POINTS: u32 = 40;
/// Points awarded above [`LARGE_IMAGE_PIXELS`].
const SIZE_POINTS: u32 = 20;
/// Points awarded above [`BRIGHT_MEAN`].
const BRIGHTNESS_POINTS: u32 = 10;

const LARGE_IMAGE_PIXELS: usize = 1_000_000;
const BRIGHT_MEAN: f64 = 120.0;

/// Score at or above which content risk is HIGH.
const HIGH_SCORE: u32 = 50;
/// Score at or above which content risk is MEDIUM.
const MEDIUM_SCORE: u32 = 25;

/// Policy tier controlling perturbation intensity. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProtectionLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Read-only record of how a level was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionMetadata {
    pub filename_risk: ProtectionLevel,
    pub content_risk: ProtectionLevel,
    /// Raw content score before thresholding.
    pub content_score: u32,
    pub features: FeatureSet,
    pub final_level: ProtectionLevel,
}

/// Classify a filename. First matching tier wins: HIGH keywords, then MEDIUM.
pub fn filename_risk(filename: &str) -> ProtectionLevel {
    let name = filename.to_lowercase();
    if HIGH_RISK_KEYWORDS.iter().any(|k| name.contains(k)) {
        ProtectionLevel::High
    } else if MEDIUM_RISK_KEYWORDS.iter().any(|k| name.contains(k)) {
        ProtectionLevel::Medium
    } else {
        ProtectionLevel::Low
    }
}

/// Accumulate the content score. Every rule is evaluated.
pub fn content_score(features: &FeatureSet) -> u32 {
    let mut score = 0;
    if features.face_count > 0 {
        score += FACE_POINTS;
    }
    if features.pixel_count > LARGE_IMAGE_PIXELS {
        score += SIZE_POINTS;
    }
    if features.mean_brightness > BRIGHT_MEAN {
        score += BRIGHTNESS_POINTS;
    }
    score
}

/// Map a content score onto a level.
pub fn score_to_level(score: u32) -> ProtectionLevel {
    if score >= HIGH_SCORE {
        ProtectionLevel::High
    } else if score >= MEDIUM_SCORE {
        ProtectionLevel::Medium
    } else {
        ProtectionLevel::Low
    }
}

/// Decide from a filename and precomputed features.
pub fn decide_with_features(filename: &str, features: FeatureSet) -> (ProtectionLevel, DecisionMetadata) {
    let name_level = filename_risk(filename);
    let score = content_score(&features);
    let content_level = score_to_level(score);
    let final_level = name_level.max(content_level);

    debug!(
        "decision: filename={name_level} content={content_level} (score {score}) -> {final_level}"
    );

    let meta = DecisionMetadata {
        filename_risk: name_level,
        content_risk: content_level,
        content_score: score,
        features,
        final_level,
    };
    (final_level, meta)
}

/// Decide the protection level for an upload.
///
/// `image` is `None` when the upload could not be decoded; the zero
/// [`FeatureSet`] is used in that case.
pub fn decide(
    filename: &str,
    image: Option<&ImageBuffer>,
    detector: &dyn FaceDetector,
) -> (ProtectionLevel, DecisionMetadata) {
    let features = match image {
        Some(img) => extract_features(img, detector),
        None => FeatureSet::zero(),
    };
    decide_with_features(filename, features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(face_count: usize, pixel_count: usize, mean_brightness: f64) -> FeatureSet {
        FeatureSet { face_count, mean_brightness, pixel_count, dimensions: (0, 0) }
    }

    #[test]
    fn level_ordering() {
        assert!(ProtectionLevel::Low < ProtectionLevel::Medium);
        assert!(ProtectionLevel::Medium < ProtectionLevel::High);
    }

    #[test]
    fn filename_keywords() {
        assert_eq!(filename_risk("profile_pic.png"), ProtectionLevel::High);
        assert_eq!(filename_risk("My_HEADSHOT.JPG"), ProtectionLevel::High);
        assert_eq!(filename_risk("portrait.png"), ProtectionLevel::High);
        assert_eq!(filename_risk("test_selfie.png"), ProtectionLevel::Medium);
        assert_eq!(filename_risk("Avatar.png"), ProtectionLevel::Medium);
        assert_eq!(filename_risk("photo_001.png"), ProtectionLevel::Medium);
        assert_eq!(filename_risk("landscape.png"), ProtectionLevel::Low);
        assert_eq!(filename_risk(""), ProtectionLevel::Low);
    }

    #[test]
    fn high_keyword_takes_precedence() {
        assert_eq!(filename_risk("selfie_profile.png"), ProtectionLevel::High);
    }

    #[test]
    fn score_rules_accumulate() {
        assert_eq!(content_score(&features(0, 0, 0.0)), 0);
        assert_eq!(content_score(&features(2, 0, 0.0)), 40);
        assert_eq!(content_score(&features(0, 1_000_001, 0.0)), 20);
        assert_eq!(content_score(&features(0, 0, 120.5)), 10);
        assert_eq!(content_score(&features(1, 2_000_000, 130.0)), 70);
    }

    #[test]
    fn thresholds_are_strict_where_specified() {
        // Exactly 1MP and exactly 120 brightness earn nothing.
        assert_eq!(content_score(&features(0, 1_000_000, 120.0)), 0);
    }

    #[test]
    fn score_mapping_boundaries() {
        assert_eq!(score_to_level(0), ProtectionLevel::Low);
        assert_eq!(score_to_level(24), ProtectionLevel::Low);
        assert_eq!(score_to_level(25), ProtectionLevel::Medium);
        assert_eq!(score_to_level(49), ProtectionLevel::Medium);
        assert_eq!(score_to_level(50), ProtectionLevel::High);
    }

    #[test]
    fn most_cautious_signal_wins() {
        let (level, meta) = decide_with_features("profile.png", FeatureSet::zero());
        assert_eq!(level, ProtectionLevel::High);
        assert_eq!(meta.content_risk, ProtectionLevel::Low);

        let (level, meta) = decide_with_features("landscape.png", features(1, 2_000_000, 130.0));
        assert_eq!(level, ProtectionLevel::High);
        assert_eq!(meta.filename_risk, ProtectionLevel::Low);
        assert_eq!(meta.content_score, 70);
    }

    #[test]
    fn empty_inputs_resolve_low() {
        let (level, meta) = decide("", None, &NoFaceDetector);
        assert_eq!(level, ProtectionLevel::Low);
        assert_eq!(meta.content_score, 0);
        assert_eq!(meta.features, FeatureSet::zero());
    }

    #[test]
    fn level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&ProtectionLevel::Medium).unwrap(), "\"MEDIUM\"");
        assert_eq!(ProtectionLevel::High.to_string(), "HIGH");
    }
}
