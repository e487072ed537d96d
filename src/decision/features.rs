// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Content features consumed by the risk score.
//!
//! Face detection is pluggable. Without a detector the face count is zero,
//! which keeps [`decide`](super::decide) total.

use serde::Serialize;

use crate::raster::ImageBuffer;

/// Bounding box of a detected face within an image.
#[derive(Debug, Clone)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Detection confidence score.
    pub confidence: f64,
}

/// Pluggable face detection backend.
///
/// Implementations receive the BT.601 luma plane of the image.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: usize, height: usize) -> Vec<FaceBounds>;
}

/// Degraded-mode detector: never reports a face.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn detect(&self, _gray: &[u8], _width: usize, _height: usize) -> Vec<FaceBounds> {
        Vec::new()
    }
}

/// Features derived once per input image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSet {
    pub face_count: usize,
    /// Mean of the luma plane, in `[0, 255]`.
    pub mean_brightness: f64,
    /// `height * width`.
    pub pixel_count: usize,
    /// `(height, width)`.
    pub dimensions: (usize, usize),
}

impl FeatureSet {
    /// The fallback used when no image content is available.
    pub fn zero() -> Self {
        Self { face_count: 0, mean_brightness: 0.0, pixel_count: 0, dimensions: (0, 0) }
    }
}

/// Compute features for `img`. An empty buffer yields [`FeatureSet::zero`].
pub fn extract_features(img: &ImageBuffer, detector: &dyn FaceDetector) -> FeatureSet {
    if img.is_empty() {
        return FeatureSet::zero();
    }

    let gray = img.grayscale();
    let sum: u64 = gray.iter().map(|&v| v as u64).sum();
    let mean_brightness = sum as f64 / gray.len() as f64;
    let face_count = detector.detect(&gray, img.width(), img.height()).len();

    FeatureSet {
        face_count,
        mean_brightness,
        pixel_count: img.pixel_count(),
        dimensions: (img.height(), img.width()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingDetector(usize);

    impl FaceDetector for CountingDetector {
        fn detect(&self, gray: &[u8], width: usize, height: usize) -> Vec<FaceBounds> {
            assert_eq!(gray.len(), width * height);
            (0..self.0)
                .map(|i| FaceBounds { x: i as f64, y: 0.0, width: 1.0, height: 1.0, confidence: 0.9 })
                .collect()
        }
    }

    #[test]
    fn uniform_image_features() {
        let img = ImageBuffer::filled(40, 30, [140, 140, 140]);
        let f = extract_features(&img, &NoFaceDetector);
        assert_eq!(f.face_count, 0);
        assert_eq!(f.pixel_count, 1200);
        assert_eq!(f.dimensions, (30, 40));
        assert!((f.mean_brightness - 140.0).abs() < 1e-9);
    }

    #[test]
    fn detector_result_is_counted() {
        let img = ImageBuffer::filled(8, 8, [10, 20, 30]);
        let f = extract_features(&img, &CountingDetector(3));
        assert_eq!(f.face_count, 3);
    }

    #[test]
    fn empty_buffer_is_zero_features() {
        let f = extract_features(&ImageBuffer::empty(), &CountingDetector(5));
        assert_eq!(f, FeatureSet::zero());
    }

    #[test]
    fn brightness_is_mean_of_luma() {
        // Half black, half white.
        let img = ImageBuffer::from_fn(2, 1, |x, _| if x == 0 { [0, 0, 0] } else { [255, 255, 255] });
        let f = extract_features(&img, &NoFaceDetector);
        assert!((f.mean_brightness - 127.5).abs() < 1e-9);
    }
}
