// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error type shared by the perturbation, watermark, and pipeline layers.
//!
//! The decision engine is total and never produces a [`GuardError`].
//! Watermark extraction does not fail either: "nothing found" and
//! "found but unparseable" are ordinary results, see
//! [`ExtractedWatermark`](crate::watermark::ExtractedWatermark).

use core::fmt;

/// Errors that can occur while protecting an image.
#[derive(Debug)]
pub enum GuardError {
    /// The image could not be decoded, or the buffer holds no samples.
    ContentUnavailable,
    /// The watermark bit stream does not fit into the image's LSB slots.
    CapacityExceeded {
        /// Bits required by the framed payload, terminator included.
        needed_bits: usize,
        /// Sample slots available (`height * width * 3`).
        available_bits: usize,
    },
    /// The image exceeds the configured dimension or pixel-count limits.
    ImageTooLarge,
    /// The protected image could not be written to its output container.
    EncodeFailed(String),
    /// The run was cancelled before a stage started.
    Cancelled,
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentUnavailable => write!(f, "image content unavailable or undecodable"),
            Self::CapacityExceeded { needed_bits, available_bits } => write!(
                f,
                "watermark needs {needed_bits} bits but image only has {available_bits}"
            ),
            Self::ImageTooLarge => write!(f, "image too large (max 8192px / 16MP)"),
            Self::EncodeFailed(msg) => write!(f, "failed to encode output image: {msg}"),
            Self::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for GuardError {}

impl From<image::ImageError> for GuardError {
    fn from(_: image::ImageError) -> Self {
        Self::ContentUnavailable
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, GuardError>;
