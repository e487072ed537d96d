// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! In-memory 8-bit RGB raster shared by every stage of the pipeline.
//!
//! Samples are stored row-major, channel-minor: the sample for row `y`,
//! column `x`, channel `c` lives at `(y * width + x) * 3 + c`. Channel order
//! is RGB and never changes between stages. The watermark layout depends on
//! this order, so nothing in the crate may reorder samples.

pub mod codec;

use crate::error::{GuardError, Result};

/// Number of channels per pixel.
pub const CHANNELS: usize = 3;

/// Maximum pixel dimension (width or height) accepted for processing.
pub const MAX_DIMENSION: u32 = 8192;

/// Maximum total pixel count (width × height) accepted for processing.
pub const MAX_PIXELS: u64 = 16_000_000;

/// A height × width × 3 grid of `u8` samples.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap raw RGB samples.
    ///
    /// A zero-sized buffer is allowed (it models absent content); the
    /// perturbation and watermark stages reject it with
    /// [`GuardError::ContentUnavailable`].
    ///
    /// # Errors
    /// [`GuardError::ContentUnavailable`] if `data.len()` is not
    /// `width * height * 3`.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|p| p.checked_mul(CHANNELS))
            .ok_or(GuardError::ContentUnavailable)?;
        if data.len() != expected {
            return Err(GuardError::ContentUnavailable);
        }
        Ok(Self { width, height, data })
    }

    /// A buffer with no samples.
    pub fn empty() -> Self {
        Self { width: 0, height: 0, data: Vec::new() }
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// A buffer where every pixel has the same color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        Self::from_fn(width, height, |_, _| rgb)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `height * width` (channels excluded).
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// `height * width * 3`.
    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer carries no samples at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail with [`GuardError::ContentUnavailable`] on an empty buffer.
    pub fn ensure_content(&self) -> Result<()> {
        if self.is_empty() {
            Err(GuardError::ContentUnavailable)
        } else {
            Ok(())
        }
    }

    /// RGB value at column `x`, row `y`.
    ///
    /// # Panics
    /// If `x >= width` or `y >= height`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) outside {}x{}", self.width, self.height);
        let i = (y * self.width + x) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// All samples in row-major, channel-minor order.
    pub fn samples(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Luma plane (ITU-R BT.601 weights), rounded to `u8`, one value per pixel.
    pub fn grayscale(&self) -> Vec<u8> {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| {
                let y = 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

impl core::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Validate image dimensions against processing limits.
///
/// # Errors
/// - [`GuardError::ContentUnavailable`] if either dimension is zero.
/// - [`GuardError::ImageTooLarge`] if either dimension exceeds `max_dimension`
///   or the pixel count exceeds `max_pixels`.
pub fn validate_dimensions(width: u32, height: u32, max_dimension: u32, max_pixels: u64) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(GuardError::ContentUnavailable);
    }
    if width > max_dimension || height > max_dimension || width as u64 * height as u64 > max_pixels {
        return Err(GuardError::ImageTooLarge);
    }
    Ok(())
}
