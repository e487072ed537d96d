// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Container I/O: encoded upload bytes in, lossless PNG bytes out.
//!
//! The watermark lives in sample LSBs, so anything written here must be
//! lossless. PNG is the only output format.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{validate_dimensions, ImageBuffer};
use crate::error::{GuardError, Result};

/// Decode any supported container (PNG, JPEG, BMP) into an RGB buffer.
///
/// Alpha is discarded and grayscale inputs are expanded to three channels.
///
/// # Errors
/// - [`GuardError::ContentUnavailable`] if the bytes cannot be decoded.
/// - [`GuardError::ImageTooLarge`] if the image exceeds the given limits.
pub fn decode(bytes: &[u8], max_dimension: u32, max_pixels: u64) -> Result<ImageBuffer> {
    if bytes.is_empty() {
        return Err(GuardError::ContentUnavailable);
    }
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    validate_dimensions(width, height, max_dimension, max_pixels)?;
    ImageBuffer::new(width as usize, height as usize, rgb.into_raw())
}

/// Encode a buffer as an 8-bit RGB PNG.
///
/// # Errors
/// - [`GuardError::ContentUnavailable`] for an empty buffer.
/// - [`GuardError::EncodeFailed`] if the PNG encoder reports an error.
pub fn encode_png(img: &ImageBuffer) -> Result<Vec<u8>> {
    img.ensure_content()?;
    let width = u32::try_from(img.width()).map_err(|_| GuardError::ImageTooLarge)?;
    let height = u32::try_from(img.height()).map_err(|_| GuardError::ImageTooLarge)?;

    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(img.samples(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| GuardError::EncodeFailed(e.to_string()))?;
    Ok(out)
}
