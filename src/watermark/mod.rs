// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! LSB watermark codec.
//!
//! One stream bit goes into the least-significant bit of each sample, in
//! row-major, channel-minor order (row, then column, then R, G, B). Samples
//! past the end of the stream are left untouched. Capacity is therefore
//! `height * width * 3` bits, and a stream that does not fit is rejected
//! rather than truncated.
//!
//! Extraction reads the LSB of every sample, regroups bytes and looks for a
//! `"<len>|"` prefix (see [`bits`]). It never fails: unmarked images yield
//! `None`, and a payload that is not valid metadata comes back as
//! [`ExtractedWatermark::Raw`].
//!
//! Not cryptographic and not robust to lossy recompression or geometric
//! edits. Use a lossless container (PNG) downstream.

pub mod bits;
pub mod payload;

use log::debug;

use crate::error::{GuardError, Result};
use crate::raster::ImageBuffer;
pub use payload::{WatermarkPayload, WATERMARK_VERSION};

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedWatermark {
    /// The payload parsed as [`WatermarkPayload`].
    Structured(WatermarkPayload),
    /// A framed payload was found but it is not valid metadata.
    Raw(String),
}

/// Number of LSB slots in `img`.
pub fn capacity_bits(img: &ImageBuffer) -> usize {
    img.sample_count()
}

/// Largest payload (in bytes) that fits into `img`, or `None` if not even
/// an empty payload fits.
pub fn max_payload_len(img: &ImageBuffer) -> Option<usize> {
    let cap = capacity_bits(img);
    if cap < bits::stream_bits(0) {
        return None;
    }
    let frame_bytes = (cap - bits::TERMINATOR_BITS) / 8;
    let mut n = frame_bytes.saturating_sub(1);
    while n > 0 && n.to_string().len() + 1 + n > frame_bytes {
        n -= 1;
    }
    Some(n)
}

/// Embed an arbitrary text payload.
///
/// # Errors
/// - [`GuardError::ContentUnavailable`] for an empty buffer.
/// - [`GuardError::CapacityExceeded`] if the framed stream does not fit.
///   The input is never modified.
pub fn embed_text(img: &ImageBuffer, text: &str) -> Result<ImageBuffer> {
    img.ensure_content()?;
    let stream = bits::encode_stream(text);
    let available = capacity_bits(img);
    if stream.len() > available {
        return Err(GuardError::CapacityExceeded { needed_bits: stream.len(), available_bits: available });
    }

    debug!("watermark: embedding {} bits into {available} slots", stream.len());

    let mut out = img.clone();
    for (sample, &bit) in out.samples_mut().iter_mut().zip(&stream) {
        *sample = (*sample & 0xFE) | bit;
    }
    Ok(out)
}

/// Embed structured metadata in its compact form.
pub fn embed_payload(img: &ImageBuffer, payload: &WatermarkPayload) -> Result<ImageBuffer> {
    embed_text(img, &payload.to_compact()?)
}

/// Embed owner/consent metadata stamped with the current time and the
/// default [`WATERMARK_VERSION`].
pub fn embed_watermark(img: &ImageBuffer, owner_id: &str, consent: bool) -> Result<ImageBuffer> {
    embed_payload(img, &WatermarkPayload::new(owner_id, consent, WATERMARK_VERSION))
}

/// Raw framed payload, if present. Invalid UTF-8 is replaced lossily.
pub fn extract_text(img: &ImageBuffer) -> Option<String> {
    if img.is_empty() {
        return None;
    }
    let lsbs: Vec<u8> = img.samples().iter().map(|s| s & 1).collect();
    let decoded = bits::bits_to_bytes(&lsbs);
    let payload = bits::unframe(&decoded)?;
    Some(String::from_utf8_lossy(payload).into_owned())
}

/// Extract and classify the watermark. `None` means no watermark present.
pub fn extract_watermark(img: &ImageBuffer) -> Option<ExtractedWatermark> {
    let text = extract_text(img)?;
    Some(match WatermarkPayload::parse(&text) {
        Some(p) => ExtractedWatermark::Structured(p),
        None => ExtractedWatermark::Raw(text),
    })
}
