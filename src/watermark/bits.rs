// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Watermark bit-stream layout.
//!
//! ```text
//! "<decimal byte length>|<payload bytes>"   8 bits per byte, MSB first
//! 0000000000000000                          16-bit zero terminator
//! ```
//!
//! Text-to-bits and bits-to-text are independent pure functions with no
//! shared cursor, so either side can be tested in isolation.

/// Separator between the decimal length and the payload.
pub const DELIMITER: u8 = b'|';

/// Zero bits appended after the framed payload.
pub const TERMINATOR_BITS: usize = 16;

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// A trailing group shorter than 8 bits is dropped, not padded.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |byte, &bit| (byte << 1) | (bit & 1)))
        .collect()
}

/// `"<len>|<payload>"` as bytes, where `len` counts payload bytes.
pub fn frame(payload: &str) -> Vec<u8> {
    let mut out = payload.len().to_string().into_bytes();
    out.push(DELIMITER);
    out.extend_from_slice(payload.as_bytes());
    out
}

/// Total bits [`encode_stream`] produces for a payload of `payload_len` bytes.
pub fn stream_bits(payload_len: usize) -> usize {
    let digits = payload_len.to_string().len();
    (digits + 1 + payload_len) * 8 + TERMINATOR_BITS
}

/// Framed payload as bits, terminator included.
pub fn encode_stream(payload: &str) -> Vec<u8> {
    let mut bits = bytes_to_bits(&frame(payload));
    bits.resize(bits.len() + TERMINATOR_BITS, 0);
    bits
}

/// Recover the payload from decoded bytes.
///
/// The bytes before the first [`DELIMITER`] must be a non-empty run of ASCII
/// digits giving the payload length `L`; the `L` bytes after the delimiter
/// are returned. Returns `None` when there is no delimiter, the prefix is not
/// a number, or fewer than `L` bytes follow.
pub fn unframe(bytes: &[u8]) -> Option<&[u8]> {
    let pos = bytes.iter().position(|&b| b == DELIMITER)?;
    let prefix = &bytes[..pos];
    if prefix.is_empty() || !prefix.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let len: usize = std::str::from_utf8(prefix).ok()?.parse().ok()?;
    let start = pos + 1;
    let end = start.checked_add(len)?;
    bytes.get(start..end)
}
