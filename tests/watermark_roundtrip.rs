// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Watermark codec: round-trip law, capacity rejection, and negative results.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use veil_core::watermark::{bits, embed_payload, embed_text, extract_text, max_payload_len};
use veil_core::{embed_watermark, extract_watermark, ExtractedWatermark, GuardError, ImageBuffer, WatermarkPayload};

fn noise_image(width: usize, height: usize, seed: u64) -> ImageBuffer {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    ImageBuffer::from_fn(width, height, |_, _| [rng.gen(), rng.gen(), rng.gen()])
}

/// Every sample even, so every LSB is zero.
fn even_image(width: usize, height: usize) -> ImageBuffer {
    ImageBuffer::from_fn(width, height, |x, y| [(x * 2) as u8, (y * 4) as u8, 200])
}

#[test]
fn embed_watermark_roundtrip() {
    let img = noise_image(64, 48, 1);
    let marked = embed_watermark(&img, "user-42", true).unwrap();
    match extract_watermark(&marked) {
        Some(ExtractedWatermark::Structured(p)) => {
            assert_eq!(p.owner_id, "user-42");
            assert!(p.consent);
            assert!(p.timestamp.ends_with('Z'));
        }
        other => panic!("expected structured watermark, got {other:?}"),
    }
}

#[test]
fn embedding_changes_each_sample_by_at_most_one() {
    let img = noise_image(32, 32, 2);
    let marked = embed_watermark(&img, "owner", false).unwrap();
    for (a, b) in img.samples().iter().zip(marked.samples()) {
        assert!((*a as i16 - *b as i16).abs() <= 1);
    }
}

#[test]
fn oversized_payload_is_rejected_without_trace() {
    let img = even_image(8, 8); // 192 slots
    let payload = "x".repeat(64);
    match embed_text(&img, &payload) {
        Err(GuardError::CapacityExceeded { needed_bits, available_bits }) => {
            assert_eq!(needed_bits, bits::stream_bits(64));
            assert_eq!(available_bits, 192);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
    assert_eq!(extract_watermark(&img), None);
}

#[test]
fn largest_fitting_payload_roundtrips() {
    let img = noise_image(20, 10, 3);
    let n = max_payload_len(&img).unwrap();
    let text = "z".repeat(n);
    let marked = embed_text(&img, &text).unwrap();
    assert_eq!(extract_text(&marked), Some(text));
}

#[test]
fn unmarked_noise_images_have_no_watermark() {
    // A false positive needs the LSBs to spell "<digits>|" followed by enough
    // bytes, which random content almost never does.
    for seed in 100..108 {
        assert_eq!(extract_watermark(&noise_image(64, 64, seed)), None, "seed {seed}");
    }
}

#[test]
fn raw_payload_is_not_confused_with_absence() {
    let marked = embed_text(&noise_image(32, 32, 4), "{\"owner_id\":\"partial\"").unwrap();
    assert_eq!(
        extract_watermark(&marked),
        Some(ExtractedWatermark::Raw("{\"owner_id\":\"partial\"".to_string()))
    );
}

#[test]
fn re_embedding_overwrites_previous_mark() {
    let img = noise_image(64, 64, 5);
    let first = embed_text(&img, "a much longer first payload that spans more samples").unwrap();
    let second = embed_text(&first, "short").unwrap();
    assert_eq!(extract_text(&second).as_deref(), Some("short"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn structured_payload_roundtrip(
        owner in "\\PC{0,40}",
        consent in any::<bool>(),
        ts in "20[0-9]{2}-[01][0-9]-[0-3][0-9]T[0-2][0-9]:[0-5][0-9]:[0-5][0-9]Z",
        seed in 0u64..1000,
    ) {
        let img = noise_image(64, 48, seed);
        let payload = WatermarkPayload::with_timestamp(owner, consent, ts, "1.0");
        let marked = embed_payload(&img, &payload).unwrap();
        prop_assert_eq!(extract_watermark(&marked), Some(ExtractedWatermark::Structured(payload)));
    }

    #[test]
    fn bits_and_bytes_are_inverse(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(bits::bits_to_bytes(&bits::bytes_to_bits(&bytes)), bytes);
    }
}
