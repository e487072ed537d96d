// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Example: protect an image, or read back its watermark.
use std::fs;

use veil_core::raster::{codec, MAX_DIMENSION, MAX_PIXELS};
use veil_core::{CancelToken, ExtractedWatermark, ProtectionRequest, Protector};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: protect <input> <owner_id> [--consent]");
        eprintln!("       protect --extract <protected.png>");
        std::process::exit(1);
    }

    if args[1] == "--extract" {
        let bytes = fs::read(&args[2]).expect("Could not read image");
        let img = codec::decode(&bytes, MAX_DIMENSION, MAX_PIXELS).expect("Could not decode image");
        match veil_core::extract_watermark(&img) {
            Some(ExtractedWatermark::Structured(p)) => {
                println!("Owner:     {}", p.owner_id);
                println!("Consent:   {}", p.consent);
                println!("Timestamp: {}", p.timestamp);
                println!("Version:   {}", p.version);
            }
            Some(ExtractedWatermark::Raw(text)) => println!("Unstructured watermark: {text}"),
            None => println!("No watermark found"),
        }
        return;
    }

    let input = &args[1];
    let upload = fs::read(input).expect("Could not read input image");
    let filename = std::path::Path::new(input)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(input.as_str());
    let req = ProtectionRequest {
        filename,
        owner_id: &args[2],
        consent: args.iter().any(|a| a == "--consent"),
    };

    let protected = Protector::default()
        .protect_bytes(&upload, &req, &CancelToken::new())
        .expect("Protection failed");

    let stem = input.rsplit_once('.').map_or(input.as_str(), |(s, _)| s);
    let out_path = format!("{stem}_protected.png");
    fs::write(&out_path, &protected.png).expect("Could not write output");
    println!("Protected image written to: {out_path}");
    println!("Level: {}", protected.record.decision.final_level);
    println!("{}", protected.record.to_json().expect("Could not serialize record"));
}
