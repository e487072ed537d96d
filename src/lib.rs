// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! # veil-core
//!
//! Image protection against unauthorized model use, in three steps:
//!
//! - **Decide** (`decision`): fuse filename keywords and content features
//!   (faces, size, brightness) into a LOW / MEDIUM / HIGH protection level.
//!   The most cautious signal wins.
//! - **Perturb** (`perturb`): add spatial, high-pass frequency, directional
//!   and (for MEDIUM/HIGH) low-frequency texture noise calibrated to the level.
//! - **Embed** (`watermark`): write a length-prefixed owner/consent record into
//!   the sample LSBs. `extract_watermark` is the inverse.
//!
//! The perturbation is a heuristic: it is not computed against a trained
//! model and makes no certified robustness claim. Its frequency stage mixes
//! in a 0.3-weighted copy of each channel, so outputs come out about 30%
//! brighter (clamped at 255). The watermark is neither encrypted nor robust
//! to lossy recompression; keep outputs in PNG.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use veil_core::{Protector, ProtectionRequest, CancelToken};
//!
//! let upload = std::fs::read("profile.png").unwrap();
//! let req = ProtectionRequest { filename: "profile.png", owner_id: "user-42", consent: false };
//! let protected = Protector::default().protect_bytes(&upload, &req, &CancelToken::new()).unwrap();
//! std::fs::write("protected.png", &protected.png).unwrap();
//! ```

pub mod decision;
pub mod error;
pub mod perturb;
pub mod pipeline;
pub mod raster;
pub mod watermark;

pub use decision::{decide, decide_with_features, DecisionMetadata, FaceBounds, FaceDetector, FeatureSet, NoFaceDetector, ProtectionLevel};
pub use error::{GuardError, Result};
pub use perturb::{perturb as protect, perturb_seeded, ProtectionParams};
pub use pipeline::{AuditRecord, AuditSink, CancelToken, MemoryAuditSink, ProtectedUpload, ProtectionOutcome, ProtectionRecord, ProtectionRequest, Protector, ProtectorConfig};
pub use raster::ImageBuffer;
pub use watermark::{embed_watermark, extract_watermark, ExtractedWatermark, WatermarkPayload};
