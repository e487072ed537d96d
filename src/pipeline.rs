// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Decide → perturb → embed orchestration.
//!
//! [`Protector`] owns the run-time configuration, the face detector, and an
//! optional append-only [`AuditSink`]. It holds no per-image state, so one
//! instance can serve concurrent calls from many threads. Cancellation is
//! coarse: a [`CancelToken`] is checked before each stage starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{info, warn};
use serde::Serialize;

use crate::decision::{decide, DecisionMetadata, FaceDetector, NoFaceDetector, ProtectionLevel};
use crate::error::{GuardError, Result};
use crate::perturb::{perturb_seeded, ProtectionParams};
use crate::raster::{codec, ImageBuffer, MAX_DIMENSION, MAX_PIXELS};
use crate::watermark::{embed_payload, payload::now_iso8601, WatermarkPayload, WATERMARK_VERSION};

/// Run-time settings for a [`Protector`].
#[derive(Debug, Clone)]
pub struct ProtectorConfig {
    /// Version string written into every watermark.
    pub watermark_version: String,
    /// Fixed perturbation seed. `None` draws a fresh seed per call.
    pub seed: Option<u64>,
    /// Largest accepted width or height for encoded uploads.
    pub max_dimension: u32,
    /// Largest accepted pixel count for encoded uploads.
    pub max_pixels: u64,
}

impl Default for ProtectorConfig {
    fn default() -> Self {
        Self {
            watermark_version: WATERMARK_VERSION.to_string(),
            seed: None,
            max_dimension: MAX_DIMENSION,
            max_pixels: MAX_PIXELS,
        }
    }
}

/// Per-call cancellation flag. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(GuardError::Cancelled)` once [`cancel`](Self::cancel) was called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GuardError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One line of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub filename: String,
    pub owner_id: String,
    /// `None` if the run stopped before a level was decided.
    pub final_level: Option<ProtectionLevel>,
    pub timestamp: String,
    /// `"protected"` or the error message.
    pub outcome: String,
}

/// Append-only destination for audit records. Implementations serialize
/// their own writes.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: AuditRecord);
}

/// In-memory sink, mostly for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: AuditRecord) {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).push(record);
    }
}

/// Who is asking, and under what name the image was uploaded.
#[derive(Debug, Clone, Copy)]
pub struct ProtectionRequest<'a> {
    pub filename: &'a str,
    pub owner_id: &'a str,
    pub consent: bool,
}

/// Merged metadata of one protected image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtectionRecord {
    pub decision: DecisionMetadata,
    pub params: ProtectionParams,
    pub watermark: WatermarkPayload,
}

impl ProtectionRecord {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GuardError::EncodeFailed(e.to_string()))
    }
}

/// Protected buffer plus its record.
#[derive(Debug, Clone)]
pub struct ProtectionOutcome {
    pub image: ImageBuffer,
    pub record: ProtectionRecord,
}

/// Protected PNG bytes plus its record.
#[derive(Debug, Clone)]
pub struct ProtectedUpload {
    pub png: Vec<u8>,
    pub record: ProtectionRecord,
}

/// The pipeline orchestrator.
pub struct Protector {
    config: ProtectorConfig,
    detector: Box<dyn FaceDetector>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl Default for Protector {
    fn default() -> Self {
        Self::new(ProtectorConfig::default())
    }
}

impl Protector {
    /// A protector without face detection and without an audit sink.
    pub fn new(config: ProtectorConfig) -> Self {
        Self { config, detector: Box::new(NoFaceDetector), audit: None }
    }

    pub fn with_detector(mut self, detector: impl FaceDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn config(&self) -> &ProtectorConfig {
        &self.config
    }

    /// Protect a decoded image.
    ///
    /// # Errors
    /// - [`GuardError::ContentUnavailable`] for an empty buffer.
    /// - [`GuardError::CapacityExceeded`] if the watermark does not fit.
    /// - [`GuardError::Cancelled`] if `cancel` fires before a stage.
    pub fn protect(&self, img: &ImageBuffer, req: &ProtectionRequest<'_>, cancel: &CancelToken) -> Result<ProtectionOutcome> {
        let result = self.run(img, req, cancel);
        let level = result.as_ref().ok().map(|o| o.record.decision.final_level);
        self.audit(req, level, result.as_ref().err());
        result
    }

    /// Protect an encoded upload and return PNG bytes.
    ///
    /// An undecodable upload still gets a (zero-feature) decision for the
    /// audit trail, then fails with [`GuardError::ContentUnavailable`].
    pub fn protect_bytes(&self, bytes: &[u8], req: &ProtectionRequest<'_>, cancel: &CancelToken) -> Result<ProtectedUpload> {
        let img = match codec::decode(bytes, self.config.max_dimension, self.config.max_pixels) {
            Ok(img) => img,
            Err(e) => {
                warn!("{}: {e}; deciding on filename only", req.filename);
                let (level, _) = decide(req.filename, None, self.detector.as_ref());
                self.audit(req, Some(level), Some(&e));
                return Err(e);
            }
        };

        let outcome = self.protect(&img, req, cancel)?;
        let png = codec::encode_png(&outcome.image)?;
        Ok(ProtectedUpload { png, record: outcome.record })
    }

    fn run(&self, img: &ImageBuffer, req: &ProtectionRequest<'_>, cancel: &CancelToken) -> Result<ProtectionOutcome> {
        cancel.check()?;
        let (level, decision) = decide(req.filename, Some(img), self.detector.as_ref());

        cancel.check()?;
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let (perturbed, params) = perturb_seeded(img, level, seed)?;

        cancel.check()?;
        let watermark = WatermarkPayload::new(req.owner_id, req.consent, self.config.watermark_version.as_str());
        let image = embed_payload(&perturbed, &watermark)?;

        info!(
            "protected {} ({}x{}) at {level} for owner {}",
            req.filename,
            img.width(),
            img.height(),
            req.owner_id
        );

        Ok(ProtectionOutcome { image, record: ProtectionRecord { decision, params, watermark } })
    }

    fn audit(&self, req: &ProtectionRequest<'_>, level: Option<ProtectionLevel>, err: Option<&GuardError>) {
        if let Some(sink) = &self.audit {
            sink.append(AuditRecord {
                filename: req.filename.to_string(),
                owner_id: req.owner_id.to_string(),
                final_level: level,
                timestamp: now_iso8601(),
                outcome: err.map_or_else(|| "protected".to_string(), |e| e.to_string()),
            });
        }
    }
}
