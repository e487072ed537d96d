// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Ownership/consent metadata carried by the watermark.
//!
//! Serialized as compact JSON before bit-encoding, e.g.
//! `{"owner_id":"alice","consent":false,"timestamp":"2026-01-02T03:04:05Z","version":"1.0"}`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};

/// Watermark format version written by default.
pub const WATERMARK_VERSION: &str = "1.0";

/// Structured watermark metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkPayload {
    pub owner_id: String,
    pub consent: bool,
    /// ISO-8601 / RFC 3339 UTC timestamp.
    pub timestamp: String,
    pub version: String,
}

impl WatermarkPayload {
    /// Payload stamped with the current UTC time.
    pub fn new(owner_id: impl Into<String>, consent: bool, version: impl Into<String>) -> Self {
        Self::with_timestamp(owner_id, consent, now_iso8601(), version)
    }

    pub fn with_timestamp(
        owner_id: impl Into<String>,
        consent: bool,
        timestamp: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            consent,
            timestamp: timestamp.into(),
            version: version.into(),
        }
    }

    /// Compact JSON form embedded into the image.
    pub fn to_compact(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GuardError::EncodeFailed(e.to_string()))
    }

    /// Parse the compact form. `None` if `text` is not a payload object.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Current UTC time, second precision, `Z` suffix.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_form_is_stable() {
        let p = WatermarkPayload::with_timestamp("alice", false, "2026-01-02T03:04:05Z", "1.0");
        assert_eq!(
            p.to_compact().unwrap(),
            r#"{"owner_id":"alice","consent":false,"timestamp":"2026-01-02T03:04:05Z","version":"1.0"}"#
        );
    }

    #[test]
    fn parse_roundtrip() {
        let p = WatermarkPayload::with_timestamp("ß-owner \"quoted\"", true, "2026-01-02T03:04:05Z", "1.0");
        assert_eq!(WatermarkPayload::parse(&p.to_compact().unwrap()), Some(p));
    }

    #[test]
    fn parse_rejects_other_text() {
        assert_eq!(WatermarkPayload::parse("hello"), None);
        assert_eq!(WatermarkPayload::parse(r#"{"owner_id":"x"}"#), None);
    }

    #[test]
    fn timestamp_format() {
        let ts = now_iso8601();
        assert_eq!(ts.len(), 20, "{ts}");
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }
}
