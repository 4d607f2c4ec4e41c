//! The persisted image snapshot and digest-based change detection
//!
//! A snapshot captures everything the watchdog knows about the monitored
//! image at one point in time. The on-disk layout is a single JSON record:
//!
//! ```json
//! {
//!   "base64_content": "...",
//!   "hash": "9f86d081884c7d65...",
//!   "last_updated": "2025-01-09T12:00:00Z",
//!   "source_url": "https://example.com/image.png"
//! }
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// The last observed state of the monitored image
///
/// Snapshots are created fresh on every successful fetch and persisted after
/// every cycle, so `observed_at` always reflects the most recent check. The
/// previous snapshot is read at the start of a cycle and superseded, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSnapshot {
    /// Image bytes, base64-encoded for storage
    #[serde(rename = "base64_content")]
    pub content: String,

    /// SHA-256 of the raw bytes, lowercase hex
    #[serde(rename = "hash")]
    pub digest: String,

    /// When this snapshot was taken (UTC)
    #[serde(rename = "last_updated")]
    pub observed_at: DateTime<Utc>,

    /// The URL the image was fetched from
    #[serde(rename = "source_url")]
    pub source_url: String,
}

impl ImageSnapshot {
    /// Build a snapshot from freshly fetched bytes
    ///
    /// This is the only way snapshots are constructed, which guarantees the
    /// invariant that `digest` is always the fingerprint of `content`: both
    /// are derived here from the same byte slice.
    pub fn from_bytes(bytes: &[u8], source_url: impl Into<String>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);

        Self {
            content: BASE64.encode(bytes),
            digest: hex::encode(hasher.finalize()),
            observed_at: Utc::now(),
            source_url: source_url.into(),
        }
    }

    /// Decode the stored payload back to raw bytes
    pub fn decode_content(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.content)
            .map_err(|e| Error::store(format!("invalid base64 payload: {}", e)))
    }

    /// Whether this snapshot represents a change relative to `previous`
    ///
    /// An absent previous snapshot always counts as a change: the first run
    /// triggers the first notification and establishes the baseline.
    /// Otherwise snapshots are compared by digest only; `observed_at` and
    /// `source_url` never influence the result.
    pub fn differs_from(&self, previous: Option<&ImageSnapshot>) -> bool {
        match previous {
            None => true,
            Some(prev) => prev.digest != self.digest,
        }
    }
}
