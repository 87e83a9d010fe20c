// phiscrub-core/src/audit.rs
//! Audit collection for compliance review.
//!
//! One `AuditCollector` is created per scrub invocation and threaded through
//! the passes, never a process-wide singleton, so concurrent documents
//! cannot cross-contaminate trails. The finalized `AuditReport` is
//! serializable for external compliance tooling and carries canonical
//! SHA-256 sample hashes plus placeholder examples; raw PII never appears in
//! a report.
//!
//! License: MIT OR Apache-2.0

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detection::{canonical_sample_hash, DetectionSpan};
use crate::errors::ScrubError;
use crate::placeholder::PlaceholderMap;

/// At most this many sample hashes / placeholder examples are kept per entry.
const MAX_SAMPLES: usize = 3;

/// A single detector firing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: String,
    /// Which pass fired ("patterns", "contextual_id", "ner", "validation", ...).
    pub detector: String,
    /// Category the matches belong to; "none" for a pass that found nothing.
    pub category: String,
    pub matches: usize,
    pub duration_ms: u64,
    /// Canonical hashes of up to [`MAX_SAMPLES`] matched values.
    pub sample_hashes: Vec<String>,
}

/// Aggregated totals over the resolved span set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_detections: usize,
    pub by_category: BTreeMap<String, usize>,
    pub duration_ms: u64,
}

/// The finalized, serializable audit record for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: Uuid,
    pub created_at: String,
    pub doc_bytes: usize,
    pub duration_ms: u64,
    pub confidence: u8,
    pub replacement_count: usize,
    pub total_detections: usize,
    pub totals_by_category: BTreeMap<String, usize>,
    /// Placeholder tokens per category, capped, in allocation order.
    pub replacement_examples: BTreeMap<String, Vec<String>>,
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    /// JSON form for external compliance tooling.
    pub fn to_json(&self) -> Result<String, ScrubError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One line per entry, for appending to a flat audit log.
    pub fn log_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "run={} detector={} category={} matches={} duration_ms={}",
                    self.run_id, e.detector, e.category, e.matches, e.duration_ms
                )
            })
            .collect()
    }
}

/// Per-invocation collector of detector firings.
pub struct AuditCollector {
    run_id: Uuid,
    started_at: String,
    t0: Instant,
    doc_bytes: usize,
    entries: Vec<AuditEntry>,
    totals_by_category: BTreeMap<String, usize>,
    total_detections: usize,
    replacement_examples: BTreeMap<String, Vec<String>>,
}

impl AuditCollector {
    pub fn new(doc_bytes: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now().to_rfc3339(),
            t0: Instant::now(),
            doc_bytes,
            entries: Vec::new(),
            totals_by_category: BTreeMap::new(),
            total_detections: 0,
            replacement_examples: BTreeMap::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Records one detector pass. Matches are grouped per category; a pass
    /// that found nothing still leaves a timing record.
    pub fn log_pass(&mut self, detector: &str, spans: &[DetectionSpan], duration: Duration) {
        let timestamp = Utc::now().to_rfc3339();
        let duration_ms = duration.as_millis() as u64;

        if spans.is_empty() {
            self.entries.push(AuditEntry {
                timestamp,
                detector: detector.to_string(),
                category: "none".to_string(),
                matches: 0,
                duration_ms,
                sample_hashes: Vec::new(),
            });
            return;
        }

        let mut grouped: BTreeMap<&str, Vec<&DetectionSpan>> = BTreeMap::new();
        for span in spans {
            grouped.entry(span.category.as_str()).or_default().push(span);
        }

        for (category, group) in grouped {
            let sample_hashes = group
                .iter()
                .take(MAX_SAMPLES)
                .map(|s| canonical_sample_hash(category, &s.raw_value))
                .collect();
            self.entries.push(AuditEntry {
                timestamp: timestamp.clone(),
                detector: detector.to_string(),
                category: category.to_string(),
                matches: group.len(),
                duration_ms,
                sample_hashes,
            });
        }
    }

    /// Records the resolved span set the rewrite will act on; summary
    /// totals come from here rather than from raw pass firings, which may
    /// overlap across detectors.
    pub fn record_resolved(&mut self, resolved: &[DetectionSpan]) {
        self.total_detections += resolved.len();
        for span in resolved {
            *self
                .totals_by_category
                .entry(span.category.as_str().to_string())
                .or_insert(0) += 1;
        }
    }

    /// Captures placeholder examples (tokens only, no raw values).
    pub fn record_replacement_examples(&mut self, map: &PlaceholderMap) {
        for (category, token) in map.allocations() {
            let examples = self
                .replacement_examples
                .entry(category.as_str().to_string())
                .or_default();
            if examples.len() < MAX_SAMPLES {
                examples.push(token.clone());
            }
        }
    }

    /// Aggregated totals so far.
    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            total_detections: self.total_detections,
            by_category: self.totals_by_category.clone(),
            duration_ms: self.t0.elapsed().as_millis() as u64,
        }
    }

    /// Finalizes the collector into a serializable report.
    pub fn finish(self, confidence: u8, replacement_count: usize) -> AuditReport {
        AuditReport {
            run_id: self.run_id,
            created_at: self.started_at,
            doc_bytes: self.doc_bytes,
            duration_ms: self.t0.elapsed().as_millis() as u64,
            confidence,
            replacement_count,
            total_detections: self.total_detections,
            totals_by_category: self.totals_by_category,
            replacement_examples: self.replacement_examples,
            entries: self.entries,
        }
    }
}
