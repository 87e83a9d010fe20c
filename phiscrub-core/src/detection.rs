// phiscrub-core/src/detection.rs
//! Core data structures for detection spans, PII categories, and utilities
//! for logging match activity without leaking sensitive content.

use serde::{Deserialize, Serialize};
use log::debug;
use std::fmt;

use lazy_static::lazy_static;
use sha2::{Digest, Sha256};
use hex;

lazy_static! {
    /// A static boolean that is initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("PHISCRUB_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// The kinds of sensitive data the engine detects.
///
/// Each category carries a stable placeholder label used when allocating
/// redaction tokens (e.g. `Email` produces `[EMAIL_1]`, `[EMAIL_2]`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Email,
    Phone,
    Ssn,
    CreditCard,
    Zip,
    Date,
    Address,
    CityState,
    PoBox,
    Mrn,
    Name,
}

impl PiiCategory {
    /// The label embedded in placeholder tokens for this category.
    pub fn label(&self) -> &'static str {
        match self {
            PiiCategory::Email => "EMAIL",
            PiiCategory::Phone => "PHONE",
            PiiCategory::Ssn => "SSN",
            PiiCategory::CreditCard => "CC",
            PiiCategory::Zip => "ZIP",
            PiiCategory::Date => "DATE",
            PiiCategory::Address => "ADDR",
            PiiCategory::CityState => "CITY",
            PiiCategory::PoBox => "POBOX",
            PiiCategory::Mrn => "MRN",
            PiiCategory::Name => "PER",
        }
    }

    /// Stable lowercase identifier, used in configs, audit totals and hashes.
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiCategory::Email => "email",
            PiiCategory::Phone => "phone",
            PiiCategory::Ssn => "ssn",
            PiiCategory::CreditCard => "credit_card",
            PiiCategory::Zip => "zip",
            PiiCategory::Date => "date",
            PiiCategory::Address => "address",
            PiiCategory::CityState => "city_state",
            PiiCategory::PoBox => "po_box",
            PiiCategory::Mrn => "mrn",
            PiiCategory::Name => "name",
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which detection pass produced a span.
///
/// The resolver uses this to break conflicts between overlapping candidates;
/// the priority order itself lives in `ScrubConfig::priority` so it is an
/// explicit configuration value rather than an implicit constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSource {
    /// Keyword-anchored identifier extraction (e.g. an MRN after "MRN:").
    Contextual,
    /// Name extraction anchored by a labeling keyword ("Patient Name:").
    LabeledName,
    /// Stateless structural pattern matching (email, SSN, phone, ...).
    Structural,
    /// Spans proposed by the optional statistical name detector.
    Ner,
}

impl SpanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanSource::Contextual => "contextual",
            SpanSource::LabeledName => "labeled_name",
            SpanSource::Structural => "structural",
            SpanSource::Ner => "ner",
        }
    }
}

/// A single candidate region of sensitive text, identified by one detector.
///
/// `start`/`end` are byte offsets into the text the detector was handed,
/// half-open, and always fall on character boundaries. Spans are internal
/// to the engine: they feed the resolver and never appear in `ScrubResult`.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSpan {
    pub start: usize,
    pub end: usize,
    pub category: PiiCategory,
    pub raw_value: String,
    pub source: SpanSource,
    /// Per-detector confidence in [0.0, 1.0].
    pub confidence: f64,
}

impl DetectionSpan {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Checks the span invariant against the text it was produced from.
    pub fn is_valid_for(&self, text: &str) -> bool {
        self.start < self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end)
    }
}

/// Produces a loggable stand-in for sensitive content.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

/// Debug-logs a detector firing without exposing the matched value unless
/// the PHISCRUB_ALLOW_DEBUG_PII override is set.
pub fn log_span_debug(module_path: &str, category: PiiCategory, raw_value: &str) {
    debug!(
        "{} Detected span: category='{}', value='{}'",
        module_path,
        category.as_str(),
        get_loggable_content(raw_value)
    );
}

/// Computes a canonical, whitespace/case-insensitive hash of a matched
/// snippet, namespaced by category. Audit reports carry these instead of
/// raw values.
pub fn canonical_sample_hash(category_id: &str, snippet: &str) -> String {
    let normalized = snippet
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut hasher = Sha256::new();
    hasher.update(category_id.as_bytes());
    hasher.update(b":");
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}
