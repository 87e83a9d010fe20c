// phiscrub-core/src/confidence.rs
//! Confidence scoring and the post-rewrite validation pass.
//!
//! The validation pass re-scans the rewritten output with the full Pattern
//! Library. Any match there is a leak: the orchestrator surfaces it as a
//! typed fault instead of returning the document as safe. Scoring is a
//! separate, purely informational signal in [0, 100].
//!
//! License: MIT OR Apache-2.0

use once_cell::sync::Lazy;
use regex::Regex;

use crate::detection::DetectionSpan;
use crate::detectors::compiler::CompiledDetectors;
use crate::detectors::patterns::detect_patterns;

/// Spans below this per-detector confidence count as weak signals.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.70;
/// Penalty applied when NER was unavailable and the document carries
/// label-free name-shaped tokens the deterministic passes cannot anchor.
pub const NER_DEGRADED_PENALTY: u32 = 15;
/// Penalty per weak span.
pub const LOW_CONFIDENCE_SPAN_PENALTY: u32 = 2;
/// Cap on the cumulative weak-span penalty.
pub const LOW_CONFIDENCE_PENALTY_CAP: u32 = 20;

/// Two adjacent capitalized words, the shape of an unlabeled person name.
static NAME_SHAPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b").unwrap());

/// Re-scans rewritten output for residual PII signatures.
///
/// Runs the same structural patterns (including their programmatic
/// validators) as the detection pass, so the two passes agree on what
/// counts as PII. A non-empty result means the document leaked.
pub fn validation_scan(detectors: &CompiledDetectors, output: &str) -> Vec<DetectionSpan> {
    detect_patterns(detectors, output)
}

/// Aggregates per-span and per-document signals into a 0-100 score.
///
/// Base 100, minus a degradation penalty when NER was unavailable on a
/// document that contains label-free name-shaped tokens, minus a capped
/// per-span penalty for weak detector confidence. A document with zero
/// detections and no degradation scores 100.
pub fn score(resolved: &[DetectionSpan], ner_degraded: bool, source_text: &str) -> u8 {
    let mut penalty: u32 = 0;

    if ner_degraded && has_name_shaped_tokens(source_text) {
        penalty += NER_DEGRADED_PENALTY;
    }

    let weak_spans = resolved
        .iter()
        .filter(|s| s.confidence < LOW_CONFIDENCE_THRESHOLD)
        .count() as u32;
    penalty += (weak_spans * LOW_CONFIDENCE_SPAN_PENALTY).min(LOW_CONFIDENCE_PENALTY_CAP);

    100u32.saturating_sub(penalty).min(100) as u8
}

/// Heuristic presence check for unlabeled name-shaped content.
pub fn has_name_shaped_tokens(text: &str) -> bool {
    NAME_SHAPED.is_match(text)
}
