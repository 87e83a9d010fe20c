// phiscrub-core/src/detectors/context.rs
//! Keyword-anchored context detectors.
//!
//! These passes only fire when a labeling token precedes the candidate
//! value, which is the engine's primary defense against false positives on
//! ordinary numeric content (lab values, years) and ordinary capitalized
//! prose. The span covers the value only, never the keyword.
//!
//! License: MIT OR Apache-2.0

use crate::detection::{log_span_debug, DetectionSpan, PiiCategory, SpanSource};
use crate::detectors::compiler::{CompiledDetectors, ContextMatcher};

/// Detects contextual identifiers: alphanumeric tokens of bounded length
/// directly preceded by a configured keyword ("MRN:", "Patient ID", ...).
/// Standalone tokens never match.
pub fn detect_contextual_ids(detectors: &CompiledDetectors, text: &str) -> Vec<DetectionSpan> {
    scan_context(
        &detectors.contextual_id,
        PiiCategory::Mrn,
        SpanSource::Contextual,
        text,
    )
}

/// Detects labeled names: capitalized 1-3 word sequences preceded by a name
/// label ("Name:", "Patient Name:", JSON-style `patientName` keys). Bare
/// names with no label are intentionally left to the NER adapter.
pub fn detect_labeled_names(detectors: &CompiledDetectors, text: &str) -> Vec<DetectionSpan> {
    scan_context(
        &detectors.labeled_name,
        PiiCategory::Name,
        SpanSource::LabeledName,
        text,
    )
}

fn scan_context(
    matcher: &ContextMatcher,
    category: PiiCategory,
    source: SpanSource,
    text: &str,
) -> Vec<DetectionSpan> {
    let mut spans = Vec::new();
    for caps in matcher.regex.captures_iter(text) {
        // Group 1 is the value; the anchoring keyword stays in the text.
        let Some(value) = caps.get(1) else { continue };
        let raw = value.as_str();
        log_span_debug(module_path!(), category, raw);
        spans.push(DetectionSpan {
            start: value.start(),
            end: value.end(),
            category,
            raw_value: raw.to_string(),
            source,
            confidence: matcher.confidence,
        });
    }
    spans
}
