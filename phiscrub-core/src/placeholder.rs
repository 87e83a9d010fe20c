// phiscrub-core/src/placeholder.rs
//! Placeholder allocation and the redaction rewrite.
//!
//! `PlaceholderMap` owns the raw-value -> token mapping and the per-category
//! counters for one document. Its lifetime is a single scrub call: it is
//! never shared across documents or threads, and a chunked scrub threads one
//! map through every segment so identical values collapse to one token.
//!
//! The map holds raw PII and therefore refuses casual exposure: `Debug`
//! output redacts raw values and the type is deliberately not serializable.
//!
//! License: MIT OR Apache-2.0

use std::collections::HashMap;
use std::fmt;

use crate::detection::{redact_sensitive, DetectionSpan, PiiCategory};

/// Per-document mapping from raw values to stable, typed placeholder tokens.
#[derive(Clone, Default)]
pub struct PlaceholderMap {
    by_value: HashMap<String, String>,
    counters: HashMap<PiiCategory, u32>,
    /// Allocation order, kept for audit example reporting.
    allocations: Vec<(PiiCategory, String)>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the placeholder for `raw`, allocating `[LABEL_N]` on first
    /// sight. Counters start at 1, increase monotonically in first-sight
    /// order, and are never reused within a document.
    pub fn token_for(&mut self, category: PiiCategory, raw: &str) -> String {
        if let Some(token) = self.by_value.get(raw) {
            return token.clone();
        }

        let counter = self.counters.entry(category).or_insert(0);
        *counter += 1;
        let token = format!("[{}_{}]", category.label(), counter);

        self.by_value.insert(raw.to_string(), token.clone());
        self.allocations.push((category, token.clone()));
        token
    }

    /// The placeholder previously allocated for `raw`, if any.
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.by_value.get(raw).map(String::as_str)
    }

    /// Number of distinct raw values mapped.
    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }

    /// Iterates `(raw_value, placeholder)` pairs. The raw side is PII;
    /// callers are expected to hash or discard it before export.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_value.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Placeholder tokens in allocation order, with their categories.
    pub fn allocations(&self) -> &[(PiiCategory, String)] {
        &self.allocations
    }
}

impl fmt::Debug for PlaceholderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (raw, token) in &self.by_value {
            map.entry(&redact_sensitive(raw), token);
        }
        map.finish()
    }
}

/// Rewrites `text` by substituting each resolved span with its placeholder.
///
/// The output is built left-to-right from span boundaries, never via
/// repeated global string replacement, which would corrupt offsets once an
/// earlier substitution changes the text length. `spans` must be the
/// resolver's output: ordered and non-overlapping.
pub fn rewrite(text: &str, spans: &[DetectionSpan], map: &mut PlaceholderMap) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0usize;

    for span in spans {
        // Resolver output upholds this; skip rather than corrupt on a bad span.
        if span.start < last_end || span.end > text.len() || span.start >= span.end {
            continue;
        }
        out.push_str(&text[last_end..span.start]);
        out.push_str(&map.token_for(span.category, &span.raw_value));
        last_end = span.end;
    }
    out.push_str(&text[last_end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::SpanSource;

    fn span(start: usize, end: usize, category: PiiCategory, raw: &str) -> DetectionSpan {
        DetectionSpan {
            start,
            end,
            category,
            raw_value: raw.to_string(),
            source: SpanSource::Structural,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_first_sight_numbering() {
        let mut map = PlaceholderMap::new();
        assert_eq!(map.token_for(PiiCategory::Email, "a@x.com"), "[EMAIL_1]");
        assert_eq!(map.token_for(PiiCategory::Email, "b@x.com"), "[EMAIL_2]");
        assert_eq!(map.token_for(PiiCategory::Ssn, "123-45-6789"), "[SSN_1]");
        // Re-seen value reuses its token; the counter does not advance.
        assert_eq!(map.token_for(PiiCategory::Email, "a@x.com"), "[EMAIL_1]");
        assert_eq!(map.token_for(PiiCategory::Email, "c@x.com"), "[EMAIL_3]");
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_rewrite_is_single_linear_pass() {
        let text = "mail a@x.com then b@x.com then a@x.com";
        let spans = vec![
            span(5, 12, PiiCategory::Email, "a@x.com"),
            span(18, 25, PiiCategory::Email, "b@x.com"),
            span(31, 38, PiiCategory::Email, "a@x.com"),
        ];
        let mut map = PlaceholderMap::new();
        let out = rewrite(text, &spans, &mut map);
        assert_eq!(out, "mail [EMAIL_1] then [EMAIL_2] then [EMAIL_1]");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_rewrite_with_no_spans_is_identity() {
        let mut map = PlaceholderMap::new();
        assert_eq!(rewrite("nothing here", &[], &mut map), "nothing here");
        assert!(map.is_empty());
    }

    #[test]
    fn test_debug_output_redacts_raw_values() {
        let mut map = PlaceholderMap::new();
        map.token_for(PiiCategory::Email, "john.doe@example.com");
        let debug = format!("{map:?}");
        assert!(!debug.contains("john.doe"));
        assert!(debug.contains("[EMAIL_1]"));
    }

    #[test]
    fn test_shared_map_across_segments_collapses_values() {
        let mut map = PlaceholderMap::new();
        let a = rewrite("see a@x.com", &[span(4, 11, PiiCategory::Email, "a@x.com")], &mut map);
        let b = rewrite("ping a@x.com", &[span(5, 12, PiiCategory::Email, "a@x.com")], &mut map);
        assert_eq!(a, "see [EMAIL_1]");
        assert_eq!(b, "ping [EMAIL_1]");
        assert_eq!(map.len(), 1);
    }
}
