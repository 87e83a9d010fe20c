// phiscrub-core/src/resolver.rs
//! Span-conflict resolution.
//!
//! All detector passes run independently and may propose overlapping
//! candidates (a ZIP inside an address, an NER name over a labeled name).
//! The resolver merges them into a single ordered, non-overlapping span
//! set so the subsequent rewrite is one linear pass with no
//! double-substitution.
//!
//! License: MIT OR Apache-2.0

use std::cmp::Ordering;

use crate::detection::{DetectionSpan, SpanSource};

/// Position of a source in the configured priority list; unlisted sources
/// rank last.
fn rank(source: SpanSource, priority: &[SpanSource]) -> usize {
    priority
        .iter()
        .position(|s| *s == source)
        .unwrap_or(priority.len())
}

/// Merges candidate span lists from all detectors into an ordered,
/// non-overlapping set.
///
/// Candidates are sorted by `start` ascending, then span length descending
/// (longer match wins ties), then by source priority so conflicts resolve
/// deterministically. The left-to-right sweep keeps the winner of each
/// overlap: a later candidate replaces the current span only when it
/// outranks it (higher priority, then longer).
pub fn resolve(
    span_lists: Vec<Vec<DetectionSpan>>,
    priority: &[SpanSource],
) -> Vec<DetectionSpan> {
    let mut candidates: Vec<DetectionSpan> = span_lists.into_iter().flatten().collect();

    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| rank(a.source, priority).cmp(&rank(b.source, priority)))
    });

    let mut resolved: Vec<DetectionSpan> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let Some(current) = resolved.last() else {
            resolved.push(candidate);
            continue;
        };

        if candidate.start >= current.end {
            resolved.push(candidate);
            continue;
        }

        // Overlap: keep the higher-priority span; equal priority falls back
        // to the longer one, and the incumbent wins full ties.
        let candidate_outranks = match rank(candidate.source, priority)
            .cmp(&rank(current.source, priority))
        {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => candidate.len() > current.len(),
        };

        if candidate_outranks {
            *resolved.last_mut().unwrap() = candidate;
        }
    }

    resolved
}
