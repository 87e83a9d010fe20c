// phiscrub-core/src/engine.rs
//! The scrub orchestrator.
//!
//! `ScrubEngine` runs the full pipeline for one document: input hygiene,
//! the deterministic detection passes plus the optional NER join, span
//! resolution, the placeholder rewrite, the output validation pass, and
//! confidence scoring, emitting a per-call audit trail throughout. It is
//! the only place a `RedactedText` is ever constructed, and it constructs
//! one only after the validation pass finds the output clean.
//!
//! Engines hold no per-document state: `PlaceholderMap` and
//! `AuditCollector` are created fresh per call and returned by value, so N
//! documents may be scrubbed concurrently on one engine with no locking.
//!
//! License: MIT OR Apache-2.0

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use strip_ansi_escapes::strip;

use crate::audit::{AuditCollector, AuditReport};
use crate::confidence;
use crate::config::{validate_patterns, validate_priority, ScrubConfig};
use crate::detection::DetectionSpan;
use crate::detectors::compiler::{get_or_compile_detectors, CompiledDetectors};
use crate::detectors::context::{detect_contextual_ids, detect_labeled_names};
use crate::detectors::patterns::detect_patterns;
use crate::errors::ScrubError;
use crate::ner::{NameDetector, NerAdapter};
use crate::placeholder::{rewrite, PlaceholderMap};
use crate::resolver::resolve;
use crate::trust::{RawPhi, RedactedText};

/// Smallest chunk size the engine will honor; protects the line-boundary
/// splitter from degenerate configs.
const MIN_CHUNK_BYTES: usize = 1024;

/// The outcome of scrubbing one document. Immutable after creation.
#[derive(Debug)]
pub struct ScrubResult {
    /// The rewritten text, proven clean by the validation pass.
    pub text: RedactedText,
    /// Raw value -> placeholder mapping for this document.
    pub replacements: PlaceholderMap,
    /// Number of distinct values replaced; always `replacements.len()`.
    pub count: usize,
    /// Document confidence in 0..=100.
    pub confidence: u8,
}

/// Multi-pass detection-and-redaction engine for a fixed configuration.
pub struct ScrubEngine {
    config: ScrubConfig,
    detectors: Arc<CompiledDetectors>,
    ner: NerAdapter,
}

impl ScrubEngine {
    /// Builds an engine from configuration alone. The NER pass is inert
    /// until a detector is injected via [`ScrubEngine::with_name_detector`],
    /// regardless of `config.ner.enabled`.
    pub fn new(config: ScrubConfig) -> Result<Self, ScrubError> {
        Self::with_adapter(config, NerAdapter::disabled())
    }

    /// Builds an engine with an injected statistical name detector, run
    /// under the configured deadline.
    pub fn with_name_detector(
        config: ScrubConfig,
        detector: Arc<dyn NameDetector>,
    ) -> Result<Self, ScrubError> {
        let timeout = Duration::from_millis(config.ner.timeout_ms);
        let adapter = if config.ner.enabled {
            NerAdapter::new(detector, timeout)
        } else {
            debug!("NER detector injected but disabled by config; adapter stays inert.");
            NerAdapter::disabled()
        };
        Self::with_adapter(config, adapter)
    }

    fn with_adapter(config: ScrubConfig, ner: NerAdapter) -> Result<Self, ScrubError> {
        validate_patterns(&config.patterns).map_err(ScrubError::AnyhowWrapper)?;
        validate_priority(&config.priority).map_err(ScrubError::AnyhowWrapper)?;
        let detectors = get_or_compile_detectors(&config)?;
        Ok(Self {
            config,
            detectors,
            ner,
        })
    }

    pub fn config(&self) -> &ScrubConfig {
        &self.config
    }

    /// Scrubs one document. See [`ScrubEngine::scrub_with_audit`].
    pub async fn scrub(&self, input: &RawPhi) -> Result<ScrubResult, ScrubError> {
        self.scrub_with_audit(input).await.map(|(result, _)| result)
    }

    /// Scrubs one document and returns the audit trail alongside.
    ///
    /// The only suspension point is the NER join, and only when a detector
    /// is enabled. On a leak fault no partial result is returned: the
    /// document either comes back fully redacted-and-verified or the call
    /// fails with [`ScrubError::LeakDetected`].
    pub async fn scrub_with_audit(
        &self,
        input: &RawPhi,
    ) -> Result<(ScrubResult, AuditReport), ScrubError> {
        let sanitized = sanitize_input(input.expose());
        let mut audit = AuditCollector::new(sanitized.len());

        if sanitized.trim().is_empty() {
            debug!("Input is empty or whitespace-only; returning trivial result.");
            let report = audit.finish(100, 0);
            let result = ScrubResult {
                text: RedactedText::new(sanitized),
                replacements: PlaceholderMap::new(),
                count: 0,
                confidence: 100,
            };
            return Ok((result, report));
        }

        let chunks = chunk_text(&sanitized, self.config.chunking.max_chunk_bytes);
        debug!("Scrubbing {} byte(s) in {} chunk(s).", sanitized.len(), chunks.len());

        let mut map = PlaceholderMap::new();
        let mut output = String::with_capacity(sanitized.len());
        let mut all_resolved: Vec<DetectionSpan> = Vec::new();
        let mut ner_degraded = false;

        for chunk in &chunks {
            let t = Instant::now();
            let structural = detect_patterns(&self.detectors, chunk);
            audit.log_pass("patterns", &structural, t.elapsed());

            let t = Instant::now();
            let contextual = detect_contextual_ids(&self.detectors, chunk);
            audit.log_pass("contextual_id", &contextual, t.elapsed());

            let t = Instant::now();
            let labeled = detect_labeled_names(&self.detectors, chunk);
            audit.log_pass("labeled_name", &labeled, t.elapsed());

            let t = Instant::now();
            let ner_spans = match self.ner.try_detect_names(chunk).await {
                Ok(spans) => spans,
                Err(unavailable) => {
                    warn!("NER pass degraded: {unavailable}");
                    ner_degraded = true;
                    Vec::new()
                }
            };
            audit.log_pass("ner", &ner_spans, t.elapsed());

            let resolved = resolve(
                vec![structural, contextual, labeled, ner_spans],
                &self.config.priority,
            );
            output.push_str(&rewrite(chunk, &resolved, &mut map));
            all_resolved.extend(resolved);
        }

        audit.record_resolved(&all_resolved);

        // Validation pass: the output must carry no residual PII signature.
        let t = Instant::now();
        let residual = confidence::validation_scan(&self.detectors, &output);
        audit.log_pass("validation", &residual, t.elapsed());

        if !residual.is_empty() {
            let categories: BTreeSet<String> = residual
                .iter()
                .map(|s| s.category.as_str().to_string())
                .collect();
            return Err(ScrubError::LeakDetected {
                categories: categories.into_iter().collect(),
                occurrences: residual.len(),
            });
        }

        let confidence = confidence::score(&all_resolved, ner_degraded, &sanitized);
        audit.record_replacement_examples(&map);

        let count = map.len();
        let report = audit.finish(confidence, count);
        let result = ScrubResult {
            text: RedactedText::new(output),
            replacements: map,
            count,
            confidence,
        };
        Ok((result, report))
    }
}

/// Strips terminal escape sequences and residual control characters from
/// the input. OCR and terminal captures routinely carry both; they are
/// sanitized rather than rejected. Newlines, tabs, and carriage returns
/// survive.
fn sanitize_input(raw: &str) -> String {
    let stripped = strip(raw.as_bytes());
    let text = String::from_utf8_lossy(&stripped);
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect()
}

/// Splits a large document into segments no bigger than `max_bytes`,
/// preferring line boundaries so keyword contexts stay intact. Small
/// inputs come back as a single chunk.
fn chunk_text(text: &str, max_bytes: usize) -> Vec<&str> {
    let max_bytes = max_bytes.max(MIN_CHUNK_BYTES);
    if text.len() <= max_bytes {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.len() > max_bytes {
        let cut = match rest[..max_bytes].rfind('\n') {
            Some(i) => i + 1,
            None => {
                // Single huge line: fall back to the nearest char boundary.
                let mut i = max_bytes;
                while !rest.is_char_boundary(i) {
                    i -= 1;
                }
                i
            }
        };
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}
