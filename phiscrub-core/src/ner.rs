// phiscrub-core/src/ner.rs
//! The NER adapter: an optional, injectable statistical name detector.
//!
//! The engine's deterministic core must stay deployable without any ML
//! runtime, so the model sits behind the `NameDetector` strategy trait with
//! a no-op default. Every failure mode (detector absent, load failure,
//! inference error, deadline exceeded) collapses into a single
//! `ModelUnavailable` outcome that the orchestrator treats as zero
//! additional spans plus a confidence degradation signal, never as a
//! pipeline failure. The adapter performs no mutation, so callers may
//! abandon a pending call safely.
//!
//! License: MIT OR Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;

use crate::detection::{DetectionSpan, SpanSource};

/// Errors a concrete `NameDetector` may surface.
#[derive(Debug, Clone, Error)]
pub enum NerError {
    #[error("name detection model is not loaded")]
    NotLoaded,

    #[error("name detection inference failed: {0}")]
    Inference(String),
}

/// The single "unavailable" outcome the orchestrator sees. Whatever went
/// wrong underneath, the document is still scrubbed by the deterministic
/// passes.
#[derive(Debug, Error)]
#[error("name detection unavailable: {reason}")]
pub struct ModelUnavailable {
    pub reason: String,
}

/// Strategy interface for statistical name detection.
///
/// Implementations propose additional spans (primarily person names) that
/// the labeled-name detector cannot anchor. Spans are proposals: the
/// adapter bounds-checks them and the resolver ranks them below every
/// deterministic source.
#[async_trait]
pub trait NameDetector: Send + Sync {
    async fn detect_names(&self, text: &str) -> Result<Vec<DetectionSpan>, NerError>;
}

/// The default detector: always succeeds with zero spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNameDetector;

#[async_trait]
impl NameDetector for NoopNameDetector {
    async fn detect_names(&self, _text: &str) -> Result<Vec<DetectionSpan>, NerError> {
        Ok(Vec::new())
    }
}

/// Wraps a `NameDetector` behind an enable flag and a hard deadline so a
/// hung model cannot stall the document.
pub struct NerAdapter {
    detector: Arc<dyn NameDetector>,
    timeout: Duration,
    enabled: bool,
}

impl NerAdapter {
    /// An adapter that never runs the model. A disabled adapter is not a
    /// degradation: it succeeds with zero spans.
    pub fn disabled() -> Self {
        Self {
            detector: Arc::new(NoopNameDetector),
            timeout: Duration::from_millis(0),
            enabled: false,
        }
    }

    pub fn new(detector: Arc<dyn NameDetector>, timeout: Duration) -> Self {
        Self {
            detector,
            timeout,
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Runs the model within the configured deadline.
    ///
    /// Returns the model's (sanitized) spans, or `ModelUnavailable` for any
    /// failure. Callers must treat the error as "zero additional spans",
    /// never as a reason to abort scrubbing.
    pub async fn try_detect_names(
        &self,
        text: &str,
    ) -> Result<Vec<DetectionSpan>, ModelUnavailable> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        match tokio::time::timeout(self.timeout, self.detector.detect_names(text)).await {
            Err(_elapsed) => Err(ModelUnavailable {
                reason: format!("deadline of {}ms exceeded", self.timeout.as_millis()),
            }),
            Ok(Err(e)) => Err(ModelUnavailable {
                reason: e.to_string(),
            }),
            Ok(Ok(spans)) => Ok(sanitize_model_spans(spans, text)),
        }
    }
}

/// Drops model proposals that violate the span invariant. A statistical
/// model is untrusted input: out-of-bounds or non-char-boundary offsets are
/// soft-failed here instead of panicking in the rewrite.
fn sanitize_model_spans(spans: Vec<DetectionSpan>, text: &str) -> Vec<DetectionSpan> {
    let mut out = Vec::with_capacity(spans.len());
    for mut span in spans {
        if !span.is_valid_for(text) {
            warn!(
                "Dropping model span with invalid bounds [{}, {}) for text of {} bytes.",
                span.start,
                span.end,
                text.len()
            );
            continue;
        }
        if &text[span.start..span.end] != span.raw_value {
            debug!("Model span value disagrees with text slice; using the slice.");
            span.raw_value = text[span.start..span.end].to_string();
        }
        span.source = SpanSource::Ner;
        out.push(span);
    }
    out
}
