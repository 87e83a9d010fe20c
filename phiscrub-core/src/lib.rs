// phiscrub-core/src/lib.rs
//! # PhiScrub Core Library
//!
//! `phiscrub-core` provides the fundamental, platform-independent logic for
//! multi-pass PII/PHI detection and redaction. Given raw document text it
//! produces a redacted text in which every detected sensitive span is
//! replaced by a stable, typed placeholder, together with a replacement
//! map, a confidence score, and an audit trail suitable for compliance
//! review.
//!
//! The library is designed to achieve near-zero false negatives while
//! tolerating a non-deterministic, optional ML component (named-entity
//! recognition) whose unavailability never blocks redaction. It has no
//! concerns for I/O, file ingestion, or presentation; those stages consume
//! the engine's output and are statically prevented, via the
//! [`RedactedText`] trust-boundary type, from ever receiving unredacted
//! text.
//!
//! ## Modules
//!
//! * `config`: Defines `ScrubConfig`: pattern rules, context keywords, NER
//!   and chunking settings, and the span-conflict priority order.
//! * `detectors`: The detection passes (structural patterns, contextual
//!   identifiers, labeled names) and their compiler/cache.
//! * `validators`: Programmatic validation for specific data types (SSN
//!   structure, date ranges, phone subscriber numbers).
//! * `ner`: The optional, injectable statistical name detector behind a
//!   deadline.
//! * `resolver`: Merges overlapping candidates into one ordered,
//!   non-overlapping span set.
//! * `placeholder`: Per-document placeholder allocation and the linear
//!   rewrite.
//! * `confidence`: Confidence scoring and the output validation pass.
//! * `audit`: Per-invocation audit collection and serializable reports.
//! * `trust`: The `RawPhi`/`RedactedText` trust-boundary types.
//! * `engine`: The `ScrubEngine` orchestrator.
//! * `headless`: Convenience wrappers for one-shot, non-interactive use.
//!
//! ## Usage Example
//!
//! ```rust
//! use phiscrub_core::{scrub_text, ScrubConfig};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     // 1. Load the default detection configuration.
//!     let config = ScrubConfig::load_default()?;
//!
//!     // 2. Scrub a document in a single, headless call.
//!     let input = "Contact john.doe@example.com or call 555-123-4567.";
//!     let result = scrub_text(config, input)?;
//!
//!     // 3. Every detected value is replaced by a typed placeholder.
//!     assert!(result.text.as_str().contains("[EMAIL_1]"));
//!     assert!(result.text.as_str().contains("[PHONE_1]"));
//!     assert_eq!(result.count, result.replacements.len());
//!
//!     println!("{} replacement(s), confidence {}", result.count, result.confidence);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Recoverable conditions (an unavailable NER model, a candidate failing
//! range validation) never surface as errors: the pipeline continues with
//! fewer spans. A residual PII signature in the rewritten output is the one
//! fatal per-document condition and surfaces as
//! [`ScrubError::LeakDetected`], never as a silently lowered confidence.
//!
//! ## Design Principles
//!
//! * **Leak-free over precise:** overlap resolution and pattern policy
//!   favor redacting too much rather than too little.
//! * **Deterministic core:** every pass except the NER join is pure and
//!   synchronous; the engine is deployable without any ML runtime.
//! * **Stateless:** engines hold no per-document state; concurrent scrubs
//!   share nothing but compiled patterns.
//! * **Auditable:** every detector firing is recorded, with hashed samples
//!   only; raw PII never appears in logs or reports.
//!
//! ---
//! License: MIT OR Apache-2.0

// All modules must be declared before they can be used.
pub mod audit;
pub mod confidence;
pub mod config;
pub mod detection;
pub mod detectors;
pub mod engine;
pub mod errors;
pub mod headless;
pub mod ner;
pub mod placeholder;
pub mod resolver;
pub mod trust;
pub mod validators;

/// Re-exports the public configuration types and helpers.
pub use config::{
    merge_config,
    validate_patterns,
    validate_priority,
    ChunkingConfig,
    ContextConfig,
    NerConfig,
    PatternRule,
    ScrubConfig,
    MAX_PATTERN_LENGTH,
};

/// Re-exports the custom error type for clear error reporting.
pub use errors::ScrubError;

/// Re-exports the span model shared by all detectors.
pub use detection::{canonical_sample_hash, redact_sensitive, DetectionSpan, PiiCategory, SpanSource};

/// Re-exports the orchestrator and its result type.
pub use engine::{ScrubEngine, ScrubResult};

/// Re-exports the NER adapter seam for injecting a statistical model.
pub use ner::{ModelUnavailable, NameDetector, NerAdapter, NerError, NoopNameDetector};

/// Re-exports placeholder allocation types.
pub use placeholder::PlaceholderMap;

/// Re-exports audit collection and reporting types.
pub use audit::{AuditCollector, AuditEntry, AuditReport, AuditSummary};

/// Re-exports the trust-boundary types downstream stages are typed against.
pub use trust::{RawPhi, RedactedText};

/// Re-exports one-shot convenience entry points.
pub use headless::{scrub_text, scrub_text_with_audit};

// Re-export key types from the detectors::compiler module for advanced usage.
pub use detectors::compiler::{compile_detectors, CompiledDetectors, CompiledPattern};
