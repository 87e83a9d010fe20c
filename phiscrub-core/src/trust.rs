// phiscrub-core/src/trust.rs
//! Trust-boundary types separating unredacted from redacted text.
//!
//! `RawPhi` wraps text that may contain PHI: anyone can construct it, but
//! only this crate's detectors can read it back out. `RedactedText` can only
//! be constructed by the orchestrator after the validation pass succeeds, so
//! a downstream stage that declares its parameter as `RedactedText` is
//! statically prevented from receiving unredacted text. No runtime guard is
//! needed: the `pub(crate)` constructor is the enforcement.
//!
//! License: MIT OR Apache-2.0

use std::fmt;

use serde::Serialize;

use crate::detection::redact_sensitive;

/// Text that has not been scrubbed and must be treated as sensitive.
///
/// The inner string is only readable inside the engine crate; even `Debug`
/// output redacts it.
#[derive(Clone)]
pub struct RawPhi(String);

impl RawPhi {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Detector-only access to the underlying text.
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RawPhi {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RawPhi {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Debug for RawPhi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPhi({})", redact_sensitive(&self.0))
    }
}

/// Text that passed the full scrub-and-validate pipeline.
///
/// Constructible only by the orchestrator (`pub(crate)`), freely readable by
/// consumers. `Deserialize` is deliberately not implemented: deserializing
/// would be a constructor bypass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RedactedText(String);

impl RedactedText {
    /// Only the orchestrator constructs this, after the validation pass.
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RedactedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RedactedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_phi_debug_never_prints_content() {
        let raw = RawPhi::new("ssn is 123-45-6789");
        let debug = format!("{raw:?}");
        assert!(!debug.contains("123-45-6789"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_redacted_text_round_trips_content() {
        let redacted = RedactedText::new("all clear [EMAIL_1]".to_string());
        assert_eq!(redacted.as_str(), "all clear [EMAIL_1]");
        assert_eq!(redacted.to_string(), "all clear [EMAIL_1]");
        assert_eq!(redacted.into_inner(), "all clear [EMAIL_1]");
    }
}
