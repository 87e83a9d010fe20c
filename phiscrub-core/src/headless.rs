// phiscrub-core/src/headless.rs
// File: phiscrub-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for one-shot, non-interactive scrubbing.
//!
//! The engine's entry point is async because of the optional NER join;
//! callers without a runtime of their own can use these helpers, which spin
//! a current-thread runtime for the single call.

use crate::audit::AuditReport;
use crate::config::ScrubConfig;
use crate::engine::{ScrubEngine, ScrubResult};
use crate::errors::ScrubError;
use crate::trust::RawPhi;

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, ScrubError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Fully scrubs a string in one call, with no NER detector attached.
///
/// This is the primary entry point for non-interactive use.
pub fn scrub_text(config: ScrubConfig, content: &str) -> Result<ScrubResult, ScrubError> {
    let engine = ScrubEngine::new(config)?;
    let input = RawPhi::new(content);
    block_on(engine.scrub(&input))?
}

/// Like [`scrub_text`], returning the audit report alongside the result.
pub fn scrub_text_with_audit(
    config: ScrubConfig,
    content: &str,
) -> Result<(ScrubResult, AuditReport), ScrubError> {
    let engine = ScrubEngine::new(config)?;
    let input = RawPhi::new(content);
    block_on(engine.scrub_with_audit(&input))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_text_one_shot() -> Result<(), ScrubError> {
        let config = ScrubConfig::load_default()?;
        let result = scrub_text(config, "My email is test@example.com and my SSN is 123-45-6789.")?;

        assert!(result.text.as_str().contains("[EMAIL_1]"));
        assert!(result.text.as_str().contains("[SSN_1]"));
        assert!(!result.text.as_str().contains("test@example.com"));
        assert_eq!(result.count, 2);
        Ok(())
    }

    #[test]
    fn test_scrub_text_with_audit_reports_totals() -> Result<(), ScrubError> {
        let config = ScrubConfig::load_default()?;
        let (result, report) = scrub_text_with_audit(config, "Reach me at a@b.io")?;
        assert_eq!(result.count, 1);
        assert_eq!(report.replacement_count, 1);
        assert_eq!(report.totals_by_category.get("email"), Some(&1));
        Ok(())
    }
}
