// phiscrub-core/tests/engine_integration_tests.rs
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use phiscrub_core::{
    scrub_text, scrub_text_with_audit, DetectionSpan, NameDetector, NerError, PatternRule,
    PiiCategory, RawPhi, ScrubConfig, ScrubEngine, ScrubError,
};

/// A document exercising every structural and contextual category.
const FULL_FIXTURE: &str = "\
Patient Name: John Smith
MRN: ABC123456
Email: john.smith@example.com
Phone: (555) 123-4567
SSN: 123-45-6789
DOB: 01/02/1980
Address: 123 Main Street, Springfield, IL 62704
Card: 4111-1111-1111-1111
Mail to PO Box 987
";

struct FailingDetector;

#[async_trait]
impl NameDetector for FailingDetector {
    async fn detect_names(&self, _text: &str) -> std::result::Result<Vec<DetectionSpan>, NerError> {
        Err(NerError::NotLoaded)
    }
}

struct HangingDetector;

#[async_trait]
impl NameDetector for HangingDetector {
    async fn detect_names(&self, _text: &str) -> std::result::Result<Vec<DetectionSpan>, NerError> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

#[test]
fn test_email_is_replaced_by_typed_placeholder() -> Result<()> {
    let result = scrub_text(ScrubConfig::load_default()?, "Contact john.doe@example.com")?;
    assert!(result.text.as_str().contains("[EMAIL_1]"));
    assert!(!result.text.as_str().contains("john.doe@example.com"));
    assert!(result.count >= 1);
    Ok(())
}

#[test]
fn test_mrn_requires_keyword_anchor() -> Result<()> {
    let anchored = scrub_text(ScrubConfig::load_default()?, "MRN: ABC123456")?;
    assert_eq!(anchored.text.as_str(), "MRN: [MRN_1]");
    assert_eq!(anchored.replacements.get("ABC123456"), Some("[MRN_1]"));

    let bare = scrub_text(ScrubConfig::load_default()?, "count was 1234567")?;
    assert_eq!(bare.count, 0);
    assert_eq!(bare.text.as_str(), "count was 1234567");
    Ok(())
}

#[test]
fn test_repeated_value_reuses_placeholder() -> Result<()> {
    let result = scrub_text(
        ScrubConfig::load_default()?,
        "test@x.com appears twice: test@x.com",
    )?;
    assert_eq!(result.count, 1);
    assert_eq!(
        result.text.as_str().matches("[EMAIL_1]").count(),
        2,
        "both occurrences must share the identical placeholder"
    );
    Ok(())
}

#[test]
fn test_empty_input_yields_trivial_result() -> Result<()> {
    let result = scrub_text(ScrubConfig::load_default()?, "")?;
    assert_eq!(result.text.as_str(), "");
    assert_eq!(result.count, 0);
    assert!(result.replacements.is_empty());
    assert_eq!(result.confidence, 100);
    Ok(())
}

#[test]
fn test_whitespace_only_input_passes_through() -> Result<()> {
    let result = scrub_text(ScrubConfig::load_default()?, "  \n\t ")?;
    assert_eq!(result.text.as_str(), "  \n\t ");
    assert_eq!(result.count, 0);
    assert_eq!(result.confidence, 100);
    Ok(())
}

#[test]
fn test_double_scrub_of_ssn_is_idempotent() -> Result<()> {
    let first = scrub_text(ScrubConfig::load_default()?, "SSN: 123-45-6789")?;
    assert_eq!(first.text.as_str(), "SSN: [SSN_1]");

    let second = scrub_text(ScrubConfig::load_default()?, first.text.as_str())?;
    assert_eq!(second.count, 0);
    assert_eq!(second.text.as_str(), first.text.as_str());
    Ok(())
}

#[test]
fn test_full_fixture_is_leak_free_and_idempotent() -> Result<()> {
    let result = scrub_text(ScrubConfig::load_default()?, FULL_FIXTURE)?;

    for raw in [
        "John Smith",
        "ABC123456",
        "john.smith@example.com",
        "(555) 123-4567",
        "123-45-6789",
        "01/02/1980",
        "123 Main Street",
        "4111-1111-1111-1111",
        "PO Box 987",
    ] {
        assert!(
            !result.text.as_str().contains(raw),
            "raw value {raw:?} leaked into output:\n{}",
            result.text.as_str()
        );
    }

    // Count invariant.
    assert_eq!(result.count, result.replacements.len());
    assert!(result.confidence <= 100);

    // Idempotence: a second pass finds nothing new.
    let second = scrub_text(ScrubConfig::load_default()?, result.text.as_str())?;
    assert_eq!(second.count, 0);
    assert_eq!(second.text.as_str(), result.text.as_str());
    Ok(())
}

#[test]
fn test_distinct_values_never_share_a_placeholder() -> Result<()> {
    let result = scrub_text(ScrubConfig::load_default()?, "mail a@x.com and b@x.com")?;
    assert_eq!(result.count, 2);
    assert_ne!(result.replacements.get("a@x.com"), result.replacements.get("b@x.com"));
    Ok(())
}

#[tokio::test]
async fn test_structural_redaction_survives_ner_failure() -> Result<()> {
    let mut config = ScrubConfig::load_default()?;
    config.ner.enabled = true;
    let engine = ScrubEngine::with_name_detector(config, Arc::new(FailingDetector))?;

    let input = RawPhi::new("Jane Roe, email jane@x.org, ssn 123-45-6789, phone 555-123-4567");
    let result = engine.scrub(&input).await?;

    assert!(!result.text.as_str().contains("jane@x.org"));
    assert!(!result.text.as_str().contains("123-45-6789"));
    assert!(!result.text.as_str().contains("555-123-4567"));
    assert!(result.confidence <= 100);
    Ok(())
}

#[tokio::test]
async fn test_hung_model_is_bounded_by_deadline_and_degrades_confidence() -> Result<()> {
    let mut config = ScrubConfig::load_default()?;
    config.ner.enabled = true;
    config.ner.timeout_ms = 50;
    let engine = ScrubEngine::with_name_detector(config, Arc::new(HangingDetector))?;

    // Label-free name-shaped tokens that only NER could have caught.
    let input = RawPhi::new("Seen by Robert Jones; contact clinic@x.org");
    let result = engine.scrub(&input).await?;

    assert!(!result.text.as_str().contains("clinic@x.org"));
    assert!(
        result.confidence < 100,
        "degraded NER on a name-shaped document must lower confidence"
    );
    Ok(())
}

#[tokio::test]
async fn test_injected_model_spans_are_redacted_lowest_priority() -> Result<()> {
    struct FixedNames;

    #[async_trait]
    impl NameDetector for FixedNames {
        async fn detect_names(
            &self,
            text: &str,
        ) -> std::result::Result<Vec<DetectionSpan>, NerError> {
            // Propose every "Robert Jones" occurrence.
            let needle = "Robert Jones";
            Ok(text
                .match_indices(needle)
                .map(|(start, m)| DetectionSpan {
                    start,
                    end: start + m.len(),
                    category: PiiCategory::Name,
                    raw_value: m.to_string(),
                    source: phiscrub_core::SpanSource::Ner,
                    confidence: 0.85,
                })
                .collect())
        }
    }

    let mut config = ScrubConfig::load_default()?;
    config.ner.enabled = true;
    let engine = ScrubEngine::with_name_detector(config, Arc::new(FixedNames))?;

    let input = RawPhi::new("Seen by Robert Jones on 01/02/2023.");
    let result = engine.scrub(&input).await?;

    assert!(result.text.as_str().contains("[PER_1]"));
    assert!(result.text.as_str().contains("[DATE_1]"));
    assert!(!result.text.as_str().contains("Robert Jones"));
    Ok(())
}

#[test]
fn test_chunked_scrub_collapses_repeated_values() -> Result<()> {
    let mut config = ScrubConfig::load_default()?;
    config.chunking.max_chunk_bytes = 1024;

    let line = "email me at dup@example.com\n";
    let text = line.repeat(100); // well past one chunk
    let result = scrub_text(config, &text)?;

    assert_eq!(result.count, 1, "one distinct value across chunks, one placeholder");
    assert!(!result.text.as_str().contains("dup@example.com"));
    assert_eq!(result.text.as_str().matches("[EMAIL_1]").count(), 100);
    Ok(())
}

#[test]
fn test_placeholder_pattern_collision_is_a_leak_fault() -> Result<()> {
    // A (misconfigured) pattern that matches the engine's own email
    // placeholder: the validation pass must refuse to bless the output.
    let mut config = ScrubConfig::load_default()?;
    config.patterns.push(PatternRule {
        category: PiiCategory::Zip,
        pattern: r"\[EMAIL_\d+\]".to_string(),
        confidence: 0.9,
        ..Default::default()
    });
    // Replace the real zip rule to keep one rule per category.
    config.patterns.retain(|r| {
        r.category != PiiCategory::Zip || r.pattern.contains("EMAIL")
    });

    let err = scrub_text(config, "write to a@b.io please").unwrap_err();
    match err {
        ScrubError::LeakDetected { occurrences, .. } => assert!(occurrences >= 1),
        other => panic!("expected LeakDetected, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_control_characters_are_sanitized_not_fatal() -> Result<()> {
    let result = scrub_text(
        ScrubConfig::load_default()?,
        "\x1b[1mssn\x1b[0m 123-45-6789\x00 end",
    )?;
    assert!(!result.text.as_str().contains("123-45-6789"));
    assert!(!result.text.as_str().contains('\x00'));
    Ok(())
}

#[test_log::test]
fn test_audit_report_is_serializable_and_pii_free() -> Result<()> {
    let (result, report) = scrub_text_with_audit(ScrubConfig::load_default()?, FULL_FIXTURE)?;

    assert_eq!(report.replacement_count, result.count);
    assert_eq!(report.confidence, result.confidence);
    assert!(report.total_detections >= result.count);
    assert!(!report.entries.is_empty());
    assert_eq!(report.doc_bytes, FULL_FIXTURE.len());

    let json = report.to_json()?;
    for raw in ["john.smith@example.com", "123-45-6789", "ABC123456", "John Smith"] {
        assert!(!json.contains(raw), "raw value {raw:?} leaked into the audit JSON");
    }
    assert!(!report.log_lines().is_empty());
    Ok(())
}

#[test]
fn test_confidence_is_bounded_for_assorted_inputs() -> Result<()> {
    for input in [
        "",
        "nothing sensitive",
        FULL_FIXTURE,
        "zip 12345 zip 54321 zip 99999",
        "Seen by Alice Brown with no labels anywhere",
    ] {
        let result = scrub_text(ScrubConfig::load_default()?, input)?;
        assert!(result.confidence <= 100, "confidence out of range for {input:?}");
    }
    Ok(())
}
