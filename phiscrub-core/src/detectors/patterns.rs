// phiscrub-core/src/detectors/patterns.rs
//! The Pattern Library: stateless structural detection of regular PII
//! shapes (email, phone, SSN, credit card, ZIP, date, address, city/state,
//! PO box).
//!
//! Each detector is pure and total: it never fails, never mutates shared
//! state, and candidates that fail programmatic validation are silently
//! omitted. The same pass doubles as the post-rewrite validation scan, so
//! both passes agree on what counts as PII.
//!
//! License: MIT OR Apache-2.0

use crate::detection::{log_span_debug, DetectionSpan, PiiCategory, SpanSource};
use crate::detectors::compiler::CompiledDetectors;
use crate::validators;

/// Runs every compiled structural pattern over `text` and returns all
/// candidate spans. Order-independent: patterns do not interact.
pub fn detect_patterns(detectors: &CompiledDetectors, text: &str) -> Vec<DetectionSpan> {
    let mut spans = Vec::new();
    for pattern in &detectors.patterns {
        scan_pattern(pattern.category, pattern.confidence, &pattern.regex, text, &mut spans);
    }
    spans
}

/// Runs only the pattern for `category`, if one is compiled.
pub fn detect_category(
    detectors: &CompiledDetectors,
    category: PiiCategory,
    text: &str,
) -> Vec<DetectionSpan> {
    let mut spans = Vec::new();
    for pattern in detectors.patterns.iter().filter(|p| p.category == category) {
        scan_pattern(pattern.category, pattern.confidence, &pattern.regex, text, &mut spans);
    }
    spans
}

fn scan_pattern(
    category: PiiCategory,
    confidence: f64,
    regex: &regex::Regex,
    text: &str,
    out: &mut Vec<DetectionSpan>,
) {
    for m in regex.find_iter(text) {
        let raw = m.as_str();
        if !passes_programmatic_validation(category, raw) {
            continue;
        }
        log_span_debug(module_path!(), category, raw);
        out.push(DetectionSpan {
            start: m.start(),
            end: m.end(),
            category,
            raw_value: raw.to_string(),
            source: SpanSource::Structural,
            confidence,
        });
    }
}

/// Post-regex structural checks. A failing candidate is not PII as far as
/// the engine is concerned, in detection and validation alike.
fn passes_programmatic_validation(category: PiiCategory, raw: &str) -> bool {
    match category {
        PiiCategory::Ssn => validators::is_valid_ssn_structure(raw),
        PiiCategory::Date => validators::is_plausible_date_token(raw),
        PiiCategory::Phone => validators::has_ten_digit_subscriber(raw),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrubConfig;
    use crate::detectors::compiler::compile_detectors;

    fn detectors() -> CompiledDetectors {
        compile_detectors(&ScrubConfig::load_default().unwrap()).unwrap()
    }

    fn categories_in(text: &str) -> Vec<PiiCategory> {
        detect_patterns(&detectors(), text)
            .into_iter()
            .map(|s| s.category)
            .collect()
    }

    #[test]
    fn test_email_detection() {
        let spans = detect_category(&detectors(), PiiCategory::Email, "reach me at jane.roe@clinic.org today");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].raw_value, "jane.roe@clinic.org");
        assert_eq!(spans[0].source, SpanSource::Structural);
    }

    #[test]
    fn test_phone_formats() {
        for text in [
            "call 555-123-4567",
            "call (555) 123-4567",
            "call +1-555-123-4567",
            "call 555.123.4567",
        ] {
            assert!(
                categories_in(text).contains(&PiiCategory::Phone),
                "no phone span in {text:?}"
            );
        }
    }

    #[test]
    fn test_undelimited_ssn_is_not_matched() {
        assert!(!categories_in("id 123456789").contains(&PiiCategory::Ssn));
        assert!(categories_in("ssn 123-45-6789").contains(&PiiCategory::Ssn));
    }

    #[test]
    fn test_invalid_ssn_area_soft_fails() {
        assert!(!categories_in("ssn 666-45-6789").contains(&PiiCategory::Ssn));
    }

    #[test]
    fn test_multiple_dates_all_captured() {
        let spans = detect_category(
            &detectors(),
            PiiCategory::Date,
            "admitted 01/02/2023, discharged 01-05-23",
        );
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_out_of_range_date_soft_fails() {
        assert!(!categories_in("on 02/30/2023").contains(&PiiCategory::Date));
    }

    #[test]
    fn test_address_with_unit() {
        let spans = detect_category(
            &detectors(),
            PiiCategory::Address,
            "lives at 123 North Main Street, Apt 4B since 2020",
        );
        assert_eq!(spans.len(), 1);
        assert!(spans[0].raw_value.contains("Apt 4B"));
    }

    #[test]
    fn test_city_state_requires_abbreviation() {
        assert!(categories_in("from Springfield, IL today").contains(&PiiCategory::CityState));
        assert!(!categories_in("from Springfield, Illinois today").contains(&PiiCategory::CityState));
    }

    #[test]
    fn test_po_box_variants() {
        for text in ["P.O. Box 123", "PO Box 123", "P O Box 123"] {
            assert!(
                categories_in(text).contains(&PiiCategory::PoBox),
                "no po_box span in {text:?}"
            );
        }
    }

    #[test]
    fn test_credit_card_separated() {
        assert!(categories_in("card 4111-1111-1111-1111").contains(&PiiCategory::CreditCard));
        assert!(categories_in("card 4111 1111 1111 1111").contains(&PiiCategory::CreditCard));
    }

    #[test]
    fn test_bare_numbers_are_quiet() {
        // Ordinary numeric content: lab value, year, 7-digit count.
        let spans = detect_patterns(&detectors(), "glucose 108, year 2023, count was 1234567");
        assert!(spans.is_empty(), "unexpected spans: {spans:?}");
    }
}
