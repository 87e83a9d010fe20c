// File: phiscrub-core/src/validators.rs
//! Programmatic validation functions for specific sensitive data types.
//!
//! This module provides additional validation logic beyond regular expression
//! matching for candidates such as SSNs, dates, and phone numbers. These
//! functions reduce false positives by applying structural checks; a candidate
//! that fails validation is simply omitted by its detector (soft-fail), and
//! the same checks run during the output validation pass so the two passes
//! agree on what counts as PII.
//!
//! License: MIT OR Apache-2.0

/// Helper function to validate SSN based on US Social Security Administration rules.
///
/// This implementation aims for a robust programmatic check without external data.
/// It validates the structural components against known invalid patterns.
///
/// # Arguments
///
/// * `ssn` - The SSN string slice to validate. Expected format "XXX-XX-XXXX".
///
/// # Returns
///
/// `true` if the SSN passes basic structural and invalid pattern checks, `false` otherwise.
pub fn is_valid_ssn_structure(ssn: &str) -> bool {
    let mut parts = ssn.split('-');

    let (Some(area), Some(group), Some(serial), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if area.len() != 3 || group.len() != 2 || serial.len() != 4 {
        return false;
    }

    let Some(area_num) = area.parse::<u16>().ok() else { return false; };
    let Some(group_num) = group.parse::<u8>().ok() else { return false; };
    let Some(serial_num) = serial.parse::<u16>().ok() else { return false; };

    // Check for invalid SSN patterns based on historical and current rules.
    let invalid_area = (area_num == 0) || (area_num == 666) || (area_num >= 800);
    let invalid_group = group_num == 0;
    let invalid_serial = serial_num == 0;

    !(invalid_area || invalid_group || invalid_serial)
}

/// Validates a matched date token of the form `M/D/Y` or `M-D-Y`.
///
/// Per the engine's documented convention the first component is always the
/// month (US `MM/DD/YYYY`); there is no runtime signal distinguishing true
/// ambiguity from confident parses.
pub fn is_plausible_date_token(token: &str) -> bool {
    let mut parts = token.split(|c| c == '/' || c == '-');

    let (Some(month), Some(day), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let Some(month) = month.parse::<u8>().ok() else { return false; };
    let Some(day) = day.parse::<u8>().ok() else { return false; };
    if year.parse::<u16>().is_err() {
        return false;
    }

    let max_day = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        // Leap years are not resolvable from a short-year token; accept the 29th.
        2 => 29,
        _ => return false,
    };

    (1..=31).contains(&day) && day <= max_day
}

/// Extracts the 10-digit NANP subscriber number from a phone candidate.
///
/// Strips separators, drops a leading country code `1`, and returns `None`
/// when the remaining digit count is not exactly 10.
pub fn subscriber_number_digits(candidate: &str) -> Option<String> {
    let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();

    let digits = if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else {
        digits
    };

    if digits.len() == 10 {
        Some(digits)
    } else {
        None
    }
}

/// True when a phone candidate resolves to a 10-digit subscriber number.
pub fn has_ten_digit_subscriber(candidate: &str) -> bool {
    subscriber_number_digits(candidate).is_some()
}
