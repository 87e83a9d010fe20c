//! compiler.rs - Manages the compilation and caching of detection patterns.
//!
//! This module provides a thread-safe, cached mechanism to convert a
//! `ScrubConfig` into `CompiledDetectors`, which are optimized for
//! efficient scanning. It uses a global, shared cache to avoid redundant
//! compilation when many documents are scrubbed with the same config.
//!
//! License: MIT OR Apache-2.0

use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use lazy_static::lazy_static;
use std::sync::{Arc, RwLock};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use crate::config::{PatternRule, ScrubConfig, MAX_PATTERN_LENGTH};
use crate::detection::PiiCategory;
use crate::errors::ScrubError;

/// Confidence assigned to contextual identifier spans.
pub const CONTEXTUAL_ID_CONFIDENCE: f64 = 0.95;
/// Confidence assigned to labeled name spans.
pub const LABELED_NAME_CONFIDENCE: f64 = 0.90;

/// A single compiled structural pattern.
#[derive(Debug)]
pub struct CompiledPattern {
    /// The compiled regular expression used for matching.
    pub regex: Regex,
    /// The category of spans this pattern produces.
    pub category: PiiCategory,
    /// Per-detector confidence carried onto every span.
    pub confidence: f64,
}

/// A keyword-anchored matcher whose first capture group is the value span.
#[derive(Debug)]
pub struct ContextMatcher {
    pub regex: Regex,
    pub confidence: f64,
}

/// All compiled detectors for one configuration.
#[derive(Debug)]
pub struct CompiledDetectors {
    /// Structural patterns (the Pattern Library), one per enabled category.
    pub patterns: Vec<CompiledPattern>,
    /// Contextual identifier matcher (MRN-style tokens after a keyword).
    pub contextual_id: ContextMatcher,
    /// Labeled name matcher (capitalized sequences after a name label).
    pub labeled_name: ContextMatcher,
}

lazy_static! {
    /// A thread-safe, global cache for compiled detectors.
    /// The key is a hash of the detection-relevant parts of the `ScrubConfig`.
    static ref COMPILED_DETECTORS_CACHE: RwLock<HashMap<u64, Arc<CompiledDetectors>>> =
        RwLock::new(HashMap::new());
}

/// Hashes the detection-relevant configuration to create a stable cache key.
///
/// To ensure determinism, pattern rules are sorted by category and keyword
/// sets are hashed in their configured order (order matters: it shapes the
/// generated alternations only via length, which we normalize ourselves).
fn hash_config(config: &ScrubConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut rules_to_hash = config.patterns.clone();

    rules_to_hash.sort_by_key(|r| r.category);
    rules_to_hash.hash(&mut hasher);

    let mut id_keywords = config.context.id_keywords.clone();
    id_keywords.sort();
    id_keywords.hash(&mut hasher);

    let mut name_keywords = config.context.name_keywords.clone();
    name_keywords.sort();
    name_keywords.hash(&mut hasher);

    hasher.finish()
}

/// Builds a longest-first, escaped alternation from a keyword set.
fn keyword_alternation(keywords: &[String]) -> String {
    let mut escaped: Vec<String> = keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| regex::escape(k.trim()))
        .collect();
    // Longest first so "Patient Name" wins over "Name" at the same offset.
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    escaped.join("|")
}

fn build_regex(pattern: &str, what: &str) -> Result<Regex, ScrubError> {
    RegexBuilder::new(pattern)
        .size_limit(10 * (1 << 20)) // 10 MB limit for compiled regex
        .build()
        .map_err(|e| ScrubError::PatternCompilation(what.to_string(), e))
}

/// Compiles the contextual identifier matcher from the configured keywords.
///
/// The value is an alphanumeric token of 6-12 characters that must directly
/// follow a keyword, tolerating `:`/`#`/whitespace separators. Standalone
/// tokens with no preceding keyword never match.
fn compile_contextual_id(keywords: &[String]) -> Result<ContextMatcher, ScrubError> {
    let alternation = keyword_alternation(keywords);
    if alternation.is_empty() {
        return Err(ScrubError::InvalidConfig(
            "context.id_keywords must not be empty".to_string(),
        ));
    }
    let pattern = format!(
        r"(?i)\b(?:{alternation})\b\s*[:#]?\s*\b([A-Za-z0-9]{{6,12}})\b"
    );
    Ok(ContextMatcher {
        regex: build_regex(&pattern, "contextual_id")?,
        confidence: CONTEXTUAL_ID_CONFIDENCE,
    })
}

/// Compiles the labeled name matcher from the configured labels.
///
/// The value is 1-3 capitalized words with an optional title prefix and an
/// optional middle initial; the label match is case-insensitive, the value
/// match is not. JSON-style keys (`"patientName": "..."`) are tolerated via
/// optional quotes around the separator.
fn compile_labeled_name(keywords: &[String]) -> Result<ContextMatcher, ScrubError> {
    let alternation = keyword_alternation(keywords);
    if alternation.is_empty() {
        return Err(ScrubError::InvalidConfig(
            "context.name_keywords must not be empty".to_string(),
        ));
    }
    let pattern = format!(
        "\\b(?i:{alternation})\"?\\s*[:=]?\\s*\"?((?:(?:Dr|Mr|Mrs|Ms)\\.?\\s+)?[A-Z][a-z]+(?:\\s+[A-Z]\\.)?(?:\\s+[A-Z][a-z]+){{0,2}})"
    );
    Ok(ContextMatcher {
        regex: build_regex(&pattern, "labeled_name")?,
        confidence: LABELED_NAME_CONFIDENCE,
    })
}

/// Compiles structural pattern rules and context matchers for a config.
/// This is the low-level function that performs the actual regex compilation.
pub fn compile_detectors(config: &ScrubConfig) -> Result<CompiledDetectors, ScrubError> {
    debug!("Starting compilation of {} pattern rules.", config.patterns.len());

    let mut compiled_patterns = Vec::new();

    for rule in &config.patterns {
        if let Some(false) = rule.enabled {
            debug!("Skipping disabled pattern rule '{}'.", rule.category.as_str());
            continue;
        }

        if rule.pattern.is_empty() {
            warn!(
                "Skipping pattern rule '{}' because its pattern is empty.",
                rule.category.as_str()
            );
            continue;
        }

        if rule.pattern.len() > MAX_PATTERN_LENGTH {
            return Err(ScrubError::PatternLengthExceeded(
                rule.category.as_str().to_string(),
                rule.pattern.len(),
                MAX_PATTERN_LENGTH,
            ));
        }

        let regex = build_regex(&rule.pattern, rule.category.as_str())?;
        compiled_patterns.push(CompiledPattern {
            regex,
            category: rule.category,
            confidence: rule.confidence,
        });
    }

    let contextual_id = compile_contextual_id(&config.context.id_keywords)?;
    let labeled_name = compile_labeled_name(&config.context.name_keywords)?;

    debug!("Finished compiling detectors. Structural patterns: {}.", compiled_patterns.len());
    Ok(CompiledDetectors {
        patterns: compiled_patterns,
        contextual_id,
        labeled_name,
    })
}

/// Gets a `CompiledDetectors` instance from the cache or compiles it if not
/// found. Returns an `Arc` so compiled detectors are cheaply shared across
/// concurrent scrub calls.
pub fn get_or_compile_detectors(config: &ScrubConfig) -> Result<Arc<CompiledDetectors>, ScrubError> {
    let cache_key = hash_config(config);

    {
        let cache = COMPILED_DETECTORS_CACHE.read().unwrap();
        if let Some(detectors) = cache.get(&cache_key) {
            debug!("Serving compiled detectors from cache for key: {}", &cache_key);
            return Ok(Arc::clone(detectors));
        }
    } // Read lock is released here.

    debug!("Compiled detectors not found in cache. Compiling now.");
    let compiled = compile_detectors(config)?;
    let compiled_arc = Arc::new(compiled);

    COMPILED_DETECTORS_CACHE
        .write()
        .unwrap()
        .insert(cache_key, Arc::clone(&compiled_arc));

    debug!("Successfully compiled and cached detectors for key: {}", &cache_key);
    Ok(compiled_arc)
}
