//! Configuration management for `phiscrub-core`.
//!
//! This module defines the data structures that describe how a document is
//! scrubbed: the structural pattern rules, the keyword sets that anchor the
//! context detectors, the NER adapter settings, chunking limits, and the
//! span-conflict priority order. It handles serialization/deserialization of
//! YAML configurations and provides utilities for loading, merging, and
//! validating these configs.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::Path;
use log::{debug, info, warn};
use regex::Regex;

use crate::detection::{PiiCategory, SpanSource};

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// A single structural pattern rule used by the Pattern Library.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternRule {
    /// The PII category this rule detects.
    pub category: PiiCategory,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    /// The regex pattern string.
    pub pattern: String,
    /// Per-detector confidence assigned to spans this rule produces.
    pub confidence: f64,
    /// Explicit override for enabling/disabling the rule.
    pub enabled: Option<bool>,
}

impl Default for PatternRule {
    fn default() -> Self {
        Self {
            category: PiiCategory::Email,
            description: None,
            pattern: String::new(),
            confidence: 0.8,
            enabled: None,
        }
    }
}

impl Hash for PatternRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.category.hash(state);
        self.description.hash(state);
        self.pattern.hash(state);
        self.confidence.to_bits().hash(state);
        self.enabled.hash(state);
    }
}

/// Keyword sets consumed by the context detectors.
#[derive(Debug, Clone, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Keywords that must precede an alphanumeric token for it to count as
    /// a contextual identifier (MRN, chart number, ...).
    pub id_keywords: Vec<String>,
    /// Labels that must precede a capitalized token sequence for it to
    /// count as a person name. Bare names are left to the NER adapter.
    pub name_keywords: Vec<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            id_keywords: [
                "MRN",
                "Medical Record Number",
                "Patient ID",
                "Chart Number",
                "Record Number",
                "Member ID",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            name_keywords: [
                "Patient Name",
                "Full Name",
                "Name",
                "patient_name",
                "patientName",
                "full_name",
                "fullName",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Settings for the optional statistical name detector.
#[derive(Debug, Clone, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct NerConfig {
    /// Whether the NER pass runs at all. When false the engine is fully
    /// deterministic and never suspends.
    pub enabled: bool,
    /// Deadline for a single NER call, in milliseconds. A model that does
    /// not answer within the deadline is treated as unavailable.
    pub timeout_ms: u64,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: 2000,
        }
    }
}

/// Limits for processing very large documents.
#[derive(Debug, Clone, PartialEq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Inputs larger than this are split into independently detected
    /// segments (on line boundaries) that share one placeholder map.
    pub max_chunk_bytes: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 256 * 1024,
        }
    }
}

fn default_priority() -> Vec<SpanSource> {
    vec![
        SpanSource::Contextual,
        SpanSource::LabeledName,
        SpanSource::Structural,
        SpanSource::Ner,
    ]
}

/// Represents the top-level configuration structure for a scrub run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrubConfig {
    /// Structural pattern rules, one per category.
    pub patterns: Vec<PatternRule>,
    /// Keyword sets for the context detectors.
    pub context: ContextConfig,
    /// NER adapter settings.
    pub ner: NerConfig,
    /// Large-document chunking limits.
    pub chunking: ChunkingConfig,
    /// Span-conflict priority order, highest priority first. Kept in
    /// configuration so the precision-over-recall ordering for ID-like
    /// tokens is an explicit, reviewable choice.
    pub priority: Vec<SpanSource>,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            context: ContextConfig::default(),
            ner: NerConfig::default(),
            chunking: ChunkingConfig::default(),
            priority: default_priority(),
        }
    }
}

impl ScrubConfig {
    /// Loads a scrub configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom scrub config from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ScrubConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_patterns(&config.patterns)?;
        validate_priority(&config.priority)?;
        info!(
            "Loaded {} pattern rules from file {}.",
            config.patterns.len(),
            path.display()
        );

        Ok(config)
    }

    /// Loads the default configuration from the embedded YAML.
    pub fn load_default() -> Result<Self> {
        debug!("Loading default scrub config from embedded string...");
        let default_yaml = include_str!("../config/default_scrub.yaml");
        let config: ScrubConfig =
            serde_yml::from_str(default_yaml).context("Failed to parse default scrub config")?;

        debug!("Loaded {} default pattern rules.", config.patterns.len());
        Ok(config)
    }

    /// Enables or disables a single structural category.
    pub fn set_category_enabled(&mut self, category: PiiCategory, enabled: bool) {
        let mut found = false;
        for rule in self.patterns.iter_mut().filter(|r| r.category == category) {
            rule.enabled = Some(enabled);
            found = true;
        }
        if !found {
            warn!(
                "set_category_enabled: no pattern rule for category '{}'.",
                category.as_str()
            );
        }
    }

    /// Returns the pattern rule for a category, if configured.
    pub fn pattern_for(&self, category: PiiCategory) -> Option<&PatternRule> {
        self.patterns.iter().find(|r| r.category == category)
    }
}

/// Merges a user-provided configuration over the defaults.
///
/// User pattern rules replace the default rule for the same category;
/// non-empty keyword lists replace the default lists; NER and chunking
/// settings are taken from the user config wholesale.
pub fn merge_config(default_config: ScrubConfig, user_config: Option<ScrubConfig>) -> ScrubConfig {
    debug!(
        "merge_config called. Initial default pattern count: {}",
        default_config.patterns.len()
    );

    let Some(user_cfg) = user_config else {
        return default_config;
    };

    let mut final_patterns_map: HashMap<PiiCategory, PatternRule> = default_config
        .patterns
        .into_iter()
        .map(|rule| (rule.category, rule))
        .collect();

    debug!("User config provided. Merging {} user rules.", user_cfg.patterns.len());
    for user_rule in user_cfg.patterns {
        final_patterns_map.insert(user_rule.category, user_rule);
    }

    let mut final_patterns: Vec<PatternRule> = final_patterns_map.into_values().collect();
    final_patterns.sort_by_key(|r| r.category);

    let mut context = default_config.context;
    if !user_cfg.context.id_keywords.is_empty() {
        debug!("Overriding id keyword set ({} entries).", user_cfg.context.id_keywords.len());
        context.id_keywords = user_cfg.context.id_keywords;
    }
    if !user_cfg.context.name_keywords.is_empty() {
        debug!("Overriding name keyword set ({} entries).", user_cfg.context.name_keywords.len());
        context.name_keywords = user_cfg.context.name_keywords;
    }

    ScrubConfig {
        patterns: final_patterns,
        context,
        ner: user_cfg.ner,
        chunking: user_cfg.chunking,
        priority: user_cfg.priority,
    }
}

/// Validates pattern rule integrity (regex compilation, lengths, duplicates).
pub fn validate_patterns(patterns: &[PatternRule]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for rule in patterns {
        if !seen.insert(rule.category) {
            errors.push(format!(
                "Duplicate pattern rule for category '{}'.",
                rule.category.as_str()
            ));
        }

        if rule.pattern.is_empty() {
            errors.push(format!(
                "Category '{}' has an empty `pattern` field.",
                rule.category.as_str()
            ));
            continue;
        }

        if rule.pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(format!(
                "Category '{}': pattern length ({}) exceeds maximum allowed ({}).",
                rule.category.as_str(),
                rule.pattern.len(),
                MAX_PATTERN_LENGTH
            ));
        }

        if let Err(e) = Regex::new(&rule.pattern) {
            errors.push(format!(
                "Category '{}' has an invalid regex pattern: {}",
                rule.category.as_str(),
                e
            ));
        }

        if !(0.0..=1.0).contains(&rule.confidence) {
            errors.push(format!(
                "Category '{}': confidence {} is outside [0.0, 1.0].",
                rule.category.as_str(),
                rule.confidence
            ));
        }
    }

    if !errors.is_empty() {
        let full_error_message = format!("Pattern validation failed:\n{}", errors.join("\n"));
        Err(anyhow!(full_error_message))
    } else {
        Ok(())
    }
}

/// The priority list must mention each span source exactly once.
pub fn validate_priority(priority: &[SpanSource]) -> Result<()> {
    let mut seen = HashSet::new();
    for source in priority {
        if !seen.insert(*source) {
            return Err(anyhow!(
                "Priority list mentions source '{}' more than once.",
                source.as_str()
            ));
        }
    }
    if seen.len() != 4 {
        return Err(anyhow!(
            "Priority list must mention all four span sources (got {}).",
            seen.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses_and_validates() {
        let config = ScrubConfig::load_default().unwrap();
        assert!(!config.patterns.is_empty());
        validate_patterns(&config.patterns).unwrap();
        validate_priority(&config.priority).unwrap();
        assert!(config.pattern_for(PiiCategory::Email).is_some());
        assert!(config.pattern_for(PiiCategory::Ssn).is_some());
    }

    #[test]
    fn test_merge_replaces_pattern_by_category() {
        let default_config = ScrubConfig::load_default().unwrap();
        let user = ScrubConfig {
            patterns: vec![PatternRule {
                category: PiiCategory::Zip,
                pattern: r"\bZIPZIP\b".to_string(),
                confidence: 0.99,
                ..Default::default()
            }],
            ..Default::default()
        };
        let merged = merge_config(default_config, Some(user));
        let zip = merged.pattern_for(PiiCategory::Zip).unwrap();
        assert_eq!(zip.pattern, r"\bZIPZIP\b");
        // Untouched categories survive the merge.
        assert!(merged.pattern_for(PiiCategory::Email).is_some());
    }

    #[test]
    fn test_validate_rejects_duplicate_category() {
        let rules = vec![
            PatternRule {
                category: PiiCategory::Zip,
                pattern: r"\d{5}".to_string(),
                ..Default::default()
            },
            PatternRule {
                category: PiiCategory::Zip,
                pattern: r"\d{5}".to_string(),
                ..Default::default()
            },
        ];
        assert!(validate_patterns(&rules).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let rules = vec![PatternRule {
            category: PiiCategory::Email,
            pattern: "([unclosed".to_string(),
            ..Default::default()
        }];
        assert!(validate_patterns(&rules).is_err());
    }

    #[test]
    fn test_validate_priority_rejects_partial_list() {
        assert!(validate_priority(&[SpanSource::Contextual, SpanSource::Ner]).is_err());
        assert!(validate_priority(&[
            SpanSource::Contextual,
            SpanSource::LabeledName,
            SpanSource::Structural,
            SpanSource::Ner
        ])
        .is_ok());
    }
}
