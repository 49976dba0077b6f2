//! Separator detection and label tokenization
//!
//! The first inference stage: scan every field name in a scope, decide
//! which separator family the labels follow, and split labels into ordered
//! tokens. Everything here is a pure function over the label set.

use serde::{Deserialize, Serialize};

/// Naming-pattern family a label set follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryPattern {
    /// `"Base - Axis1 - Axis2"` style labels.
    Hierarchical,
    /// `"Prefix: rest"` style labels.
    PrefixGrouped,
    /// `"base_axis1_axis2"` style labels.
    UnderscoreDelim,
    /// `"Base|Axis1|Axis2"` style labels.
    PipeDelim,
    /// No separator cleared the acceptance threshold.
    Flat,
}

/// Candidate separators in fixed priority order. Earlier entries win ties.
const SEPARATORS: [(&str, CategoryPattern); 4] = [
    (" - ", CategoryPattern::Hierarchical),
    ("|", CategoryPattern::PipeDelim),
    ("_", CategoryPattern::UnderscoreDelim),
    (":", CategoryPattern::PrefixGrouped),
];

/// Outcome of a separator scan over one scope's labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDetection {
    pub pattern: CategoryPattern,
    /// The winning separator, absent for `Flat`.
    pub separator: Option<String>,
    /// Consistency ratio of the winning separator, in `[0, 1]`.
    pub confidence: f64,
}

impl PatternDetection {
    fn flat() -> Self {
        Self { pattern: CategoryPattern::Flat, separator: None, confidence: 0.0 }
    }
}

/// Fraction of names that split into the modal token count under `sep`.
///
/// Only names that actually split (≥2 tokens) are candidates for the mode;
/// the ratio is still taken over all names, so a separator used by a
/// minority of labels scores low.
fn consistency_ratio(names: &[&str], sep: &str) -> f64 {
    if names.is_empty() {
        return 0.0;
    }

    let mut counts: Vec<usize> = Vec::new();
    for name in names {
        let tokens = name.split(sep).count();
        if tokens >= 2 {
            counts.push(tokens);
        }
    }
    if counts.is_empty() {
        return 0.0;
    }

    // Frequency of the modal token count.
    let mut best_freq = 0;
    counts.sort_unstable();
    let mut i = 0;
    while i < counts.len() {
        let value = counts[i];
        let mut freq = 0;
        while i < counts.len() && counts[i] == value {
            freq += 1;
            i += 1;
        }
        if freq > best_freq {
            best_freq = freq;
        }
    }

    best_freq as f64 / names.len() as f64
}

/// Scan a label set and pick the dominant separator family.
///
/// Separators are tried in the fixed priority order; the one with the
/// highest consistency ratio at or above `threshold` wins, with ties broken
/// toward the earlier candidate. No winner means `Flat` with confidence 0.
pub fn detect_pattern(names: &[&str], threshold: f64) -> PatternDetection {
    let mut best: Option<(&'static str, CategoryPattern, f64)> = None;

    for (sep, pattern) in SEPARATORS {
        let ratio = consistency_ratio(names, sep);
        if ratio < threshold {
            continue;
        }
        // Strictly-greater keeps the earlier separator on ties.
        let better = match best {
            Some((_, _, best_ratio)) => ratio > best_ratio,
            None => true,
        };
        if better {
            best = Some((sep, pattern, ratio));
        }
    }

    match best {
        Some((sep, pattern, ratio)) => PatternDetection {
            pattern,
            separator: Some(sep.to_string()),
            confidence: ratio,
        },
        None => PatternDetection::flat(),
    }
}

/// Longest common prefix of a set of labels, trimmed back to a clean
/// word boundary. Used for group titles.
pub fn shared_name_prefix(names: &[&str]) -> Option<String> {
    let first = *names.first()?;
    let mut prefix_len = first.len();
    for name in &names[1..] {
        let common =
            first.bytes().zip(name.bytes()).take_while(|(a, b)| a == b).count();
        prefix_len = prefix_len.min(common);
    }
    while prefix_len > 0 && !first.is_char_boundary(prefix_len) {
        prefix_len -= 1;
    }
    let prefix = first[..prefix_len]
        .trim_end_matches(|c: char| matches!(c, ' ' | '-' | '_' | ':' | '|'));
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

/// Split a label into ordered, trimmed tokens using `sep`.
///
/// Empty tokens (from doubled separators or leading/trailing ones) are
/// dropped so downstream position analysis never sees phantom axes.
pub fn tokenize(name: &str, sep: &str) -> Vec<String> {
    name.split(sep)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
