//! Tunable thresholds for the inference pipeline
//!
//! The defaults were calibrated against real-world data-element label
//! corpora; callers can override any of them per form load.

use serde::{Deserialize, Serialize};

/// Threshold set driving every inference stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Minimum fraction of names that must split consistently for a
    /// separator to be accepted.
    pub separator_consistency_threshold: f64,
    /// Exclusivity score at or above which a cluster becomes a radio group.
    pub exclusivity_radio_threshold: f64,
    /// Exclusivity score at or above which a cluster becomes a checkbox
    /// group (below the radio threshold).
    pub exclusivity_checkbox_threshold: f64,
    /// Jaccard similarity a field must reach against a cluster centroid to
    /// join it.
    pub semantic_similarity_threshold: f64,
    /// Hard cap on semantic cluster size, to avoid over-grouping large
    /// unrelated sections.
    pub max_semantic_cluster_size: usize,
    /// Largest option count still rendered as radio buttons.
    pub max_radio_options: usize,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            separator_consistency_threshold: 0.6,
            exclusivity_radio_threshold: 0.7,
            exclusivity_checkbox_threshold: 0.4,
            semantic_similarity_threshold: 0.5,
            max_semantic_cluster_size: 8,
            max_radio_options: 4,
        }
    }
}
