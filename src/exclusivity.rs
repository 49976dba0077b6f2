//! Mutual exclusivity scoring
//!
//! For clusters with no dimensional pattern, estimates statistically
//! whether the fields behave as a one-of-N choice. The composite score
//! blends three signals: how much of the naming is a shared prefix, how
//! homogeneous the data-entry types are, and whether the cluster is small
//! enough to plausibly be a closed choice.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::config::GroupingConfig;
use crate::models::{DataEntryType, Field, GroupType};
use crate::tokenizer::tokenize;

/// Score component weights. They sum to 1.0 so the composite stays in
/// `[0, 1]`.
const PREFIX_WEIGHT: f64 = 0.4;
const HOMOGENEITY_WEIGHT: f64 = 0.3;
const CARDINALITY_WEIGHT: f64 = 0.3;

/// Cluster size at or below which the small-cardinality boost is full.
const CLOSED_CHOICE_SIZE: usize = 4;

/// Result of scoring one candidate cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusivityOutcome {
    pub score: f64,
    /// `RadioGroup` or `CheckboxGroup` when a threshold was cleared,
    /// `None` when the cluster should defer to the semantic stage.
    pub group_type: Option<GroupType>,
}

/// Bucket fields into candidate clusters by their leading name word.
///
/// With a detected separator the leading separator token is taken first
/// (so `stock_received` buckets on `stock`), then reduced to its first
/// whitespace word, case-folded. Buckets are returned in sorted key
/// order; only buckets with at least two members are candidates.
pub fn candidate_clusters(fields: &[Field], separator: Option<&str>) -> Vec<Vec<Field>> {
    let mut buckets: BTreeMap<String, Vec<Field>> = BTreeMap::new();
    for field in fields {
        let leading = match separator {
            Some(sep) => tokenize(&field.name, sep).into_iter().next(),
            None => Some(field.name.clone()),
        };
        let key = leading
            .as_deref()
            .and_then(|t| t.split_whitespace().next())
            .map(|w| w.to_lowercase());
        let Some(key) = key else { continue };
        buckets.entry(key).or_default().push(field.clone());
    }
    buckets.into_values().filter(|members| members.len() >= 2).collect()
}

/// Compute the composite exclusivity score for one cluster and classify
/// it against the configured thresholds.
pub fn score_cluster(members: &[Field], config: &GroupingConfig) -> ExclusivityOutcome {
    let score = PREFIX_WEIGHT * prefix_similarity(members)
        + HOMOGENEITY_WEIGHT * type_homogeneity(members)
        + CARDINALITY_WEIGHT * cardinality_boost(members.len());

    let group_type = if score >= config.exclusivity_radio_threshold {
        Some(GroupType::RadioGroup)
    } else if score >= config.exclusivity_checkbox_threshold {
        Some(GroupType::CheckboxGroup)
    } else {
        None
    };

    ExclusivityOutcome { score, group_type }
}

/// Fraction of each name taken up by the common leading words, case-folded.
fn prefix_similarity(members: &[Field]) -> f64 {
    let token_lists: Vec<Vec<String>> = members
        .iter()
        .map(|f| f.name.split_whitespace().map(|w| w.to_lowercase()).collect())
        .collect();

    let max_len = token_lists.iter().map(Vec::len).max().unwrap_or(0);
    if max_len == 0 {
        return 0.0;
    }

    let first = &token_lists[0];
    let mut common = first.len();
    for tokens in &token_lists[1..] {
        let shared = first
            .iter()
            .zip(tokens.iter())
            .take_while(|(a, b)| a == b)
            .count();
        common = common.min(shared);
    }

    common as f64 / max_len as f64
}

/// Share of members carrying the modal data-entry type.
fn type_homogeneity(members: &[Field]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<DataEntryType, usize> = HashMap::new();
    for field in members {
        *counts.entry(field.data_entry_type).or_insert(0) += 1;
    }
    let modal = counts.values().copied().max().unwrap_or(0);
    modal as f64 / members.len() as f64
}

/// Full boost for small clusters, decaying as the cluster grows past a
/// plausible closed-choice size.
fn cardinality_boost(size: usize) -> f64 {
    if size == 0 {
        return 0.0;
    }
    if size <= CLOSED_CHOICE_SIZE {
        1.0
    } else {
        CLOSED_CHOICE_SIZE as f64 / size as f64
    }
}
