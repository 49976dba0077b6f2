//! Semantic fallback clustering
//!
//! The last inference stage before the flat fallback: fields that share
//! enough vocabulary are grouped even when no structural signal exists.
//! Names are case-folded and stripped of stop words; a field joins the
//! first cluster whose running centroid it is Jaccard-similar enough to,
//! subject to a hard cluster size cap.

use std::collections::BTreeSet;

use crate::config::GroupingConfig;
use crate::models::Field;

/// Words too common in form labels to carry grouping signal.
const STOP_WORDS: [&str; 16] = [
    "a", "an", "and", "at", "by", "for", "from", "in", "no", "of", "on", "or", "per", "the",
    "to", "with",
];

/// A similarity-based cluster and the evidence score backing it.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticCluster {
    pub members: Vec<Field>,
    /// Mean pairwise Jaccard similarity of the member token sets.
    pub mean_similarity: f64,
}

/// Case-folded, stop-word-filtered word set of one label.
fn token_set(name: &str) -> BTreeSet<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Greedily cluster `fields` by vocabulary similarity.
///
/// Returns the clusters that actually grouped (≥2 members) plus the
/// leftover singletons, both in input order. Clustering walks fields and
/// clusters in creation order, so identical inputs cluster identically.
pub fn cluster_fields(
    fields: &[Field],
    config: &GroupingConfig,
) -> (Vec<SemanticCluster>, Vec<Field>) {
    struct Working {
        members: Vec<Field>,
        token_sets: Vec<BTreeSet<String>>,
        centroid: BTreeSet<String>,
    }

    let mut working: Vec<Working> = Vec::new();

    for field in fields {
        let tokens = token_set(&field.name);
        let mut joined = false;

        if !tokens.is_empty() {
            for cluster in working.iter_mut() {
                if cluster.members.len() >= config.max_semantic_cluster_size {
                    continue;
                }
                if jaccard(&tokens, &cluster.centroid) > config.semantic_similarity_threshold {
                    cluster.centroid.extend(tokens.iter().cloned());
                    cluster.members.push(field.clone());
                    cluster.token_sets.push(tokens.clone());
                    joined = true;
                    break;
                }
            }
        }

        if !joined {
            working.push(Working {
                members: vec![field.clone()],
                centroid: tokens.clone(),
                token_sets: vec![tokens],
            });
        }
    }

    let mut clusters = Vec::new();
    let mut leftovers = Vec::new();
    for cluster in working {
        if cluster.members.len() >= 2 {
            let mean_similarity = mean_pairwise(&cluster.token_sets);
            clusters.push(SemanticCluster { members: cluster.members, mean_similarity });
        } else {
            leftovers.extend(cluster.members);
        }
    }
    (clusters, leftovers)
}

fn mean_pairwise(token_sets: &[BTreeSet<String>]) -> f64 {
    let n = token_sets.len();
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            total += jaccard(&token_sets[i], &token_sets[j]);
            pairs += 1;
        }
    }
    total / pairs as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataEntryType;

    fn field(id: &str, name: &str) -> Field {
        Field::new(id, name, "Section", DataEntryType::Integer)
    }

    #[test]
    fn test_shared_vocabulary_clusters() {
        let fields = vec![
            field("f1", "Bednets distributed"),
            field("f2", "Bednets distributed to mothers"),
            field("f3", "Rainfall"),
        ];
        let (clusters, leftovers) = cluster_fields(&fields, &GroupingConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
        assert!(clusters[0].mean_similarity > 0.0 && clusters[0].mean_similarity <= 1.0);
        assert_eq!(leftovers.len(), 1);
        assert_eq!(leftovers[0].name, "Rainfall");
    }

    #[test]
    fn test_unrelated_fields_stay_singletons() {
        let fields = vec![
            field("f1", "Weight"),
            field("f2", "Rainfall"),
            field("f3", "Distance"),
            field("f4", "Attendance"),
            field("f5", "Temperature"),
        ];
        let (clusters, leftovers) = cluster_fields(&fields, &GroupingConfig::default());
        assert!(clusters.is_empty());
        assert_eq!(leftovers.len(), 5);
    }

    #[test]
    fn test_stop_words_do_not_create_similarity() {
        let fields = vec![field("f1", "Number of the visits"), field("f2", "Name of the officer")];
        let (clusters, leftovers) = cluster_fields(&fields, &GroupingConfig::default());
        assert!(clusters.is_empty());
        assert_eq!(leftovers.len(), 2);
    }

    #[test]
    fn test_cluster_size_cap() {
        let config =
            GroupingConfig { max_semantic_cluster_size: 3, ..GroupingConfig::default() };
        let fields: Vec<Field> =
            (0..5).map(|i| field(&format!("f{}", i), "Village outreach visits")).collect();
        let (clusters, leftovers) = cluster_fields(&fields, &config);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members.len(), 3);
        assert_eq!(clusters[1].members.len(), 2);
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_token_set_folds_case_and_strips_stop_words() {
        let tokens = token_set("Number of THE Visits-Completed");
        let expected: BTreeSet<String> =
            ["number", "visits", "completed"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tokens, expected);
    }
}
