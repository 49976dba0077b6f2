//! Dimensional pattern extraction
//!
//! Clusters fields whose labels share a base name and vary along two or
//! more orthogonal token positions, turning each cluster into a
//! [`DimensionalPattern`] with stable axis ordering. Clusters varying
//! along a single position are not dimensional; the caller escalates them
//! to the exclusivity stage.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::models::{DimensionalPattern, Dimension, Field, InferredCategory, InferredCategoryCombo};
use crate::tokenizer::tokenize;

/// A confirmed dimensional cluster: the pattern plus the fields backing it
/// and each field's observed value on each axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCluster {
    pub pattern: DimensionalPattern,
    pub members: Vec<Field>,
    /// Parallel to `members`; inner vector parallel to
    /// `pattern.dimensions`. `None` where the label had no token at that
    /// axis's position (ragged rows in conditional structures).
    pub member_values: Vec<Vec<Option<String>>>,
}

impl PatternCluster {
    /// Derives the category-combo analogue for this cluster. Conditional
    /// annotation is added separately by the rule detector.
    pub fn to_combo(&self) -> InferredCategoryCombo {
        let categories = self
            .pattern
            .dimensions
            .iter()
            .map(|d| InferredCategory {
                name: d.name.clone(),
                options: d.values.iter().cloned().collect(),
            })
            .collect();
        InferredCategoryCombo {
            categories,
            total_expected_combinations: self.pattern.total_expected_combinations(),
            actual_combinations: self.members.len(),
            is_conditional: false,
            conditional_rules: Vec::new(),
        }
    }
}

/// Extract every dimensional cluster from `fields` under `separator`.
///
/// Fields are first bucketed by their leading token; within a bucket, a
/// token position is *varying* when it takes ≥2 distinct values. Buckets
/// with ≥2 varying positions become clusters; the rest are left for later
/// stages. Output is ordered by base name so identical inputs always
/// yield identical results.
pub fn extract_patterns(fields: &[Field], separator: &str) -> Vec<PatternCluster> {
    // Bucket by leading token, preserving input order within each bucket.
    let mut buckets: BTreeMap<String, Vec<(Field, Vec<String>)>> = BTreeMap::new();
    for field in fields {
        let tokens = tokenize(&field.name, separator);
        if tokens.is_empty() {
            continue;
        }
        buckets.entry(tokens[0].clone()).or_default().push((field.clone(), tokens));
    }

    let mut clusters = Vec::new();
    for (_, bucket) in buckets {
        if bucket.len() < 2 {
            continue;
        }
        if let Some(cluster) = cluster_from_bucket(&bucket, separator) {
            clusters.push(cluster);
        }
    }
    clusters
}

/// Distinct values observed at each token position across a bucket.
fn position_values(bucket: &[(Field, Vec<String>)]) -> Vec<BTreeSet<String>> {
    let width = bucket.iter().map(|(_, tokens)| tokens.len()).max().unwrap_or(0);
    let mut values = vec![BTreeSet::new(); width];
    for (_, tokens) in bucket {
        for (pos, token) in tokens.iter().enumerate() {
            values[pos].insert(token.clone());
        }
    }
    values
}

fn cluster_from_bucket(bucket: &[(Field, Vec<String>)], separator: &str) -> Option<PatternCluster> {
    let values = position_values(bucket);

    let varying: Vec<usize> =
        (0..values.len()).filter(|&pos| values[pos].len() >= 2).collect();
    if varying.len() < 2 {
        return None;
    }

    // Base name = the fixed positions before the first varying one.
    let first_varying = varying[0];
    let (_, reference_tokens) = &bucket[0];
    let base_name = reference_tokens[..first_varying.min(reference_tokens.len())].join(separator);

    let dimensions: Vec<Dimension> = varying
        .iter()
        .map(|&pos| Dimension {
            name: axis_label(&values[pos], pos),
            values: values[pos].clone(),
            order: pos,
        })
        .collect();

    let mut members = Vec::with_capacity(bucket.len());
    let mut member_values = Vec::with_capacity(bucket.len());
    for (field, tokens) in bucket {
        members.push(field.clone());
        member_values
            .push(varying.iter().map(|&pos| tokens.get(pos).cloned()).collect());
    }

    Some(PatternCluster {
        pattern: DimensionalPattern { base_name, dimensions },
        members,
        member_values,
    })
}

/// Best-effort human label for an axis from its value set.
///
/// Falls back to a position-derived name, which keeps naming deterministic
/// for identical inputs regardless of field discovery order.
fn axis_label(values: &BTreeSet<String>, order: usize) -> String {
    let lowered: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();

    let all = |pred: fn(&str) -> bool| lowered.iter().all(|v| pred(v));

    if all(|v| matches!(v, "male" | "female" | "m" | "f" | "other")) {
        return "Gender".to_string();
    }
    if all(|v| matches!(v, "yes" | "no" | "true" | "false")) {
        return "Response".to_string();
    }
    if all(is_grade_value) {
        return "Grade".to_string();
    }
    if all(is_age_value) {
        return "Age".to_string();
    }
    format!("Dimension {}", order)
}

/// `P1`, `p12`, `Grade 3` style values.
fn is_grade_value(v: &str) -> bool {
    if let Some(rest) = v.strip_prefix('p') {
        return !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit());
    }
    if let Some(rest) = v.strip_prefix("grade ") {
        return !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit());
    }
    false
}

/// `0-11m`, `<5`, `5+`, `12-59m`, `15y` style values.
fn is_age_value(v: &str) -> bool {
    if v.is_empty() {
        return false;
    }
    v.chars().all(|c| {
        c.is_ascii_digit() || matches!(c, '-' | '<' | '>' | '+' | 'm' | 'y')
    }) && v.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataEntryType;

    fn field(id: &str, name: &str) -> Field {
        Field::new(id, name, "Section", DataEntryType::Integer)
    }

    fn feeding_fields() -> Vec<Field> {
        vec![
            field("f1", "Pupils Fed - P1 - Male"),
            field("f2", "Pupils Fed - P1 - Female"),
            field("f3", "Pupils Fed - P2 - Male"),
            field("f4", "Pupils Fed - P2 - Female"),
        ]
    }

    #[test]
    fn test_extracts_two_axis_grid() {
        let clusters = extract_patterns(&feeding_fields(), " - ");
        assert_eq!(clusters.len(), 1);

        let cluster = &clusters[0];
        assert_eq!(cluster.pattern.base_name, "Pupils Fed");
        assert_eq!(cluster.pattern.dimensions.len(), 2);

        let grade = &cluster.pattern.dimensions[0];
        assert_eq!(grade.name, "Grade");
        assert_eq!(grade.order, 1);
        assert_eq!(grade.values.iter().cloned().collect::<Vec<_>>(), vec!["P1", "P2"]);

        let gender = &cluster.pattern.dimensions[1];
        assert_eq!(gender.name, "Gender");
        assert_eq!(gender.order, 2);

        let combo = cluster.to_combo();
        assert_eq!(combo.total_expected_combinations, 4);
        assert_eq!(combo.actual_combinations, 4);
        assert_eq!(combo.completeness_ratio(), 1.0);
    }

    #[test]
    fn test_single_varying_axis_is_not_dimensional() {
        let fields = vec![
            field("f1", "Stock - Received"),
            field("f2", "Stock - Issued"),
            field("f3", "Stock - Discarded"),
        ];
        let clusters = extract_patterns(&fields, " - ");
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_ragged_rows_join_the_cluster() {
        let mut fields = feeding_fields();
        fields.push(field("f5", "Pupils Fed - Disabled"));

        let clusters = extract_patterns(&fields, " - ");
        assert_eq!(clusters.len(), 1);

        let cluster = &clusters[0];
        assert_eq!(cluster.members.len(), 5);
        // Disabled has no value on the second axis.
        assert_eq!(cluster.member_values[4], vec![Some("Disabled".to_string()), None]);

        let combo = cluster.to_combo();
        assert_eq!(combo.total_expected_combinations, 6);
        assert_eq!(combo.actual_combinations, 5);
        assert!(combo.completeness_ratio() < 1.0);
    }

    #[test]
    fn test_identical_inputs_yield_identical_patterns() {
        let forward = extract_patterns(&feeding_fields(), " - ");
        let mut reversed_fields = feeding_fields();
        reversed_fields.reverse();
        let reversed = extract_patterns(&reversed_fields, " - ");

        // Axis structure does not depend on field discovery order.
        assert_eq!(forward[0].pattern, reversed[0].pattern);
    }

    #[test]
    fn test_multi_token_base_name() {
        let fields = vec![
            field("f1", "ANC - Visit - 1st - Urban"),
            field("f2", "ANC - Visit - 1st - Rural"),
            field("f3", "ANC - Visit - 2nd - Urban"),
            field("f4", "ANC - Visit - 2nd - Rural"),
        ];
        let clusters = extract_patterns(&fields, " - ");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].pattern.base_name, "ANC - Visit");
        assert_eq!(clusters[0].pattern.dimensions[0].order, 2);
    }

    #[test]
    fn test_age_axis_label() {
        let fields = vec![
            field("f1", "Measles Doses - 0-11m - Fixed"),
            field("f2", "Measles Doses - 0-11m - Outreach"),
            field("f3", "Measles Doses - 12-59m - Fixed"),
            field("f4", "Measles Doses - 12-59m - Outreach"),
        ];
        let clusters = extract_patterns(&fields, " - ");
        assert_eq!(clusters[0].pattern.dimensions[0].name, "Age");
        assert_eq!(clusters[0].pattern.dimensions[1].name, "Dimension 2");
    }
}
