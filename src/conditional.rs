//! Conditional structure detection for dimensional patterns
//!
//! Some axis values replace another axis instead of combining with it
//! ("Disabled" pupils are not split by gender). The detector finds axis
//! values whose observed co-occurrence with another axis is empty and
//! annotates the combo; it never changes the group type, and the reduced
//! completeness ratio that results is expected, not an error.

use std::collections::BTreeSet;

use crate::dimensional::PatternCluster;
use crate::models::InferredCategoryCombo;

/// Annotate `combo` with any conditional structure observed in `cluster`.
///
/// For every value of every axis, the values it actually co-occurs with on
/// each other axis are collected. An empty co-occurrence is a replacement
/// value and emits an omission rule; a strict non-empty subset emits a
/// "limited to" rule. A limited-to rule is suppressed when every missing
/// counterpart is itself a replacement value, whose own omission rule
/// already covers the gap (otherwise a single replacement value would echo
/// one rule per value of the other axis). Axes and values are walked in
/// stable order, so rules come out deterministically.
pub fn annotate_conditionals(cluster: &PatternCluster, combo: &mut InferredCategoryCombo) {
    let dims = &cluster.pattern.dimensions;

    for (i, dim) in dims.iter().enumerate() {
        for value in &dim.values {
            for (j, other) in dims.iter().enumerate() {
                if i == j {
                    continue;
                }

                let observed = co_occurrence(cluster, i, value, j);
                if observed.len() >= other.values.len() {
                    continue;
                }

                if observed.is_empty() {
                    combo.is_conditional = true;
                    combo
                        .conditional_rules
                        .push(format!("If {}, {} is omitted", value, other.name));
                    continue;
                }

                let subsumed = other
                    .values
                    .iter()
                    .filter(|w| !observed.contains(w.as_str()))
                    .all(|w| co_occurrence(cluster, j, w, i).is_empty());
                if !subsumed {
                    combo.is_conditional = true;
                    combo.conditional_rules.push(format!(
                        "If {}, {} is limited to {}",
                        value,
                        other.name,
                        observed.iter().cloned().collect::<Vec<_>>().join(", ")
                    ));
                }
            }
        }
    }
}

/// Values of axis `j` observed together with `value` on axis `i`.
fn co_occurrence<'a>(
    cluster: &'a PatternCluster,
    i: usize,
    value: &str,
    j: usize,
) -> BTreeSet<&'a str> {
    let mut observed = BTreeSet::new();
    for row in &cluster.member_values {
        if row[i].as_deref() == Some(value) {
            if let Some(other_value) = row[j].as_deref() {
                observed.insert(other_value);
            }
        }
    }
    observed
}
