//! Grouping pipeline orchestration
//!
//! Runs the resolvers in fixed priority over one scope's working set:
//! explicit category combos, then dimensional patterns, then mutual
//! exclusivity, then semantic similarity, then the flat remainder. Each
//! stage removes the fields it claimed before the next stage runs, which
//! is what guarantees the partition invariant: every input field lands in
//! exactly one strategy, and an earlier stage always beats a later one on
//! overlapping clusters.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::category::{resolve_explicit_combo, MetadataCache, MetadataProvider};
use crate::conditional::annotate_conditionals;
use crate::config::GroupingConfig;
use crate::dimensional::extract_patterns;
use crate::error::GroupingError;
use crate::exclusivity::{candidate_clusters, score_cluster};
use crate::models::{
    ConfidenceLevel, Field, GroupMetadata, GroupType, GroupingNote, GroupingStrategy, ScopeResult,
};
use crate::semantic::cluster_fields;
use crate::tokenizer::{detect_pattern, shared_name_prefix};

/// Cooperative cancellation handle, checked between scopes and between
/// pipeline stages. A cancelled scope yields no partial partition.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The engine entry point: configuration, an optional metadata provider,
/// and a cancellation handle.
pub struct GroupAssembler<'a> {
    config: GroupingConfig,
    provider: Option<&'a dyn MetadataProvider>,
    cancel: CancelFlag,
}

impl<'a> GroupAssembler<'a> {
    pub fn new(config: GroupingConfig) -> Self {
        Self { config, provider: None, cancel: CancelFlag::new() }
    }

    pub fn with_provider(mut self, provider: &'a dyn MetadataProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Group one scope's fields into a complete partition.
    ///
    /// Total for every input: the worst case is one flat-list strategy
    /// per field. The only error is cancellation, which discards the
    /// scope's partial results entirely.
    pub fn group_scope(
        &self,
        section_name: &str,
        fields: &[Field],
        cache: &mut MetadataCache,
    ) -> Result<ScopeResult, GroupingError> {
        let mut strategies = Vec::new();
        let mut notes = Vec::new();
        let mut working: Vec<Field> = fields.to_vec();

        self.checkpoint(section_name)?;
        self.resolve_explicit_stage(&mut working, &mut strategies, &mut notes, cache);

        self.checkpoint(section_name)?;
        let detection =
            detect_pattern(&name_refs(&working), self.config.separator_consistency_threshold);
        if let Some(separator) = detection.separator.as_deref() {
            self.dimensional_stage(&mut working, &mut strategies, separator);
        }

        self.checkpoint(section_name)?;
        self.exclusivity_stage(&mut working, &mut strategies, detection.separator.as_deref());

        self.checkpoint(section_name)?;
        self.semantic_stage(&mut working, &mut strategies);

        // Flat remainder: whatever no resolver claimed, one strategy each.
        for field in working {
            strategies.push(GroupingStrategy {
                confidence: ConfidenceLevel::Low,
                group_type: GroupType::FlatList,
                group_title: field.name.clone(),
                members: vec![field],
                metadata: GroupMetadata::flat(),
            });
        }

        Ok(ScopeResult { section_name: section_name.to_string(), strategies, notes })
    }

    /// Group several scopes sequentially, in input order.
    pub fn group_scopes(
        &self,
        scopes: &[(String, Vec<Field>)],
        cache: &mut MetadataCache,
    ) -> Result<Vec<ScopeResult>, GroupingError> {
        scopes
            .iter()
            .map(|(section, fields)| self.group_scope(section, fields, cache))
            .collect()
    }

    /// Group several scopes on parallel workers.
    ///
    /// Scopes share no mutable state, so each worker runs on a private
    /// clone of the cache and results are collected back in input order;
    /// the output is identical to [`group_scopes`](Self::group_scopes).
    pub fn group_scopes_parallel(
        &self,
        scopes: &[(String, Vec<Field>)],
        cache: &MetadataCache,
    ) -> Result<Vec<ScopeResult>, GroupingError> {
        scopes
            .par_iter()
            .map(|(section, fields)| {
                let mut local_cache = cache.clone();
                self.group_scope(section, fields, &mut local_cache)
            })
            .collect()
    }

    fn checkpoint(&self, section_name: &str) -> Result<(), GroupingError> {
        if self.cancel.is_cancelled() {
            Err(GroupingError::Cancelled(section_name.to_string()))
        } else {
            Ok(())
        }
    }

    /// Stage 1: server-declared combos beat all inference. A failed fetch
    /// leaves the fields in the working set for the later stages.
    fn resolve_explicit_stage(
        &self,
        working: &mut Vec<Field>,
        strategies: &mut Vec<GroupingStrategy>,
        notes: &mut Vec<GroupingNote>,
        cache: &mut MetadataCache,
    ) {
        let Some(provider) = self.provider else {
            if working.iter().any(|f| f.explicit_category_combo_id.is_some()) {
                notes.push(GroupingNote::new(
                    "explicit category combos present but no metadata provider configured",
                ));
            }
            return;
        };

        let mut by_combo: BTreeMap<String, Vec<Field>> = BTreeMap::new();
        for field in working.iter() {
            if let Some(combo_id) = &field.explicit_category_combo_id {
                by_combo.entry(combo_id.clone()).or_default().push(field.clone());
            }
        }

        for (combo_id, members) in by_combo {
            match resolve_explicit_combo(provider, cache, &self.config, &combo_id, members) {
                Ok(strategy) => {
                    claim(working, &strategy.members);
                    strategies.push(strategy);
                }
                Err(e) => {
                    notes.push(GroupingNote::metadata_unavailable(&combo_id, &e.to_string()));
                }
            }
        }
    }

    /// Stage 2: multi-axis naming patterns become grids.
    fn dimensional_stage(
        &self,
        working: &mut Vec<Field>,
        strategies: &mut Vec<GroupingStrategy>,
        separator: &str,
    ) {
        for cluster in extract_patterns(working, separator) {
            let mut combo = cluster.to_combo();
            annotate_conditionals(&cluster, &mut combo);

            claim(working, &cluster.members);
            strategies.push(GroupingStrategy {
                confidence: ConfidenceLevel::Medium,
                group_type: GroupType::DimensionalGrid,
                group_title: cluster.pattern.base_name.clone(),
                members: cluster.members,
                metadata: GroupMetadata::dimensional(combo),
            });
        }
    }

    /// Stage 3: statistically exclusive clusters become choice groups.
    fn exclusivity_stage(
        &self,
        working: &mut Vec<Field>,
        strategies: &mut Vec<GroupingStrategy>,
        separator: Option<&str>,
    ) {
        for members in candidate_clusters(working, separator) {
            let outcome = score_cluster(&members, &self.config);
            let Some(group_type) = outcome.group_type else { continue };

            claim(working, &members);
            strategies.push(GroupingStrategy {
                confidence: ConfidenceLevel::Medium,
                group_type,
                group_title: title_for(&members),
                members,
                metadata: GroupMetadata::exclusivity(outcome.score),
            });
        }
    }

    /// Stage 4: vocabulary similarity, the last grouping signal.
    fn semantic_stage(&self, working: &mut Vec<Field>, strategies: &mut Vec<GroupingStrategy>) {
        let (clusters, leftovers) = cluster_fields(working, &self.config);
        for cluster in clusters {
            strategies.push(GroupingStrategy {
                confidence: ConfidenceLevel::Low,
                group_type: GroupType::SemanticCluster,
                group_title: title_for(&cluster.members),
                members: cluster.members,
                metadata: GroupMetadata::semantic(cluster.mean_similarity),
            });
        }
        *working = leftovers;
    }
}

fn name_refs(fields: &[Field]) -> Vec<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

/// Remove claimed fields from the working set, by id.
fn claim(working: &mut Vec<Field>, members: &[Field]) {
    let claimed: HashSet<&str> = members.iter().map(|f| f.id.as_str()).collect();
    working.retain(|f| !claimed.contains(f.id.as_str()));
}

fn title_for(members: &[Field]) -> String {
    let names = name_refs(members);
    shared_name_prefix(&names)
        .unwrap_or_else(|| members.first().map(|f| f.name.clone()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataEntryType;

    fn field(id: &str, name: &str) -> Field {
        Field::new(id, name, "Section", DataEntryType::Integer)
    }

    fn assert_partition(fields: &[Field], result: &ScopeResult) {
        let mut seen = HashSet::new();
        for strategy in &result.strategies {
            for member in &strategy.members {
                assert!(seen.insert(member.id.clone()), "field {} assigned twice", member.id);
            }
        }
        let input: HashSet<String> = fields.iter().map(|f| f.id.clone()).collect();
        assert_eq!(seen, input);
    }

    #[test]
    fn test_empty_scope_yields_empty_result() {
        let assembler = GroupAssembler::new(GroupingConfig::default());
        let mut cache = MetadataCache::new();
        let result = assembler.group_scope("Empty", &[], &mut cache).unwrap();
        assert!(result.strategies.is_empty());
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_every_field_appears_exactly_once() {
        let fields = vec![
            field("f1", "Pupils Fed - P1 - Male"),
            field("f2", "Pupils Fed - P1 - Female"),
            field("f3", "Pupils Fed - P2 - Male"),
            field("f4", "Pupils Fed - P2 - Female"),
            field("f5", "Rainfall"),
        ];
        let assembler = GroupAssembler::new(GroupingConfig::default());
        let mut cache = MetadataCache::new();
        let result = assembler.group_scope("Feeding", &fields, &mut cache).unwrap();
        assert_partition(&fields, &result);
    }

    #[test]
    fn test_singleton_scope_is_flat() {
        let fields = vec![field("f1", "Comments")];
        let assembler = GroupAssembler::new(GroupingConfig::default());
        let mut cache = MetadataCache::new();
        let result = assembler.group_scope("Notes", &fields, &mut cache).unwrap();
        assert_eq!(result.strategies.len(), 1);
        assert_eq!(result.strategies[0].group_type, GroupType::FlatList);
        assert_eq!(result.strategies[0].group_title, "Comments");
    }

    #[test]
    fn test_duplicate_names_both_assigned() {
        let fields = vec![field("f1", "Weight"), field("f2", "Weight")];
        let assembler = GroupAssembler::new(GroupingConfig::default());
        let mut cache = MetadataCache::new();
        let result = assembler.group_scope("Vitals", &fields, &mut cache).unwrap();
        assert_partition(&fields, &result);
    }

    #[test]
    fn test_cancelled_scope_returns_no_partial_result() {
        let fields = vec![field("f1", "Weight"), field("f2", "Height")];
        let cancel = CancelFlag::new();
        cancel.cancel();
        let assembler =
            GroupAssembler::new(GroupingConfig::default()).with_cancel_flag(cancel);
        let mut cache = MetadataCache::new();
        let result = assembler.group_scope("Vitals", &fields, &mut cache);
        assert_eq!(result, Err(GroupingError::Cancelled("Vitals".to_string())));
    }

    #[test]
    fn test_missing_provider_with_explicit_combo_is_noted() {
        let fields = vec![field("f1", "BCG Doses").with_explicit_combo("cc1")];
        let assembler = GroupAssembler::new(GroupingConfig::default());
        let mut cache = MetadataCache::new();
        let result = assembler.group_scope("Immunization", &fields, &mut cache).unwrap();
        assert_eq!(result.notes.len(), 1);
        assert_partition(&fields, &result);
    }
}
