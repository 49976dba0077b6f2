//! Explicit category-combo resolution
//!
//! When a field carries a server-declared category combo id, the server's
//! own structure beats every inference heuristic. The resolver consumes a
//! [`MetadataProvider`] (injected, possibly backed by an on-device cache
//! owned by the caller) and emits `High`-confidence strategies. A failed
//! fetch is never an error at the engine boundary: the caller records a
//! note and lets the fields fall through to the inference stages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::GroupingConfig;
use crate::error::MetadataError;
use crate::models::{
    ConfidenceLevel, Field, GroupMetadata, GroupType, GroupingStrategy, InferredCategory,
};

/// One option of a server category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOption {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub icon: Option<String>,
}

/// One server category: a named axis with its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCategory {
    pub name: String,
    pub options: Vec<ServerOption>,
}

/// The category structure of one server combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryComboStructure {
    pub combo_id: String,
    pub categories: Vec<ServerCategory>,
}

/// Link from a category option combo to the option ids it is made of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionComboLink {
    pub combo_id: String,
    pub option_ids: Vec<String>,
}

/// Read-only source of server category metadata.
///
/// Implementations may hit a local store or a network layer; the engine
/// only ever calls it synchronously per cluster and treats any failure as
/// "no explicit metadata". `Send + Sync` because one provider is shared
/// across parallel scope workers.
pub trait MetadataProvider: Send + Sync {
    fn category_combo_structure(
        &self,
        combo_id: &str,
    ) -> Result<CategoryComboStructure, MetadataError>;

    fn category_option_combos(&self, combo_id: &str)
        -> Result<Vec<OptionComboLink>, MetadataError>;
}

/// Injected structure cache, owned by the caller's lifecycle.
///
/// Deliberately a plain value with explicit invalidation rather than a
/// process-wide singleton: the caller decides when a sync made cached
/// structures stale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataCache {
    structures: HashMap<String, CategoryComboStructure>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, combo_id: &str) -> Option<&CategoryComboStructure> {
        self.structures.get(combo_id)
    }

    pub fn insert(&mut self, structure: CategoryComboStructure) {
        self.structures.insert(structure.combo_id.clone(), structure);
    }

    /// Drop one combo's cached structure, e.g. after a metadata sync.
    pub fn invalidate(&mut self, combo_id: &str) {
        self.structures.remove(combo_id);
    }

    pub fn clear(&mut self) {
        self.structures.clear();
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

/// Resolve one explicit combo into a definitive strategy.
///
/// `members` are the fields carrying this combo id; their order is kept
/// except that fields are sorted into server option-combo order when the
/// link table is available. Returns `Err` only when the structure itself
/// cannot be fetched; the caller degrades, never propagates.
pub fn resolve_explicit_combo(
    provider: &dyn MetadataProvider,
    cache: &mut MetadataCache,
    config: &GroupingConfig,
    combo_id: &str,
    mut members: Vec<Field>,
) -> Result<GroupingStrategy, MetadataError> {
    let structure = match cache.get(combo_id) {
        Some(cached) => cached.clone(),
        None => {
            let fetched = provider.category_combo_structure(combo_id)?;
            cache.insert(fetched.clone());
            fetched
        }
    };

    if structure.categories.is_empty() {
        return Err(MetadataError::NotFound(combo_id.to_string()));
    }

    // Server option-combo order is authoritative for cell layout when we
    // can get it; a miss here is not worth failing over.
    if let Ok(links) = provider.category_option_combos(combo_id) {
        let order: HashMap<&str, usize> =
            links.iter().enumerate().map(|(i, l)| (l.combo_id.as_str(), i)).collect();
        members.sort_by_key(|f| {
            f.category_option_combo
                .as_deref()
                .and_then(|c| order.get(c).copied())
                .unwrap_or(usize::MAX)
        });
    }

    let group_type = classify(&structure, config);
    let inferred: Vec<InferredCategory> = structure
        .categories
        .iter()
        .map(|c| InferredCategory {
            name: c.name.clone(),
            options: c.options.iter().map(|o| o.display_name.clone()).collect(),
        })
        .collect();

    let title = group_title(&members, &structure);

    Ok(GroupingStrategy {
        confidence: ConfidenceLevel::High,
        group_type,
        group_title: title,
        members,
        metadata: GroupMetadata::definitive(combo_id, inferred),
    })
}

fn classify(structure: &CategoryComboStructure, config: &GroupingConfig) -> GroupType {
    if structure.categories.len() >= 2 {
        return GroupType::DimensionalGrid;
    }
    let single = &structure.categories[0];
    let has_icons = single.options.iter().any(|o| o.icon.is_some());
    if single.options.len() <= config.max_radio_options && !has_icons {
        GroupType::RadioGroup
    } else {
        GroupType::CheckboxGroup
    }
}

fn group_title(members: &[Field], structure: &CategoryComboStructure) -> String {
    let names: Vec<&str> = members.iter().map(|f| f.name.as_str()).collect();
    if let Some(prefix) = crate::tokenizer::shared_name_prefix(&names) {
        return prefix;
    }
    structure
        .categories
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(" / ")
}
