//! Data models for field grouping decisions
//!
//! Everything here is an immutable value object: the engine builds these
//! fresh on every invocation and never mutates a field it was handed.
//! All types serialize so the rendering layer can snapshot a grouping
//! decision alongside the form state it was computed for.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The kind of value a field captures, as declared by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataEntryType {
    Number,
    Integer,
    PositiveInteger,
    Text,
    LongText,
    YesNo,
    Date,
    OptionSet,
}

/// The atomic unit being grouped. Owned by the caller; never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    pub section_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category_option_combo: Option<String>,
    pub data_entry_type: DataEntryType,
    /// Server-declared category combo, when the dataset carries one.
    /// Presence of this id short-circuits all inference for the cluster.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub explicit_category_combo_id: Option<String>,
}

impl Field {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        section_name: impl Into<String>,
        data_entry_type: DataEntryType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            section_name: section_name.into(),
            category_option_combo: None,
            data_entry_type,
            explicit_category_combo_id: None,
        }
    }

    pub fn with_explicit_combo(mut self, combo_id: impl Into<String>) -> Self {
        self.explicit_category_combo_id = Some(combo_id.into());
        self
    }
}

/// How much a grouping decision can be trusted.
///
/// `High` is reserved for server-declared category structures; inference
/// from naming patterns caps out at `Medium`, similarity guesses at `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "HIGH"),
            ConfidenceLevel::Medium => write!(f, "MEDIUM"),
            ConfidenceLevel::Low => write!(f, "LOW"),
        }
    }
}

/// The input structure a group of fields should render as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupType {
    RadioGroup,
    CheckboxGroup,
    DimensionalGrid,
    SemanticCluster,
    FlatList,
}

/// One orthogonal axis of a dimensional naming pattern.
///
/// `order` is the token position the axis was found at and fixes display
/// and iteration order; `values` is a `BTreeSet` so iteration is stable
/// across runs regardless of field discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub values: BTreeSet<String>,
    pub order: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, order: usize) -> Self {
        Self { name: name.into(), values: BTreeSet::new(), order }
    }
}

/// A cluster of fields whose names share a base and vary along ≥2 axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionalPattern {
    pub base_name: String,
    /// Sorted by `Dimension::order`.
    pub dimensions: Vec<Dimension>,
}

impl DimensionalPattern {
    /// Product of each axis's distinct-value count: the size of the full
    /// combination space this pattern implies.
    pub fn total_expected_combinations(&self) -> usize {
        self.dimensions.iter().map(|d| d.values.len()).product()
    }
}

/// Derived analogue of a server category: a named axis with its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredCategory {
    pub name: String,
    pub options: Vec<String>,
}

/// Derived analogue of a server category combo.
///
/// `actual_combinations` counts the fields actually present; a ratio below
/// 1.0 is normal for conditional structures and never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredCategoryCombo {
    pub categories: Vec<InferredCategory>,
    pub total_expected_combinations: usize,
    pub actual_combinations: usize,
    pub is_conditional: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub conditional_rules: Vec<String>,
}

impl InferredCategoryCombo {
    /// Fraction of the theoretical combination space actually observed,
    /// always in `(0, 1]` for a combo built from at least one real field.
    pub fn completeness_ratio(&self) -> f64 {
        if self.total_expected_combinations == 0 {
            return 0.0;
        }
        self.actual_combinations as f64 / self.total_expected_combinations as f64
    }
}

/// Evidence backing a grouping decision.
///
/// Exactly one primary evidence kind is populated, consistent with the
/// owning strategy's [`ConfidenceLevel`]: server structure for `High`, a
/// pattern or exclusivity score for `Medium`, a similarity score for `Low`.
/// Built through the named constructors so the coupling holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupMetadata {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category_combo_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category_combo_structure: Option<Vec<InferredCategory>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dimensional_pattern: Option<InferredCategoryCombo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mutual_exclusivity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub semantic_similarity_score: Option<f64>,
    /// Numeric score used to rank ties among same-confidence strategies.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub numeric_confidence_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detection_method: Option<String>,
}

impl GroupMetadata {
    /// Evidence for a server-declared combo (confidence `High`).
    pub fn definitive(combo_uid: impl Into<String>, structure: Vec<InferredCategory>) -> Self {
        Self {
            category_combo_uid: Some(combo_uid.into()),
            category_combo_structure: Some(structure),
            detection_method: Some("explicit_category_combo".to_string()),
            ..Self::default()
        }
    }

    /// Evidence for a naming-pattern grid (confidence `Medium`).
    pub fn dimensional(combo: InferredCategoryCombo) -> Self {
        let score = combo.completeness_ratio();
        Self {
            dimensional_pattern: Some(combo),
            numeric_confidence_score: Some(score),
            detection_method: Some("dimensional_pattern".to_string()),
            ..Self::default()
        }
    }

    /// Evidence for a statistically exclusive cluster (confidence `Medium`).
    pub fn exclusivity(score: f64) -> Self {
        Self {
            mutual_exclusivity_score: Some(score),
            numeric_confidence_score: Some(score),
            detection_method: Some("mutual_exclusivity".to_string()),
            ..Self::default()
        }
    }

    /// Evidence for a similarity-based cluster (confidence `Low`).
    pub fn semantic(score: f64) -> Self {
        Self {
            semantic_similarity_score: Some(score),
            numeric_confidence_score: Some(score),
            detection_method: Some("semantic_similarity".to_string()),
            ..Self::default()
        }
    }

    /// No evidence at all: the flat-list fallback.
    pub fn flat() -> Self {
        Self { detection_method: Some("flat_fallback".to_string()), ..Self::default() }
    }
}

/// The engine's sole externally visible output unit: one rendering group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingStrategy {
    pub confidence: ConfidenceLevel,
    pub group_type: GroupType,
    pub group_title: String,
    pub members: Vec<Field>,
    pub metadata: GroupMetadata,
}

impl GroupingStrategy {
    /// True when the decision came straight from server metadata.
    pub fn is_definitive(&self) -> bool {
        self.confidence == ConfidenceLevel::High
            && self
                .metadata
                .category_combo_structure
                .as_ref()
                .map_or(false, |s| !s.is_empty())
    }

    /// True when the rendering layer should draw a visual group container.
    pub fn should_render_as_group(&self) -> bool {
        self.group_type != GroupType::FlatList && self.members.len() > 1
    }

    /// Checks the evidence-confidence coupling invariant.
    pub fn validate_evidence(&self) -> bool {
        match self.confidence {
            ConfidenceLevel::High => {
                self.metadata.category_combo_uid.is_some()
                    && self
                        .metadata
                        .category_combo_structure
                        .as_ref()
                        .map_or(false, |s| !s.is_empty())
            }
            ConfidenceLevel::Medium => {
                self.metadata.dimensional_pattern.is_some()
                    || self.metadata.mutual_exclusivity_score.is_some()
            }
            ConfidenceLevel::Low => {
                self.metadata.semantic_similarity_score.is_some()
                    || self.group_type == GroupType::FlatList
            }
        }
    }
}

/// An observability record attached to a scope result instead of being
/// raised: the engine never fails, it annotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingNote {
    pub message: String,
}

impl GroupingNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn metadata_unavailable(combo_id: &str, reason: &str) -> Self {
        Self::new(format!(
            "category combo '{}' unavailable ({}), falling back to inference",
            combo_id, reason
        ))
    }
}

/// The full grouping decision for one form section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeResult {
    pub section_name: String,
    pub strategies: Vec<GroupingStrategy>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<GroupingNote>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_total_order() {
        assert!(ConfidenceLevel::High > ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Medium > ConfidenceLevel::Low);
    }

    #[test]
    fn test_completeness_ratio_full() {
        let combo = InferredCategoryCombo {
            categories: vec![],
            total_expected_combinations: 4,
            actual_combinations: 4,
            is_conditional: false,
            conditional_rules: vec![],
        };
        assert_eq!(combo.completeness_ratio(), 1.0);
    }

    #[test]
    fn test_completeness_ratio_partial() {
        let combo = InferredCategoryCombo {
            categories: vec![],
            total_expected_combinations: 6,
            actual_combinations: 5,
            is_conditional: true,
            conditional_rules: vec!["If Disabled, Gender is omitted".to_string()],
        };
        let ratio = combo.completeness_ratio();
        assert!(ratio > 0.0 && ratio < 1.0);
    }

    #[test]
    fn test_definitive_metadata_passes_evidence_check() {
        let strategy = GroupingStrategy {
            confidence: ConfidenceLevel::High,
            group_type: GroupType::DimensionalGrid,
            group_title: "Vaccinations".to_string(),
            members: vec![],
            metadata: GroupMetadata::definitive(
                "combo1",
                vec![InferredCategory {
                    name: "Gender".to_string(),
                    options: vec!["Male".to_string(), "Female".to_string()],
                }],
            ),
        };
        assert!(strategy.validate_evidence());
        assert!(strategy.is_definitive());
    }

    #[test]
    fn test_high_without_structure_fails_evidence_check() {
        let strategy = GroupingStrategy {
            confidence: ConfidenceLevel::High,
            group_type: GroupType::RadioGroup,
            group_title: "Broken".to_string(),
            members: vec![],
            metadata: GroupMetadata::flat(),
        };
        assert!(!strategy.validate_evidence());
    }

    #[test]
    fn test_flat_list_does_not_render_as_group() {
        let strategy = GroupingStrategy {
            confidence: ConfidenceLevel::Low,
            group_type: GroupType::FlatList,
            group_title: "Comments".to_string(),
            members: vec![Field::new("f1", "Comments", "Notes", DataEntryType::LongText)],
            metadata: GroupMetadata::flat(),
        };
        assert!(!strategy.should_render_as_group());
        assert!(strategy.validate_evidence());
    }

    #[test]
    fn test_field_serde_roundtrip() {
        let field = Field::new("de1", "Pupils Fed - P1 - Male", "Feeding", DataEntryType::Integer)
            .with_explicit_combo("cc9");
        let json = serde_json::to_string(&field).unwrap();
        let parsed: Field = serde_json::from_str(&json).unwrap();
        assert_eq!(field, parsed);
    }

    #[test]
    fn test_dimension_values_iterate_sorted() {
        let mut dim = Dimension::new("Grade", 1);
        dim.values.insert("P2".to_string());
        dim.values.insert("P1".to_string());
        let collected: Vec<_> = dim.values.iter().cloned().collect();
        assert_eq!(collected, vec!["P1".to_string(), "P2".to_string()]);
    }
}
