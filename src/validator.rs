//! Field value validators
//!
//! A closed enum of validator kinds with plain-data parameters. Keeping
//! the kinds enumerable (rather than storing closures) means a form
//! definition with its validators serializes cleanly and two definitions
//! can be compared for equality.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One validation rule attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValidator {
    /// Value must be present and non-blank.
    Required,
    /// Value must match the stored regular expression.
    Pattern { pattern: String },
    /// Numeric value must be at least `min`.
    MinValue { min: f64 },
    /// Numeric value must be at most `max`.
    MaxValue { max: f64 },
    /// Value length must not exceed `max` characters.
    MaxLength { max: usize },
    /// Value must parse as a whole number.
    IntegerOnly,
    /// Value must parse as a number greater than zero.
    PositiveOnly,
}

/// Outcome of applying one validator to one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Invalid { message: String },
}

impl ValidationOutcome {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl FieldValidator {
    /// Apply this validator to an optional raw value.
    ///
    /// Absent values pass every rule except `Required`: presence is its
    /// own rule and the others only constrain what was entered.
    pub fn validate(&self, value: Option<&str>) -> ValidationOutcome {
        let Some(value) = value else {
            return match self {
                FieldValidator::Required => ValidationOutcome::invalid("value is required"),
                _ => ValidationOutcome::Valid,
            };
        };

        match self {
            FieldValidator::Required => {
                if value.trim().is_empty() {
                    ValidationOutcome::invalid("value is required")
                } else {
                    ValidationOutcome::Valid
                }
            }
            FieldValidator::Pattern { pattern } => match Regex::new(pattern) {
                Ok(re) if re.is_match(value) => ValidationOutcome::Valid,
                Ok(_) => {
                    ValidationOutcome::invalid(format!("value does not match '{}'", pattern))
                }
                Err(e) => ValidationOutcome::invalid(format!("invalid pattern: {}", e)),
            },
            FieldValidator::MinValue { min } => match value.parse::<f64>() {
                Ok(n) if n >= *min => ValidationOutcome::Valid,
                Ok(n) => ValidationOutcome::invalid(format!("{} is below minimum {}", n, min)),
                Err(_) => ValidationOutcome::invalid("value is not a number"),
            },
            FieldValidator::MaxValue { max } => match value.parse::<f64>() {
                Ok(n) if n <= *max => ValidationOutcome::Valid,
                Ok(n) => ValidationOutcome::invalid(format!("{} is above maximum {}", n, max)),
                Err(_) => ValidationOutcome::invalid("value is not a number"),
            },
            FieldValidator::MaxLength { max } => {
                if value.chars().count() <= *max {
                    ValidationOutcome::Valid
                } else {
                    ValidationOutcome::invalid(format!("value exceeds {} characters", max))
                }
            }
            FieldValidator::IntegerOnly => {
                if value.parse::<i64>().is_ok() {
                    ValidationOutcome::Valid
                } else {
                    ValidationOutcome::invalid("value is not a whole number")
                }
            }
            FieldValidator::PositiveOnly => match value.parse::<f64>() {
                Ok(n) if n > 0.0 => ValidationOutcome::Valid,
                Ok(_) => ValidationOutcome::invalid("value must be positive"),
                Err(_) => ValidationOutcome::invalid("value is not a number"),
            },
        }
    }
}
