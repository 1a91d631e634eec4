//! Field-level validation primitives.
//!
//! Entity definitions validate payloads up front and report every violation
//! at once, so a caller fixing a form sees the full list rather than one
//! failure per round trip. The aggregate converts into a single
//! `validation_error` envelope with per-field details.

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// A single schema violation on a named payload field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldViolation {
    /// Payload field the violation refers to.
    pub field: &'static str,
    /// Human-readable description of the violation.
    pub message: String,
}

impl FieldViolation {
    /// Build a violation for the named field.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Accumulated schema violations for one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldViolations(Vec<FieldViolation>);

impl FieldViolations {
    /// Empty accumulator.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a violation against a field.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    /// True when no violation was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded violations in insertion order.
    pub fn as_slice(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Return `Ok(())` when clean, otherwise the accumulated violations.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::FieldViolations;
    ///
    /// let mut violations = FieldViolations::new();
    /// assert!(violations.clone().into_result().is_ok());
    /// violations.push("name", "must not be blank");
    /// assert!(violations.into_result().is_err());
    /// ```
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<FieldViolations> for DomainError {
    fn from(violations: FieldViolations) -> Self {
        DomainError::validation("payload failed validation")
            .with_details(json!({ "violations": violations.0 }))
    }
}
