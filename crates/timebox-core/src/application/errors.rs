//! Application layer errors
//!
//! Structured, field-level validation errors produced by the phase
//! validators. A non-empty set blocks submission before any request is made.

use std::fmt;

use serde::Serialize;

/// A single field validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field (e.g. `planning.fechaInicio`)
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.field, self.message)
    }
}

/// Collected validation errors for one sub-form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Record a failure when `condition` is false
    pub fn require(&mut self, condition: bool, field: &str, message: &str) {
        if !condition {
            self.add(field, message);
        }
    }

    /// Whether no errors were recorded
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// All recorded errors in insertion order
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether a given field failed
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Merge another set into this one
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// Convert into a `Result`, failing when any error was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display() {
        let err = FieldError::new("planning.nombre", "is required");
        assert!(err.to_string().contains("planning.nombre"));
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_require_records_only_failures() {
        let mut errors = ValidationErrors::new();
        errors.require(true, "a", "never");
        errors.require(false, "b", "missing");

        assert_eq!(errors.len(), 1);
        assert!(errors.has_field("b"));
        assert!(!errors.has_field("a"));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add("qa.estadoConsolidacion", "is required");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.errors()[0].field, "qa.estadoConsolidacion");
    }
}
