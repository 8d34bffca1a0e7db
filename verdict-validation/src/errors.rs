// Validation errors

use crate::ValidationResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A single failed rule for one concrete field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Concrete field path, e.g. `address.0.city`
    pub field: String,

    /// Rendered message
    pub message: String,

    /// Rule that failed
    pub constraint: String,

    /// Offending scalar value, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            constraint: "custom".to_string(),
            value: None,
        }
    }

    /// Set the constraint name
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = constraint.into();
        self
    }

    /// Set the invalid value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Ordered collection of validation errors (the "message bag").
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of failures across all fields
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a plain message for `field`, as after-hooks do.
    pub fn add_message(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.add(ValidationError::new(field, message).with_constraint("after"));
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Messages for `field`, in the order they were reported
    pub fn get(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Get errors for a specific field
    pub fn get_field_errors(&self, field: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }

    /// Fields with at least one error, in first-reported order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for error in &self.errors {
            if !keys.contains(&error.field.as_str()) {
                keys.push(&error.field);
            }
        }
        keys
    }

    /// Field path to its ordered messages
    pub fn messages(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
        map
    }

    /// `{"field": ["message", ...]}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.messages())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::new(errors)
    }
}

/// A rule set that cannot be compiled. Always a programming error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleSpecError {
    #[error("Unknown validation rule `{rule}` for field `{field}`")]
    UnknownRule { field: String, rule: String },

    #[error("Invalid parameters for rule `{rule}` on field `{field}`: {reason}")]
    InvalidParameters {
        field: String,
        rule: String,
        reason: String,
    },

    #[error("Invalid field pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Raised by [`Validator::validate`](crate::Validator::validate) when the
/// data does not pass. Carries the full result.
#[derive(Debug, Clone, Error)]
#[error("The given data was invalid ({} failure(s))", .result.errors().len())]
pub struct ValidationFailed {
    result: ValidationResult,
}

impl ValidationFailed {
    pub fn new(result: ValidationResult) -> Self {
        Self { result }
    }

    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn errors(&self) -> &ValidationErrors {
        self.result.errors()
    }

    pub fn into_result(self) -> ValidationResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag() -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        errors.add(ValidationError::new("username", "The username field must be a valid email address.").with_constraint("email"));
        errors.add(ValidationError::new("password", "The password field must be at least 6 characters.").with_constraint("min"));
        errors.add_message("password", "Password must differ from username");
        errors
    }

    #[test]
    fn test_bag_queries() {
        let errors = bag();

        assert_eq!(errors.len(), 3);
        assert!(errors.has("password"));
        assert!(!errors.has("email"));
        assert_eq!(errors.keys(), vec!["username", "password"]);
        assert_eq!(errors.get("password").len(), 2);
        assert_eq!(
            errors.first("password"),
            Some("The password field must be at least 6 characters.")
        );
        assert_eq!(errors.get_field_errors("password")[1].constraint, "after");
    }

    #[test]
    fn test_to_json_groups_by_field() {
        let json = bag().to_json();
        assert_eq!(json["password"].as_array().unwrap().len(), 2);
        assert_eq!(
            json["username"][0],
            "The username field must be a valid email address."
        );
    }

    #[test]
    fn test_serialize_is_flat_list() {
        let json = serde_json::to_value(bag()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[0]["constraint"], "email");
        assert!(json[0].get("value").is_none());
    }

    #[test]
    fn test_rule_spec_error_display() {
        let err = RuleSpecError::UnknownRule {
            field: "username".into(),
            rule: "uppercase".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown validation rule `uppercase` for field `username`"
        );
    }
}
