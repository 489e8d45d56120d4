//! Schema validation with per-field error reporting

use jsonschema::{validator_for, Validator as JsonValidator};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::EntityPrefix;
use crate::schema::registry::SchemaRegistry;

/// A single validation issue within a record file
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// JSON-pointer style path of the offending value
    pub path: String,
    pub message: String,
}

/// Result of validating one record
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }
}

/// Errors preparing a record for validation
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("cannot determine record type for {0}")]
    UnknownRecordType(String),

    #[error("no schema registered for record type {0}")]
    NoSchema(EntityPrefix),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Schema validator with compiled schemas
pub struct Validator {
    compiled: HashMap<EntityPrefix, JsonValidator>,
}

impl Validator {
    /// Create a new validator with schemas from the registry
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();

        for prefix in EntityPrefix::all() {
            if let Some(schema_str) = registry.get(*prefix) {
                if let Ok(schema_json) = serde_json::from_str::<JsonValue>(schema_str) {
                    if let Ok(compiled_schema) = validator_for(&schema_json) {
                        compiled.insert(*prefix, compiled_schema);
                    }
                }
            }
        }

        Self { compiled }
    }

    /// Validate an in-memory record value against its type's schema
    pub fn validate_value(
        &self,
        prefix: EntityPrefix,
        value: &JsonValue,
    ) -> Result<ValidationResult, ValidateError> {
        let validator = self
            .compiled
            .get(&prefix)
            .ok_or(ValidateError::NoSchema(prefix))?;

        let issues: Vec<ValidationIssue> = validator
            .iter_errors(value)
            .map(|error| ValidationIssue {
                path: error.instance_path.to_string(),
                message: error.to_string(),
            })
            .collect();

        Ok(ValidationResult {
            valid: issues.is_empty(),
            issues,
        })
    }

    /// Validate a record file, determining its type from the filename
    /// or its parent directory
    pub fn validate_file(&self, path: &Path) -> Result<ValidationResult, ValidateError> {
        let prefix = EntityPrefix::from_path(path)
            .ok_or_else(|| ValidateError::UnknownRecordType(path.display().to_string()))?;

        let contents = std::fs::read_to_string(path).map_err(|e| ValidateError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let yaml: serde_yml::Value =
            serde_yml::from_str(&contents).map_err(|e| ValidateError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let json = serde_json::to_value(&yaml).map_err(|e| ValidateError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        self.validate_value(prefix, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ApprovalDefaults;
    use crate::entities::document::Document;

    fn validator() -> Validator {
        Validator::new(&SchemaRegistry::new())
    }

    #[test]
    fn test_valid_document_passes() {
        let doc = Document::new(
            "DC-0001".to_string(),
            "Bracket Drawing".to_string(),
            None,
            None,
            &ApprovalDefaults::default(),
            "test".to_string(),
        );
        let value = serde_json::to_value(&doc).unwrap();
        let result = validator()
            .validate_value(EntityPrefix::Doc, &value)
            .unwrap();
        assert!(result.valid, "issues: {:?}", result.issues);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let value = serde_json::json!({ "title": "No id or author" });
        let result = validator()
            .validate_value(EntityPrefix::Doc, &value)
            .unwrap();
        assert!(!result.valid);
        assert!(!result.issues.is_empty());
    }

    #[test]
    fn test_invalid_state_fails() {
        let doc = Document::new(
            "DC-0001".to_string(),
            "Bracket Drawing".to_string(),
            None,
            None,
            &ApprovalDefaults::default(),
            "test".to_string(),
        );
        let mut value = serde_json::to_value(&doc).unwrap();
        value["state"] = serde_json::json!("limbo");
        let result = validator()
            .validate_value(EntityPrefix::Doc, &value)
            .unwrap();
        assert!(!result.valid);
    }
}
