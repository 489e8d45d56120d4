//! JSON-schema validation of record files

pub mod registry;
pub mod validator;

pub use registry::SchemaRegistry;
pub use validator::{ValidateError, ValidationIssue, ValidationResult, Validator};
