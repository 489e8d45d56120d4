//! Record loading utilities
//!
//! Generic helpers for reading and writing record files, reducing
//! boilerplate in command implementations.

use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::entity::Entity;
use crate::core::identity::EntityPrefix;
use crate::core::project::Project;

/// Load all records of type T of the given prefix from a project
pub fn load_all<T: Entity + 'static>(project: &Project, prefix: EntityPrefix) -> Vec<T> {
    let mut records = Vec::new();

    for path in project.iter_entity_files(prefix) {
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(record) = serde_yml::from_str::<T>(&content) {
                records.push(record);
            }
        }
    }

    records
}

/// Load one record from a specific file with source diagnostics
pub fn load_file<T: DeserializeOwned + 'static>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).into_diagnostic()?;
    serde_yml::from_str(&content).map_err(|e| {
        crate::yaml::YamlSyntaxError::from_serde_error(
            &e,
            &content,
            &path.display().to_string(),
        )
        .into()
    })
}

/// Write a record to its canonical path under the project
pub fn save_entity<T: Entity>(project: &Project, prefix: EntityPrefix, record: &T) -> Result<PathBuf> {
    let path = project.entity_path(prefix, record.id());
    let contents = serde_yml::to_string(record).into_diagnostic()?;
    fs::write(&path, contents).into_diagnostic()?;
    Ok(path)
}

/// Resolve a user-supplied reference against loaded records.
///
/// Accepts a full record id, an id prefix (first characters of the
/// ULID form), or the human-readable display number handled by the
/// caller-provided matcher.
pub fn resolve_record<'a, T: Entity>(
    records: &'a [T],
    reference: &str,
    display_matches: impl Fn(&T, &str) -> bool,
) -> Option<&'a T> {
    // Exact id match first
    if let Some(record) = records
        .iter()
        .find(|r| r.id().to_string().eq_ignore_ascii_case(reference))
    {
        return Some(record);
    }

    // Display number match (DC-0001, ECN-0007, ...)
    if let Some(record) = records.iter().find(|r| display_matches(r, reference)) {
        return Some(record);
    }

    // Unique id-prefix match
    let upper = reference.to_uppercase();
    let mut matches = records
        .iter()
        .filter(|r| r.id().to_string().starts_with(&upper));
    let first = matches.next()?;
    if matches.next().is_some() {
        return None; // ambiguous
    }
    Some(first)
}
