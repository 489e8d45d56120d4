//! Recursive field-change tracking between record versions
//!
//! Walks two [`Record`]s and emits one [`FieldChange`] per differing
//! scalar field. Nested collections recurse to arbitrary depth; the
//! dot-notation path encodes where in the tree a change happened
//! (e.g. `team.3.status`).

use serde::{Deserialize, Serialize};

use crate::diff::value::{CollectionRow, Field, FieldValue, Record};

/// Classification of a single field change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Added => write!(f, "added"),
            ChangeType::Modified => write!(f, "modified"),
            ChangeType::Removed => write!(f, "removed"),
        }
    }
}

/// One recorded field change with before/after values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    /// Dot-notation path (`description`, `lines.2.quantity`)
    pub path: String,

    /// Human label chain (`Change Required > Quantity`)
    pub label: String,

    /// Field kind tag (text, boolean, reference, ...)
    pub kind: String,

    pub change_type: ChangeType,

    #[serde(default)]
    pub old_value: String,

    #[serde(default)]
    pub old_display: String,

    #[serde(default)]
    pub new_value: String,

    #[serde(default)]
    pub new_display: String,
}

impl FieldChange {
    /// Nesting depth: number of dots in the path
    pub fn nesting_level(&self) -> usize {
        self.path.matches('.').count()
    }

    /// Auto-generated description of this change
    pub fn describe(&self) -> String {
        match self.change_type {
            ChangeType::Added => {
                format!("Added new field: {} = {}", self.label, self.new_display)
            }
            ChangeType::Removed => {
                format!("Removed field: {} (was: {})", self.label, self.old_display)
            }
            ChangeType::Modified => format!(
                "Modified {}: '{}' -> '{}'",
                self.label, self.old_display, self.new_display
            ),
        }
    }
}

/// Diff two record versions into a flat list of field changes.
///
/// Comparing a record against itself yields an empty list.
pub fn diff_records(old: &Record, new: &Record) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    diff_into(old, new, "", "", &mut changes);
    changes
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn join_label(prefix: &str, label: &str) -> String {
    if prefix.is_empty() {
        label.to_string()
    } else {
        format!("{} > {}", prefix, label)
    }
}

fn diff_into(
    old: &Record,
    new: &Record,
    path_prefix: &str,
    label_prefix: &str,
    out: &mut Vec<FieldChange>,
) {
    // Fields present in the old version
    for old_field in &old.fields {
        match new.get(&old_field.name) {
            Some(new_field) => diff_field(old_field, new_field, path_prefix, label_prefix, out),
            None => emit_side(old_field, ChangeType::Removed, path_prefix, label_prefix, out),
        }
    }

    // Fields only in the new version
    for new_field in &new.fields {
        if old.get(&new_field.name).is_none() {
            emit_side(new_field, ChangeType::Added, path_prefix, label_prefix, out);
        }
    }
}

fn diff_field(
    old_field: &Field,
    new_field: &Field,
    path_prefix: &str,
    label_prefix: &str,
    out: &mut Vec<FieldChange>,
) {
    let path = join_path(path_prefix, &old_field.name);
    let label = join_label(label_prefix, &old_field.label);

    match (&old_field.value, &new_field.value) {
        (
            FieldValue::Collection { rows: old_rows },
            FieldValue::Collection { rows: new_rows },
        ) => {
            diff_collections(old_rows, new_rows, &path, &label, out);
        }
        (old_value, new_value) => {
            if old_value != new_value {
                out.push(FieldChange {
                    path,
                    label,
                    kind: new_value.kind().to_string(),
                    change_type: ChangeType::Modified,
                    old_value: old_value.storage(),
                    old_display: old_value.display(),
                    new_value: new_value.storage(),
                    new_display: new_value.display(),
                });
            }
        }
    }
}

fn diff_collections(
    old_rows: &[CollectionRow],
    new_rows: &[CollectionRow],
    path: &str,
    label: &str,
    out: &mut Vec<FieldChange>,
) {
    // Removed rows: every populated field reported
    for old_row in old_rows {
        if !new_rows.iter().any(|r| r.row_id == old_row.row_id) {
            let row_path = format!("{}.{}", path, old_row.row_id);
            for field in &old_row.record.fields {
                emit_side(field, ChangeType::Removed, &row_path, label, out);
            }
        }
    }

    for new_row in new_rows {
        let row_path = format!("{}.{}", path, new_row.row_id);
        match old_rows.iter().find(|r| r.row_id == new_row.row_id) {
            // Rows in both versions: recurse
            Some(old_row) => {
                diff_into(&old_row.record, &new_row.record, &row_path, label, out);
            }
            // New rows: every populated field reported
            None => {
                for field in &new_row.record.fields {
                    emit_side(field, ChangeType::Added, &row_path, label, out);
                }
            }
        }
    }
}

/// Emit a change for a field that exists on only one side
fn emit_side(
    field: &Field,
    change_type: ChangeType,
    path_prefix: &str,
    label_prefix: &str,
    out: &mut Vec<FieldChange>,
) {
    let path = join_path(path_prefix, &field.name);
    let label = join_label(label_prefix, &field.label);

    // One-sided collections recurse against an empty row set
    if let FieldValue::Collection { rows } = &field.value {
        match change_type {
            ChangeType::Added => diff_collections(&[], rows, &path, &label, out),
            _ => diff_collections(rows, &[], &path, &label, out),
        }
        return;
    }

    let (old_value, old_display, new_value, new_display) = match change_type {
        ChangeType::Added => (
            String::new(),
            String::new(),
            field.value.storage(),
            field.value.display(),
        ),
        _ => (
            field.value.storage(),
            field.value.display(),
            String::new(),
            String::new(),
        ),
    };

    out.push(FieldChange {
        path,
        label,
        kind: field.value.kind().to_string(),
        change_type,
        old_value,
        old_display,
        new_value,
        new_display,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::value::CollectionRow;

    fn row(row_id: u64, record: Record) -> CollectionRow {
        CollectionRow { row_id, record }
    }

    #[test]
    fn test_identical_records_yield_no_changes() {
        let record = Record::new()
            .with("name", "Name", FieldValue::text("Bracket"))
            .with("qty", "Quantity", FieldValue::Number { value: 4.0 })
            .with(
                "lines",
                "Lines",
                FieldValue::Collection {
                    rows: vec![row(
                        1,
                        Record::new().with("status", "Status", FieldValue::text("open")),
                    )],
                },
            );

        assert!(diff_records(&record, &record).is_empty());
    }

    #[test]
    fn test_scalar_modification() {
        let old = Record::new().with("name", "Name", FieldValue::text("Bracket"));
        let new = Record::new().with("name", "Name", FieldValue::text("Bracket Mk2"));

        let changes = diff_records(&old, &new);
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.path, "name");
        assert_eq!(change.change_type, ChangeType::Modified);
        assert_eq!(change.old_display, "Bracket");
        assert_eq!(change.new_display, "Bracket Mk2");
        assert_eq!(change.nesting_level(), 0);
    }

    #[test]
    fn test_added_and_removed_fields() {
        let old = Record::new().with("obsolete_note", "Obsolete Note", FieldValue::text("x"));
        let new = Record::new().with("surface", "Surface", FieldValue::text("Anodized"));

        let changes = diff_records(&old, &new);
        assert_eq!(changes.len(), 2);
        assert!(changes
            .iter()
            .any(|c| c.path == "obsolete_note" && c.change_type == ChangeType::Removed));
        assert!(changes
            .iter()
            .any(|c| c.path == "surface" && c.change_type == ChangeType::Added));
    }

    #[test]
    fn test_boolean_and_reference_display() {
        let old = Record::new()
            .with("active", "Active", FieldValue::Boolean { value: true })
            .with(
                "owner",
                "Owner",
                FieldValue::reference("USR-1", "Jane Smith"),
            );
        let new = Record::new()
            .with("active", "Active", FieldValue::Boolean { value: false })
            .with(
                "owner",
                "Owner",
                FieldValue::reference("USR-2", "Bob Wilson"),
            );

        let changes = diff_records(&old, &new);
        let active = changes.iter().find(|c| c.path == "active").unwrap();
        assert_eq!(active.old_display, "Yes");
        assert_eq!(active.new_display, "No");

        let owner = changes.iter().find(|c| c.path == "owner").unwrap();
        assert_eq!(owner.old_value, "USR-1");
        assert_eq!(owner.old_display, "Jane Smith");
        assert_eq!(owner.new_display, "Bob Wilson");
    }

    #[test]
    fn test_collection_row_update_recurses_with_path() {
        let old = Record::new().with(
            "lines",
            "Change Required",
            FieldValue::Collection {
                rows: vec![row(
                    3,
                    Record::new().with("qty", "Quantity", FieldValue::Number { value: 2.0 }),
                )],
            },
        );
        let new = Record::new().with(
            "lines",
            "Change Required",
            FieldValue::Collection {
                rows: vec![row(
                    3,
                    Record::new().with("qty", "Quantity", FieldValue::Number { value: 5.0 }),
                )],
            },
        );

        let changes = diff_records(&old, &new);
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.path, "lines.3.qty");
        assert_eq!(change.label, "Change Required > Quantity");
        assert_eq!(change.nesting_level(), 2);
    }

    #[test]
    fn test_collection_row_added_and_removed() {
        let old = Record::new().with(
            "lines",
            "Lines",
            FieldValue::Collection {
                rows: vec![row(
                    1,
                    Record::new().with("name", "Name", FieldValue::text("old line")),
                )],
            },
        );
        let new = Record::new().with(
            "lines",
            "Lines",
            FieldValue::Collection {
                rows: vec![row(
                    2,
                    Record::new().with("name", "Name", FieldValue::text("new line")),
                )],
            },
        );

        let changes = diff_records(&old, &new);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().any(|c| c.path == "lines.1.name"
            && c.change_type == ChangeType::Removed
            && c.old_display == "old line"));
        assert!(changes.iter().any(|c| c.path == "lines.2.name"
            && c.change_type == ChangeType::Added
            && c.new_display == "new line"));
    }

    #[test]
    fn test_deeply_nested_collections() {
        let leaf =
            |status: &str| Record::new().with("status", "Status", FieldValue::text(status));
        let mid = |status: &str| {
            Record::new().with(
                "tasks",
                "Tasks",
                FieldValue::Collection {
                    rows: vec![row(7, leaf(status))],
                },
            )
        };
        let old = Record::new().with(
            "lines",
            "Lines",
            FieldValue::Collection {
                rows: vec![row(1, mid("open"))],
            },
        );
        let new = Record::new().with(
            "lines",
            "Lines",
            FieldValue::Collection {
                rows: vec![row(1, mid("closed"))],
            },
        );

        let changes = diff_records(&old, &new);
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.path, "lines.1.tasks.7.status");
        assert_eq!(change.label, "Lines > Tasks > Status");
        assert_eq!(change.nesting_level(), 4);
    }

    #[test]
    fn test_describe() {
        let old = Record::new().with("finish", "Finish", FieldValue::text("Raw"));
        let new = Record::new().with("finish", "Finish", FieldValue::text("Plated"));
        let changes = diff_records(&old, &new);
        assert_eq!(changes[0].describe(), "Modified Finish: 'Raw' -> 'Plated'");
    }
}
