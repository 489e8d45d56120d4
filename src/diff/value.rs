//! Tagged field values for change tracking
//!
//! The original system resolved display values through runtime field
//! introspection. Here every tracked value carries its own variant, and
//! each variant has an explicit formatter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A tracked field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldValue {
    Text {
        value: String,
    },
    Integer {
        value: i64,
    },
    Number {
        value: f64,
    },
    Boolean {
        value: bool,
    },
    Date {
        value: NaiveDate,
    },
    DateTime {
        value: DateTime<Utc>,
    },
    /// Link to another record: raw id plus its display name
    Reference {
        id: String,
        display: String,
    },
    /// Enumerated value: stored key plus its human label
    Selection {
        key: String,
        label: String,
    },
    /// Nested one-to-many rows, keyed by a stable row id
    Collection {
        rows: Vec<CollectionRow>,
    },
}

/// One row of a nested collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRow {
    /// Stable row identity used to match rows between versions
    pub row_id: u64,
    pub record: Record,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text {
            value: value.into(),
        }
    }

    pub fn reference(id: impl Into<String>, display: impl Into<String>) -> Self {
        FieldValue::Reference {
            id: id.into(),
            display: display.into(),
        }
    }

    pub fn selection(key: impl Into<String>, label: impl Into<String>) -> Self {
        FieldValue::Selection {
            key: key.into(),
            label: label.into(),
        }
    }

    /// The field kind tag used in change records
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text { .. } => "text",
            FieldValue::Integer { .. } => "integer",
            FieldValue::Number { .. } => "number",
            FieldValue::Boolean { .. } => "boolean",
            FieldValue::Date { .. } => "date",
            FieldValue::DateTime { .. } => "datetime",
            FieldValue::Reference { .. } => "reference",
            FieldValue::Selection { .. } => "selection",
            FieldValue::Collection { .. } => "collection",
        }
    }

    /// Human-readable rendering: booleans as Yes/No, dates formatted,
    /// references by display name, selections by label
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text { value } => value.clone(),
            FieldValue::Integer { value } => value.to_string(),
            FieldValue::Number { value } => value.to_string(),
            FieldValue::Boolean { value } => {
                if *value { "Yes".to_string() } else { "No".to_string() }
            }
            FieldValue::Date { value } => value.format("%Y-%m-%d").to_string(),
            FieldValue::DateTime { value } => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            FieldValue::Reference { display, .. } => display.clone(),
            FieldValue::Selection { label, .. } => label.clone(),
            FieldValue::Collection { rows } => format!("{} records", rows.len()),
        }
    }

    /// Canonical storage rendering: references by id, selections by key
    pub fn storage(&self) -> String {
        match self {
            FieldValue::Reference { id, .. } => id.clone(),
            FieldValue::Selection { key, .. } => key.clone(),
            FieldValue::Boolean { value } => value.to_string(),
            other => other.display(),
        }
    }
}

/// One named field within a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Machine name, used in dot-notation paths
    pub name: String,
    /// Display label, chained with " > " for nested changes
    pub label: String,
    pub value: FieldValue,
}

/// An ordered set of named fields, the unit the tracker diffs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field (builder style)
    pub fn with(mut self, name: &str, label: &str, value: FieldValue) -> Self {
        self.push(name, label, value);
        self
    }

    pub fn push(&mut self, name: &str, label: &str, value: FieldValue) {
        self.fields.push(Field {
            name: name.to_string(),
            label: label.to_string(),
            value,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_display() {
        assert_eq!(FieldValue::Boolean { value: true }.display(), "Yes");
        assert_eq!(FieldValue::Boolean { value: false }.display(), "No");
    }

    #[test]
    fn test_date_display() {
        let value = FieldValue::Date {
            value: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        };
        assert_eq!(value.display(), "2024-03-09");
    }

    #[test]
    fn test_reference_display_vs_storage() {
        let value = FieldValue::reference("PART-01ABC", "Mounting Bracket");
        assert_eq!(value.display(), "Mounting Bracket");
        assert_eq!(value.storage(), "PART-01ABC");
    }

    #[test]
    fn test_selection_display_vs_storage() {
        let value = FieldValue::selection("in_progress", "In Progress");
        assert_eq!(value.display(), "In Progress");
        assert_eq!(value.storage(), "in_progress");
    }

    #[test]
    fn test_collection_display_counts_rows() {
        let value = FieldValue::Collection {
            rows: vec![
                CollectionRow {
                    row_id: 1,
                    record: Record::new(),
                },
                CollectionRow {
                    row_id: 2,
                    record: Record::new(),
                },
            ],
        };
        assert_eq!(value.display(), "2 records");
        assert_eq!(value.kind(), "collection");
    }

    #[test]
    fn test_record_builder() {
        let record = Record::new()
            .with("qty", "Quantity", FieldValue::Number { value: 4.0 })
            .with("unit", "Unit", FieldValue::text("pcs"));
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.get("qty").unwrap().label, "Quantity");
        assert!(record.get("missing").is_none());
    }
}
