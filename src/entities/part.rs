//! Part record type - products with BOM, attachments, and technical data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// One bill-of-materials line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
    /// Component part
    pub component: EntityId,

    /// Quantity per assembly
    pub quantity: f64,

    /// Unit of measure
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "pcs".to_string()
}

/// A drawing or specification file attached to the part's document set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,

    /// Size in bytes
    pub size: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// SHA-256 of the file contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl Attachment {
    /// Record an attachment from a file on disk, hashing its contents
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let digest = hasher.finalize();

        Ok(Self {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            size: contents.len() as u64,
            media_type: None,
            sha256: Some(format!("{:x}", digest)),
        })
    }
}

/// The fixed technical attribute set compared between part versions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalAttributes {
    pub raw_material: Option<String>,
    pub surface_finish: Option<String>,
    pub thermal_treatment: Option<String>,
    pub cad_raw_material: Option<String>,
    pub cad_surface_finish: Option<String>,
    pub cad_thermal_treatment: Option<String>,
}

impl TechnicalAttributes {
    /// Field keys and their display labels, in comparison order
    pub const FIELDS: [(&'static str, &'static str); 6] = [
        ("raw_material", "Raw Material"),
        ("surface_finish", "Surface Finishing"),
        ("thermal_treatment", "Thermal Treatment"),
        ("cad_raw_material", "CAD Raw Material"),
        ("cad_surface_finish", "CAD Surface Finishing"),
        ("cad_thermal_treatment", "CAD Thermal Treatment"),
    ];

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "raw_material" => self.raw_material.as_deref(),
            "surface_finish" => self.surface_finish.as_deref(),
            "thermal_treatment" => self.thermal_treatment.as_deref(),
            "cad_raw_material" => self.cad_raw_material.as_deref(),
            "cad_surface_finish" => self.cad_surface_finish.as_deref(),
            "cad_thermal_treatment" => self.cad_thermal_treatment.as_deref(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: Option<String>) -> Result<(), PartFieldError> {
        let slot = match key {
            "raw_material" => &mut self.raw_material,
            "surface_finish" => &mut self.surface_finish,
            "thermal_treatment" => &mut self.thermal_treatment,
            "cad_raw_material" => &mut self.cad_raw_material,
            "cad_surface_finish" => &mut self.cad_surface_finish,
            "cad_thermal_treatment" => &mut self.cad_thermal_treatment,
            _ => return Err(PartFieldError::UnknownField(key.to_string())),
        };
        *slot = value;
        Ok(())
    }
}

/// Part lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartState {
    #[default]
    Active,
    Obsolete,
}

/// Errors applying field overrides to a part
#[derive(Debug, Error)]
pub enum PartFieldError {
    #[error("unknown part field: '{0}'")]
    UnknownField(String),

    #[error("field '{0}' expects a string value")]
    NotAString(String),
}

/// A part: product identity, BOM, attachments, technical attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Unique identifier
    pub id: EntityId,

    /// Part number
    pub part_number: String,

    /// Part name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,

    /// Bill of materials
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bom: Vec<BomLine>,

    /// Attached drawing/specification files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    /// Technical attribute fields
    #[serde(default)]
    pub technical: TechnicalAttributes,

    #[serde(default)]
    pub state: PartState,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Part {
    /// Create a new active part
    pub fn new(part_number: String, name: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Part),
            part_number,
            name,
            description: None,
            customer: None,
            bom: Vec::new(),
            attachments: Vec::new(),
            technical: TechnicalAttributes::default(),
            state: PartState::Active,
            created: Utc::now(),
            author,
        }
    }

    /// Find a BOM line by component id
    pub fn bom_line(&self, component: &EntityId) -> Option<&BomLine> {
        self.bom.iter().find(|l| &l.component == component)
    }

    /// Field keys a draft-change payload may override
    pub fn overridable_fields() -> Vec<&'static str> {
        let mut fields = vec!["name", "description"];
        fields.extend(TechnicalAttributes::FIELDS.iter().map(|(k, _)| *k));
        fields
    }

    /// Read the current value of an overridable field
    pub fn field_value(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "description" => self.description.clone(),
            _ => self.technical.get(key).map(|s| s.to_string()),
        }
    }

    /// Snapshot the named fields for later rollback
    pub fn capture_fields(&self, keys: &[String]) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for key in keys {
            let value = self
                .field_value(key)
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null);
            map.insert(key.clone(), value);
        }
        serde_json::Value::Object(map)
    }

    /// Snapshot this part as a diffable record for change tracking.
    /// BOM rows are keyed by component identity so reordering lines
    /// does not read as a change.
    pub fn to_record(&self) -> crate::diff::value::Record {
        use crate::diff::value::{CollectionRow, FieldValue, Record};

        let mut record = Record::new()
            .with(
                "part_number",
                "Part Number",
                FieldValue::text(self.part_number.as_str()),
            )
            .with("name", "Part Name", FieldValue::text(self.name.as_str()));

        if let Some(ref description) = self.description {
            record.push(
                "description",
                "Description",
                FieldValue::text(description.as_str()),
            );
        }
        if let Some(ref customer) = self.customer {
            record.push("customer", "Customer", FieldValue::text(customer.as_str()));
        }
        for (key, label) in TechnicalAttributes::FIELDS {
            if let Some(value) = self.technical.get(key) {
                record.push(key, label, FieldValue::text(value));
            }
        }

        let rows = self
            .bom
            .iter()
            .map(|line| {
                let ulid = line.component.ulid().0;
                CollectionRow {
                    row_id: (ulid >> 64) as u64 ^ ulid as u64,
                    record: Record::new()
                        .with(
                            "component",
                            "Component",
                            FieldValue::reference(
                                line.component.to_string(),
                                line.component.to_string(),
                            ),
                        )
                        .with(
                            "quantity",
                            "Quantity",
                            FieldValue::Number {
                                value: line.quantity,
                            },
                        )
                        .with("unit", "Unit", FieldValue::text(line.unit.as_str())),
                }
            })
            .collect();
        record.push("bom", "Bill of Materials", FieldValue::Collection { rows });

        record
    }

    /// Apply a draft-change payload: an object mapping overridable field
    /// names to new string values (null clears an optional field)
    pub fn apply_field_overrides(
        &mut self,
        payload: &serde_json::Value,
    ) -> Result<(), PartFieldError> {
        let Some(map) = payload.as_object() else {
            return Ok(());
        };

        for (key, value) in map {
            let text = match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                _ => return Err(PartFieldError::NotAString(key.clone())),
            };

            match key.as_str() {
                "name" => {
                    self.name = text.ok_or_else(|| PartFieldError::NotAString(key.clone()))?;
                }
                "description" => self.description = text,
                other => self.technical.set(other, text)?,
            }
        }
        Ok(())
    }
}

impl Entity for Part {
    const PREFIX: &'static str = "PART";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &str {
        match self.state {
            PartState::Active => "active",
            PartState::Obsolete => "obsolete",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_part() -> Part {
        Part::new(
            "PN-1001".to_string(),
            "Mounting Bracket".to_string(),
            "test".to_string(),
        )
    }

    #[test]
    fn test_part_creation() {
        let part = test_part();
        assert!(part.id.to_string().starts_with("PART-"));
        assert_eq!(part.state, PartState::Active);
        assert!(part.bom.is_empty());
    }

    #[test]
    fn test_technical_attribute_access() {
        let mut part = test_part();
        part.technical
            .set("raw_material", Some("AISI 304".to_string()))
            .unwrap();
        assert_eq!(part.technical.get("raw_material"), Some("AISI 304"));
        assert!(part.technical.get("surface_finish").is_none());
        assert!(part.technical.set("density", None).is_err());
    }

    #[test]
    fn test_capture_and_apply_overrides() {
        let mut part = test_part();
        part.technical.surface_finish = Some("Anodized".to_string());

        let keys = vec!["name".to_string(), "surface_finish".to_string()];
        let snapshot = part.capture_fields(&keys);

        let payload = serde_json::json!({
            "name": "Mounting Bracket Mk2",
            "surface_finish": "Powder coated",
        });
        part.apply_field_overrides(&payload).unwrap();
        assert_eq!(part.name, "Mounting Bracket Mk2");
        assert_eq!(part.technical.surface_finish.as_deref(), Some("Powder coated"));

        // Rolling back the snapshot restores the originals
        part.apply_field_overrides(&snapshot).unwrap();
        assert_eq!(part.name, "Mounting Bracket");
        assert_eq!(part.technical.surface_finish.as_deref(), Some("Anodized"));
    }

    #[test]
    fn test_apply_rejects_unknown_field() {
        let mut part = test_part();
        let payload = serde_json::json!({ "mass_kg": "1.5" });
        assert!(part.apply_field_overrides(&payload).is_err());
    }

    #[test]
    fn test_attachment_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("drawing_rev_b.pdf");
        std::fs::write(&path, b"fake drawing bytes").unwrap();

        let att = Attachment::from_file(&path).unwrap();
        assert_eq!(att.filename, "drawing_rev_b.pdf");
        assert_eq!(att.size, 18);
        assert_eq!(att.sha256.as_ref().map(|h| h.len()), Some(64));
    }

    #[test]
    fn test_to_record_ignores_bom_order() {
        use crate::diff::tracker::diff_records;

        let mut part = test_part();
        let c1 = EntityId::new(EntityPrefix::Part);
        let c2 = EntityId::new(EntityPrefix::Part);
        part.bom.push(BomLine {
            component: c1.clone(),
            quantity: 1.0,
            unit: "pcs".to_string(),
        });
        part.bom.push(BomLine {
            component: c2.clone(),
            quantity: 2.0,
            unit: "pcs".to_string(),
        });

        let mut reordered = part.clone();
        reordered.bom.reverse();

        assert!(diff_records(&part.to_record(), &reordered.to_record()).is_empty());
    }

    #[test]
    fn test_to_record_tracks_quantity_change() {
        use crate::diff::tracker::diff_records;

        let mut part = test_part();
        part.bom.push(BomLine {
            component: EntityId::new(EntityPrefix::Part),
            quantity: 2.0,
            unit: "pcs".to_string(),
        });

        let mut changed = part.clone();
        changed.bom[0].quantity = 6.0;

        let changes = diff_records(&part.to_record(), &changed.to_record());
        assert_eq!(changes.len(), 1);
        assert!(changes[0].path.starts_with("bom."));
        assert!(changes[0].path.ends_with(".quantity"));
    }

    #[test]
    fn test_part_yaml_roundtrip() {
        let mut part = test_part();
        part.bom.push(BomLine {
            component: EntityId::new(EntityPrefix::Part),
            quantity: 4.0,
            unit: "pcs".to_string(),
        });

        let yaml = serde_yml::to_string(&part).unwrap();
        let parsed: Part = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, part.id);
        assert_eq!(parsed.bom.len(), 1);
        assert_eq!(parsed.bom[0].quantity, 4.0);
    }
}
