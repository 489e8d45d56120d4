//! Comparison record type - stored part-to-part comparison results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::diff::compare::{CompareScope, ComparisonReport};

/// Comparison record state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonState {
    #[default]
    Draft,
    Compared,
}

/// A stored comparison between two parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// Unique identifier
    pub id: EntityId,

    /// Display name ("Compare: PN-1001 vs PN-1002")
    pub name: String,

    /// Part A (from)
    pub part_a: EntityId,

    /// Part B (to)
    pub part_b: EntityId,

    #[serde(default)]
    pub scope: CompareScope,

    #[serde(default)]
    pub state: ComparisonState,

    /// The diff payload, present once the comparison has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ComparisonReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compared_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compared_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Comparison {
    /// Create a comparison shell in draft
    pub fn new(
        part_a: EntityId,
        part_a_number: &str,
        part_b: EntityId,
        part_b_number: &str,
        scope: CompareScope,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Cmpr),
            name: format!("Compare: {} vs {}", part_a_number, part_b_number),
            part_a,
            part_b,
            scope,
            state: ComparisonState::Draft,
            report: None,
            compared_by: None,
            compared_at: None,
            notes: None,
            created: Utc::now(),
            author,
        }
    }

    /// Attach a finished report and stamp the comparison
    pub fn record_result(&mut self, report: ComparisonReport, actor: &str) {
        self.report = Some(report);
        self.compared_by = Some(actor.to_string());
        self.compared_at = Some(Utc::now());
        self.state = ComparisonState::Compared;
    }
}

impl Entity for Comparison {
    const PREFIX: &'static str = "CMPR";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &str {
        match self.state {
            ComparisonState::Draft => "draft",
            ComparisonState::Compared => "compared",
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

    #[test]
    fn test_comparison_lifecycle() {
        let mut cmp = Comparison::new(
            EntityId::new(EntityPrefix::Part),
            "PN-1001",
            EntityId::new(EntityPrefix::Part),
            "PN-1002",
            CompareScope::All,
            "test".to_string(),
        );

        assert_eq!(cmp.name, "Compare: PN-1001 vs PN-1002");
        assert_eq!(cmp.state, ComparisonState::Draft);
        assert!(cmp.report.is_none());

        cmp.record_result(ComparisonReport::default(), "jsmith");
        assert_eq!(cmp.state, ComparisonState::Compared);
        assert_eq!(cmp.compared_by.as_deref(), Some("jsmith"));
        assert!(cmp.compared_at.is_some());
    }

    #[test]
    fn test_comparison_yaml_roundtrip() {
        let cmp = Comparison::new(
            EntityId::new(EntityPrefix::Part),
            "A",
            EntityId::new(EntityPrefix::Part),
            "B",
            CompareScope::Bom,
            "test".to_string(),
        );
        let yaml = serde_yml::to_string(&cmp).unwrap();
        let parsed: Comparison = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, cmp.id);
        assert_eq!(parsed.scope, CompareScope::Bom);
    }
}
