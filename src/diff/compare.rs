//! Part-to-part comparison engine
//!
//! Independently diffs two parts across five categories: BOM lines,
//! linked document fields, revision sets, attached files, and the fixed
//! technical attribute list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::core::entity::DocState;
use crate::entities::document::Document;
use crate::entities::part::{Part, TechnicalAttributes};
use crate::entities::revision::Revision;

/// Which categories a comparison covers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum CompareScope {
    #[default]
    All,
    Bom,
    Documents,
    Revisions,
    Files,
    Technical,
}

impl CompareScope {
    fn covers(&self, other: CompareScope) -> bool {
        *self == CompareScope::All || *self == other
    }
}

/// Errors running a comparison
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("cannot compare a part with itself; select two different parts")]
    SamePart,
}

/// Direction-aware change kind for keyed sets (BOM lines, files)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetChange {
    Added,
    Deleted,
    Modified,
}

impl std::fmt::Display for SetChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetChange::Added => write!(f, "added"),
            SetChange::Deleted => write!(f, "deleted"),
            SetChange::Modified => write!(f, "modified"),
        }
    }
}

/// One BOM difference, keyed by component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomDiff {
    pub change: SetChange,

    /// Component record id
    pub component: String,

    /// Component part number, when the component record is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_a: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_b: Option<f64>,

    pub unit: String,
}

/// One differing document field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFieldDiff {
    pub field: String,
    pub value_a: String,
    pub value_b: String,
}

/// Revision-set summary for both sides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionSummary {
    pub count_a: usize,
    pub count_b: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_b: Option<String>,
}

/// How a revision number differs between sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionChange {
    OnlyInA,
    OnlyInB,
    Different,
}

/// One revision difference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionDiff {
    pub change: RevisionChange,
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_b: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_a: Option<DocState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_b: Option<DocState>,
}

/// One attachment difference, keyed by filename
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiff {
    pub change: SetChange,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_a: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_b: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// One technical attribute row; always emitted, flagged changed or not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalDiff {
    pub field: String,
    pub value_a: String,
    pub value_b: String,
    pub changed: bool,
}

/// Aggregate counts over all categories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub bom_total: usize,
    pub bom_additions: usize,
    pub bom_deletions: usize,
    pub bom_modifications: usize,
    pub file_total: usize,
    pub file_additions: usize,
    pub file_deletions: usize,
    pub technical_changes: usize,
    pub revision_count_a: usize,
    pub revision_count_b: usize,
}

/// The full comparison result across all requested categories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Explanatory notes (missing BOMs, missing documents)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bom: Vec<BomDiff>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentFieldDiff>,

    #[serde(default)]
    pub revision_summary: RevisionSummary,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<RevisionDiff>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileDiff>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technical: Vec<TechnicalDiff>,

    #[serde(default)]
    pub summary: ComparisonSummary,
}

/// Everything the comparator needs about one side
pub struct CompareSide<'a> {
    pub part: &'a Part,
    pub document: Option<&'a Document>,
    pub revisions: Vec<&'a Revision>,
}

/// Run a comparison between two parts
pub fn run_comparison(
    a: &CompareSide,
    b: &CompareSide,
    scope: CompareScope,
    part_lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<ComparisonReport, CompareError> {
    if a.part.id == b.part.id {
        return Err(CompareError::SamePart);
    }

    let mut report = ComparisonReport::default();

    if scope.covers(CompareScope::Bom) {
        compare_boms(a.part, b.part, part_lookup, &mut report);
    }
    if scope.covers(CompareScope::Documents) {
        compare_documents(a, b, &mut report);
    }
    if scope.covers(CompareScope::Revisions) {
        compare_revisions(a, b, &mut report);
    }
    if scope.covers(CompareScope::Files) {
        compare_files(a.part, b.part, &mut report);
    }
    if scope.covers(CompareScope::Technical) {
        compare_technical(a.part, b.part, &mut report);
    }

    summarize(&mut report);
    Ok(report)
}

fn compare_boms(
    part_a: &Part,
    part_b: &Part,
    part_lookup: &dyn Fn(&str) -> Option<String>,
    report: &mut ComparisonReport,
) {
    if part_a.bom.is_empty() && part_b.bom.is_empty() {
        report
            .notes
            .push("No BOM found for either part".to_string());
        return;
    }
    if part_a.bom.is_empty() {
        report
            .notes
            .push(format!("Part A ({}) has no BOM", part_a.part_number));
        return;
    }
    if part_b.bom.is_empty() {
        report
            .notes
            .push(format!("Part B ({}) has no BOM", part_b.part_number));
        return;
    }

    // Deleted components (in A but not in B)
    for line in &part_a.bom {
        if part_b.bom_line(&line.component).is_none() {
            let key = line.component.to_string();
            report.bom.push(BomDiff {
                change: SetChange::Deleted,
                part_number: part_lookup(&key),
                component: key,
                quantity_a: Some(line.quantity),
                quantity_b: None,
                unit: line.unit.clone(),
            });
        }
    }

    for line in &part_b.bom {
        let key = line.component.to_string();
        match part_a.bom_line(&line.component) {
            // Added components (in B but not in A)
            None => {
                report.bom.push(BomDiff {
                    change: SetChange::Added,
                    part_number: part_lookup(&key),
                    component: key,
                    quantity_a: None,
                    quantity_b: Some(line.quantity),
                    unit: line.unit.clone(),
                });
            }
            // In both: a diff entry only when quantities differ
            Some(line_a) => {
                if line_a.quantity != line.quantity {
                    report.bom.push(BomDiff {
                        change: SetChange::Modified,
                        part_number: part_lookup(&key),
                        component: key,
                        quantity_a: Some(line_a.quantity),
                        quantity_b: Some(line.quantity),
                        unit: line_a.unit.clone(),
                    });
                }
            }
        }
    }
}

fn compare_documents(a: &CompareSide, b: &CompareSide, report: &mut ComparisonReport) {
    let (doc_a, doc_b) = match (a.document, b.document) {
        (None, None) => {
            report
                .notes
                .push("No documents found for either part".to_string());
            return;
        }
        (None, Some(_)) => {
            report
                .notes
                .push("Part A has no document control record".to_string());
            return;
        }
        (Some(_), None) => {
            report
                .notes
                .push("Part B has no document control record".to_string());
            return;
        }
        (Some(da), Some(db)) => (da, db),
    };

    let current_a = a
        .revisions
        .last()
        .map(|r| r.description.clone())
        .unwrap_or_default();
    let current_b = b
        .revisions
        .last()
        .map(|r| r.description.clone())
        .unwrap_or_default();

    let fields: [(&str, String, String); 6] = [
        ("Format Number", doc_a.title.clone(), doc_b.title.clone()),
        (
            "Customer Part Number",
            doc_a.customer_part_number.clone().unwrap_or_default(),
            doc_b.customer_part_number.clone().unwrap_or_default(),
        ),
        (
            "Customer Part Description",
            doc_a.customer_part_description.clone().unwrap_or_default(),
            doc_b.customer_part_description.clone().unwrap_or_default(),
        ),
        ("Status", doc_a.state.to_string(), doc_b.state.to_string()),
        ("Current Revision", current_a, current_b),
        (
            "Customer",
            doc_a.customer.clone().unwrap_or_default(),
            doc_b.customer.clone().unwrap_or_default(),
        ),
    ];

    for (field, value_a, value_b) in fields {
        if value_a != value_b {
            report.documents.push(DocumentFieldDiff {
                field: field.to_string(),
                value_a,
                value_b,
            });
        }
    }

    // Categories compared as sets
    let cats_a: BTreeSet<&String> = doc_a.categories.iter().collect();
    let cats_b: BTreeSet<&String> = doc_b.categories.iter().collect();
    if cats_a != cats_b {
        let join = |cats: &BTreeSet<&String>| {
            if cats.is_empty() {
                "None".to_string()
            } else {
                cats.iter().cloned().cloned().collect::<Vec<_>>().join(", ")
            }
        };
        report.documents.push(DocumentFieldDiff {
            field: "Categories".to_string(),
            value_a: join(&cats_a),
            value_b: join(&cats_b),
        });
    }
}

fn compare_revisions(a: &CompareSide, b: &CompareSide, report: &mut ComparisonReport) {
    report.revision_summary = RevisionSummary {
        count_a: a.revisions.len(),
        count_b: b.revisions.len(),
        current_a: a.revisions.last().map(|r| r.description.clone()),
        current_b: b.revisions.last().map(|r| r.description.clone()),
    };

    let numbers_a: BTreeSet<u32> = a.revisions.iter().map(|r| r.number).collect();
    let numbers_b: BTreeSet<u32> = b.revisions.iter().map(|r| r.number).collect();
    let find = |revs: &[&Revision], n: u32| revs.iter().find(|r| r.number == n).copied().cloned();

    for number in numbers_a.difference(&numbers_b) {
        let rev = find(&a.revisions, *number).unwrap();
        report.revisions.push(RevisionDiff {
            change: RevisionChange::OnlyInA,
            number: *number,
            description_a: Some(rev.description),
            description_b: None,
            state_a: Some(rev.state),
            state_b: None,
        });
    }

    for number in numbers_b.difference(&numbers_a) {
        let rev = find(&b.revisions, *number).unwrap();
        report.revisions.push(RevisionDiff {
            change: RevisionChange::OnlyInB,
            number: *number,
            description_a: None,
            description_b: Some(rev.description),
            state_a: None,
            state_b: Some(rev.state),
        });
    }

    for number in numbers_a.intersection(&numbers_b) {
        let rev_a = find(&a.revisions, *number).unwrap();
        let rev_b = find(&b.revisions, *number).unwrap();
        if rev_a.description != rev_b.description || rev_a.state != rev_b.state {
            report.revisions.push(RevisionDiff {
                change: RevisionChange::Different,
                number: *number,
                description_a: Some(rev_a.description),
                description_b: Some(rev_b.description),
                state_a: Some(rev_a.state),
                state_b: Some(rev_b.state),
            });
        }
    }

    report.revisions.sort_by_key(|r| r.number);
}

fn compare_files(part_a: &Part, part_b: &Part, report: &mut ComparisonReport) {
    let find = |part: &Part, name: &str| {
        part.attachments
            .iter()
            .find(|att| att.filename == name)
            .cloned()
    };

    // Files only in A
    for att in &part_a.attachments {
        if find(part_b, &att.filename).is_none() {
            report.files.push(FileDiff {
                change: SetChange::Deleted,
                filename: att.filename.clone(),
                size_a: Some(att.size),
                size_b: None,
                media_type: att.media_type.clone(),
            });
        }
    }

    for att in &part_b.attachments {
        match find(part_a, &att.filename) {
            // Files only in B
            None => {
                report.files.push(FileDiff {
                    change: SetChange::Added,
                    filename: att.filename.clone(),
                    size_a: None,
                    size_b: Some(att.size),
                    media_type: att.media_type.clone(),
                });
            }
            // In both: modified when the size differs
            Some(att_a) => {
                if att_a.size != att.size {
                    report.files.push(FileDiff {
                        change: SetChange::Modified,
                        filename: att.filename.clone(),
                        size_a: Some(att_a.size),
                        size_b: Some(att.size),
                        media_type: att_a.media_type.clone(),
                    });
                }
            }
        }
    }
}

fn compare_technical(part_a: &Part, part_b: &Part, report: &mut ComparisonReport) {
    // Every attribute row is emitted so the report shows the complete
    // technical picture, not only the deltas
    for (key, label) in TechnicalAttributes::FIELDS {
        let value_a = part_a.technical.get(key).unwrap_or_default().to_string();
        let value_b = part_b.technical.get(key).unwrap_or_default().to_string();
        let changed = value_a != value_b;
        report.technical.push(TechnicalDiff {
            field: label.to_string(),
            value_a,
            value_b,
            changed,
        });
    }
}

fn summarize(report: &mut ComparisonReport) {
    let count = |kind: SetChange| report.bom.iter().filter(|d| d.change == kind).count();
    report.summary = ComparisonSummary {
        bom_total: report.bom.len(),
        bom_additions: count(SetChange::Added),
        bom_deletions: count(SetChange::Deleted),
        bom_modifications: count(SetChange::Modified),
        file_total: report.files.len(),
        file_additions: report
            .files
            .iter()
            .filter(|f| f.change == SetChange::Added)
            .count(),
        file_deletions: report
            .files
            .iter()
            .filter(|f| f.change == SetChange::Deleted)
            .count(),
        technical_changes: report.technical.iter().filter(|t| t.changed).count(),
        revision_count_a: report.revision_summary.count_a,
        revision_count_b: report.revision_summary.count_b,
    };
}
