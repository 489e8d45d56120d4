//! Per-record change history
//!
//! Every recorded revision of a tracked record is one changeset file
//! under `changelog/`, numbered monotonically per target record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::identity::EntityId;
use crate::core::project::Project;
use crate::diff::tracker::FieldChange;

/// Why a change was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Correction,
    Improvement,
    #[default]
    Update,
    Compliance,
    CustomerRequest,
    ProcessChange,
    Other,
}

impl std::fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChangeReason::Correction => "correction",
            ChangeReason::Improvement => "improvement",
            ChangeReason::Update => "update",
            ChangeReason::Compliance => "compliance",
            ChangeReason::CustomerRequest => "customer_request",
            ChangeReason::ProcessChange => "process_change",
            ChangeReason::Other => "other",
        };
        write!(f, "{}", label)
    }
}

/// One recorded revision of a tracked record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    /// The record this changeset belongs to
    pub target: EntityId,

    /// Monotonic changeset number per target
    pub number: u32,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    pub reason: ChangeReason,

    pub author: String,

    pub date: DateTime<Utc>,

    #[serde(default)]
    pub major: bool,

    #[serde(default)]
    pub affects_quality: bool,

    #[serde(default)]
    pub affects_safety: bool,

    #[serde(default)]
    pub affects_cost: bool,

    /// The field changes captured for this revision
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

/// Errors reading or writing the changelog
#[derive(Debug, Error)]
pub enum ChangeLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse changeset {path}: {message}")]
    Parse { path: String, message: String },
}

/// The changelog directory of a project
pub struct ChangeLog;

impl ChangeLog {
    /// All changesets recorded for a target, sorted by number
    pub fn for_target(
        project: &Project,
        target: &EntityId,
    ) -> Result<Vec<ChangeSet>, ChangeLogError> {
        let dir = project.changelog_dir();
        let mut sets = Vec::new();

        if !dir.exists() {
            return Ok(sets);
        }

        let needle = format!("{}-", target);
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if !name.starts_with(&needle) || !name.ends_with(".mct.yaml") {
                continue;
            }

            let contents = std::fs::read_to_string(&path)?;
            let set: ChangeSet =
                serde_yml::from_str(&contents).map_err(|e| ChangeLogError::Parse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            sets.push(set);
        }

        sets.sort_by_key(|s| s.number);
        Ok(sets)
    }

    /// The next changeset number for a target
    pub fn next_number(project: &Project, target: &EntityId) -> Result<u32, ChangeLogError> {
        let sets = Self::for_target(project, target)?;
        Ok(sets.iter().map(|s| s.number).max().unwrap_or(0) + 1)
    }

    /// Record a new changeset, assigning the next number
    pub fn record(
        project: &Project,
        target: &EntityId,
        title: String,
        summary: Option<String>,
        reason: ChangeReason,
        author: String,
        changes: Vec<FieldChange>,
    ) -> Result<ChangeSet, ChangeLogError> {
        let number = Self::next_number(project, target)?;
        let set = ChangeSet {
            target: target.clone(),
            number,
            title,
            summary,
            reason,
            author,
            date: Utc::now(),
            major: false,
            affects_quality: false,
            affects_safety: false,
            affects_cost: false,
            changes,
        };
        Self::save(project, &set)?;
        Ok(set)
    }

    /// Write a changeset to its file
    pub fn save(project: &Project, set: &ChangeSet) -> Result<(), ChangeLogError> {
        let dir = project.changelog_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}-{:04}.mct.yaml", set.target, set.number));
        let contents = serde_yml::to_string(set)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
