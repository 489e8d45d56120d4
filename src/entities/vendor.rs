//! Vendor document record type - submissions with per-line approval
//!
//! The line aggregate here is intentionally independent of the ECN
//! rollup: vendor lines track one decision per assigned approver and
//! surface an in_progress state while decisions are outstanding.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::approval::{aggregate_decisions, AggregateStatus, DecisionStatus};
use crate::core::entity::{Entity, VendorStage};
use crate::core::identity::{EntityId, EntityPrefix};

/// One approver's decision on a document line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualApproval {
    pub user: String,

    #[serde(default)]
    pub status: DecisionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Errors from vendor document actions
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("{user} is not an assigned approver for line {line}")]
    NotAnApprover { user: String, line: u32 },

    #[error("{user} has already submitted a decision for line {line}")]
    AlreadyDecided { user: String, line: u32 },

    #[error("no document line with serial {0}")]
    NoSuchLine(u32),

    #[error("document is already integrated; no further stage remains")]
    AlreadyIntegrated,
}

/// One submitted document line with its approver set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDocumentLine {
    pub serial: u32,

    pub filename: String,

    /// Assigned approver usernames
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approvers: Vec<String>,

    /// One decision entry per assigned approver
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approvals: Vec<IndividualApproval>,

    /// Stamped when the aggregate reaches approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl VendorDocumentLine {
    /// Create a line with pending decision entries for each approver
    pub fn new(serial: u32, filename: String, approvers: Vec<String>) -> Self {
        let approvals = approvers
            .iter()
            .map(|user| IndividualApproval {
                user: user.clone(),
                status: DecisionStatus::Pending,
                decision_date: None,
                remarks: None,
            })
            .collect();

        Self {
            serial,
            filename,
            approvers,
            approvals,
            approval_date: None,
            remarks: None,
        }
    }

    /// Re-sync decision entries after the approver set changes: new
    /// approvers get pending entries, removed approvers lose theirs
    pub fn set_approvers(&mut self, approvers: Vec<String>) {
        self.approvals.retain(|a| {
            approvers
                .iter()
                .any(|u| u.eq_ignore_ascii_case(&a.user))
        });
        for user in &approvers {
            if !self
                .approvals
                .iter()
                .any(|a| a.user.eq_ignore_ascii_case(user))
            {
                self.approvals.push(IndividualApproval {
                    user: user.clone(),
                    status: DecisionStatus::Pending,
                    decision_date: None,
                    remarks: None,
                });
            }
        }
        self.approvers = approvers;
        self.refresh_approval_date();
    }

    /// Aggregate status over the per-approver decisions
    pub fn aggregate_status(&self) -> AggregateStatus {
        if self.approvers.is_empty() {
            return AggregateStatus::Pending;
        }
        let decisions: Vec<DecisionStatus> = self.approvals.iter().map(|a| a.status).collect();
        aggregate_decisions(&decisions)
    }

    /// Whether a user is assigned and still has a pending decision
    pub fn can_decide(&self, user: &str) -> bool {
        self.approvals
            .iter()
            .any(|a| a.user.eq_ignore_ascii_case(user) && a.status == DecisionStatus::Pending)
    }

    /// Record a user's approval
    pub fn approve(&mut self, user: &str) -> Result<(), VendorError> {
        self.decide(user, DecisionStatus::Approved, None)
    }

    /// Record a user's rejection with mandatory remarks
    pub fn reject(&mut self, user: &str, remarks: String) -> Result<(), VendorError> {
        self.decide(user, DecisionStatus::Rejected, Some(remarks))
    }

    fn decide(
        &mut self,
        user: &str,
        status: DecisionStatus,
        remarks: Option<String>,
    ) -> Result<(), VendorError> {
        let serial = self.serial;
        let entry = self
            .approvals
            .iter_mut()
            .find(|a| a.user.eq_ignore_ascii_case(user))
            .ok_or_else(|| VendorError::NotAnApprover {
                user: user.to_string(),
                line: serial,
            })?;

        if entry.status != DecisionStatus::Pending {
            return Err(VendorError::AlreadyDecided {
                user: user.to_string(),
                line: serial,
            });
        }

        entry.status = status;
        entry.decision_date = Some(Utc::now().date_naive());
        entry.remarks = remarks;

        self.refresh_approval_date();
        Ok(())
    }

    fn refresh_approval_date(&mut self) {
        self.approval_date = if self.aggregate_status() == AggregateStatus::Approved {
            Some(Utc::now().date_naive())
        } else {
            None
        };
    }
}

/// A vendor document submission moving through review stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDocument {
    /// Unique identifier
    pub id: EntityId,

    /// Human-readable serial number (e.g. VD-0003)
    pub sequence: String,

    /// Document name
    pub name: String,

    /// Vendor name
    pub vendor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_code: Option<String>,

    /// Responsible username
    pub responsible: String,

    pub submission_date: NaiveDate,

    #[serde(default)]
    pub stage: VendorStage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<VendorDocumentLine>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl VendorDocument {
    /// Create a new submission in the submitted stage
    pub fn new(sequence: String, name: String, vendor: String, responsible: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Vdoc),
            sequence,
            name,
            vendor,
            vendor_code: None,
            responsible: responsible.clone(),
            submission_date: Utc::now().date_naive(),
            stage: VendorStage::Submitted,
            notes: None,
            lines: Vec::new(),
            created: Utc::now(),
            author: responsible,
        }
    }

    /// Advance to the next review stage
    pub fn advance(&mut self) -> Result<VendorStage, VendorError> {
        self.stage = match self.stage {
            VendorStage::Submitted => VendorStage::QualityReview,
            VendorStage::QualityReview => VendorStage::Approval,
            VendorStage::Approval => VendorStage::Integrated,
            VendorStage::Integrated => return Err(VendorError::AlreadyIntegrated),
        };
        Ok(self.stage)
    }

    /// Find a line by serial number
    pub fn line_mut(&mut self, serial: u32) -> Result<&mut VendorDocumentLine, VendorError> {
        self.lines
            .iter_mut()
            .find(|l| l.serial == serial)
            .ok_or(VendorError::NoSuchLine(serial))
    }

    /// Next free line serial
    pub fn next_serial(&self) -> u32 {
        self.lines.iter().map(|l| l.serial).max().unwrap_or(0) + 1
    }
}

impl Entity for VendorDocument {
    const PREFIX: &'static str = "VDOC";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &str {
        match self.stage {
            VendorStage::Submitted => "submitted",
            VendorStage::QualityReview => "quality_review",
            VendorStage::Approval => "approval",
            VendorStage::Integrated => "integrated",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}
