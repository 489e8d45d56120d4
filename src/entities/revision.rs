//! Revision record type - one issued state of a controlled document

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::approval::ApprovalRecord;
use crate::core::config::ApprovalDefaults;
use crate::core::entity::{DocState, Entity};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::workflow::Lifecycle;

/// A document revision with its own approval lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    /// Unique identifier
    pub id: EntityId,

    /// Document this revision belongs to
    pub document: EntityId,

    /// Revision number, assigned as count + 1 at creation
    pub number: u32,

    /// What changed in this revision
    pub description: String,

    /// Current lifecycle state
    #[serde(default)]
    pub state: DocState,

    /// Usernames that must approve before release
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approvers: Vec<String>,

    /// Approvals granted so far
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approvals: Vec<ApprovalRecord>,

    /// Usernames notified on release
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub release_to: Vec<String>,

    /// Links to all earlier revisions of the same document
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_revisions: Vec<EntityId>,

    /// Final approver, stamped when the approver set completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    /// Date the approval completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_approved: Option<NaiveDate>,

    /// Who released the revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_by: Option<String>,

    /// When the revision was released
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,

    /// Date the previous drawing became obsolete (stamped on release)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obsolete_date: Option<NaiveDate>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who raised this revision)
    pub author: String,
}

impl Revision {
    /// Create a revision in draft. Callers go through
    /// [`Document::new_revision`](crate::entities::Document::new_revision),
    /// which enforces the single-unreleased-revision invariant.
    pub fn new(
        document: EntityId,
        number: u32,
        description: String,
        previous_revisions: Vec<EntityId>,
        defaults: &ApprovalDefaults,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Rev),
            document,
            number,
            description,
            state: DocState::default(),
            approvers: defaults.approvers.clone(),
            approvals: Vec::new(),
            release_to: defaults.release_to.clone(),
            previous_revisions,
            approved_by: None,
            date_approved: None,
            released_by: None,
            released_at: None,
            obsolete_date: None,
            created: Utc::now(),
            author,
        }
    }

    /// Stamp the final approver once the approver set completes
    pub fn stamp_approved(&mut self, actor: &str) {
        self.approved_by = Some(actor.to_string());
        self.date_approved = Some(Utc::now().date_naive());
    }
}

impl Entity for Revision {
    const PREFIX: &'static str = "REV";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.description
    }

    fn state(&self) -> &str {
        match self.state {
            DocState::Draft => "draft",
            DocState::PendingApproval => "pending_approval",
            DocState::Approved => "approved",
            DocState::Released => "released",
            DocState::Cancelled => "cancelled",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Lifecycle for Revision {
    fn prefix(&self) -> EntityPrefix {
        EntityPrefix::Rev
    }

    fn state(&self) -> DocState {
        self.state
    }

    fn set_state(&mut self, state: DocState) {
        self.state = state;
    }

    fn required_approvers(&self) -> &[String] {
        &self.approvers
    }

    fn approvals(&self) -> &[ApprovalRecord] {
        &self.approvals
    }

    fn approvals_mut(&mut self) -> &mut Vec<ApprovalRecord> {
        &mut self.approvals
    }

    fn stamp_release(&mut self, actor: &str, at: DateTime<Utc>) {
        self.released_by = Some(actor.to_string());
        self.released_at = Some(at);
        self.obsolete_date = Some(at.date_naive());
    }
}
