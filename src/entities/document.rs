//! Document record type - controlled documents (drawing control)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::approval::ApprovalRecord;
use crate::core::config::ApprovalDefaults;
use crate::core::entity::{DocState, Entity};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::workflow::{ensure_revisions_released, Lifecycle, WorkflowError};
use crate::entities::revision::Revision;

/// A controlled document tying a part and customer to its drawing
/// revisions and approval lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: EntityId,

    /// Human-readable serial number (e.g. DC-0001)
    pub sequence: String,

    /// Format number / document title
    pub title: String,

    /// Part this document controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<EntityId>,

    /// Customer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,

    /// Customer's own part number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_part_number: Option<String>,

    /// Customer's part description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_part_description: Option<String>,

    /// Document categories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

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

    /// Who released the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_by: Option<String>,

    /// When the document was released
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this document)
    pub author: String,
}

impl Document {
    /// Create a new document in draft, with the approver set and
    /// distribution list seeded from the project approval defaults
    pub fn new(
        sequence: String,
        title: String,
        part: Option<EntityId>,
        customer: Option<String>,
        defaults: &ApprovalDefaults,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Doc),
            sequence,
            title,
            part,
            customer,
            customer_part_number: None,
            customer_part_description: None,
            categories: Vec::new(),
            state: DocState::default(),
            approvers: defaults.approvers.clone(),
            approvals: Vec::new(),
            release_to: defaults.release_to.clone(),
            released_by: None,
            released_at: None,
            created: Utc::now(),
            author,
        }
    }

    /// Revisions belonging to this document, sorted by revision number
    pub fn revisions<'a>(&self, all: &'a [Revision]) -> Vec<&'a Revision> {
        let mut revs: Vec<&Revision> = all.iter().filter(|r| r.document == self.id).collect();
        revs.sort_by_key(|r| r.number);
        revs
    }

    /// The current revision: latest by revision number
    pub fn current_revision<'a>(&self, all: &'a [Revision]) -> Option<&'a Revision> {
        self.revisions(all).into_iter().next_back()
    }

    /// Create the next revision of this document.
    ///
    /// Fails while any existing revision is unreleased; the new revision
    /// links back to all prior revisions and starts in draft.
    pub fn new_revision(
        &self,
        existing: &[Revision],
        description: String,
        defaults: &ApprovalDefaults,
        author: String,
    ) -> Result<Revision, WorkflowError> {
        let own: Vec<&Revision> = self.revisions(existing);
        ensure_revisions_released(own.iter().map(|r| (r.number, r.state)))?;

        Ok(Revision::new(
            self.id.clone(),
            own.len() as u32 + 1,
            description,
            own.iter().map(|r| r.id.clone()).collect(),
            defaults,
            author,
        ))
    }
}

impl Entity for Document {
    const PREFIX: &'static str = "DOC";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
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

impl Lifecycle for Document {
    fn prefix(&self) -> EntityPrefix {
        EntityPrefix::Doc
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
    }
}
