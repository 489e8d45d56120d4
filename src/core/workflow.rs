//! Lifecycle engine for controlled documents and revisions
//!
//! Drives the draft → pending_approval → approved → released machine,
//! the fixed undo table, and the approval gate against the team roster.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::approval::{fully_approved, has_approved, ApprovalRecord};
use crate::core::entity::DocState;
use crate::core::identity::EntityPrefix;
use crate::core::team::{TeamMember, TeamRoster};

/// Errors that can occur during lifecycle operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: DocState, to: DocState },

    #[error("record is not in {expected} state (current: {current})")]
    WrongState { expected: DocState, current: DocState },

    #[error("no approvers assigned; configure 'approvals.approvers' in .mct/config.yaml")]
    NoApprovers,

    #[error("{user} is not in the assigned approver set")]
    NotAnApprover { user: String },

    #[error("{user} has already approved this record")]
    DuplicateApproval { user: String },

    #[error("authorization required: {record_type} approval requires role {required_role}")]
    Unauthorized {
        record_type: String,
        required_role: String,
    },

    #[error("current user not found in team roster")]
    UserNotInRoster,

    #[error(
        "cannot create a new revision while revision {revision} is in '{state}' state; release it first"
    )]
    RevisionInProgress { revision: u32, state: DocState },
}

/// Records driven by the document lifecycle machine
pub trait Lifecycle {
    /// The record type prefix, for approval-matrix lookup
    fn prefix(&self) -> EntityPrefix;

    fn state(&self) -> DocState;
    fn set_state(&mut self, state: DocState);

    /// The assigned approver set (usernames)
    fn required_approvers(&self) -> &[String];

    fn approvals(&self) -> &[ApprovalRecord];
    fn approvals_mut(&mut self) -> &mut Vec<ApprovalRecord>;

    /// Stamp the release actor and timestamp
    fn stamp_release(&mut self, actor: &str, at: DateTime<Utc>);
}

/// Lifecycle engine for documents and revisions
pub struct DocumentWorkflow {
    roster: Option<TeamRoster>,
}

impl DocumentWorkflow {
    /// Create an engine; pass the roster when workflow authorization applies
    pub fn new(roster: Option<TeamRoster>) -> Self {
        Self { roster }
    }

    /// Get the team roster
    pub fn roster(&self) -> Option<&TeamRoster> {
        self.roster.as_ref()
    }

    /// Check if a state transition is valid
    pub fn is_valid_transition(&self, from: DocState, to: DocState) -> bool {
        matches!(
            (from, to),
            // Normal forward transitions
            (DocState::Draft, DocState::PendingApproval)
                | (DocState::PendingApproval, DocState::Approved)
                | (DocState::Approved, DocState::Released)
                // Cancellation of anything not yet released
                | (DocState::Draft, DocState::Cancelled)
                | (DocState::PendingApproval, DocState::Cancelled)
                | (DocState::Approved, DocState::Cancelled)
        )
    }

    /// Get allowed forward transitions from the current state
    pub fn allowed_transitions(&self, current: DocState) -> Vec<DocState> {
        match current {
            DocState::Draft => vec![DocState::PendingApproval, DocState::Cancelled],
            DocState::PendingApproval => vec![DocState::Approved, DocState::Cancelled],
            DocState::Approved => vec![DocState::Released, DocState::Cancelled],
            DocState::Released => vec![],
            DocState::Cancelled => vec![],
        }
    }

    /// Fixed reverse table for the undo action
    pub fn undo_target(state: DocState) -> Option<DocState> {
        match state {
            DocState::PendingApproval => Some(DocState::Draft),
            DocState::Approved => Some(DocState::PendingApproval),
            DocState::Released => Some(DocState::Approved),
            DocState::Cancelled => Some(DocState::Draft),
            DocState::Draft => None,
        }
    }

    /// Submit a draft record for approval, clearing any stale approvals
    pub fn request_approval<T: Lifecycle>(&self, record: &mut T) -> Result<(), WorkflowError> {
        if record.state() != DocState::Draft {
            return Err(WorkflowError::WrongState {
                expected: DocState::Draft,
                current: record.state(),
            });
        }
        if record.required_approvers().is_empty() {
            return Err(WorkflowError::NoApprovers);
        }

        record.approvals_mut().clear();
        record.set_state(DocState::PendingApproval);
        Ok(())
    }

    /// Record one approver's approval.
    ///
    /// Returns true when this approval was the last one required and the
    /// record auto-transitioned to approved.
    pub fn approve<T: Lifecycle>(
        &self,
        record: &mut T,
        actor: &str,
        comment: Option<&str>,
    ) -> Result<bool, WorkflowError> {
        if record.state() != DocState::PendingApproval {
            return Err(WorkflowError::WrongState {
                expected: DocState::PendingApproval,
                current: record.state(),
            });
        }

        if !record
            .required_approvers()
            .iter()
            .any(|a| a.eq_ignore_ascii_case(actor))
        {
            return Err(WorkflowError::NotAnApprover {
                user: actor.to_string(),
            });
        }

        if has_approved(record.approvals(), actor) {
            return Err(WorkflowError::DuplicateApproval {
                user: actor.to_string(),
            });
        }

        let member = self.authorize_approver(record.prefix(), actor)?;

        record.approvals_mut().push(ApprovalRecord {
            approver: actor.to_string(),
            role: member.and_then(|m| m.roles.first().copied()),
            timestamp: Utc::now(),
            comment: comment.map(|c| c.to_string()),
        });

        if fully_approved(record.required_approvers(), record.approvals()) {
            record.set_state(DocState::Approved);
            return Ok(true);
        }
        Ok(false)
    }

    /// Release an approved record, stamping actor and timestamp
    pub fn release<T: Lifecycle>(&self, record: &mut T, actor: &str) -> Result<(), WorkflowError> {
        if record.state() != DocState::Approved {
            return Err(WorkflowError::WrongState {
                expected: DocState::Approved,
                current: record.state(),
            });
        }

        if let Some(roster) = &self.roster {
            let member = roster
                .find_member(actor)
                .ok_or(WorkflowError::UserNotInRoster)?;
            if !roster.can_release(member) {
                return Err(WorkflowError::Unauthorized {
                    record_type: "release".to_string(),
                    required_role: "management".to_string(),
                });
            }
        }

        record.stamp_release(actor, Utc::now());
        record.set_state(DocState::Released);
        Ok(())
    }

    /// Cancel a record that has not been released
    pub fn cancel<T: Lifecycle>(&self, record: &mut T) -> Result<(), WorkflowError> {
        let from = record.state();
        if !self.is_valid_transition(from, DocState::Cancelled) {
            return Err(WorkflowError::InvalidTransition {
                from,
                to: DocState::Cancelled,
            });
        }
        record.set_state(DocState::Cancelled);
        Ok(())
    }

    /// Step a record back one state per the fixed reverse table.
    ///
    /// Returns the (from, to) pair when a mapping exists; unmapped states
    /// are a no-op and return None.
    pub fn undo<T: Lifecycle>(&self, record: &mut T) -> Option<(DocState, DocState)> {
        let from = record.state();
        let to = Self::undo_target(from)?;
        record.set_state(to);
        Some((from, to))
    }

    /// Roster gate for approval transitions. No roster means no checks.
    fn authorize_approver(
        &self,
        prefix: EntityPrefix,
        actor: &str,
    ) -> Result<Option<&TeamMember>, WorkflowError> {
        let Some(roster) = &self.roster else {
            return Ok(None);
        };

        let member = roster
            .find_member(actor)
            .ok_or(WorkflowError::UserNotInRoster)?;

        if !roster.can_approve(member, prefix) {
            let required_roles = roster
                .required_roles(prefix)
                .map(|roles| {
                    roles
                        .iter()
                        .map(|r| r.to_string())
                        .collect::<Vec<_>>()
                        .join(" or ")
                })
                .unwrap_or_else(|| "team member".to_string());

            return Err(WorkflowError::Unauthorized {
                record_type: prefix.as_str().to_string(),
                required_role: required_roles,
            });
        }

        Ok(Some(member))
    }
}

/// Enforce the single-unreleased-revision invariant before creating a
/// new revision. `revisions` yields (revision_number, state) pairs.
pub fn ensure_revisions_released(
    revisions: impl Iterator<Item = (u32, DocState)>,
) -> Result<(), WorkflowError> {
    for (revision, state) in revisions {
        if state != DocState::Released {
            return Err(WorkflowError::RevisionInProgress { revision, state });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRecord {
        state: DocState,
        approvers: Vec<String>,
        approvals: Vec<ApprovalRecord>,
        released_by: Option<String>,
    }

    impl TestRecord {
        fn new(approvers: &[&str]) -> Self {
            Self {
                state: DocState::Draft,
                approvers: approvers.iter().map(|s| s.to_string()).collect(),
                approvals: Vec::new(),
                released_by: None,
            }
        }
    }

    impl Lifecycle for TestRecord {
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
        fn stamp_release(&mut self, actor: &str, _at: DateTime<Utc>) {
            self.released_by = Some(actor.to_string());
        }
    }

    fn engine() -> DocumentWorkflow {
        DocumentWorkflow::new(None)
    }

    #[test]
    fn test_valid_transitions() {
        let engine = engine();
        assert!(engine.is_valid_transition(DocState::Draft, DocState::PendingApproval));
        assert!(engine.is_valid_transition(DocState::PendingApproval, DocState::Approved));
        assert!(engine.is_valid_transition(DocState::Approved, DocState::Released));
        assert!(engine.is_valid_transition(DocState::PendingApproval, DocState::Cancelled));

        assert!(!engine.is_valid_transition(DocState::Draft, DocState::Approved));
        assert!(!engine.is_valid_transition(DocState::Draft, DocState::Released));
        assert!(!engine.is_valid_transition(DocState::Released, DocState::Cancelled));
        assert!(!engine.is_valid_transition(DocState::Released, DocState::Draft));
    }

    #[test]
    fn test_full_approval_cycle() {
        let engine = engine();
        let mut doc = TestRecord::new(&["alice", "bob"]);

        engine.request_approval(&mut doc).unwrap();
        assert_eq!(doc.state, DocState::PendingApproval);

        let done = engine.approve(&mut doc, "alice", Some("LGTM")).unwrap();
        assert!(!done);
        assert_eq!(doc.state, DocState::PendingApproval);

        let done = engine.approve(&mut doc, "bob", None).unwrap();
        assert!(done);
        assert_eq!(doc.state, DocState::Approved);

        engine.release(&mut doc, "carol").unwrap();
        assert_eq!(doc.state, DocState::Released);
        assert_eq!(doc.released_by.as_deref(), Some("carol"));
    }

    #[test]
    fn test_request_approval_requires_approvers() {
        let engine = engine();
        let mut doc = TestRecord::new(&[]);
        let err = engine.request_approval(&mut doc).unwrap_err();
        assert!(matches!(err, WorkflowError::NoApprovers));
    }

    #[test]
    fn test_duplicate_approval_rejected() {
        let engine = engine();
        let mut doc = TestRecord::new(&["alice", "bob"]);
        engine.request_approval(&mut doc).unwrap();

        engine.approve(&mut doc, "alice", None).unwrap();
        let err = engine.approve(&mut doc, "alice", None).unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateApproval { .. }));
    }

    #[test]
    fn test_outsider_cannot_approve() {
        let engine = engine();
        let mut doc = TestRecord::new(&["alice"]);
        engine.request_approval(&mut doc).unwrap();

        let err = engine.approve(&mut doc, "mallory", None).unwrap_err();
        assert!(matches!(err, WorkflowError::NotAnApprover { .. }));
    }

    #[test]
    fn test_approve_outside_pending_state_fails() {
        let engine = engine();
        let mut doc = TestRecord::new(&["alice"]);
        let err = engine.approve(&mut doc, "alice", None).unwrap_err();
        assert!(matches!(err, WorkflowError::WrongState { .. }));
    }

    #[test]
    fn test_request_approval_clears_stale_approvals() {
        let engine = engine();
        let mut doc = TestRecord::new(&["alice"]);
        engine.request_approval(&mut doc).unwrap();
        engine.approve(&mut doc, "alice", None).unwrap();

        // Undo back to draft, then resubmit: old approvals must not count
        engine.undo(&mut doc);
        engine.undo(&mut doc);
        assert_eq!(doc.state, DocState::Draft);
        engine.request_approval(&mut doc).unwrap();
        assert!(doc.approvals.is_empty());
    }

    #[test]
    fn test_undo_table() {
        let engine = engine();
        let mut doc = TestRecord::new(&["alice"]);

        // Draft is unmapped: no-op
        assert!(engine.undo(&mut doc).is_none());
        assert_eq!(doc.state, DocState::Draft);

        doc.state = DocState::Released;
        assert_eq!(
            engine.undo(&mut doc),
            Some((DocState::Released, DocState::Approved))
        );
        assert_eq!(
            engine.undo(&mut doc),
            Some((DocState::Approved, DocState::PendingApproval))
        );
        assert_eq!(
            engine.undo(&mut doc),
            Some((DocState::PendingApproval, DocState::Draft))
        );
        assert!(engine.undo(&mut doc).is_none());

        doc.state = DocState::Cancelled;
        assert_eq!(
            engine.undo(&mut doc),
            Some((DocState::Cancelled, DocState::Draft))
        );
    }

    #[test]
    fn test_cancel_released_record_fails() {
        let engine = engine();
        let mut doc = TestRecord::new(&["alice"]);
        doc.state = DocState::Released;
        let err = engine.cancel(&mut doc).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_ensure_revisions_released() {
        assert!(ensure_revisions_released(std::iter::empty()).is_ok());
        assert!(ensure_revisions_released(
            [(1, DocState::Released), (2, DocState::Released)].into_iter()
        )
        .is_ok());

        let err = ensure_revisions_released(
            [(1, DocState::Released), (2, DocState::Draft)].into_iter(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::RevisionInProgress { revision: 2, .. }
        ));
    }
}
