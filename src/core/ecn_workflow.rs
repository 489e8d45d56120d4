//! Workflow engine for engineering change notes
//!
//! Drives the eight-state ECN machine. Every forward transition
//! validates its required fields and appends an immutable history
//! entry; the CFT approval round aggregates per-member line statuses.

use chrono::Utc;
use thiserror::Error;

use crate::core::approval::LineStatus;
use crate::core::entity::EcnState;
use crate::core::identity::EntityId;
use crate::entities::ecn::{ChangeRequiredLine, Ecn, HistoryAction};
use crate::entities::part::{Part, PartFieldError};

/// Errors that can occur during ECN workflow operations
#[derive(Debug, Error)]
pub enum EcnWorkflowError {
    #[error("cannot {action} an ECN in '{current}' state (expected '{expected}')")]
    WrongState {
        action: &'static str,
        expected: EcnState,
        current: EcnState,
    },

    #[error("select a proposer before submitting")]
    MissingProposer,

    #[error("add CFT team members before submitting")]
    NoTeamMembers,

    #[error("provide a change description before starting review")]
    MissingDescription,

    #[error("mark the feasibility status before requesting CFT approval")]
    FeasibilityNotAssessed,

    #[error("{user} is not a CFT team member on this ECN")]
    NotATeamMember { user: String },

    #[error("{user} has already recorded a decision on this ECN")]
    AlreadyDecided { user: String },

    #[error("all team members must approve first; missing approvals from: {departments}")]
    MissingApprovals { departments: String },

    #[error(
        "no BOM found for this part; create a BOM first or link a document control record for manual entry"
    )]
    NoBomAvailable,

    #[error(transparent)]
    Field(#[from] PartFieldError),
}

/// Outcome of requesting CFT approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CftRequest {
    /// Approval round opened; team lines reset to pending
    Opened,
    /// The change was marked not feasible; take the reject path
    NotFeasible,
}

/// Outcome of one member's approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveOutcome {
    /// Other members are still outstanding
    Pending,
    /// Every line is approved
    AllApproved,
    /// Every line approved while in implementation: complete the ECN
    ReadyToComplete,
}

fn expect_state(
    ecn: &Ecn,
    action: &'static str,
    expected: EcnState,
) -> Result<(), EcnWorkflowError> {
    if ecn.state != expected {
        return Err(EcnWorkflowError::WrongState {
            action,
            expected,
            current: ecn.state,
        });
    }
    Ok(())
}

/// Submit the ECN for review
pub fn submit(ecn: &mut Ecn, actor: &str) -> Result<(), EcnWorkflowError> {
    expect_state(ecn, "submit", EcnState::Draft)?;
    if ecn.proposer.is_none() {
        return Err(EcnWorkflowError::MissingProposer);
    }
    if ecn.team.is_empty() {
        return Err(EcnWorkflowError::NoTeamMembers);
    }

    ecn.state = EcnState::Submitted;
    ecn.log(
        actor,
        HistoryAction::Submitted,
        Some("ECN/ECR submitted for review".to_string()),
    );
    Ok(())
}

/// Start the review process
pub fn start_review(ecn: &mut Ecn, actor: &str) -> Result<(), EcnWorkflowError> {
    expect_state(ecn, "start review on", EcnState::Submitted)?;
    if ecn.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
        return Err(EcnWorkflowError::MissingDescription);
    }

    ecn.state = EcnState::UnderReview;
    ecn.log(
        actor,
        HistoryAction::StartedReview,
        Some("Review process started".to_string()),
    );
    Ok(())
}

/// Move to the feasibility check stage
pub fn move_to_feasibility(ecn: &mut Ecn, actor: &str) -> Result<(), EcnWorkflowError> {
    expect_state(ecn, "move to feasibility", EcnState::UnderReview)?;

    ecn.state = EcnState::FeasibilityCheck;
    ecn.log(
        actor,
        HistoryAction::FeasibilityCheck,
        Some("Moved to feasibility check".to_string()),
    );
    Ok(())
}

/// Request cross-functional team approval.
///
/// Every team line resets to pending so the round starts clean. A
/// not-feasible verdict short-circuits to the reject path.
pub fn request_cft_approval(ecn: &mut Ecn, actor: &str) -> Result<CftRequest, EcnWorkflowError> {
    expect_state(ecn, "request CFT approval on", EcnState::FeasibilityCheck)?;
    if !ecn.feasibility.is_assessed() {
        return Err(EcnWorkflowError::FeasibilityNotAssessed);
    }
    if ecn.feasibility.not_feasible {
        return Ok(CftRequest::NotFeasible);
    }

    ecn.state = EcnState::CftApproval;
    ecn.reset_team_lines();
    ecn.log(
        actor,
        HistoryAction::CftApprovalRequested,
        Some("CFT approval requested".to_string()),
    );
    Ok(CftRequest::Opened)
}

/// Record one team member's approval on their line
pub fn approve(
    ecn: &mut Ecn,
    actor: &str,
    comment: Option<&str>,
) -> Result<ApproveOutcome, EcnWorkflowError> {
    if ecn.state != EcnState::CftApproval && ecn.state != EcnState::Implementation {
        return Err(EcnWorkflowError::WrongState {
            action: "approve",
            expected: EcnState::CftApproval,
            current: ecn.state,
        });
    }

    let line = ecn
        .line_for_mut(actor)
        .ok_or_else(|| EcnWorkflowError::NotATeamMember {
            user: actor.to_string(),
        })?;

    if line.status != LineStatus::Pending && line.status != LineStatus::Review {
        return Err(EcnWorkflowError::AlreadyDecided {
            user: actor.to_string(),
        });
    }

    line.status = LineStatus::Approved;
    line.decision_date = Some(Utc::now().date_naive());
    line.comments = comment.map(|c| c.to_string());

    let comments = comment.map(|c| c.to_string()).unwrap_or_else(|| "Approved".to_string());
    ecn.log(actor, HistoryAction::Approved, Some(comments));

    if ecn.all_approved() {
        if ecn.state == EcnState::Implementation {
            Ok(ApproveOutcome::ReadyToComplete)
        } else {
            Ok(ApproveOutcome::AllApproved)
        }
    } else {
        Ok(ApproveOutcome::Pending)
    }
}

/// A team member flags their line for another review round
pub fn request_review(
    ecn: &mut Ecn,
    actor: &str,
    comments: Option<&str>,
) -> Result<(), EcnWorkflowError> {
    let line = ecn
        .line_for_mut(actor)
        .ok_or_else(|| EcnWorkflowError::NotATeamMember {
            user: actor.to_string(),
        })?;

    line.status = LineStatus::Review;
    line.comments = comments.map(|c| c.to_string());

    ecn.log(
        actor,
        HistoryAction::RequestedReview,
        comments.map(|c| c.to_string()),
    );
    Ok(())
}

/// A team member rejects on their line
pub fn reject_line(
    ecn: &mut Ecn,
    actor: &str,
    comments: &str,
) -> Result<(), EcnWorkflowError> {
    let line = ecn
        .line_for_mut(actor)
        .ok_or_else(|| EcnWorkflowError::NotATeamMember {
            user: actor.to_string(),
        })?;

    if line.status == LineStatus::Approved || line.status == LineStatus::Rejected {
        return Err(EcnWorkflowError::AlreadyDecided {
            user: actor.to_string(),
        });
    }

    line.status = LineStatus::Rejected;
    line.decision_date = Some(Utc::now().date_naive());
    line.comments = Some(comments.to_string());

    ecn.log(actor, HistoryAction::Rejected, Some(comments.to_string()));
    Ok(())
}

/// Move an approved ECN into implementation planning.
///
/// Approval lines reset for the implementation review round and the
/// change-required lines regenerate from the part's BOM snapshot. With
/// no BOM, a linked document control record allows manual entry.
pub fn plan_implementation(
    ecn: &mut Ecn,
    actor: &str,
    part: &Part,
) -> Result<(), EcnWorkflowError> {
    expect_state(ecn, "plan implementation for", EcnState::CftApproval)?;
    if !ecn.all_approved() {
        return Err(EcnWorkflowError::MissingApprovals {
            departments: ecn.missing_departments().join(", "),
        });
    }

    ecn.reset_team_lines();
    ecn.log(
        actor,
        HistoryAction::ResetApprovals,
        Some("CFT approvals reset for implementation review".to_string()),
    );

    ecn.change_required.clear();
    if part.bom.is_empty() {
        if ecn.document.is_none() {
            return Err(EcnWorkflowError::NoBomAvailable);
        }
        // Manual entry against the linked document control record
    } else {
        for (index, bom_line) in part.bom.iter().enumerate() {
            ecn.change_required.push(ChangeRequiredLine {
                serial: index as u32 + 1,
                component: Some(bom_line.component.clone()),
                format_name: None,
                change_required: false,
                responsible: None,
                target_date: None,
                draft_changes: None,
                original_values: None,
            });
        }
    }

    ecn.state = EcnState::Implementation;
    ecn.log(
        actor,
        HistoryAction::ImplementationPlanning,
        Some("Moved to implementation planning".to_string()),
    );
    Ok(())
}

/// Stage a draft-change payload on a change-required line, snapshotting
/// the target's current values for rollback
pub fn save_draft_changes(
    line: &mut ChangeRequiredLine,
    target: &Part,
    payload: serde_json::Value,
) -> Result<(), EcnWorkflowError> {
    let keys: Vec<String> = payload
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();

    // Validate the payload against the target before staging it
    let mut probe = target.clone();
    probe.apply_field_overrides(&payload)?;

    line.original_values = Some(target.capture_fields(&keys));
    line.draft_changes = Some(payload);
    line.change_required = true;
    Ok(())
}

/// Complete the ECN, returning the draft-change payloads to apply to
/// their targets
pub fn complete(
    ecn: &mut Ecn,
    actor: &str,
    notes: &str,
) -> Result<Vec<(EntityId, serde_json::Value)>, EcnWorkflowError> {
    expect_state(ecn, "complete", EcnState::Implementation)?;
    if !ecn.all_approved() {
        return Err(EcnWorkflowError::MissingApprovals {
            departments: ecn.missing_departments().join(", "),
        });
    }

    let mut payloads = Vec::new();
    for line in &mut ecn.change_required {
        if line.change_required {
            if let Some(changes) = line.draft_changes.take() {
                payloads.push((ecn.part.clone(), changes));
                line.original_values = None;
            }
        }
    }

    ecn.state = EcnState::Completed;
    ecn.actual_completion_date = Some(Utc::now().date_naive());
    ecn.completion_notes = Some(notes.to_string());
    ecn.log(actor, HistoryAction::Completed, Some(notes.to_string()));
    Ok(payloads)
}

/// Reject the ECN, returning the original-value payloads to restore on
/// their targets
pub fn reject(
    ecn: &mut Ecn,
    actor: &str,
    notes: &str,
) -> Result<Vec<(EntityId, serde_json::Value)>, EcnWorkflowError> {
    if ecn.state == EcnState::Completed || ecn.state == EcnState::Rejected {
        return Err(EcnWorkflowError::WrongState {
            action: "reject",
            expected: EcnState::CftApproval,
            current: ecn.state,
        });
    }

    let mut payloads = Vec::new();
    for line in &mut ecn.change_required {
        if line.change_required {
            if let Some(originals) = line.original_values.take() {
                payloads.push((ecn.part.clone(), originals));
                line.draft_changes = None;
            }
        }
    }

    ecn.state = EcnState::Rejected;
    ecn.completion_notes = Some(notes.to_string());
    ecn.log(actor, HistoryAction::Rejected, Some(notes.to_string()));
    Ok(payloads)
}

/// Reset the ECN back to draft
pub fn reset_to_draft(ecn: &mut Ecn) {
    ecn.state = EcnState::Draft;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{EntityId, EntityPrefix};
    use crate::entities::ecn::TeamApprovalLine;
    use crate::entities::part::BomLine;

    fn test_part() -> Part {
        Part::new("PN-1001".to_string(), "Bracket".to_string(), "test".to_string())
    }

    fn test_ecn() -> Ecn {
        let mut ecn = Ecn::new(
            "ECN-0001".to_string(),
            EntityId::new(EntityPrefix::Part),
            "Acme Corp".to_string(),
            "test".to_string(),
        );
        ecn.proposer = Some("jsmith".to_string());
        ecn.description = Some("Switch fastener supplier".to_string());
        ecn.team.push(TeamApprovalLine::new(
            "alice".to_string(),
            Some("Quality".to_string()),
        ));
        ecn.team.push(TeamApprovalLine::new(
            "bob".to_string(),
            Some("Production".to_string()),
        ));
        ecn
    }

    fn ecn_at_cft() -> Ecn {
        let mut ecn = test_ecn();
        submit(&mut ecn, "jsmith").unwrap();
        start_review(&mut ecn, "jsmith").unwrap();
        move_to_feasibility(&mut ecn, "jsmith").unwrap();
        ecn.feasibility.feasible = true;
        assert_eq!(
            request_cft_approval(&mut ecn, "jsmith").unwrap(),
            CftRequest::Opened
        );
        ecn
    }

    #[test]
    fn test_submit_requires_proposer_and_team() {
        let mut ecn = test_ecn();
        ecn.proposer = None;
        assert!(matches!(
            submit(&mut ecn, "x").unwrap_err(),
            EcnWorkflowError::MissingProposer
        ));

        let mut ecn = test_ecn();
        ecn.team.clear();
        assert!(matches!(
            submit(&mut ecn, "x").unwrap_err(),
            EcnWorkflowError::NoTeamMembers
        ));

        let mut ecn = test_ecn();
        submit(&mut ecn, "jsmith").unwrap();
        assert_eq!(ecn.state, EcnState::Submitted);
        assert_eq!(ecn.history.len(), 1);
        assert_eq!(ecn.history[0].action, HistoryAction::Submitted);
    }

    #[test]
    fn test_start_review_requires_description() {
        let mut ecn = test_ecn();
        submit(&mut ecn, "jsmith").unwrap();
        ecn.description = None;
        assert!(matches!(
            start_review(&mut ecn, "x").unwrap_err(),
            EcnWorkflowError::MissingDescription
        ));
    }

    #[test]
    fn test_forward_transitions_validate_state() {
        let mut ecn = test_ecn();
        // Cannot start review from draft
        assert!(matches!(
            start_review(&mut ecn, "x").unwrap_err(),
            EcnWorkflowError::WrongState { .. }
        ));
        // Cannot submit twice
        submit(&mut ecn, "jsmith").unwrap();
        assert!(matches!(
            submit(&mut ecn, "jsmith").unwrap_err(),
            EcnWorkflowError::WrongState { .. }
        ));
    }

    #[test]
    fn test_cft_request_requires_feasibility() {
        let mut ecn = test_ecn();
        submit(&mut ecn, "jsmith").unwrap();
        start_review(&mut ecn, "jsmith").unwrap();
        move_to_feasibility(&mut ecn, "jsmith").unwrap();

        assert!(matches!(
            request_cft_approval(&mut ecn, "jsmith").unwrap_err(),
            EcnWorkflowError::FeasibilityNotAssessed
        ));

        ecn.feasibility.not_feasible = true;
        assert_eq!(
            request_cft_approval(&mut ecn, "jsmith").unwrap(),
            CftRequest::NotFeasible
        );
        // State unchanged on the reject path
        assert_eq!(ecn.state, EcnState::FeasibilityCheck);
    }

    #[test]
    fn test_approval_rollup_progression() {
        let mut ecn = ecn_at_cft();

        assert_eq!(
            approve(&mut ecn, "alice", Some("fine by QA")).unwrap(),
            ApproveOutcome::Pending
        );
        assert!(!ecn.all_approved());

        assert_eq!(
            approve(&mut ecn, "bob", None).unwrap(),
            ApproveOutcome::AllApproved
        );
        assert!(ecn.all_approved());
    }

    #[test]
    fn test_outsider_and_double_approval() {
        let mut ecn = ecn_at_cft();
        assert!(matches!(
            approve(&mut ecn, "mallory", None).unwrap_err(),
            EcnWorkflowError::NotATeamMember { .. }
        ));

        approve(&mut ecn, "alice", None).unwrap();
        assert!(matches!(
            approve(&mut ecn, "alice", None).unwrap_err(),
            EcnWorkflowError::AlreadyDecided { .. }
        ));
    }

    #[test]
    fn test_plan_implementation_needs_all_approved() {
        let mut ecn = ecn_at_cft();
        approve(&mut ecn, "alice", None).unwrap();

        let part = test_part();
        let err = plan_implementation(&mut ecn, "jsmith", &part).unwrap_err();
        match err {
            EcnWorkflowError::MissingApprovals { departments } => {
                assert!(departments.contains("Production"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_plan_implementation_snapshots_bom() {
        let mut ecn = ecn_at_cft();
        approve(&mut ecn, "alice", None).unwrap();
        approve(&mut ecn, "bob", None).unwrap();

        let mut part = test_part();
        part.bom.push(BomLine {
            component: EntityId::new(EntityPrefix::Part),
            quantity: 2.0,
            unit: "pcs".to_string(),
        });
        part.bom.push(BomLine {
            component: EntityId::new(EntityPrefix::Part),
            quantity: 8.0,
            unit: "pcs".to_string(),
        });

        plan_implementation(&mut ecn, "jsmith", &part).unwrap();
        assert_eq!(ecn.state, EcnState::Implementation);
        assert_eq!(ecn.change_required.len(), 2);
        assert_eq!(ecn.change_required[0].serial, 1);
        assert_eq!(ecn.change_required[1].serial, 2);
        // Approval lines reset for the implementation round
        assert!(!ecn.all_approved());
        assert!(ecn
            .history
            .iter()
            .any(|h| h.action == HistoryAction::ResetApprovals));
    }

    #[test]
    fn test_plan_implementation_without_bom_needs_document() {
        let mut ecn = ecn_at_cft();
        approve(&mut ecn, "alice", None).unwrap();
        approve(&mut ecn, "bob", None).unwrap();

        let part = test_part();
        assert!(matches!(
            plan_implementation(&mut ecn, "jsmith", &part).unwrap_err(),
            EcnWorkflowError::NoBomAvailable
        ));

        ecn.document = Some(EntityId::new(EntityPrefix::Doc));
        plan_implementation(&mut ecn, "jsmith", &part).unwrap();
        assert!(ecn.change_required.is_empty());
        assert_eq!(ecn.state, EcnState::Implementation);
    }

    #[test]
    fn test_final_approval_in_implementation_is_ready_to_complete() {
        let mut ecn = ecn_at_cft();
        approve(&mut ecn, "alice", None).unwrap();
        approve(&mut ecn, "bob", None).unwrap();

        let mut part = test_part();
        part.bom.push(BomLine {
            component: EntityId::new(EntityPrefix::Part),
            quantity: 1.0,
            unit: "pcs".to_string(),
        });
        plan_implementation(&mut ecn, "jsmith", &part).unwrap();

        assert_eq!(
            approve(&mut ecn, "alice", None).unwrap(),
            ApproveOutcome::Pending
        );
        assert_eq!(
            approve(&mut ecn, "bob", None).unwrap(),
            ApproveOutcome::ReadyToComplete
        );
    }

    #[test]
    fn test_complete_applies_draft_changes() {
        let mut ecn = ecn_at_cft();
        approve(&mut ecn, "alice", None).unwrap();
        approve(&mut ecn, "bob", None).unwrap();

        let mut part = test_part();
        part.technical.raw_material = Some("AISI 201".to_string());
        part.bom.push(BomLine {
            component: EntityId::new(EntityPrefix::Part),
            quantity: 1.0,
            unit: "pcs".to_string(),
        });
        plan_implementation(&mut ecn, "jsmith", &part).unwrap();

        let payload = serde_json::json!({ "raw_material": "AISI 304" });
        save_draft_changes(&mut ecn.change_required[0], &part, payload).unwrap();
        assert_eq!(
            ecn.change_required[0]
                .original_values
                .as_ref()
                .unwrap()
                .get("raw_material")
                .unwrap(),
            "AISI 201"
        );

        approve(&mut ecn, "alice", None).unwrap();
        approve(&mut ecn, "bob", None).unwrap();

        let payloads = complete(&mut ecn, "jsmith", "Rolled out to line 2").unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(ecn.state, EcnState::Completed);
        assert!(ecn.actual_completion_date.is_some());

        let mut target = part.clone();
        target.apply_field_overrides(&payloads[0].1).unwrap();
        assert_eq!(target.technical.raw_material.as_deref(), Some("AISI 304"));
    }

    #[test]
    fn test_reject_restores_original_values() {
        let mut ecn = ecn_at_cft();
        approve(&mut ecn, "alice", None).unwrap();
        approve(&mut ecn, "bob", None).unwrap();

        let mut part = test_part();
        part.technical.raw_material = Some("AISI 201".to_string());
        part.bom.push(BomLine {
            component: EntityId::new(EntityPrefix::Part),
            quantity: 1.0,
            unit: "pcs".to_string(),
        });
        plan_implementation(&mut ecn, "jsmith", &part).unwrap();

        let payload = serde_json::json!({ "raw_material": "AISI 304" });
        save_draft_changes(&mut ecn.change_required[0], &part, payload).unwrap();

        let payloads = reject(&mut ecn, "jsmith", "Cost impact too high").unwrap();
        assert_eq!(ecn.state, EcnState::Rejected);
        assert_eq!(payloads.len(), 1);
        assert_eq!(
            payloads[0].1.get("raw_material").unwrap(),
            "AISI 201"
        );
    }

    #[test]
    fn test_reject_terminal_states() {
        let mut ecn = test_ecn();
        ecn.state = EcnState::Completed;
        assert!(matches!(
            reject(&mut ecn, "x", "notes").unwrap_err(),
            EcnWorkflowError::WrongState { .. }
        ));
    }

    #[test]
    fn test_save_draft_changes_validates_fields() {
        let part = test_part();
        let mut line = ChangeRequiredLine {
            serial: 1,
            component: None,
            format_name: Some("Control Plan".to_string()),
            change_required: false,
            responsible: None,
            target_date: None,
            draft_changes: None,
            original_values: None,
        };

        let bad = serde_json::json!({ "weight": "12kg" });
        assert!(save_draft_changes(&mut line, &part, bad).is_err());
        assert!(line.draft_changes.is_none());
    }

    #[test]
    fn test_request_review_marks_line() {
        let mut ecn = ecn_at_cft();
        request_review(&mut ecn, "alice", Some("needs tooling input")).unwrap();
        assert!(ecn.any_review());
        assert!(ecn
            .history
            .iter()
            .any(|h| h.action == HistoryAction::RequestedReview));
    }

    #[test]
    fn test_reject_line_sets_rollup() {
        let mut ecn = ecn_at_cft();
        reject_line(&mut ecn, "bob", "Tooling cost too high").unwrap();
        assert!(ecn.any_rejected());
        assert!(matches!(
            reject_line(&mut ecn, "bob", "again").unwrap_err(),
            EcnWorkflowError::AlreadyDecided { .. }
        ));
    }
}
