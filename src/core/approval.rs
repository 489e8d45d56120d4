//! Approval records, line statuses, and aggregate rollups
//!
//! Two independent aggregates live here on purpose. Document and
//! revision approvals are set-based (a required-approver set against
//! granted approvals). Vendor document lines aggregate per-approver
//! decisions with an in_progress intermediate state. ECN team lines
//! use their own all/any rollup in the ECN workflow. The precedence
//! rules differ between these subsystems and must not be unified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::team::Role;

/// Approval granted on a document or revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub approver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Rejection recorded on a document or revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub rejector: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Status of one ECN team approval line
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    /// Member asked for another review round before deciding
    Review,
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineStatus::Pending => write!(f, "pending"),
            LineStatus::Approved => write!(f, "approved"),
            LineStatus::Rejected => write!(f, "rejected"),
            LineStatus::Review => write!(f, "review"),
        }
    }
}

/// Decision of one vendor-document approver
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Pending => write!(f, "pending"),
            DecisionStatus::Approved => write!(f, "approved"),
            DecisionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Aggregate status of a vendor document line
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatus {
    #[default]
    Pending,
    InProgress,
    Approved,
    Rejected,
}

impl std::fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateStatus::Pending => write!(f, "pending"),
            AggregateStatus::InProgress => write!(f, "in_progress"),
            AggregateStatus::Approved => write!(f, "approved"),
            AggregateStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Roll up per-approver decisions into a line status.
///
/// Precedence: rejected > approved (all) > in_progress (partial) > pending.
/// One decision entry is expected per assigned approver.
pub fn aggregate_decisions(decisions: &[DecisionStatus]) -> AggregateStatus {
    if decisions.is_empty() {
        return AggregateStatus::Pending;
    }
    if decisions.contains(&DecisionStatus::Rejected) {
        return AggregateStatus::Rejected;
    }
    if decisions.iter().all(|d| *d == DecisionStatus::Approved) {
        return AggregateStatus::Approved;
    }
    if decisions.contains(&DecisionStatus::Approved) {
        return AggregateStatus::InProgress;
    }
    AggregateStatus::Pending
}

/// Check whether a user already holds an approval
pub fn has_approved(approvals: &[ApprovalRecord], user: &str) -> bool {
    approvals
        .iter()
        .any(|a| a.approver.eq_ignore_ascii_case(user))
}

/// Check whether every required approver has granted approval
pub fn fully_approved(required: &[String], approvals: &[ApprovalRecord]) -> bool {
    !required.is_empty() && required.iter().all(|r| has_approved(approvals, r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approval(user: &str) -> ApprovalRecord {
        ApprovalRecord {
            approver: user.to_string(),
            role: None,
            timestamp: Utc::now(),
            comment: None,
        }
    }

    #[test]
    fn test_aggregate_empty_is_pending() {
        assert_eq!(aggregate_decisions(&[]), AggregateStatus::Pending);
    }

    #[test]
    fn test_aggregate_all_pending() {
        let d = [DecisionStatus::Pending, DecisionStatus::Pending];
        assert_eq!(aggregate_decisions(&d), AggregateStatus::Pending);
    }

    #[test]
    fn test_aggregate_rejection_wins() {
        let d = [
            DecisionStatus::Approved,
            DecisionStatus::Rejected,
            DecisionStatus::Pending,
        ];
        assert_eq!(aggregate_decisions(&d), AggregateStatus::Rejected);
    }

    #[test]
    fn test_aggregate_all_approved() {
        let d = [DecisionStatus::Approved, DecisionStatus::Approved];
        assert_eq!(aggregate_decisions(&d), AggregateStatus::Approved);
    }

    #[test]
    fn test_aggregate_partial_is_in_progress() {
        let d = [DecisionStatus::Approved, DecisionStatus::Pending];
        assert_eq!(aggregate_decisions(&d), AggregateStatus::InProgress);
    }

    #[test]
    fn test_fully_approved_requires_every_member() {
        let required = vec!["alice".to_string(), "bob".to_string()];

        let granted = vec![approval("alice")];
        assert!(!fully_approved(&required, &granted));

        let granted = vec![approval("alice"), approval("BOB")];
        assert!(fully_approved(&required, &granted));
    }

    #[test]
    fn test_fully_approved_empty_required_is_false() {
        assert!(!fully_approved(&[], &[approval("alice")]));
    }

    #[test]
    fn test_has_approved_case_insensitive() {
        let granted = vec![approval("Alice")];
        assert!(has_approved(&granted, "alice"));
        assert!(!has_approved(&granted, "bob"));
    }
}
