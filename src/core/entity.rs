//! Entity trait - common interface for all record types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::EntityId;

/// Common trait for all MCT records
pub trait Entity: Serialize + DeserializeOwned {
    /// The record type prefix (e.g., "DOC", "ECN")
    const PREFIX: &'static str;

    /// Get the record's unique ID
    fn id(&self) -> &EntityId;

    /// Get the record's display title
    fn title(&self) -> &str;

    /// Get the record's lifecycle state as a string
    fn state(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the author
    fn author(&self) -> &str;
}

/// Lifecycle states for controlled documents and revisions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum DocState {
    #[default]
    Draft,
    PendingApproval,
    Approved,
    Released,
    Cancelled,
}

impl std::fmt::Display for DocState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocState::Draft => write!(f, "draft"),
            DocState::PendingApproval => write!(f, "pending_approval"),
            DocState::Approved => write!(f, "approved"),
            DocState::Released => write!(f, "released"),
            DocState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for DocState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(DocState::Draft),
            "pending_approval" => Ok(DocState::PendingApproval),
            "approved" => Ok(DocState::Approved),
            "released" => Ok(DocState::Released),
            "cancelled" => Ok(DocState::Cancelled),
            _ => Err(format!("Unknown state: {}", s)),
        }
    }
}

/// Workflow states for engineering change notes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum EcnState {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    FeasibilityCheck,
    CftApproval,
    Implementation,
    Completed,
    Rejected,
}

impl std::fmt::Display for EcnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EcnState::Draft => write!(f, "draft"),
            EcnState::Submitted => write!(f, "submitted"),
            EcnState::UnderReview => write!(f, "under_review"),
            EcnState::FeasibilityCheck => write!(f, "feasibility_check"),
            EcnState::CftApproval => write!(f, "cft_approval"),
            EcnState::Implementation => write!(f, "implementation"),
            EcnState::Completed => write!(f, "completed"),
            EcnState::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for EcnState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(EcnState::Draft),
            "submitted" => Ok(EcnState::Submitted),
            "under_review" => Ok(EcnState::UnderReview),
            "feasibility_check" => Ok(EcnState::FeasibilityCheck),
            "cft_approval" => Ok(EcnState::CftApproval),
            "implementation" => Ok(EcnState::Implementation),
            "completed" => Ok(EcnState::Completed),
            "rejected" => Ok(EcnState::Rejected),
            _ => Err(format!("Unknown state: {}", s)),
        }
    }
}

/// Stages for vendor document submissions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum VendorStage {
    #[default]
    Submitted,
    QualityReview,
    Approval,
    Integrated,
}

impl std::fmt::Display for VendorStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VendorStage::Submitted => write!(f, "submitted"),
            VendorStage::QualityReview => write!(f, "quality_review"),
            VendorStage::Approval => write!(f, "approval"),
            VendorStage::Integrated => write!(f, "integrated"),
        }
    }
}

impl std::str::FromStr for VendorStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "submitted" => Ok(VendorStage::Submitted),
            "quality_review" => Ok(VendorStage::QualityReview),
            "approval" => Ok(VendorStage::Approval),
            "integrated" => Ok(VendorStage::Integrated),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_state_roundtrip() {
        for state in [
            DocState::Draft,
            DocState::PendingApproval,
            DocState::Approved,
            DocState::Released,
            DocState::Cancelled,
        ] {
            let parsed: DocState = state.to_string().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_ecn_state_roundtrip() {
        for state in [
            EcnState::Draft,
            EcnState::Submitted,
            EcnState::UnderReview,
            EcnState::FeasibilityCheck,
            EcnState::CftApproval,
            EcnState::Implementation,
            EcnState::Completed,
            EcnState::Rejected,
        ] {
            let parsed: EcnState = state.to_string().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_unknown_state_fails() {
        assert!("limbo".parse::<DocState>().is_err());
        assert!("limbo".parse::<EcnState>().is_err());
        assert!("limbo".parse::<VendorStage>().is_err());
    }
}
