//! ECN record type - engineering change notes with CFT approval

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::approval::LineStatus;
use crate::core::entity::{EcnState, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// Where the change request originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOrigin {
    Customer,
    Internal,
    Supplier,
}

impl std::fmt::Display for ChangeOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeOrigin::Customer => write!(f, "customer"),
            ChangeOrigin::Internal => write!(f, "internal"),
            ChangeOrigin::Supplier => write!(f, "supplier"),
        }
    }
}

impl std::str::FromStr for ChangeOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "customer" => Ok(ChangeOrigin::Customer),
            "internal" => Ok(ChangeOrigin::Internal),
            "supplier" => Ok(ChangeOrigin::Supplier),
            _ => Err(format!(
                "Invalid origin: {}. Use customer, internal, or supplier",
                s
            )),
        }
    }
}

/// Disposition of material already produced to the old definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDisposition {
    pub scrapped: bool,
    pub quantity: u32,
    pub use_as_is: bool,
    pub convert_to_new_spec: bool,
}

/// Purpose-of-change checklist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PurposeOfChange {
    pub specification_change: bool,
    pub process_change: bool,
    pub quality_improvement: bool,
    pub cost_reduction: bool,
    pub standardisation: bool,
    pub sub_supplier_requirement: bool,
    pub machining_improvement: bool,
    pub customer_requirement: bool,
}

/// The eight feasibility impact questions plus the overall verdict
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityReview {
    /// 1. Can engineering performance specifications be met as written?
    pub specs_met: bool,
    /// 2. Is there adequate capacity to produce product?
    pub capacity_adequate: bool,
    /// 3. Can product be manufactured with Cpks that meet requirements?
    pub cpk_capable: bool,
    /// 4. Can statistical process control be applied to the product?
    pub spc_applicable: bool,
    /// 5. Does the design allow efficient material handling?
    pub material_handling_efficient: bool,
    /// 6. Costs for tooling?
    pub tooling_cost_acceptable: bool,
    /// 7. Costs for capital equipment?
    pub capital_cost_acceptable: bool,
    /// 8. Alternative manufacturing methods?
    pub alternative_methods: bool,

    pub feasible: bool,
    pub not_feasible: bool,
}

impl FeasibilityReview {
    /// True once the team has marked the change feasible or not
    pub fn is_assessed(&self) -> bool {
        self.feasible || self.not_feasible
    }
}

/// One CFT member's approval line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamApprovalLine {
    /// Member username
    pub member: String,

    /// Member's department, shown in missing-approval errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default)]
    pub status: LineStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl TeamApprovalLine {
    pub fn new(member: String, department: Option<String>) -> Self {
        Self {
            member,
            department,
            status: LineStatus::Pending,
            decision_date: None,
            comments: None,
        }
    }

    /// Reset the line back to pending, clearing date and comments
    pub fn reset(&mut self) {
        self.status = LineStatus::Pending;
        self.decision_date = None;
        self.comments = None;
    }
}

/// 4M root-cause category. One category per impact line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FourMCategory {
    Man,
    Machine,
    Material,
    Method,
    Measurement,
    Environment,
}

impl std::fmt::Display for FourMCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FourMCategory::Man => write!(f, "man"),
            FourMCategory::Machine => write!(f, "machine"),
            FourMCategory::Material => write!(f, "material"),
            FourMCategory::Method => write!(f, "method"),
            FourMCategory::Measurement => write!(f, "measurement"),
            FourMCategory::Environment => write!(f, "environment"),
        }
    }
}

/// Progress of one 4M impact action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImpactStatus {
    Open,
    #[default]
    NotStarted,
    InProgress,
    Closed,
}

/// One 4M impact assessment line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FourMImpactLine {
    /// Exactly one category per line
    pub category: FourMCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_plan: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,

    #[serde(default)]
    pub status: ImpactStatus,
}

/// One implementation-planning line, generated from the part's BOM
/// snapshot or entered manually when no BOM exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequiredLine {
    pub serial: u32,

    /// BOM component this line covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<EntityId>,

    /// Manually entered format name when the part has no BOM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,

    #[serde(default)]
    pub change_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,

    /// Field overrides to apply to the target on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_changes: Option<serde_json::Value>,

    /// Snapshot of the overridden fields, for rollback on rejection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_values: Option<serde_json::Value>,
}

/// Workflow actions recorded in the approval history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Submitted,
    StartedReview,
    FeasibilityCheck,
    CftApprovalRequested,
    Approved,
    Rejected,
    RequestedReview,
    ImplementationPlanning,
    ResetApprovals,
    Completed,
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HistoryAction::Submitted => "Submitted",
            HistoryAction::StartedReview => "Started Review",
            HistoryAction::FeasibilityCheck => "Moved to Feasibility Check",
            HistoryAction::CftApprovalRequested => "CFT Approval Requested",
            HistoryAction::Approved => "Approved",
            HistoryAction::Rejected => "Rejected",
            HistoryAction::RequestedReview => "Requested Review",
            HistoryAction::ImplementationPlanning => "Implementation Planning",
            HistoryAction::ResetApprovals => "Reset Approvals",
            HistoryAction::Completed => "Completed",
        };
        write!(f, "{}", label)
    }
}

/// One append-only approval-history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub action: HistoryAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Outcome of the CFT approval round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalStatus {
    Approved,
    Rejected,
}

/// An engineering change note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ecn {
    /// Unique identifier
    pub id: EntityId,

    /// ECN/ECR number (e.g. ECN-0007)
    pub number: String,

    /// Part being changed
    pub part: EntityId,

    /// Customer name
    pub customer: String,

    /// Other parts affected by the same change
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_parts: Vec<EntityId>,

    /// Document control record this ECN was raised from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<EntityId>,

    /// Proposer username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposer: Option<String>,

    /// Coordinator username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator: Option<String>,

    /// Proposer's department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Date the ECN was raised
    pub raised_on: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_completion_date: Option<NaiveDate>,

    /// Actual completion date, stamped when the ECN completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_completion_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ChangeOrigin>,

    /// Change description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed: Option<String>,

    #[serde(default)]
    pub disposition: MaterialDisposition,

    #[serde(default)]
    pub purpose: PurposeOfChange,

    #[serde(default)]
    pub feasibility: FeasibilityReview,

    /// Workflow state
    #[serde(default)]
    pub state: EcnState,

    /// CFT team approval lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<TeamApprovalLine>,

    /// 4M impact assessment lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impacts: Vec<FourMImpactLine>,

    /// Implementation-planning lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_required: Vec<ChangeRequiredLine>,

    /// Append-only approval history
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who raised this ECN)
    pub author: String,
}

impl Ecn {
    /// Create a new ECN in draft
    pub fn new(number: String, part: EntityId, customer: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Ecn),
            number,
            part,
            customer,
            related_parts: Vec::new(),
            document: None,
            proposer: None,
            coordinator: None,
            department: None,
            raised_on: Utc::now().date_naive(),
            start_date: None,
            target_completion_date: None,
            actual_completion_date: None,
            origin: None,
            description: None,
            existing: None,
            proposed: None,
            disposition: MaterialDisposition::default(),
            purpose: PurposeOfChange::default(),
            feasibility: FeasibilityReview::default(),
            state: EcnState::default(),
            team: Vec::new(),
            impacts: Vec::new(),
            change_required: Vec::new(),
            history: Vec::new(),
            completion_notes: None,
            created: Utc::now(),
            author,
        }
    }

    /// True when every team line is approved (false with no lines)
    pub fn all_approved(&self) -> bool {
        !self.team.is_empty() && self.team.iter().all(|l| l.status == LineStatus::Approved)
    }

    /// True when any team line is rejected
    pub fn any_rejected(&self) -> bool {
        self.team.iter().any(|l| l.status == LineStatus::Rejected)
    }

    /// True when any team line asks for another review
    pub fn any_review(&self) -> bool {
        self.team.iter().any(|l| l.status == LineStatus::Review)
    }

    /// Final status of the CFT round: approved wins over rejected only
    /// when every line approved
    pub fn final_status(&self) -> Option<FinalStatus> {
        if self.all_approved() {
            Some(FinalStatus::Approved)
        } else if self.any_rejected() {
            Some(FinalStatus::Rejected)
        } else {
            None
        }
    }

    /// The team line owned by a member, if any
    pub fn line_for_mut(&mut self, member: &str) -> Option<&mut TeamApprovalLine> {
        self.team
            .iter_mut()
            .find(|l| l.member.eq_ignore_ascii_case(member))
    }

    /// Departments whose members have not yet approved, deduplicated
    pub fn missing_departments(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .team
            .iter()
            .filter(|l| l.status != LineStatus::Approved)
            .map(|l| {
                l.department
                    .clone()
                    .unwrap_or_else(|| "Unknown Department".to_string())
            })
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Reset every team line to pending
    pub fn reset_team_lines(&mut self) {
        for line in &mut self.team {
            line.reset();
        }
    }

    /// Append an approval-history entry
    pub fn log(&mut self, actor: &str, action: HistoryAction, comments: Option<String>) {
        self.history.push(HistoryEntry {
            actor: actor.to_string(),
            timestamp: Utc::now(),
            action,
            comments,
        });
    }

    /// Usernames of all CFT members
    pub fn team_members(&self) -> Vec<String> {
        self.team.iter().map(|l| l.member.clone()).collect()
    }

    /// Early/on-time/late summary once both dates are known
    pub fn completion_status(&self) -> Option<String> {
        let target = self.target_completion_date?;
        let actual = self.actual_completion_date?;
        let days = (actual - target).num_days();
        Some(if days < 0 {
            format!("{} days early", -days)
        } else if days > 0 {
            format!("{} days late", days)
        } else {
            "On time".to_string()
        })
    }
}

impl Entity for Ecn {
    const PREFIX: &'static str = "ECN";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.number
    }

    fn state(&self) -> &str {
        match self.state {
            EcnState::Draft => "draft",
            EcnState::Submitted => "submitted",
            EcnState::UnderReview => "under_review",
            EcnState::FeasibilityCheck => "feasibility_check",
            EcnState::CftApproval => "cft_approval",
            EcnState::Implementation => "implementation",
            EcnState::Completed => "completed",
            EcnState::Rejected => "rejected",
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

    fn test_ecn() -> Ecn {
        Ecn::new(
            "ECN-0001".to_string(),
            EntityId::new(EntityPrefix::Part),
            "Acme Corp".to_string(),
            "test".to_string(),
        )
    }

    #[test]
    fn test_ecn_creation() {
        let ecn = test_ecn();
        assert!(ecn.id.to_string().starts_with("ECN-"));
        assert_eq!(ecn.state, EcnState::Draft);
        assert!(ecn.history.is_empty());
        assert!(ecn.final_status().is_none());
    }

    #[test]
    fn test_rollup_requires_every_line() {
        let mut ecn = test_ecn();
        ecn.team.push(TeamApprovalLine::new("a".to_string(), None));
        ecn.team.push(TeamApprovalLine::new("b".to_string(), None));

        assert!(!ecn.all_approved());

        ecn.line_for_mut("a").unwrap().status = LineStatus::Approved;
        assert!(!ecn.all_approved());

        ecn.line_for_mut("b").unwrap().status = LineStatus::Approved;
        assert!(ecn.all_approved());
        assert_eq!(ecn.final_status(), Some(FinalStatus::Approved));
    }

    #[test]
    fn test_rollup_empty_team_is_not_approved() {
        let ecn = test_ecn();
        assert!(!ecn.all_approved());
        assert!(!ecn.any_rejected());
    }

    #[test]
    fn test_rejection_sets_final_status() {
        let mut ecn = test_ecn();
        ecn.team.push(TeamApprovalLine::new("a".to_string(), None));
        ecn.team.push(TeamApprovalLine::new("b".to_string(), None));
        ecn.line_for_mut("a").unwrap().status = LineStatus::Rejected;

        assert!(ecn.any_rejected());
        assert_eq!(ecn.final_status(), Some(FinalStatus::Rejected));
    }

    #[test]
    fn test_missing_departments_dedup() {
        let mut ecn = test_ecn();
        ecn.team.push(TeamApprovalLine::new(
            "a".to_string(),
            Some("Quality".to_string()),
        ));
        ecn.team.push(TeamApprovalLine::new(
            "b".to_string(),
            Some("Quality".to_string()),
        ));
        ecn.team.push(TeamApprovalLine::new("c".to_string(), None));
        ecn.line_for_mut("c").unwrap().status = LineStatus::Approved;

        assert_eq!(ecn.missing_departments(), vec!["Quality"]);
    }

    #[test]
    fn test_reset_team_lines() {
        let mut ecn = test_ecn();
        let mut line = TeamApprovalLine::new("a".to_string(), None);
        line.status = LineStatus::Approved;
        line.comments = Some("ok".to_string());
        line.decision_date = Some(Utc::now().date_naive());
        ecn.team.push(line);

        ecn.reset_team_lines();
        let line = &ecn.team[0];
        assert_eq!(line.status, LineStatus::Pending);
        assert!(line.decision_date.is_none());
        assert!(line.comments.is_none());
    }

    #[test]
    fn test_completion_status() {
        let mut ecn = test_ecn();
        assert!(ecn.completion_status().is_none());

        ecn.target_completion_date = NaiveDate::from_ymd_opt(2024, 6, 10);
        ecn.actual_completion_date = NaiveDate::from_ymd_opt(2024, 6, 7);
        assert_eq!(ecn.completion_status().as_deref(), Some("3 days early"));

        ecn.actual_completion_date = NaiveDate::from_ymd_opt(2024, 6, 10);
        assert_eq!(ecn.completion_status().as_deref(), Some("On time"));

        ecn.actual_completion_date = NaiveDate::from_ymd_opt(2024, 6, 12);
        assert_eq!(ecn.completion_status().as_deref(), Some("2 days late"));
    }

    #[test]
    fn test_ecn_yaml_roundtrip() {
        let mut ecn = test_ecn();
        ecn.team.push(TeamApprovalLine::new(
            "a".to_string(),
            Some("Quality".to_string()),
        ));
        ecn.impacts.push(FourMImpactLine {
            category: FourMCategory::Material,
            action_plan: Some("Requalify supplier".to_string()),
            responsible: Some("a".to_string()),
            status: ImpactStatus::InProgress,
        });
        ecn.log("test", HistoryAction::Submitted, None);

        let yaml = serde_yml::to_string(&ecn).unwrap();
        let parsed: Ecn = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, ecn.id);
        assert_eq!(parsed.team.len(), 1);
        assert_eq!(parsed.impacts[0].category, FourMCategory::Material);
        assert_eq!(parsed.history.len(), 1);
    }
}
