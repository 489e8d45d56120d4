//! Ecn command - engineering change note workflow

use clap::{Args, Subcommand, ValueEnum};
use console::style;
use dialoguer::Input;
use miette::{bail, IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{get_document, get_ecn, get_part, resolve_actor, truncate_str};
use crate::core::ecn_workflow::{self, ApproveOutcome, CftRequest};
use crate::core::entity::EcnState;
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, save_entity};
use crate::core::outbox::{Notification, Outbox};
use crate::core::sequence::SequenceIndex;
use crate::core::{Config, Project, TeamRoster};
use crate::entities::ecn::{
    ChangeOrigin, Ecn, FourMCategory, FourMImpactLine, ImpactStatus, TeamApprovalLine,
};
use crate::entities::part::Part;

/// Engineering change note workflow
#[derive(Debug, Subcommand)]
pub enum EcnCommands {
    /// Raise a new ECN
    New(EcnNewArgs),
    /// List ECNs
    List(EcnListArgs),
    /// Show one ECN
    Show(EcnShowArgs),
    /// Add a CFT team member line
    AddMember(EcnAddMemberArgs),
    /// Add a 4M impact line
    AddImpact(EcnAddImpactArgs),
    /// Submit the ECN for review
    Submit(EcnActorArgs),
    /// Start the review process
    StartReview(EcnActorArgs),
    /// Move to the feasibility check stage
    Feasibility(EcnActorArgs),
    /// Record the feasibility verdict
    Assess(EcnAssessArgs),
    /// Request cross-functional team approval
    RequestCft(EcnRequestCftArgs),
    /// Approve on your CFT line
    Approve(EcnApproveArgs),
    /// Flag your CFT line for another review round
    Review(EcnCommentArgs),
    /// Reject on your CFT line
    RejectLine(EcnReasonArgs),
    /// Move to implementation planning (regenerates lines from the BOM)
    Plan(EcnActorArgs),
    /// Stage draft changes on a change-required line
    Stage(EcnStageArgs),
    /// Complete the ECN and apply staged changes
    Complete(EcnNotesArgs),
    /// Reject the ECN and roll back staged changes
    Reject(EcnNotesArgs),
    /// Reset the ECN to draft
    Reset(EcnRefArgs),
    /// Show the approval history
    History(EcnRefArgs),
}

#[derive(Debug, Args)]
pub struct EcnNewArgs {
    /// Part reference (id, id prefix, or part number)
    #[arg(long)]
    pub part: String,

    /// Customer name
    #[arg(long)]
    pub customer: String,

    /// Proposer username
    #[arg(long)]
    pub proposer: Option<String>,

    /// Coordinator username
    #[arg(long)]
    pub coordinator: Option<String>,

    /// Change description
    #[arg(long)]
    pub description: Option<String>,

    /// Where the change request came from
    #[arg(long)]
    pub origin: Option<ChangeOriginArg>,

    /// Document control record this ECN was raised from
    #[arg(long)]
    pub document: Option<String>,

    /// Target completion date (YYYY-MM-DD)
    #[arg(long)]
    pub target: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ChangeOriginArg {
    Customer,
    Internal,
    Supplier,
}

impl From<ChangeOriginArg> for ChangeOrigin {
    fn from(arg: ChangeOriginArg) -> Self {
        match arg {
            ChangeOriginArg::Customer => ChangeOrigin::Customer,
            ChangeOriginArg::Internal => ChangeOrigin::Internal,
            ChangeOriginArg::Supplier => ChangeOrigin::Supplier,
        }
    }
}

#[derive(Debug, Args)]
pub struct EcnListArgs {
    /// Filter by state
    #[arg(long, short = 's')]
    pub state: Option<EcnState>,
}

#[derive(Debug, Args)]
pub struct EcnShowArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Output format (yaml, json)
    #[arg(long, short = 'f', default_value = "yaml")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct EcnRefArgs {
    /// ECN id, id prefix, or number
    pub id: String,
}

#[derive(Debug, Args)]
pub struct EcnActorArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Debug, Args)]
pub struct EcnAddMemberArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Member username
    #[arg(long)]
    pub member: String,

    /// Department (default: from the team roster)
    #[arg(long)]
    pub department: Option<String>,
}

#[derive(Debug, Args)]
pub struct EcnAddImpactArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// 4M category (exactly one per line)
    #[arg(long)]
    pub category: FourMCategory,

    /// Action plan
    #[arg(long)]
    pub action_plan: Option<String>,

    /// Responsible username
    #[arg(long)]
    pub responsible: Option<String>,
}

#[derive(Debug, Args)]
pub struct EcnAssessArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Feasibility verdict
    #[arg(long)]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Verdict {
    Feasible,
    NotFeasible,
}

#[derive(Debug, Args)]
pub struct EcnRequestCftArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Rejection notes, used when the change was marked not feasible
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct EcnApproveArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Approval comment
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

#[derive(Debug, Args)]
pub struct EcnCommentArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Comments
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

#[derive(Debug, Args)]
pub struct EcnReasonArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Rejection reason
    #[arg(long)]
    pub reason: String,
}

#[derive(Debug, Args)]
pub struct EcnStageArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Change-required line serial
    #[arg(long)]
    pub line: u32,

    /// Field overrides as key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Responsible username for the line
    #[arg(long)]
    pub responsible: Option<String>,

    /// Target date for the line (YYYY-MM-DD)
    #[arg(long)]
    pub target: Option<chrono::NaiveDate>,
}

#[derive(Debug, Args)]
pub struct EcnNotesArgs {
    /// ECN id, id prefix, or number
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Completion/rejection notes
    #[arg(long)]
    pub notes: Option<String>,
}

pub fn run(cmd: EcnCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EcnCommands::New(args) => run_new(args),
        EcnCommands::List(args) => run_list(args),
        EcnCommands::Show(args) => run_show(args),
        EcnCommands::AddMember(args) => run_add_member(args),
        EcnCommands::AddImpact(args) => run_add_impact(args),
        EcnCommands::Submit(args) => run_submit(args, global),
        EcnCommands::StartReview(args) => run_start_review(args),
        EcnCommands::Feasibility(args) => run_feasibility(args),
        EcnCommands::Assess(args) => run_assess(args),
        EcnCommands::RequestCft(args) => run_request_cft(args, global),
        EcnCommands::Approve(args) => run_approve(args),
        EcnCommands::Review(args) => run_review(args),
        EcnCommands::RejectLine(args) => run_reject_line(args),
        EcnCommands::Plan(args) => run_plan(args, global),
        EcnCommands::Stage(args) => run_stage(args),
        EcnCommands::Complete(args) => run_complete(args),
        EcnCommands::Reject(args) => run_reject(args, global),
        EcnCommands::Reset(args) => run_reset(args),
        EcnCommands::History(args) => run_history(args),
    }
}

fn load_context(args_by: &Option<String>) -> Result<(Project, Config, Option<TeamRoster>, String)> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();
    let roster = TeamRoster::load(&project);
    let actor = resolve_actor(args_by, roster.as_ref(), &config);
    Ok((project, config, roster, actor))
}

fn notify_team(
    project: &Project,
    ecn: &Ecn,
    kind: Notification,
    comments: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let recipients = ecn.team_members();
    if recipients.is_empty() {
        return Ok(());
    }

    let outbox = Outbox::open(project).into_diagnostic()?;
    let mut ctx = tera::Context::new();
    ctx.insert("number", &ecn.number);
    ctx.insert("state", &ecn.state.to_string());
    ctx.insert("comments", comments.unwrap_or(""));
    let sent = outbox.send_all(kind, &recipients, &ctx).into_diagnostic()?;
    if !quiet {
        println!("  Notified {} team members", sent);
    }
    Ok(())
}

fn run_new(args: EcnNewArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();

    let part = get_part(&project, &args.part)?;
    let mut sequences = SequenceIndex::load(&project);
    let number = sequences.next(EntityPrefix::Ecn);

    let mut ecn = Ecn::new(number, part.id.clone(), args.customer, config.author());
    ecn.proposer = args.proposer;
    ecn.coordinator = args.coordinator;
    ecn.description = args.description;
    ecn.origin = args.origin.map(Into::into);
    ecn.target_completion_date = args.target;
    if let Some(ref doc_ref) = args.document {
        ecn.document = Some(get_document(&project, doc_ref)?.id);
    }

    // Department follows the proposer when the roster knows them
    if let (Some(roster), Some(proposer)) = (TeamRoster::load(&project), ecn.proposer.as_deref()) {
        ecn.department = roster.department_of(proposer).map(|d| d.to_string());
    }

    save_entity(&project, EntityPrefix::Ecn, &ecn)?;
    sequences.save(&project).into_diagnostic()?;

    println!(
        "{} Raised {} for part {} ({})",
        style("✓").green(),
        ecn.number,
        part.part_number,
        ecn.id
    );
    Ok(())
}

fn run_list(args: EcnListArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut ecns: Vec<Ecn> = load_all(&project, EntityPrefix::Ecn);
    ecns.sort_by(|a, b| a.number.cmp(&b.number));

    if let Some(state) = args.state {
        ecns.retain(|e| e.state == state);
    }

    if ecns.is_empty() {
        println!("No ECNs found.");
        return Ok(());
    }

    println!(
        "{:<10} {:<18} {:<20} {:<12} TEAM",
        "NUMBER", "STATE", "CUSTOMER", "RAISED"
    );
    println!("{}", "-".repeat(72));
    for ecn in &ecns {
        let approved = ecn
            .team
            .iter()
            .filter(|l| l.status == crate::core::LineStatus::Approved)
            .count();
        println!(
            "{:<10} {:<18} {:<20} {:<12} {}/{}",
            ecn.number,
            ecn.state.to_string(),
            truncate_str(&ecn.customer, 18),
            ecn.raised_on.to_string(),
            approved,
            ecn.team.len(),
        );
    }
    Ok(())
}

fn run_show(args: EcnShowArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let ecn = get_ecn(&project, &args.id)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&ecn).into_diagnostic()?),
        _ => print!("{}", serde_yml::to_string(&ecn).into_diagnostic()?),
    }
    if let Some(status) = ecn.completion_status() {
        println!("# completion: {}", status);
    }
    Ok(())
}

fn run_add_member(args: EcnAddMemberArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut ecn = get_ecn(&project, &args.id)?;

    if ecn.line_for_mut(&args.member).is_some() {
        bail!("{} is already on the CFT team of {}", args.member, ecn.number);
    }

    let department = args.department.or_else(|| {
        TeamRoster::load(&project)
            .and_then(|r| r.department_of(&args.member).map(|d| d.to_string()))
    });

    ecn.team
        .push(TeamApprovalLine::new(args.member.clone(), department));
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!(
        "{} Added {} to the CFT team of {} ({} members)",
        style("✓").green(),
        args.member,
        ecn.number,
        ecn.team.len()
    );
    Ok(())
}

fn run_add_impact(args: EcnAddImpactArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut ecn = get_ecn(&project, &args.id)?;

    ecn.impacts.push(FourMImpactLine {
        category: args.category,
        action_plan: args.action_plan,
        responsible: args.responsible,
        status: ImpactStatus::NotStarted,
    });
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!(
        "{} Added {} impact line to {}",
        style("✓").green(),
        args.category,
        ecn.number
    );
    Ok(())
}

fn run_submit(args: EcnActorArgs, global: &GlobalOpts) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    ecn_workflow::submit(&mut ecn, &actor).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!("{} {} submitted for review", style("✓").green(), ecn.number);
    notify_team(&project, &ecn, Notification::EcnSubmitted, None, global.quiet)
}

fn run_start_review(args: EcnActorArgs) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    ecn_workflow::start_review(&mut ecn, &actor).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!("{} {} is under review", style("✓").green(), ecn.number);
    Ok(())
}

fn run_feasibility(args: EcnActorArgs) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    ecn_workflow::move_to_feasibility(&mut ecn, &actor).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!(
        "{} {} moved to feasibility check",
        style("✓").green(),
        ecn.number
    );
    Ok(())
}

fn run_assess(args: EcnAssessArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut ecn = get_ecn(&project, &args.id)?;

    match args.verdict {
        Verdict::Feasible => {
            ecn.feasibility.feasible = true;
            ecn.feasibility.not_feasible = false;
        }
        Verdict::NotFeasible => {
            ecn.feasibility.feasible = false;
            ecn.feasibility.not_feasible = true;
        }
    }
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!(
        "{} {} marked {}",
        style("✓").green(),
        ecn.number,
        match args.verdict {
            Verdict::Feasible => "feasible",
            Verdict::NotFeasible => "not feasible",
        }
    );
    Ok(())
}

fn run_request_cft(args: EcnRequestCftArgs, global: &GlobalOpts) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    match ecn_workflow::request_cft_approval(&mut ecn, &actor).into_diagnostic()? {
        CftRequest::Opened => {
            save_entity(&project, EntityPrefix::Ecn, &ecn)?;
            println!(
                "{} {} waiting for CFT approval ({} lines reset to pending)",
                style("✓").green(),
                ecn.number,
                ecn.team.len()
            );
            notify_team(
                &project,
                &ecn,
                Notification::EcnStatusUpdate,
                None,
                global.quiet,
            )
        }
        CftRequest::NotFeasible => {
            // Not feasible: the request becomes a rejection
            let notes = match args.notes {
                Some(notes) => notes,
                None => Input::new()
                    .with_prompt("Change is marked not feasible. Rejection notes")
                    .interact_text()
                    .into_diagnostic()?,
            };
            let payloads = ecn_workflow::reject(&mut ecn, &actor, &notes).into_diagnostic()?;
            restore_payloads(&project, payloads)?;
            save_entity(&project, EntityPrefix::Ecn, &ecn)?;
            println!(
                "{} {} rejected (not feasible)",
                style("✗").red(),
                ecn.number
            );
            notify_team(
                &project,
                &ecn,
                Notification::EcnStatusUpdate,
                Some(&notes),
                global.quiet,
            )
        }
    }
}

fn run_approve(args: EcnApproveArgs) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    let outcome =
        ecn_workflow::approve(&mut ecn, &actor, args.message.as_deref()).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    match outcome {
        ApproveOutcome::Pending => {
            let missing = ecn.missing_departments();
            println!(
                "{} {} approval recorded for {}; waiting on: {}",
                style("✓").green(),
                ecn.number,
                actor,
                missing.join(", ")
            );
        }
        ApproveOutcome::AllApproved => {
            println!(
                "{} {} fully approved by the CFT - run 'mct ecn plan {}' next",
                style("✓").green(),
                ecn.number,
                ecn.number
            );
        }
        ApproveOutcome::ReadyToComplete => {
            println!(
                "{} {} implementation approved by all members - run 'mct ecn complete {}' to finish",
                style("✓").green(),
                ecn.number,
                ecn.number
            );
        }
    }
    Ok(())
}

fn run_review(args: EcnCommentArgs) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    ecn_workflow::request_review(&mut ecn, &actor, args.message.as_deref()).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!(
        "{} {} flagged for another review round by {}",
        style("✓").green(),
        ecn.number,
        actor
    );
    Ok(())
}

fn run_reject_line(args: EcnReasonArgs) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    ecn_workflow::reject_line(&mut ecn, &actor, &args.reason).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!(
        "{} {} rejected on {}'s line: {}",
        style("✗").red(),
        ecn.number,
        actor,
        args.reason
    );
    Ok(())
}

fn run_plan(args: EcnActorArgs, global: &GlobalOpts) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;
    let part = get_part(&project, &ecn.part.to_string())?;

    ecn_workflow::plan_implementation(&mut ecn, &actor, &part).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    if ecn.change_required.is_empty() {
        println!(
            "{} {} in implementation planning (no BOM; add lines manually via 'mct ecn stage')",
            style("✓").green(),
            ecn.number
        );
    } else {
        println!(
            "{} {} in implementation planning ({} change-required lines from BOM)",
            style("✓").green(),
            ecn.number,
            ecn.change_required.len()
        );
    }
    notify_team(
        &project,
        &ecn,
        Notification::EcnImplementation,
        None,
        global.quiet,
    )
}

fn run_stage(args: EcnStageArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut ecn = get_ecn(&project, &args.id)?;
    let part = get_part(&project, &ecn.part.to_string())?;

    let mut payload = serde_json::Map::new();
    for pair in &args.set {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid --set '{}'; expected KEY=VALUE", pair);
        };
        payload.insert(
            key.trim().to_string(),
            serde_json::Value::String(value.trim().to_string()),
        );
    }
    if payload.is_empty() {
        bail!("nothing to stage; pass at least one --set KEY=VALUE");
    }

    let index = match ecn
        .change_required
        .iter()
        .position(|l| l.serial == args.line)
    {
        Some(index) => index,
        None => {
            // Manual entry when the part had no BOM snapshot
            ecn.change_required.push(crate::entities::ecn::ChangeRequiredLine {
                serial: args.line,
                component: None,
                format_name: Some(part.part_number.clone()),
                change_required: false,
                responsible: None,
                target_date: None,
                draft_changes: None,
                original_values: None,
            });
            ecn.change_required.len() - 1
        }
    };
    let line = &mut ecn.change_required[index];

    if let Some(responsible) = args.responsible {
        line.responsible = Some(responsible);
    }
    if let Some(target) = args.target {
        line.target_date = Some(target);
    }

    ecn_workflow::save_draft_changes(line, &part, serde_json::Value::Object(payload))
        .into_diagnostic()?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!(
        "{} Staged draft changes on line {} of {}",
        style("✓").green(),
        args.line,
        ecn.number
    );
    Ok(())
}

fn run_complete(args: EcnNotesArgs) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    let notes = match args.notes {
        Some(notes) => notes,
        None => Input::new()
            .with_prompt("Completion notes")
            .interact_text()
            .into_diagnostic()?,
    };

    let payloads = ecn_workflow::complete(&mut ecn, &actor, &notes).into_diagnostic()?;
    let applied = apply_payloads(&project, payloads)?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!("{} {} completed", style("✓").green(), ecn.number);
    if applied > 0 {
        println!("  Applied {} staged change set(s)", applied);
    }
    if let Some(status) = ecn.completion_status() {
        println!("  Completion: {}", status);
    }
    Ok(())
}

fn run_reject(args: EcnNotesArgs, global: &GlobalOpts) -> Result<()> {
    let (project, _, _, actor) = load_context(&args.by)?;
    let mut ecn = get_ecn(&project, &args.id)?;

    let notes = match args.notes {
        Some(notes) => notes,
        None => Input::new()
            .with_prompt("Rejection notes")
            .interact_text()
            .into_diagnostic()?,
    };

    let payloads = ecn_workflow::reject(&mut ecn, &actor, &notes).into_diagnostic()?;
    let restored = restore_payloads(&project, payloads)?;
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!("{} {} rejected", style("✗").red(), ecn.number);
    if restored > 0 {
        println!("  Restored {} original value set(s)", restored);
    }
    notify_team(
        &project,
        &ecn,
        Notification::EcnStatusUpdate,
        Some(&notes),
        global.quiet,
    )
}

fn run_reset(args: EcnRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut ecn = get_ecn(&project, &args.id)?;

    ecn_workflow::reset_to_draft(&mut ecn);
    save_entity(&project, EntityPrefix::Ecn, &ecn)?;

    println!("{} {} reset to draft", style("✓").green(), ecn.number);
    Ok(())
}

fn run_history(args: EcnRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let ecn = get_ecn(&project, &args.id)?;

    if ecn.history.is_empty() {
        println!("{} has no history entries yet.", ecn.number);
        return Ok(());
    }

    println!("Approval history for {}:\n", ecn.number);
    for entry in &ecn.history {
        println!(
            "  {}  {:<26} {}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.action.to_string(),
            entry.actor,
            entry.comments.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Apply staged change payloads to their target parts
fn apply_payloads(
    project: &Project,
    payloads: Vec<(crate::core::EntityId, serde_json::Value)>,
) -> Result<usize> {
    let count = payloads.len();
    for (part_id, payload) in payloads {
        let mut part: Part = get_part(project, &part_id.to_string())?;
        part.apply_field_overrides(&payload).into_diagnostic()?;
        save_entity(project, EntityPrefix::Part, &part)?;
    }
    Ok(count)
}

/// Restore original-value payloads on their target parts
fn restore_payloads(
    project: &Project,
    payloads: Vec<(crate::core::EntityId, serde_json::Value)>,
) -> Result<usize> {
    apply_payloads(project, payloads)
}
