//! Rev command - document revision lifecycle

use clap::{Args, Subcommand};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{get_document, get_revision, resolve_actor, truncate_str};
use crate::core::entity::DocState;
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, save_entity};
use crate::core::outbox::{Notification, Outbox};
use crate::core::workflow::DocumentWorkflow;
use crate::core::{Config, Project, TeamRoster};
use crate::entities::revision::Revision;

/// Document revision management
#[derive(Debug, Subcommand)]
pub enum RevCommands {
    /// List revisions (optionally for one document)
    List(RevListArgs),
    /// Show one revision
    Show(RevShowArgs),
    /// Submit a draft revision for approval
    RequestApproval(RevRefArgs),
    /// Approve a revision pending approval
    Approve(RevApproveArgs),
    /// Release an approved revision and notify the distribution list
    Release(RevActorArgs),
    /// Cancel a revision that has not been released
    Cancel(RevRefArgs),
    /// Step a revision back one state
    Undo(RevRefArgs),
}

#[derive(Debug, Args)]
pub struct RevListArgs {
    /// Limit to one document (id, id prefix, or sequence number)
    #[arg(long)]
    pub document: Option<String>,

    /// Filter by state
    #[arg(long, short = 's')]
    pub state: Option<DocState>,
}

#[derive(Debug, Args)]
pub struct RevShowArgs {
    /// Revision id, id prefix, or "<doc>:<number>"
    pub id: String,

    /// Output format (yaml, json)
    #[arg(long, short = 'f', default_value = "yaml")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct RevRefArgs {
    /// Revision id, id prefix, or "<doc>:<number>"
    pub id: String,
}

#[derive(Debug, Args)]
pub struct RevActorArgs {
    /// Revision id, id prefix, or "<doc>:<number>"
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Debug, Args)]
pub struct RevApproveArgs {
    /// Revision id, id prefix, or "<doc>:<number>"
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Approval comment
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

pub fn run(cmd: RevCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RevCommands::List(args) => run_list(args),
        RevCommands::Show(args) => run_show(args),
        RevCommands::RequestApproval(args) => run_request_approval(args),
        RevCommands::Approve(args) => run_approve(args),
        RevCommands::Release(args) => run_release(args, global),
        RevCommands::Cancel(args) => run_cancel(args),
        RevCommands::Undo(args) => run_undo(args),
    }
}

fn run_list(args: RevListArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut revs: Vec<Revision> = load_all(&project, EntityPrefix::Rev);

    if let Some(ref doc_ref) = args.document {
        let doc = get_document(&project, doc_ref)?;
        revs.retain(|r| r.document == doc.id);
    }
    if let Some(state) = args.state {
        revs.retain(|r| r.state == state);
    }
    revs.sort_by(|a, b| a.document.to_string().cmp(&b.document.to_string()).then(a.number.cmp(&b.number)));

    if revs.is_empty() {
        println!("No revisions found.");
        return Ok(());
    }

    println!(
        "{:<5} {:<34} {:<18} {:<30} APPROVALS",
        "REV", "DOCUMENT", "STATE", "DESCRIPTION"
    );
    println!("{}", "-".repeat(100));
    for rev in &revs {
        println!(
            "{:<5} {:<34} {:<18} {:<30} {}/{}",
            rev.number,
            rev.document.to_string(),
            rev.state.to_string(),
            truncate_str(&rev.description, 28),
            rev.approvals.len(),
            rev.approvers.len(),
        );
    }
    Ok(())
}

fn run_show(args: RevShowArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let rev = get_revision(&project, &args.id)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&rev).into_diagnostic()?),
        _ => print!("{}", serde_yml::to_string(&rev).into_diagnostic()?),
    }
    Ok(())
}

fn run_request_approval(args: RevRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let engine = DocumentWorkflow::new(TeamRoster::load(&project));

    let mut rev = get_revision(&project, &args.id)?;
    engine.request_approval(&mut rev).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Rev, &rev)?;

    println!(
        "{} Revision {} submitted for approval ({} approvers required)",
        style("✓").green(),
        rev.number,
        rev.approvers.len()
    );
    Ok(())
}

fn run_approve(args: RevApproveArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();
    let roster = TeamRoster::load(&project);
    let actor = resolve_actor(&args.by, roster.as_ref(), &config);
    let engine = DocumentWorkflow::new(roster);

    let mut rev = get_revision(&project, &args.id)?;
    let done = engine
        .approve(&mut rev, &actor, args.message.as_deref())
        .into_diagnostic()?;
    if done {
        rev.stamp_approved(&actor);
    }
    save_entity(&project, EntityPrefix::Rev, &rev)?;

    if done {
        println!(
            "{} Revision {} approved by {} - all approvals received",
            style("✓").green(),
            rev.number,
            actor
        );
    } else {
        println!(
            "{} Revision {} approval recorded for {} ({}/{})",
            style("✓").green(),
            rev.number,
            actor,
            rev.approvals.len(),
            rev.approvers.len()
        );
    }
    Ok(())
}

fn run_release(args: RevActorArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();
    let roster = TeamRoster::load(&project);
    let actor = resolve_actor(&args.by, roster.as_ref(), &config);
    let engine = DocumentWorkflow::new(roster);

    let mut rev = get_revision(&project, &args.id)?;
    engine.release(&mut rev, &actor).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Rev, &rev)?;

    println!(
        "{} Revision {} released by {}",
        style("✓").green(),
        rev.number,
        actor
    );

    if !rev.release_to.is_empty() {
        let outbox = Outbox::open(&project).into_diagnostic()?;
        let mut ctx = tera::Context::new();
        ctx.insert("number", &rev.number);
        ctx.insert("document", &rev.document.to_string());
        ctx.insert("description", &rev.description);
        ctx.insert("released_by", &actor);
        let sent = outbox
            .send_all(Notification::RevisionReleased, &rev.release_to, &ctx)
            .into_diagnostic()?;
        if !global.quiet {
            println!("  Notified {} recipients", sent);
        }
    }
    Ok(())
}

fn run_cancel(args: RevRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let engine = DocumentWorkflow::new(TeamRoster::load(&project));

    let mut rev = get_revision(&project, &args.id)?;
    engine.cancel(&mut rev).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Rev, &rev)?;

    println!("{} Revision {} cancelled", style("✓").green(), rev.number);
    Ok(())
}

fn run_undo(args: RevRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let engine = DocumentWorkflow::new(TeamRoster::load(&project));

    let mut rev = get_revision(&project, &args.id)?;
    match engine.undo(&mut rev) {
        Some((from, to)) => {
            save_entity(&project, EntityPrefix::Rev, &rev)?;
            println!(
                "{} Revision {}: {} -> {}",
                style("✓").green(),
                rev.number,
                from,
                to
            );
        }
        None => {
            println!(
                "Revision {} is in '{}'; nothing to undo",
                rev.number, rev.state
            );
        }
    }
    Ok(())
}
