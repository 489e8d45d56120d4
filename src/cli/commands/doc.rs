//! Doc command - controlled document lifecycle

use clap::{Args, Subcommand};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{get_document, get_part, resolve_actor, truncate_str};
use crate::core::entity::DocState;
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, save_entity};
use crate::core::outbox::{Notification, Outbox};
use crate::core::sequence::SequenceIndex;
use crate::core::workflow::DocumentWorkflow;
use crate::core::{Config, Project, TeamRoster};
use crate::entities::document::Document;
use crate::entities::revision::Revision;

/// Controlled document management
#[derive(Debug, Subcommand)]
pub enum DocCommands {
    /// Create a new controlled document
    New(DocNewArgs),
    /// List documents
    List(DocListArgs),
    /// Show one document
    Show(DocShowArgs),
    /// Submit a draft document for approval
    RequestApproval(DocRefArgs),
    /// Approve a document pending approval
    Approve(DocApproveArgs),
    /// Release an approved document and notify the distribution list
    Release(DocActorArgs),
    /// Cancel a document that has not been released
    Cancel(DocRefArgs),
    /// Step a document back one state
    Undo(DocRefArgs),
    /// Create the next revision of a document
    NewRev(DocNewRevArgs),
}

#[derive(Debug, Args)]
pub struct DocNewArgs {
    /// Format number / document title
    #[arg(long)]
    pub title: String,

    /// Part reference (id, id prefix, or part number)
    #[arg(long)]
    pub part: Option<String>,

    /// Customer name
    #[arg(long)]
    pub customer: Option<String>,

    /// Customer part number
    #[arg(long)]
    pub customer_part_number: Option<String>,

    /// Document categories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub category: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DocListArgs {
    /// Filter by state (draft, pending_approval, approved, released, cancelled)
    #[arg(long, short = 's')]
    pub state: Option<DocState>,

    /// Output format (table, json)
    #[arg(long, short = 'f', default_value = "table")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct DocShowArgs {
    /// Document id, id prefix, or sequence number
    pub id: String,

    /// Output format (yaml, json)
    #[arg(long, short = 'f', default_value = "yaml")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct DocRefArgs {
    /// Document id, id prefix, or sequence number
    pub id: String,
}

#[derive(Debug, Args)]
pub struct DocActorArgs {
    /// Document id, id prefix, or sequence number
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Debug, Args)]
pub struct DocApproveArgs {
    /// Document id, id prefix, or sequence number
    pub id: String,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Approval comment
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

#[derive(Debug, Args)]
pub struct DocNewRevArgs {
    /// Document id, id prefix, or sequence number
    pub id: String,

    /// What changes in this revision
    #[arg(long)]
    pub description: String,
}

pub fn run(cmd: DocCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DocCommands::New(args) => run_new(args, global),
        DocCommands::List(args) => run_list(args),
        DocCommands::Show(args) => run_show(args),
        DocCommands::RequestApproval(args) => run_request_approval(args),
        DocCommands::Approve(args) => run_approve(args, global),
        DocCommands::Release(args) => run_release(args, global),
        DocCommands::Cancel(args) => run_cancel(args),
        DocCommands::Undo(args) => run_undo(args),
        DocCommands::NewRev(args) => run_new_rev(args),
    }
}

fn run_new(args: DocNewArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();

    let part = match &args.part {
        Some(reference) => Some(get_part(&project, reference)?.id),
        None => None,
    };

    let mut sequences = SequenceIndex::load(&project);
    let sequence = sequences.next(EntityPrefix::Doc);

    let mut doc = Document::new(
        sequence,
        args.title,
        part,
        args.customer,
        &config.approvals,
        config.author(),
    );
    doc.customer_part_number = args.customer_part_number;
    doc.categories = args.category;

    save_entity(&project, EntityPrefix::Doc, &doc)?;
    sequences.save(&project).into_diagnostic()?;

    println!(
        "{} Created document {} ({})",
        style("✓").green(),
        doc.sequence,
        doc.id
    );
    if doc.approvers.is_empty() && !global.quiet {
        println!(
            "  Note: no default approvers configured; set 'approvals.approvers' in .mct/config.yaml"
        );
    }
    Ok(())
}

fn run_list(args: DocListArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut docs: Vec<Document> = load_all(&project, EntityPrefix::Doc);
    docs.sort_by(|a, b| a.sequence.cmp(&b.sequence));

    if let Some(state) = args.state {
        docs.retain(|d| d.state == state);
    }

    if docs.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&docs).into_diagnostic()?);
        return Ok(());
    }

    println!(
        "{:<9} {:<30} {:<18} {:<20} APPROVALS",
        "SEQ", "TITLE", "STATE", "CUSTOMER"
    );
    println!("{}", "-".repeat(88));
    for doc in &docs {
        println!(
            "{:<9} {:<30} {:<18} {:<20} {}/{}",
            doc.sequence,
            truncate_str(&doc.title, 28),
            doc.state.to_string(),
            truncate_str(doc.customer.as_deref().unwrap_or("-"), 18),
            doc.approvals.len(),
            doc.approvers.len(),
        );
    }
    Ok(())
}

fn run_show(args: DocShowArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let doc = get_document(&project, &args.id)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&doc).into_diagnostic()?),
        _ => print!("{}", serde_yml::to_string(&doc).into_diagnostic()?),
    }

    let revisions: Vec<Revision> = load_all(&project, EntityPrefix::Rev);
    if let Some(current) = doc.current_revision(&revisions) {
        println!(
            "# current revision: {} ({}, {})",
            current.number, current.description, current.state
        );
    }
    Ok(())
}

fn run_request_approval(args: DocRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let roster = TeamRoster::load(&project);
    let engine = DocumentWorkflow::new(roster);

    let mut doc = get_document(&project, &args.id)?;
    engine.request_approval(&mut doc).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Doc, &doc)?;

    println!(
        "{} {} submitted for approval ({} approvers required)",
        style("✓").green(),
        doc.sequence,
        doc.approvers.len()
    );
    Ok(())
}

fn run_approve(args: DocApproveArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();
    let roster = TeamRoster::load(&project);
    let actor = resolve_actor(&args.by, roster.as_ref(), &config);
    let engine = DocumentWorkflow::new(roster);

    let mut doc = get_document(&project, &args.id)?;
    let done = engine
        .approve(&mut doc, &actor, args.message.as_deref())
        .into_diagnostic()?;
    save_entity(&project, EntityPrefix::Doc, &doc)?;

    if done {
        println!(
            "{} {} approved by {} - all approvals received",
            style("✓").green(),
            doc.sequence,
            actor
        );
    } else {
        println!(
            "{} {} approval recorded for {} ({}/{})",
            style("✓").green(),
            doc.sequence,
            actor,
            doc.approvals.len(),
            doc.approvers.len()
        );
    }
    if global.verbose {
        for record in &doc.approvals {
            println!("  approved by {} at {}", record.approver, record.timestamp);
        }
    }
    Ok(())
}

fn run_release(args: DocActorArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();
    let roster = TeamRoster::load(&project);
    let actor = resolve_actor(&args.by, roster.as_ref(), &config);
    let engine = DocumentWorkflow::new(roster);

    let mut doc = get_document(&project, &args.id)?;
    engine.release(&mut doc, &actor).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Doc, &doc)?;

    println!(
        "{} {} released by {}",
        style("✓").green(),
        doc.sequence,
        actor
    );

    if !doc.release_to.is_empty() {
        let outbox = Outbox::open(&project).into_diagnostic()?;
        let mut ctx = tera::Context::new();
        ctx.insert("sequence", &doc.sequence);
        ctx.insert("title", &doc.title);
        ctx.insert("released_by", &actor);
        let sent = outbox
            .send_all(Notification::DocumentReleased, &doc.release_to, &ctx)
            .into_diagnostic()?;
        if !global.quiet {
            println!("  Notified {} recipients", sent);
        }
    }
    Ok(())
}

fn run_cancel(args: DocRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let engine = DocumentWorkflow::new(TeamRoster::load(&project));

    let mut doc = get_document(&project, &args.id)?;
    engine.cancel(&mut doc).into_diagnostic()?;
    save_entity(&project, EntityPrefix::Doc, &doc)?;

    println!("{} {} cancelled", style("✓").green(), doc.sequence);
    Ok(())
}

fn run_undo(args: DocRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let engine = DocumentWorkflow::new(TeamRoster::load(&project));

    let mut doc = get_document(&project, &args.id)?;
    match engine.undo(&mut doc) {
        Some((from, to)) => {
            save_entity(&project, EntityPrefix::Doc, &doc)?;
            println!("{} {}: {} -> {}", style("✓").green(), doc.sequence, from, to);
        }
        None => {
            println!("{} is in '{}'; nothing to undo", doc.sequence, doc.state);
        }
    }
    Ok(())
}

fn run_new_rev(args: DocNewRevArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();

    let doc = get_document(&project, &args.id)?;
    let revisions: Vec<Revision> = load_all(&project, EntityPrefix::Rev);

    let revision = doc
        .new_revision(
            &revisions,
            args.description,
            &config.approvals,
            config.author(),
        )
        .into_diagnostic()?;
    save_entity(&project, EntityPrefix::Rev, &revision)?;

    println!(
        "{} Created revision {} of {} ({})",
        style("✓").green(),
        revision.number,
        doc.sequence,
        revision.id
    );
    if !revision.previous_revisions.is_empty() {
        println!(
            "  supersedes {} earlier revision(s)",
            revision.previous_revisions.len()
        );
    }
    Ok(())
}
