//! Vendor command - vendor document submissions

use clap::{Args, Subcommand};
use console::style;
use dialoguer::Input;
use miette::{IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{get_vendor_document, resolve_actor, truncate_str};
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, save_entity};
use crate::core::sequence::SequenceIndex;
use crate::core::{Config, Project, TeamRoster};
use crate::entities::vendor::{VendorDocument, VendorDocumentLine};

/// Vendor document submissions
#[derive(Debug, Subcommand)]
pub enum VendorCommands {
    /// Record a new vendor document submission
    New(VendorNewArgs),
    /// List vendor documents
    List(VendorListArgs),
    /// Show one vendor document
    Show(VendorShowArgs),
    /// Add a document line with its approver set
    AddLine(VendorAddLineArgs),
    /// Advance to the next review stage
    Advance(VendorRefArgs),
    /// Approve a document line
    Approve(VendorDecisionArgs),
    /// Reject a document line (remarks required)
    Reject(VendorRejectArgs),
}

#[derive(Debug, Args)]
pub struct VendorNewArgs {
    /// Document name
    #[arg(long)]
    pub name: String,

    /// Vendor name
    #[arg(long)]
    pub vendor: String,

    /// Vendor code
    #[arg(long)]
    pub code: Option<String>,

    /// Responsible username (default: configured author)
    #[arg(long)]
    pub responsible: Option<String>,
}

#[derive(Debug, Args)]
pub struct VendorListArgs {
    /// Output format (table, json)
    #[arg(long, short = 'f', default_value = "table")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct VendorShowArgs {
    /// Vendor document id, id prefix, or serial number
    pub id: String,

    /// Output format (yaml, json)
    #[arg(long, short = 'f', default_value = "yaml")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct VendorRefArgs {
    /// Vendor document id, id prefix, or serial number
    pub id: String,
}

#[derive(Debug, Args)]
pub struct VendorAddLineArgs {
    /// Vendor document id, id prefix, or serial number
    pub id: String,

    /// Filename of the submitted document
    #[arg(long)]
    pub filename: String,

    /// Approver usernames (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub approvers: Vec<String>,
}

#[derive(Debug, Args)]
pub struct VendorDecisionArgs {
    /// Vendor document id, id prefix, or serial number
    pub id: String,

    /// Line serial number
    #[arg(long)]
    pub line: u32,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Debug, Args)]
pub struct VendorRejectArgs {
    /// Vendor document id, id prefix, or serial number
    pub id: String,

    /// Line serial number
    #[arg(long)]
    pub line: u32,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Rejection remarks
    #[arg(long)]
    pub remarks: Option<String>,
}

pub fn run(cmd: VendorCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        VendorCommands::New(args) => run_new(args),
        VendorCommands::List(args) => run_list(args),
        VendorCommands::Show(args) => run_show(args),
        VendorCommands::AddLine(args) => run_add_line(args),
        VendorCommands::Advance(args) => run_advance(args),
        VendorCommands::Approve(args) => run_approve(args),
        VendorCommands::Reject(args) => run_reject(args),
    }
}

fn run_new(args: VendorNewArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();

    let mut sequences = SequenceIndex::load(&project);
    let sequence = sequences.next(EntityPrefix::Vdoc);

    let responsible = args.responsible.unwrap_or_else(|| config.author());
    let mut doc = VendorDocument::new(sequence, args.name, args.vendor, responsible);
    doc.vendor_code = args.code;

    save_entity(&project, EntityPrefix::Vdoc, &doc)?;
    sequences.save(&project).into_diagnostic()?;

    println!(
        "{} Recorded vendor document {} ({})",
        style("✓").green(),
        doc.sequence,
        doc.id
    );
    Ok(())
}

fn run_list(args: VendorListArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut docs: Vec<VendorDocument> = load_all(&project, EntityPrefix::Vdoc);
    docs.sort_by(|a, b| a.sequence.cmp(&b.sequence));

    if docs.is_empty() {
        println!("No vendor documents found.");
        return Ok(());
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&docs).into_diagnostic()?);
        return Ok(());
    }

    println!(
        "{:<9} {:<28} {:<20} {:<16} LINES",
        "SEQ", "NAME", "VENDOR", "STAGE"
    );
    println!("{}", "-".repeat(82));
    for doc in &docs {
        println!(
            "{:<9} {:<28} {:<20} {:<16} {}",
            doc.sequence,
            truncate_str(&doc.name, 26),
            truncate_str(&doc.vendor, 18),
            doc.stage.to_string(),
            doc.lines.len(),
        );
    }
    Ok(())
}

fn run_show(args: VendorShowArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let doc = get_vendor_document(&project, &args.id)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&doc).into_diagnostic()?),
        _ => print!("{}", serde_yml::to_string(&doc).into_diagnostic()?),
    }
    for line in &doc.lines {
        println!(
            "# line {}: {} - {}",
            line.serial,
            line.filename,
            line.aggregate_status()
        );
    }
    Ok(())
}

fn run_add_line(args: VendorAddLineArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut doc = get_vendor_document(&project, &args.id)?;

    let serial = doc.next_serial();
    doc.lines.push(VendorDocumentLine::new(
        serial,
        args.filename.clone(),
        args.approvers,
    ));
    save_entity(&project, EntityPrefix::Vdoc, &doc)?;

    println!(
        "{} Added line {} ({}) to {}",
        style("✓").green(),
        serial,
        args.filename,
        doc.sequence
    );
    Ok(())
}

fn run_advance(args: VendorRefArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut doc = get_vendor_document(&project, &args.id)?;

    let stage = doc.advance().into_diagnostic()?;
    save_entity(&project, EntityPrefix::Vdoc, &doc)?;

    println!(
        "{} {} advanced to {}",
        style("✓").green(),
        doc.sequence,
        stage
    );
    Ok(())
}

fn run_approve(args: VendorDecisionArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();
    let roster = TeamRoster::load(&project);
    let actor = resolve_actor(&args.by, roster.as_ref(), &config);

    let mut doc = get_vendor_document(&project, &args.id)?;
    let line = doc.line_mut(args.line).into_diagnostic()?;
    line.approve(&actor).into_diagnostic()?;
    let status = line.aggregate_status();
    save_entity(&project, EntityPrefix::Vdoc, &doc)?;

    println!(
        "{} Line {} approved by {} - aggregate status: {}",
        style("✓").green(),
        args.line,
        actor,
        status
    );
    Ok(())
}

fn run_reject(args: VendorRejectArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();
    let roster = TeamRoster::load(&project);
    let actor = resolve_actor(&args.by, roster.as_ref(), &config);

    let remarks = match args.remarks {
        Some(remarks) => remarks,
        None => Input::new()
            .with_prompt("Rejection remarks")
            .interact_text()
            .into_diagnostic()?,
    };

    let mut doc = get_vendor_document(&project, &args.id)?;
    let line = doc.line_mut(args.line).into_diagnostic()?;
    line.reject(&actor, remarks).into_diagnostic()?;
    let status = line.aggregate_status();
    save_entity(&project, EntityPrefix::Vdoc, &doc)?;

    println!(
        "{} Line {} rejected by {} - aggregate status: {}",
        style("✗").red(),
        args.line,
        actor,
        status
    );
    Ok(())
}
