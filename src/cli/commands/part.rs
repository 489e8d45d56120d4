//! Part command - parts, BOM lines, attachments, technical attributes
//!
//! Mutating subcommands diff the part before and after the edit and
//! append the resulting field changes to the changelog.

use clap::{Args, Subcommand};
use console::style;
use miette::{bail, IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{get_part, truncate_str};
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, save_entity};
use crate::core::{Config, Project};
use crate::diff::changelog::{ChangeLog, ChangeReason};
use crate::diff::tracker::diff_records;
use crate::entities::part::{Attachment, BomLine, Part};

/// Part management
#[derive(Debug, Subcommand)]
pub enum PartCommands {
    /// Register a new part
    New(PartNewArgs),
    /// List parts
    List(PartListArgs),
    /// Show one part
    Show(PartShowArgs),
    /// Add or update a BOM line
    BomAdd(PartBomAddArgs),
    /// Remove a BOM line
    BomRemove(PartBomRemoveArgs),
    /// Attach a file (records name, size, and checksum)
    Attach(PartAttachArgs),
    /// Set a technical attribute or base field
    SetAttr(PartSetAttrArgs),
}

#[derive(Debug, Args)]
pub struct PartNewArgs {
    /// Part number
    #[arg(long)]
    pub part_number: String,

    /// Part name
    #[arg(long)]
    pub name: String,

    /// Customer name
    #[arg(long)]
    pub customer: Option<String>,
}

#[derive(Debug, Args)]
pub struct PartListArgs {
    /// Output format (table, json)
    #[arg(long, short = 'f', default_value = "table")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct PartShowArgs {
    /// Part id, id prefix, or part number
    pub id: String,

    /// Output format (yaml, json)
    #[arg(long, short = 'f', default_value = "yaml")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct PartBomAddArgs {
    /// Parent part (id, id prefix, or part number)
    pub id: String,

    /// Component part (id, id prefix, or part number)
    #[arg(long)]
    pub component: String,

    /// Quantity per assembly
    #[arg(long)]
    pub quantity: f64,

    /// Unit of measure
    #[arg(long, default_value = "pcs")]
    pub unit: String,

    /// Reason recorded in the changelog
    #[arg(long, default_value = "update")]
    pub reason: ChangeReason,
}

#[derive(Debug, Args)]
pub struct PartBomRemoveArgs {
    /// Parent part (id, id prefix, or part number)
    pub id: String,

    /// Component part (id, id prefix, or part number)
    #[arg(long)]
    pub component: String,

    /// Reason recorded in the changelog
    #[arg(long, default_value = "update")]
    pub reason: ChangeReason,
}

#[derive(Debug, Args)]
pub struct PartAttachArgs {
    /// Part (id, id prefix, or part number)
    pub id: String,

    /// File to record as an attachment
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct PartSetAttrArgs {
    /// Part (id, id prefix, or part number)
    pub id: String,

    /// Field key (name, description, raw_material, surface_finish, ...)
    #[arg(long)]
    pub key: String,

    /// New value (omit to clear an optional field)
    #[arg(long)]
    pub value: Option<String>,

    /// Reason recorded in the changelog
    #[arg(long, default_value = "update")]
    pub reason: ChangeReason,
}

pub fn run(cmd: PartCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        PartCommands::New(args) => run_new(args),
        PartCommands::List(args) => run_list(args),
        PartCommands::Show(args) => run_show(args),
        PartCommands::BomAdd(args) => run_bom_add(args),
        PartCommands::BomRemove(args) => run_bom_remove(args),
        PartCommands::Attach(args) => run_attach(args),
        PartCommands::SetAttr(args) => run_set_attr(args),
    }
}

/// Diff the part against its previous state and append a changeset
fn record_changes(
    project: &Project,
    before: &Part,
    after: &Part,
    title: &str,
    reason: ChangeReason,
) -> Result<usize> {
    let changes = diff_records(&before.to_record(), &after.to_record());
    let count = changes.len();
    if count > 0 {
        let config = Config::load();
        ChangeLog::record(
            project,
            &after.id,
            title.to_string(),
            None,
            reason,
            config.author(),
            changes,
        )
        .into_diagnostic()?;
    }
    Ok(count)
}

fn run_new(args: PartNewArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();

    let mut part = Part::new(args.part_number, args.name, config.author());
    part.customer = args.customer;
    save_entity(&project, EntityPrefix::Part, &part)?;

    println!(
        "{} Registered part {} ({})",
        style("✓").green(),
        part.part_number,
        part.id
    );
    Ok(())
}

fn run_list(args: PartListArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut parts: Vec<Part> = load_all(&project, EntityPrefix::Part);
    parts.sort_by(|a, b| a.part_number.cmp(&b.part_number));

    if parts.is_empty() {
        println!("No parts found.");
        return Ok(());
    }

    if args.format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&parts).into_diagnostic()?
        );
        return Ok(());
    }

    println!(
        "{:<14} {:<30} {:<10} {:<5} FILES",
        "PART NUMBER", "NAME", "STATE", "BOM"
    );
    println!("{}", "-".repeat(70));
    for part in &parts {
        println!(
            "{:<14} {:<30} {:<10} {:<5} {}",
            part.part_number,
            truncate_str(&part.name, 28),
            match part.state {
                crate::entities::part::PartState::Active => "active",
                crate::entities::part::PartState::Obsolete => "obsolete",
            },
            part.bom.len(),
            part.attachments.len(),
        );
    }
    Ok(())
}

fn run_show(args: PartShowArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let part = get_part(&project, &args.id)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&part).into_diagnostic()?),
        _ => print!("{}", serde_yml::to_string(&part).into_diagnostic()?),
    }
    Ok(())
}

fn run_bom_add(args: PartBomAddArgs) -> Result<()> {
    if args.quantity <= 0.0 {
        bail!("quantity must be positive");
    }

    let project = Project::discover().into_diagnostic()?;
    let mut part = get_part(&project, &args.id)?;
    let component = get_part(&project, &args.component)?;

    if component.id == part.id {
        bail!("a part cannot appear on its own BOM");
    }

    let before = part.clone();
    match part.bom.iter_mut().find(|l| l.component == component.id) {
        Some(line) => {
            line.quantity = args.quantity;
            line.unit = args.unit;
        }
        None => part.bom.push(BomLine {
            component: component.id.clone(),
            quantity: args.quantity,
            unit: args.unit,
        }),
    }

    save_entity(&project, EntityPrefix::Part, &part)?;
    let changes = record_changes(
        &project,
        &before,
        &part,
        &format!("BOM update: {}", component.part_number),
        args.reason,
    )?;

    println!(
        "{} {} BOM line for {} set to {} {} ({} change entries)",
        style("✓").green(),
        part.part_number,
        component.part_number,
        args.quantity,
        part.bom
            .iter()
            .find(|l| l.component == component.id)
            .map(|l| l.unit.as_str())
            .unwrap_or("pcs"),
        changes
    );
    Ok(())
}

fn run_bom_remove(args: PartBomRemoveArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut part = get_part(&project, &args.id)?;
    let component = get_part(&project, &args.component)?;

    let before = part.clone();
    let len_before = part.bom.len();
    part.bom.retain(|l| l.component != component.id);
    if part.bom.len() == len_before {
        bail!(
            "{} has no BOM line for {}",
            part.part_number,
            component.part_number
        );
    }

    save_entity(&project, EntityPrefix::Part, &part)?;
    record_changes(
        &project,
        &before,
        &part,
        &format!("BOM removal: {}", component.part_number),
        args.reason,
    )?;

    println!(
        "{} Removed {} from the BOM of {}",
        style("✓").green(),
        component.part_number,
        part.part_number
    );
    Ok(())
}

fn run_attach(args: PartAttachArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut part = get_part(&project, &args.id)?;

    let attachment = Attachment::from_file(&args.file).into_diagnostic()?;
    let filename = attachment.filename.clone();
    part.attachments.retain(|a| a.filename != filename);
    part.attachments.push(attachment);

    save_entity(&project, EntityPrefix::Part, &part)?;

    println!(
        "{} Attached {} to {}",
        style("✓").green(),
        filename,
        part.part_number
    );
    Ok(())
}

fn run_set_attr(args: PartSetAttrArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut part = get_part(&project, &args.id)?;

    let before = part.clone();
    match args.key.as_str() {
        "name" => {
            let Some(value) = args.value else {
                bail!("'name' cannot be cleared");
            };
            part.name = value;
        }
        "description" => part.description = args.value,
        "customer" => part.customer = args.value,
        key => part.technical.set(key, args.value).into_diagnostic()?,
    }

    save_entity(&project, EntityPrefix::Part, &part)?;
    let changes = record_changes(
        &project,
        &before,
        &part,
        &format!("Field update: {}", args.key),
        args.reason,
    )?;

    if changes == 0 {
        println!("{} unchanged (same value)", part.part_number);
    } else {
        println!(
            "{} Updated {} on {} ({} change entries logged)",
            style("✓").green(),
            args.key,
            part.part_number,
            changes
        );
    }
    Ok(())
}
