//! Compare command - part-to-part comparison

use clap::{Args, Subcommand};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{get_comparison, get_part, resolve_actor, truncate_str};
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, save_entity};
use crate::core::{Config, Project, TeamRoster};
use crate::diff::compare::{
    run_comparison, CompareScope, CompareSide, ComparisonReport, RevisionChange, SetChange,
};
use crate::entities::comparison::Comparison;
use crate::entities::document::Document;
use crate::entities::part::Part;
use crate::entities::revision::Revision;

/// Part comparison
#[derive(Debug, Subcommand)]
pub enum CompareCommands {
    /// Run a comparison between two parts and store the result
    Run(CompareRunArgs),
    /// List stored comparisons
    List,
    /// Show a stored comparison
    Show(CompareShowArgs),
}

#[derive(Debug, Args)]
pub struct CompareRunArgs {
    /// Part A (from): id, id prefix, or part number
    pub part_a: String,

    /// Part B (to): id, id prefix, or part number
    pub part_b: String,

    /// Categories to compare
    #[arg(long, default_value = "all")]
    pub scope: CompareScope,

    /// Notes stored on the comparison record
    #[arg(long)]
    pub notes: Option<String>,

    /// Acting username (default: roster match or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompareShowArgs {
    /// Comparison id or id prefix
    pub id: String,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(cmd: CompareCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CompareCommands::Run(args) => run_run(args, global),
        CompareCommands::List => run_list(),
        CompareCommands::Show(args) => run_show(args),
    }
}

fn run_run(args: CompareRunArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load();
    let roster = TeamRoster::load(&project);
    let actor = resolve_actor(&args.by, roster.as_ref(), &config);

    let part_a = get_part(&project, &args.part_a)?;
    let part_b = get_part(&project, &args.part_b)?;

    let documents: Vec<Document> = load_all(&project, EntityPrefix::Doc);
    let revisions: Vec<Revision> = load_all(&project, EntityPrefix::Rev);
    let parts: Vec<Part> = load_all(&project, EntityPrefix::Part);

    let lookup = |id: &str| {
        parts
            .iter()
            .find(|p| p.id.to_string() == id)
            .map(|p| p.part_number.clone())
    };

    let side_a = build_side(&part_a, &documents, &revisions);
    let side_b = build_side(&part_b, &documents, &revisions);
    let report = run_comparison(&side_a, &side_b, args.scope, &lookup).into_diagnostic()?;

    let mut comparison = Comparison::new(
        part_a.id.clone(),
        &part_a.part_number,
        part_b.id.clone(),
        &part_b.part_number,
        args.scope,
        config.author(),
    );
    comparison.notes = args.notes;
    comparison.record_result(report.clone(), &actor);
    save_entity(&project, EntityPrefix::Cmpr, &comparison)?;

    println!(
        "{} {} ({})",
        style("✓").green(),
        comparison.name,
        comparison.id
    );

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).into_diagnostic()?
        );
    } else {
        print_report(&report, global.verbose);
    }
    Ok(())
}

fn run_list() -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let mut cmps: Vec<Comparison> = load_all(&project, EntityPrefix::Cmpr);
    cmps.sort_by_key(|c| c.created);

    if cmps.is_empty() {
        println!("No comparisons found.");
        return Ok(());
    }

    println!("{:<42} {:<10} {:<10} COMPARED", "NAME", "SCOPE", "STATE");
    println!("{}", "-".repeat(84));
    for cmp in &cmps {
        let state = match cmp.state {
            crate::entities::comparison::ComparisonState::Draft => "draft",
            crate::entities::comparison::ComparisonState::Compared => "compared",
        };
        println!(
            "{:<42} {:<10} {:<10} {}",
            truncate_str(&cmp.name, 40),
            format!("{:?}", cmp.scope).to_lowercase(),
            state,
            cmp.compared_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

fn run_show(args: CompareShowArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let cmp = get_comparison(&project, &args.id)?;

    println!("{}\n", cmp.name);
    match cmp.report {
        Some(ref report) if args.json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).into_diagnostic()?
            );
        }
        Some(ref report) => print_report(report, true),
        None => println!("Comparison has not been run yet."),
    }
    Ok(())
}

/// Gather one side of the comparison: the part, its document control
/// record, and that document's revisions sorted by number
fn build_side<'a>(
    part: &'a Part,
    documents: &'a [Document],
    revisions: &'a [Revision],
) -> CompareSide<'a> {
    let document = documents
        .iter()
        .find(|d| d.part.as_ref() == Some(&part.id));
    let mut revs: Vec<&Revision> = document
        .map(|d| revisions.iter().filter(|r| r.document == d.id).collect())
        .unwrap_or_default();
    revs.sort_by_key(|r| r.number);
    CompareSide {
        part,
        document,
        revisions: revs,
    }
}

fn print_report(report: &ComparisonReport, verbose: bool) {
    for note in &report.notes {
        println!("  {} {}", style("note:").yellow(), note);
    }

    let s = &report.summary;
    println!(
        "\nBOM: {} changes ({} added, {} deleted, {} modified)",
        s.bom_total, s.bom_additions, s.bom_deletions, s.bom_modifications
    );
    for diff in &report.bom {
        let name = diff.part_number.as_deref().unwrap_or(&diff.component);
        match diff.change {
            SetChange::Added => println!(
                "  {} {} (qty {} {})",
                style("+").green(),
                name,
                diff.quantity_b.unwrap_or_default(),
                diff.unit
            ),
            SetChange::Deleted => println!(
                "  {} {} (qty {} {})",
                style("-").red(),
                name,
                diff.quantity_a.unwrap_or_default(),
                diff.unit
            ),
            SetChange::Modified => println!(
                "  {} {} (qty {} -> {} {})",
                style("~").yellow(),
                name,
                diff.quantity_a.unwrap_or_default(),
                diff.quantity_b.unwrap_or_default(),
                diff.unit
            ),
        }
    }

    if !report.documents.is_empty() {
        println!("\nDocument fields:");
        for diff in &report.documents {
            println!(
                "  {} {}: '{}' -> '{}'",
                style("~").yellow(),
                diff.field,
                diff.value_a,
                diff.value_b
            );
        }
    }

    let rs = &report.revision_summary;
    if rs.count_a > 0 || rs.count_b > 0 || !report.revisions.is_empty() {
        println!(
            "\nRevisions: {} in A (current: {}), {} in B (current: {})",
            rs.count_a,
            rs.current_a.as_deref().unwrap_or("n/a"),
            rs.count_b,
            rs.current_b.as_deref().unwrap_or("n/a")
        );
        for diff in &report.revisions {
            match diff.change {
                RevisionChange::OnlyInA => println!(
                    "  {} rev {} only in A ({})",
                    style("-").red(),
                    diff.number,
                    diff.description_a.as_deref().unwrap_or("")
                ),
                RevisionChange::OnlyInB => println!(
                    "  {} rev {} only in B ({})",
                    style("+").green(),
                    diff.number,
                    diff.description_b.as_deref().unwrap_or("")
                ),
                RevisionChange::Different => println!(
                    "  {} rev {} differs: A '{}' vs B '{}'",
                    style("~").yellow(),
                    diff.number,
                    diff.description_a.as_deref().unwrap_or(""),
                    diff.description_b.as_deref().unwrap_or("")
                ),
            }
        }
    }

    if s.file_total > 0 {
        println!(
            "\nFiles: {} changes ({} added, {} removed)",
            s.file_total, s.file_additions, s.file_deletions
        );
        for diff in &report.files {
            match diff.change {
                SetChange::Added => println!(
                    "  {} {} ({} bytes)",
                    style("+").green(),
                    diff.filename,
                    diff.size_b.unwrap_or_default()
                ),
                SetChange::Deleted => println!(
                    "  {} {} ({} bytes)",
                    style("-").red(),
                    diff.filename,
                    diff.size_a.unwrap_or_default()
                ),
                SetChange::Modified => println!(
                    "  {} {} ({} -> {} bytes)",
                    style("~").yellow(),
                    diff.filename,
                    diff.size_a.unwrap_or_default(),
                    diff.size_b.unwrap_or_default()
                ),
            }
        }
    }

    if !report.technical.is_empty() {
        println!("\nTechnical attributes ({} changed):", s.technical_changes);
        for diff in &report.technical {
            if diff.changed {
                println!(
                    "  {} {}: '{}' -> '{}'",
                    style("~").yellow(),
                    diff.field,
                    diff.value_a,
                    diff.value_b
                );
            } else if verbose {
                println!("    {}: '{}' (unchanged)", diff.field, diff.value_a);
            }
        }
    }
}
