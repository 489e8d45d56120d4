//! Log command - change history for a record

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::identity::EntityId;
use crate::core::project::Project;
use crate::diff::changelog::ChangeLog;
use crate::diff::tracker::ChangeType;

/// Show the change history of a record
#[derive(Debug, Args)]
pub struct LogArgs {
    /// Full record id (e.g. PART-01H...)
    pub id: String,

    /// Show each field change, not just the changeset summaries
    #[arg(long)]
    pub changes: bool,
}

pub fn run(args: LogArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let target = EntityId::parse(&args.id).into_diagnostic()?;

    let sets = ChangeLog::for_target(&project, &target).into_diagnostic()?;
    if sets.is_empty() {
        println!("No recorded changes for {}.", target);
        return Ok(());
    }

    println!("{} {}\n", style("Change history for:").bold(), target);
    for set in &sets {
        println!(
            "#{:<4} {}  {}  [{}]  {} ({} field changes)",
            set.number,
            set.date.format("%Y-%m-%d %H:%M"),
            set.author,
            set.reason,
            set.title,
            set.changes.len()
        );
        if let Some(ref summary) = set.summary {
            println!("      {}", summary);
        }
        if args.changes {
            for change in &set.changes {
                let marker = match change.change_type {
                    ChangeType::Added => style("+").green(),
                    ChangeType::Removed => style("-").red(),
                    ChangeType::Modified => style("~").yellow(),
                };
                let indent = "  ".repeat(change.nesting_level().min(4));
                println!("      {}{} {}", indent, marker, change.describe());
            }
        }
    }
    Ok(())
}
