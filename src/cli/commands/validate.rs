//! Validate command - check record files against their schemas

use clap::Args;
use console::style;
use miette::{bail, IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::core::identity::EntityPrefix;
use crate::core::project::Project;
use crate::schema::{SchemaRegistry, Validator};

/// Validate record files against schemas
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Specific files to validate (default: every record in the project)
    pub paths: Vec<PathBuf>,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let validator = Validator::new(&SchemaRegistry::new());

    let paths: Vec<PathBuf> = if args.paths.is_empty() {
        let mut all = Vec::new();
        for prefix in EntityPrefix::all() {
            all.extend(project.iter_entity_files(*prefix));
        }
        all
    } else {
        args.paths
    };

    if paths.is_empty() {
        println!("No record files to validate.");
        return Ok(());
    }

    let mut checked = 0usize;
    let mut failed = 0usize;

    for path in &paths {
        checked += 1;
        match validator.validate_file(path) {
            Ok(result) if result.valid => {}
            Ok(result) => {
                failed += 1;
                println!("{} {}", style("✗").red(), path.display());
                for issue in &result.issues {
                    let at = if issue.path.is_empty() {
                        String::new()
                    } else {
                        format!(" at {}", issue.path)
                    };
                    println!("    {}{}", issue.message, at);
                }
            }
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", style("✗").red(), path.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} record files failed validation", failed, checked);
    }

    println!(
        "{} {} record files valid",
        style("✓").green(),
        checked
    );
    Ok(())
}
