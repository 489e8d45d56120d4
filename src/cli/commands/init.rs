//! Init command - create a new MCT project

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::core::project::{Project, ProjectError};

/// Initialize a new MCT project
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Reinitialize even if a project already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = args
        .path
        .unwrap_or(std::env::current_dir().into_diagnostic()?);

    let project = if args.force {
        Project::init_force(&path).into_diagnostic()?
    } else {
        match Project::init(&path) {
            Ok(project) => project,
            Err(ProjectError::AlreadyExists(root)) => {
                println!(
                    "MCT project already exists at {} (use --force to reinitialize)",
                    root.display()
                );
                return Ok(());
            }
            Err(e) => return Err(e).into_diagnostic(),
        }
    };

    println!(
        "{} Initialized MCT project at {}",
        style("✓").green(),
        project.root().display()
    );
    println!("\nRecord directories:");
    for dir in [
        "documents/",
        "documents/revisions/",
        "changes/ecns/",
        "parts/",
        "vendor/submissions/",
        "comparisons/",
        "changelog/",
    ] {
        println!("  {}", dir);
    }
    println!("\nNext steps:");
    println!("  mct team init            # set up the team roster");
    println!("  mct part new ...         # register parts");
    println!("  mct doc new ...          # create controlled documents");

    Ok(())
}
