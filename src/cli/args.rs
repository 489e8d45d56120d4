//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    compare::CompareCommands,
    completions::CompletionsArgs,
    doc::DocCommands,
    ecn::EcnCommands,
    init::InitArgs,
    log::LogArgs,
    part::PartCommands,
    rev::RevCommands,
    team::TeamCommands,
    validate::ValidateArgs,
    vendor::VendorCommands,
};

#[derive(Parser)]
#[command(name = "mct")]
#[command(author, version, about = "Meridian Change Toolkit")]
#[command(
    long_about = "A Unix-style toolkit for managing controlled documents, drawing revisions, engineering change notes, and part comparisons as plain text files."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .mct/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new MCT project
    Init(InitArgs),

    /// Controlled document management
    #[command(subcommand)]
    Doc(DocCommands),

    /// Document revision management
    #[command(subcommand)]
    Rev(RevCommands),

    /// Engineering change note workflow
    #[command(subcommand)]
    Ecn(EcnCommands),

    /// Part management (BOM, attachments, technical attributes)
    #[command(subcommand)]
    Part(PartCommands),

    /// Vendor document submissions
    #[command(subcommand)]
    Vendor(VendorCommands),

    /// Compare two parts (BOM, documents, revisions, files, technical)
    #[command(subcommand)]
    Compare(CompareCommands),

    /// Team roster management
    #[command(subcommand)]
    Team(TeamCommands),

    /// Show the change history of a record
    Log(LogArgs),

    /// Validate record files against schemas
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
