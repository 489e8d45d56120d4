//! Team command - team roster management

use clap::{Args, Subcommand};
use console::style;
use miette::{bail, IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::truncate_str;
use crate::core::team::{Role, TeamMember, TeamRoster};
use crate::core::Project;

/// Team roster management
#[derive(Debug, Subcommand)]
pub enum TeamCommands {
    /// List team members
    List(TeamListArgs),
    /// Show current user's roster entry
    Whoami,
    /// Initialize team roster template
    Init(TeamInitArgs),
    /// Add a team member
    Add(TeamAddArgs),
    /// Remove a team member
    Remove(TeamRemoveArgs),
}

/// List team members
#[derive(Debug, Args)]
pub struct TeamListArgs {
    /// Filter by role
    #[arg(long, short = 'r')]
    pub role: Option<Role>,

    /// Output format (table, json)
    #[arg(long, short = 'f', default_value = "table")]
    pub format: String,
}

/// Initialize team roster
#[derive(Debug, Args)]
pub struct TeamInitArgs {
    /// Overwrite existing team.yaml
    #[arg(long)]
    pub force: bool,
}

/// Add a team member
#[derive(Debug, Args)]
pub struct TeamAddArgs {
    /// Member's full name
    #[arg(long)]
    pub name: String,

    /// Member's email
    #[arg(long)]
    pub email: String,

    /// Username (matches git user.name)
    #[arg(long)]
    pub username: String,

    /// Department shown on CFT approval lines
    #[arg(long)]
    pub department: Option<String>,

    /// Roles (comma-separated: engineering,quality,management,admin)
    #[arg(long, value_delimiter = ',')]
    pub roles: Vec<Role>,
}

/// Remove a team member
#[derive(Debug, Args)]
pub struct TeamRemoveArgs {
    /// Username to remove
    pub username: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl TeamCommands {
    pub fn run(self, global: &GlobalOpts) -> Result<()> {
        match self {
            TeamCommands::List(args) => args.run(global),
            TeamCommands::Whoami => run_whoami(global),
            TeamCommands::Init(args) => args.run(global),
            TeamCommands::Add(args) => args.run(global),
            TeamCommands::Remove(args) => args.run(global),
        }
    }
}

impl TeamListArgs {
    pub fn run(&self, _global: &GlobalOpts) -> Result<()> {
        let project = Project::discover().into_diagnostic()?;

        let Some(roster) = TeamRoster::load(&project) else {
            bail!("No team roster found. Run 'mct team init' to create one.");
        };

        let members: Vec<&TeamMember> = if let Some(role) = self.role {
            roster
                .active_members()
                .filter(|m| m.has_role(role))
                .collect()
        } else {
            roster.active_members().collect()
        };

        if members.is_empty() {
            println!("No team members found.");
            return Ok(());
        }

        match self.format.as_str() {
            "json" => {
                let json = serde_json::to_string_pretty(&members).into_diagnostic()?;
                println!("{}", json);
            }
            _ => {
                println!("\nTeam Members\n");
                println!(
                    "{:<20} {:<25} {:<13} {:<14} ROLES",
                    "NAME", "EMAIL", "USERNAME", "DEPARTMENT"
                );
                println!("{}", "-".repeat(90));

                for member in members {
                    let roles: Vec<String> =
                        member.roles.iter().map(|r| r.to_string()).collect();
                    println!(
                        "{:<20} {:<25} {:<13} {:<14} {}",
                        truncate_str(&member.name, 18),
                        truncate_str(&member.email, 23),
                        truncate_str(&member.username, 11),
                        truncate_str(member.department.as_deref().unwrap_or("-"), 12),
                        roles.join(", ")
                    );
                }
            }
        }

        Ok(())
    }
}

fn run_whoami(_global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;

    let Some(roster) = TeamRoster::load(&project) else {
        bail!("No team roster found. Run 'mct team init' to create one.");
    };

    match roster.current_user() {
        Some(member) => {
            println!("{} ({})", member.name, member.username);
            println!("  email: {}", member.email);
            if let Some(ref department) = member.department {
                println!("  department: {}", department);
            }
            let roles: Vec<String> = member.roles.iter().map(|r| r.to_string()).collect();
            println!("  roles: {}", roles.join(", "));
        }
        None => {
            println!("Current git identity is not in the team roster.");
            println!("Add yourself with 'mct team add --username <git user.name> ...'");
        }
    }
    Ok(())
}

impl TeamInitArgs {
    pub fn run(&self, _global: &GlobalOpts) -> Result<()> {
        let project = Project::discover().into_diagnostic()?;
        let path = project.mct_dir().join("team.yaml");

        if path.exists() && !self.force {
            bail!(
                "Team roster already exists at {} (use --force to overwrite)",
                path.display()
            );
        }

        std::fs::write(&path, TeamRoster::default_template()).into_diagnostic()?;
        println!(
            "{} Created team roster template at {}",
            style("✓").green(),
            path.display()
        );
        Ok(())
    }
}

impl TeamAddArgs {
    pub fn run(&self, _global: &GlobalOpts) -> Result<()> {
        let project = Project::discover().into_diagnostic()?;
        let mut roster = TeamRoster::load(&project).unwrap_or_default();

        if roster.find_member(&self.username).is_some() {
            bail!("{} is already in the team roster", self.username);
        }

        roster.add_member(TeamMember {
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            department: self.department.clone(),
            roles: self.roles.clone(),
            active: true,
        });
        roster.save(&project).into_diagnostic()?;

        println!(
            "{} Added {} to the team roster ({} members)",
            style("✓").green(),
            self.username,
            roster.members.len()
        );
        Ok(())
    }
}

impl TeamRemoveArgs {
    pub fn run(&self, _global: &GlobalOpts) -> Result<()> {
        let project = Project::discover().into_diagnostic()?;
        let Some(mut roster) = TeamRoster::load(&project) else {
            bail!("No team roster found.");
        };

        if !self.yes {
            let confirmed = dialoguer::Confirm::new()
                .with_prompt(format!("Remove {} from the roster?", self.username))
                .default(false)
                .interact()
                .into_diagnostic()?;
            if !confirmed {
                println!("Aborted.");
                return Ok(());
            }
        }

        if !roster.remove_member(&self.username) {
            bail!("{} is not in the team roster", self.username);
        }
        roster.save(&project).into_diagnostic()?;

        println!(
            "{} Removed {} from the team roster",
            style("✓").green(),
            self.username
        );
        Ok(())
    }
}
