//! Team roster, departments, and role-based workflow authorization

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::core::identity::EntityPrefix;
use crate::core::Project;

/// Team roles for authorization
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Engineering,
    Quality,
    Management,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Engineering => write!(f, "engineering"),
            Role::Quality => write!(f, "quality"),
            Role::Management => write!(f, "management"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "engineering" => Ok(Role::Engineering),
            "quality" => Ok(Role::Quality),
            "management" => Ok(Role::Management),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A team member with their roles and department
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub email: String,
    /// Username for matching git user (git config user.name or user.email)
    pub username: String,
    /// Department shown on CFT approval lines and missing-approval errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TeamMember {
    /// Check if member has a specific role
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Check if member has any of the specified roles
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }

    /// Check if member is an admin (can bypass authorization)
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// Team roster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRoster {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    /// Approval matrix: record prefix -> required roles
    /// Special key "_release" for release authorization
    #[serde(default)]
    pub approval_matrix: HashMap<String, Vec<Role>>,
}

fn default_version() -> u32 {
    1
}

impl Default for TeamRoster {
    fn default() -> Self {
        Self {
            version: 1,
            members: Vec::new(),
            approval_matrix: HashMap::new(),
        }
    }
}

impl TeamRoster {
    /// Load team roster from project's .mct/team.yaml
    pub fn load(project: &Project) -> Option<Self> {
        let path = project.mct_dir().join("team.yaml");
        Self::load_from_path(&path)
    }

    /// Load team roster from a specific path
    pub fn load_from_path(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let contents = std::fs::read_to_string(path).ok()?;
        serde_yml::from_str(&contents).ok()
    }

    /// Save team roster to project's .mct/team.yaml
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.mct_dir().join("team.yaml");
        self.save_to_path(&path)
    }

    /// Save team roster to a specific path
    pub fn save_to_path(&self, path: &Path) -> std::io::Result<()> {
        let contents = serde_yml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, contents)
    }

    /// Find member by username (matches git user.name)
    pub fn find_member(&self, username: &str) -> Option<&TeamMember> {
        self.members
            .iter()
            .find(|m| m.active && m.username.eq_ignore_ascii_case(username))
    }

    /// Find member by email
    pub fn find_member_by_email(&self, email: &str) -> Option<&TeamMember> {
        self.members
            .iter()
            .find(|m| m.active && m.email.eq_ignore_ascii_case(email))
    }

    /// Get current user as team member (from git config)
    pub fn current_user(&self) -> Option<&TeamMember> {
        // Try git user.name first
        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    if let Some(member) = self.find_member(&name) {
                        return Some(member);
                    }
                }
            }
        }

        // Try git user.email as fallback
        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.email"])
            .output()
        {
            if output.status.success() {
                let email = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !email.is_empty() {
                    if let Some(member) = self.find_member_by_email(&email) {
                        return Some(member);
                    }
                }
            }
        }

        None
    }

    /// Get roles required to approve a record type
    pub fn required_roles(&self, prefix: EntityPrefix) -> Option<&Vec<Role>> {
        let key = prefix.to_string();
        self.approval_matrix.get(&key)
    }

    /// Get roles required to release records
    pub fn release_roles(&self) -> Option<&Vec<Role>> {
        self.approval_matrix.get("_release")
    }

    /// Check if a member can approve a record type
    pub fn can_approve(&self, member: &TeamMember, prefix: EntityPrefix) -> bool {
        // Admins can approve anything
        if member.is_admin() {
            return true;
        }

        // If no approval matrix entry, anyone can approve
        let Some(required_roles) = self.required_roles(prefix) else {
            return true;
        };

        member.has_any_role(required_roles)
    }

    /// Check if a member can release records
    pub fn can_release(&self, member: &TeamMember) -> bool {
        if member.is_admin() {
            return true;
        }

        // If no release roles defined, check for management role
        let Some(required_roles) = self.release_roles() else {
            return member.has_role(Role::Management);
        };

        member.has_any_role(required_roles)
    }

    /// Add a member to the roster
    pub fn add_member(&mut self, member: TeamMember) {
        self.members.push(member);
    }

    /// Remove a member by username
    pub fn remove_member(&mut self, username: &str) -> bool {
        let len_before = self.members.len();
        self.members
            .retain(|m| !m.username.eq_ignore_ascii_case(username));
        self.members.len() < len_before
    }

    /// Get all active members
    pub fn active_members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|m| m.active)
    }

    /// Department for a username, if the roster knows the member
    pub fn department_of(&self, username: &str) -> Option<&str> {
        self.find_member(username)
            .and_then(|m| m.department.as_deref())
    }

    /// Generate default team.yaml template content
    pub fn default_template() -> &'static str {
        r#"# MCT Team Roster
# Defines team members and their roles for workflow authorization

version: 1

members:
  # Example member entry:
  # - name: "Jane Smith"
  #   email: "jane@example.com"
  #   username: "jsmith"        # Matches git config user.name
  #   department: "Quality"
  #   roles: [engineering, quality]
  #   active: true
  []

# Approval matrix: which roles can approve which record types
# If a record type is not listed, any team member can approve it
# Role options: engineering, quality, management, admin
approval_matrix:
  # DOC: [engineering, quality]
  # REV: [engineering, quality]
  # ECN: [quality, management]
  # _release: [management]  # Special key for release authorization
"#
    }
}
