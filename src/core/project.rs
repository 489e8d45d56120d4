//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Represents an MCT project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .mct/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            let mct_dir = current.join(".mct");
            if mct_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let mct_dir = root.join(".mct");
        if mct_dir.exists() {
            return Err(ProjectError::AlreadyExists(root.clone()));
        }

        Self::create_skeleton(&root)
    }

    /// Force initialization even if .mct/ exists
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_skeleton(&root)
    }

    fn create_skeleton(root: &Path) -> Result<Self, ProjectError> {
        let mct_dir = root.join(".mct");

        std::fs::create_dir_all(mct_dir.join("outbox"))
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        // Create default config
        let config_path = mct_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        // Create record directories
        Self::create_record_dirs(root)?;

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn default_config() -> &'static str {
        r#"# MCT Project Configuration

# Default author for new records (can be overridden by global config)
# author: ""

# Approval defaults applied to new documents and revisions
approvals:
  # Usernames that must approve each document/revision before release
  approvers: []
  # Usernames notified when a document/revision is released
  release_to: []
"#
    }

    fn create_record_dirs(root: &Path) -> Result<(), ProjectError> {
        let dirs = [
            "documents",
            "documents/revisions",
            "changes/ecns",
            "parts",
            "vendor/submissions",
            "comparisons",
            "changelog",
        ];

        for dir in dirs {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(())
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .mct configuration directory
    pub fn mct_dir(&self) -> PathBuf {
        self.root.join(".mct")
    }

    /// Get the notification outbox directory
    pub fn outbox_dir(&self) -> PathBuf {
        self.mct_dir().join("outbox")
    }

    /// Get the path for a record file
    pub fn entity_path(&self, prefix: EntityPrefix, id: &EntityId) -> PathBuf {
        self.root
            .join(Self::entity_directory(prefix))
            .join(format!("{}.mct.yaml", id))
    }

    /// Get the directory for a given record prefix
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Doc => "documents",
            EntityPrefix::Rev => "documents/revisions",
            EntityPrefix::Ecn => "changes/ecns",
            EntityPrefix::Part => "parts",
            EntityPrefix::Vdoc => "vendor/submissions",
            EntityPrefix::Cmpr => "comparisons",
        }
    }

    /// Get the changelog directory for field-change history
    pub fn changelog_dir(&self) -> PathBuf {
        self.root.join("changelog")
    }

    /// Iterate all record files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = self.root.join(Self::entity_directory(prefix));
        let depth = if prefix == EntityPrefix::Doc { 1 } else { 2 };
        walkdir::WalkDir::new(dir)
            .max_depth(depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(".mct.yaml"))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an MCT project (searched from {searched_from:?}). Run 'mct init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("MCT project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.mct_dir().exists());
        assert!(project.mct_dir().join("config.yaml").exists());
        assert!(project.outbox_dir().is_dir());
        assert!(project.root().join("documents/revisions").is_dir());
        assert!(project.root().join("changes/ecns").is_dir());
        assert!(project.root().join("parts").is_dir());
        assert!(project.root().join("vendor/submissions").is_dir());
        assert!(project.root().join("comparisons").is_dir());
        assert!(project.root().join("changelog").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_discover_finds_mct_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_mct_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_document_files_do_not_include_revisions() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        std::fs::write(
            project.root().join("documents/DOC-TEST.mct.yaml"),
            "id: DOC-TEST",
        )
        .unwrap();
        std::fs::write(
            project.root().join("documents/revisions/REV-TEST.mct.yaml"),
            "id: REV-TEST",
        )
        .unwrap();

        let docs: Vec<_> = project.iter_entity_files(EntityPrefix::Doc).collect();
        assert_eq!(docs.len(), 1);
        let revs: Vec<_> = project.iter_entity_files(EntityPrefix::Rev).collect();
        assert_eq!(revs.len(), 1);
    }
}
