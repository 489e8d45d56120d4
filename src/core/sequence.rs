//! Monotonic per-type sequence numbers for human-readable references
//!
//! Every record gets a ULID-based identity; the sequence index issues
//! the short display numbers people actually quote (DC-0001, ECN-0007).
//! Counters are persisted in `.mct/sequences.json` and never reused.

use std::collections::HashMap;
use std::fs;

use crate::core::identity::EntityPrefix;
use crate::core::project::Project;

/// Index file location within a project
const INDEX_FILE: &str = ".mct/sequences.json";

/// Per-prefix counters for display numbers
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SequenceIndex {
    /// Maps sequence code (e.g. "DC") to the last issued number
    counters: HashMap<String, u32>,
}

impl SequenceIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.root().join(INDEX_FILE);
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(index) = serde_json::from_str::<SequenceIndex>(&content) {
                    return index;
                }
            }
        }
        Self::new()
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.root().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Issue the next display number for a record type (e.g. "ECN-0007")
    pub fn next(&mut self, prefix: EntityPrefix) -> String {
        let code = prefix.sequence_code();
        let counter = self.counters.entry(code.to_string()).or_insert(0);
        *counter += 1;
        format!("{}-{:04}", code, counter)
    }

    /// Peek at the last issued number for a record type
    pub fn last(&self, prefix: EntityPrefix) -> u32 {
        self.counters
            .get(prefix.sequence_code())
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sequence_is_monotonic() {
        let mut index = SequenceIndex::new();
        assert_eq!(index.next(EntityPrefix::Doc), "DC-0001");
        assert_eq!(index.next(EntityPrefix::Doc), "DC-0002");
        assert_eq!(index.next(EntityPrefix::Ecn), "ECN-0001");
        assert_eq!(index.next(EntityPrefix::Doc), "DC-0003");
        assert_eq!(index.last(EntityPrefix::Doc), 3);
        assert_eq!(index.last(EntityPrefix::Ecn), 1);
    }

    #[test]
    fn test_sequence_survives_save_and_load() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let mut index = SequenceIndex::load(&project);
        assert_eq!(index.next(EntityPrefix::Vdoc), "VD-0001");
        index.save(&project).unwrap();

        let mut reloaded = SequenceIndex::load(&project);
        assert_eq!(reloaded.next(EntityPrefix::Vdoc), "VD-0002");
    }

    #[test]
    fn test_unknown_prefix_starts_at_one() {
        let index = SequenceIndex::new();
        assert_eq!(index.last(EntityPrefix::Cmpr), 0);
    }
}
