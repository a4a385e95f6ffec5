// Copyright 2025 Memsynth (https://github.com/memsynth)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! File ledger
//!
//! Merges file mentions from the explicit `FILES` list, the legacy
//! `files_modified` list, observation file lists and structured facts into
//! one entry per normalized path. For repeated paths the shortest valid
//! description wins.

use memsynth_core::{
    is_valid_description, FileEntry, Observation, PipelineConfig, SessionPayload,
    GENERIC_FILE_DESCRIPTION,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Normalize a path to project-relative form.
///
/// Returns None for empty paths and for relative paths that climb above
/// their starting point.
pub fn normalize_path(raw: &str, project_root: Option<&Path>) -> Option<String> {
    let mut path = raw.trim().replace('\\', "/");
    if path.is_empty() {
        return None;
    }

    if let Some(root) = project_root {
        let root = root.to_string_lossy().replace('\\', "/");
        let root = root.trim_end_matches('/');
        if !root.is_empty() {
            if path == root {
                return None;
            }
            if let Some(rest) = path.strip_prefix(&format!("{root}/")) {
                path = rest.to_string();
            }
        }
    }

    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() && !absolute {
                    return None;
                }
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return None;
    }

    let joined = parts.join("/");
    Some(if absolute { format!("/{joined}") } else { joined })
}

/// Accumulates file mentions keyed by normalized path.
#[derive(Debug, Default)]
pub struct FileLedger {
    entries: Vec<FileEntry>,
    index: HashMap<String, usize>,
}

impl FileLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mention. Returns false when the path was dropped.
    pub fn add(&mut self, raw_path: &str, description: &str, project_root: Option<&Path>) -> bool {
        let Some(path) = normalize_path(raw_path, project_root) else {
            return false;
        };
        let description = description.trim();
        let description = if description.is_empty() {
            GENERIC_FILE_DESCRIPTION
        } else {
            description
        };

        match self.index.get(&path) {
            Some(&i) => {
                let existing = &mut self.entries[i];
                if should_replace(&existing.description, description) {
                    existing.description = description.to_string();
                }
            }
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push(FileEntry::new(path, description));
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Valid descriptions first, then generic ones, capped at `max`.
    pub fn finish(self, max: usize) -> Vec<FileEntry> {
        let (mut ordered, generic): (Vec<FileEntry>, Vec<FileEntry>) = self
            .entries
            .into_iter()
            .partition(FileEntry::has_valid_description);
        ordered.extend(generic);

        if ordered.len() > max {
            warn!(
                total = ordered.len(),
                max, "file ledger exceeds limit, truncating"
            );
            ordered.truncate(max);
        }
        ordered
    }
}

fn should_replace(existing: &str, candidate: &str) -> bool {
    if !is_valid_description(candidate) {
        return false;
    }
    !is_valid_description(existing) || candidate.chars().count() < existing.chars().count()
}

/// Build the deduplicated, capped file ledger for a session.
pub fn build_file_ledger(
    payload: &SessionPayload,
    observations: &[Observation],
    config: &PipelineConfig,
) -> Vec<FileEntry> {
    let root = config.project_root.as_deref();
    let mut ledger = FileLedger::new();
    let mut dropped = 0usize;

    for entry in &payload.files {
        dropped += usize::from(!ledger.add(&entry.path, &entry.description, root));
    }
    for change in &payload.files_modified {
        dropped += usize::from(!ledger.add(&change.path, &change.description, root));
    }
    for obs in observations {
        for file in &obs.files {
            dropped += usize::from(!ledger.add(file, GENERIC_FILE_DESCRIPTION, root));
        }
    }
    for obs in observations {
        for fact in &obs.facts {
            for file in fact.files() {
                dropped += usize::from(!ledger.add(file, GENERIC_FILE_DESCRIPTION, root));
            }
        }
    }

    debug!(files = ledger.len(), dropped, "built file ledger");
    ledger.finish(config.max_files_in_memory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsynth_core::{Fact, LegacyFileChange};
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./src/lib.rs", None).as_deref(), Some("src/lib.rs"));
        assert_eq!(normalize_path("src\\a\\..\\b.rs", None).as_deref(), Some("src/b.rs"));
        assert_eq!(normalize_path("  ", None), None);
        assert_eq!(normalize_path("../outside.rs", None), None);
        let root = PathBuf::from("/work/repo/");
        assert_eq!(
            normalize_path("/work/repo/src/main.rs", Some(&root)).as_deref(),
            Some("src/main.rs")
        );
        assert_eq!(
            normalize_path("/etc/hosts", Some(&root)).as_deref(),
            Some("/etc/hosts")
        );
        assert_eq!(normalize_path("/work/repo", Some(&root)), None);
    }

    #[test]
    fn test_shortest_valid_description_wins() {
        let payload = SessionPayload {
            files: vec![FileEntry::new("src/auth.rs", "")],
            files_modified: vec![LegacyFileChange {
                path: "./src/auth.rs".into(),
                description: "Token guard".into(),
            }],
            ..Default::default()
        };
        let ledger = build_file_ledger(&payload, &[], &PipelineConfig::default());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].description, "Token guard");
    }

    #[test]
    fn test_longer_valid_description_does_not_replace_shorter() {
        let mut ledger = FileLedger::new();
        ledger.add("a.rs", "Short desc", None);
        ledger.add("a.rs", "A much longer description", None);
        ledger.add("a.rs", GENERIC_FILE_DESCRIPTION, None);
        let entries = ledger.finish(10);
        assert_eq!(entries[0].description, "Short desc");
    }

    #[test]
    fn test_one_entry_per_path_across_sources() {
        let obs = Observation::new("Edit")
            .file("src/a.rs")
            .file("src/b.rs")
            .fact(Fact::Structured {
                text: "touched".into(),
                files: vec!["src/a.rs".into(), "./src/c.rs".into()],
            });
        let payload = SessionPayload {
            files: vec![FileEntry::new("src/a.rs", "Entry point")],
            observations: vec![obs.clone()],
            ..Default::default()
        };
        let ledger = build_file_ledger(&payload, &[obs], &PipelineConfig::default());
        let paths: HashSet<_> = ledger.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths.len(), ledger.len());
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger[0].path, "src/a.rs");
        assert_eq!(ledger[0].description, "Entry point");
        assert!(ledger[1..]
            .iter()
            .all(|e| e.description == GENERIC_FILE_DESCRIPTION));
    }

    #[test]
    fn test_valid_entries_ordered_first_and_capped() {
        let mut ledger = FileLedger::new();
        ledger.add("generic1.rs", "", None);
        ledger.add("generic2.rs", "", None);
        ledger.add("real.rs", "Parser", None);
        let entries = ledger.finish(2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "real.rs");
        assert_eq!(entries[1].path, "generic1.rs");
    }

    #[test]
    fn test_unresolvable_paths_dropped() {
        let payload = SessionPayload {
            files: vec![FileEntry::new("", "x"), FileEntry::new("../../etc", "y")],
            ..Default::default()
        };
        assert!(build_file_ledger(&payload, &[], &PipelineConfig::default()).is_empty());
    }
}
