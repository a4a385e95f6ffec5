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

//! Related documentation lookup
//!
//! The only I/O in the pipeline: checking which companion documents exist
//! in the session's spec folder. Checks run concurrently and are
//! independent of one another.

use async_trait::async_trait;
use memsynth_core::{MemoryError, MemoryResult, RelatedDoc};
use std::path::PathBuf;
use tracing::debug;

/// Companion documents looked for in a spec folder, in report order.
pub const COMPANION_DOCS: &[(&str, &str)] = &[
    ("spec.md", "Feature specification"),
    ("plan.md", "Implementation plan"),
    ("tasks.md", "Task breakdown"),
    ("checklist.md", "Verification checklist"),
    ("decision-record.md", "Decision record"),
    ("research.md", "Research notes"),
    ("implementation-summary.md", "Implementation summary"),
    ("handover.md", "Session handover"),
];

/// Finds companion documents for a spec folder.
#[async_trait]
pub trait DocProbe: Send + Sync {
    async fn related_docs(&self, spec_folder: &str) -> MemoryResult<Vec<RelatedDoc>>;
}

/// Supplies the active spec folder when the payload names none.
pub trait SpecFolderResolver: Send + Sync {
    fn resolve(&self) -> Option<String>;
}

/// Resolver that never finds a folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpecFolder;

impl SpecFolderResolver for NoSpecFolder {
    fn resolve(&self) -> Option<String> {
        None
    }
}

/// Resolver that always returns the same folder.
#[derive(Debug, Clone)]
pub struct FixedSpecFolder(pub String);

impl SpecFolderResolver for FixedSpecFolder {
    fn resolve(&self) -> Option<String> {
        let folder = self.0.trim();
        (!folder.is_empty()).then(|| folder.to_string())
    }
}

/// Probe that checks the local filesystem under a project root.
#[derive(Debug, Clone)]
pub struct FsDocProbe {
    root: PathBuf,
}

impl FsDocProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocProbe for FsDocProbe {
    async fn related_docs(&self, spec_folder: &str) -> MemoryResult<Vec<RelatedDoc>> {
        let spec_folder = spec_folder.trim().trim_end_matches('/');
        if spec_folder.is_empty() {
            return Ok(Vec::new());
        }
        let folder = self.root.join(spec_folder);

        let checks = COMPANION_DOCS.iter().map(|&(name, description)| {
            let path = folder.join(name);
            async move {
                let exists = tokio::fs::try_exists(&path)
                    .await
                    .map_err(|e| MemoryError::ProbeError {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                Ok::<_, MemoryError>(exists.then(|| RelatedDoc {
                    file_name: name.to_string(),
                    relative_path: format!("{}/{}", spec_folder, name),
                    description: description.to_string(),
                }))
            }
        });

        let results = futures::future::join_all(checks).await;
        let mut docs = Vec::new();
        for result in results {
            if let Some(doc) = result? {
                docs.push(doc);
            }
        }
        debug!(spec_folder, found = docs.len(), "probed related docs");
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_finds_existing_companions_in_order() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("specs/007-cache");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("plan.md"), "# Plan").unwrap();
        std::fs::write(folder.join("spec.md"), "# Spec").unwrap();
        std::fs::write(folder.join("notes.md"), "ignored").unwrap();

        let probe = FsDocProbe::new(dir.path());
        let docs = probe.related_docs("specs/007-cache/").await.unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["spec.md", "plan.md"]);
        assert_eq!(docs[1].relative_path, "specs/007-cache/plan.md");
        assert_eq!(docs[1].description, "Implementation plan");
    }

    #[tokio::test]
    async fn test_missing_or_empty_folder_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let probe = FsDocProbe::new(dir.path());
        assert!(probe.related_docs("specs/missing").await.unwrap().is_empty());
        assert!(probe.related_docs("  ").await.unwrap().is_empty());
    }

    #[test]
    fn test_resolvers() {
        assert_eq!(NoSpecFolder.resolve(), None);
        assert_eq!(FixedSpecFolder("specs/001-x".into()).resolve().as_deref(), Some("specs/001-x"));
        assert_eq!(FixedSpecFolder(" ".into()).resolve(), None);
    }
}
