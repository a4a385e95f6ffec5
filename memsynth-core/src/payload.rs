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

//! Raw session payload
//!
//! The single input of the pipeline. Every section is optional so that a
//! partial transcript still decodes.

use crate::error::{MemoryError, MemoryResult};
use crate::lenient;
use crate::observation::{Observation, UserPrompt};
use serde::{Deserialize, Serialize};

/// Description used when a file is known only from an observation.
pub const GENERIC_FILE_DESCRIPTION: &str = "Modified during session";

/// A file mentioned by the session, with a short description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Project-relative path.
    #[serde(rename = "FILE_PATH", alias = "path", alias = "file_path")]
    pub path: String,
    /// What happened to the file.
    #[serde(
        rename = "DESCRIPTION",
        alias = "description",
        default,
        deserialize_with = "lenient::string"
    )]
    pub description: String,
}

impl FileEntry {
    /// Create an entry.
    pub fn new(path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
        }
    }

    /// Whether the description carries real information.
    pub fn has_valid_description(&self) -> bool {
        is_valid_description(&self.description)
    }
}

/// A description is valid when non-empty and not the generic fallback.
pub fn is_valid_description(description: &str) -> bool {
    let trimmed = description.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(GENERIC_FILE_DESCRIPTION)
}

/// Legacy `files_modified` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyFileChange {
    #[serde(alias = "file", alias = "file_path", alias = "FILE_PATH")]
    pub path: String,
    #[serde(
        default,
        alias = "changes_summary",
        alias = "summary",
        alias = "DESCRIPTION",
        deserialize_with = "lenient::string"
    )]
    pub description: String,
}

/// Self-assessment scores captured before or after a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningAssessment {
    /// Knowledge of the problem area (0-100).
    #[serde(deserialize_with = "lenient::score")]
    pub knowledge_score: Option<f64>,
    /// Uncertainty about the approach (0-100, lower is better).
    #[serde(deserialize_with = "lenient::score")]
    pub uncertainty_score: Option<f64>,
    /// Understanding of the surrounding context (0-100).
    #[serde(deserialize_with = "lenient::score")]
    pub context_score: Option<f64>,
    /// Knowledge gaps closed during the session (postflight only).
    #[serde(deserialize_with = "lenient::vec")]
    pub gaps_closed: Vec<String>,
    /// Knowledge gaps discovered during the session (postflight only).
    #[serde(deserialize_with = "lenient::vec")]
    pub new_gaps: Vec<String>,
}

impl LearningAssessment {
    /// Create an assessment with all three scores.
    pub fn new(knowledge: f64, uncertainty: f64, context: f64) -> Self {
        Self {
            knowledge_score: Some(knowledge),
            uncertainty_score: Some(uncertainty),
            context_score: Some(context),
            ..Default::default()
        }
    }
}

/// A decision supplied directly by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManualDecision {
    /// Free text, e.g. "Use SQLite for the cache".
    Text(String),
    /// Structured decision.
    Detailed(ManualDecisionSpec),
}

/// Structured manual decision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualDecisionSpec {
    #[serde(deserialize_with = "lenient::option")]
    pub title: Option<String>,
    #[serde(alias = "chosen", deserialize_with = "lenient::option")]
    pub decision: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub rationale: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub context: Option<String>,
    /// Percent, rounded and clamped to 0..=100.
    #[serde(deserialize_with = "lenient::percent")]
    pub confidence: Option<u8>,
}

/// Entry of `recent_context`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentContext {
    #[serde(deserialize_with = "lenient::option")]
    pub request: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub learning: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub completed: Option<String>,
    #[serde(
        alias = "nextAction",
        alias = "next_steps",
        alias = "nextSteps",
        deserialize_with = "lenient::option"
    )]
    pub next_action: Option<String>,
}

/// The full session payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default, deserialize_with = "lenient::vec")]
    pub observations: Vec<Observation>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub user_prompts: Vec<UserPrompt>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub recent_context: Vec<RecentContext>,
    #[serde(rename = "FILES", default, deserialize_with = "lenient::vec")]
    pub files: Vec<FileEntry>,
    #[serde(default, deserialize_with = "lenient::vec")]
    pub files_modified: Vec<LegacyFileChange>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub preflight: Option<LearningAssessment>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub postflight: Option<LearningAssessment>,
    #[serde(rename = "_manualDecisions", default, deserialize_with = "lenient::vec")]
    pub manual_decisions: Vec<ManualDecision>,
    #[serde(rename = "SPEC_FOLDER", default, deserialize_with = "lenient::option")]
    pub spec_folder: Option<String>,
}

impl SessionPayload {
    /// Decode a payload from JSON text.
    pub fn from_json(text: &str) -> MemoryResult<Self> {
        serde_json::from_str(text).map_err(|e| MemoryError::PayloadError(e.to_string()))
    }

    /// Add an observation.
    pub fn observation(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }

    /// Add a user prompt.
    pub fn prompt(mut self, prompt: UserPrompt) -> Self {
        self.user_prompts.push(prompt);
        self
    }

    /// Set the spec folder.
    pub fn spec_folder(mut self, folder: impl Into<String>) -> Self {
        self.spec_folder = Some(folder.into());
        self
    }

    /// Whether the payload carries any transcript content.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty() && self.user_prompts.is_empty()
    }
}
