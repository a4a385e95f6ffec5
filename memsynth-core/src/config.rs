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

//! Pipeline configuration
//!
//! Time windows, caps and thresholds used by the extractors. A single
//! [`PipelineConfig`] value is handed to the collector; nothing reads
//! module-level globals.

use crate::error::MemoryResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pairing window between a prompt and an observation (5 minutes)
pub const DEFAULT_MESSAGE_TIME_WINDOW_MS: u64 = 300_000;

/// Default cap on file ledger entries
pub const DEFAULT_MAX_FILES_IN_MEMORY: usize = 10;

/// Default message count at which an automatic save is suggested
pub const DEFAULT_MESSAGE_COUNT_TRIGGER: usize = 20;

/// Configuration for one pipeline invocation.
///
/// Every field has a default, so a partial TOML file only overrides the
/// keys it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum |prompt - observation| delta, in milliseconds, for pairing.
    #[serde(alias = "MESSAGE_TIME_WINDOW")]
    pub message_time_window_ms: u64,

    /// Maximum entries kept in the file ledger.
    #[serde(alias = "MAX_FILES_IN_MEMORY")]
    pub max_files_in_memory: usize,

    /// Message count at which `AUTO_SAVE_TRIGGERED` is raised.
    #[serde(alias = "MESSAGE_COUNT_TRIGGER")]
    pub message_count_trigger: usize,

    /// Maximum pending tasks reported.
    pub max_pending_tasks: usize,

    /// Maximum observation titles listed as outcomes.
    pub max_outcomes: usize,

    /// Maximum characters kept for the session title.
    pub title_max_chars: usize,

    /// Maximum characters kept for the session summary.
    pub summary_max_chars: usize,

    /// Project root used to relativize absolute file paths.
    /// None = paths are only cleaned, never stripped.
    pub project_root: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            message_time_window_ms: DEFAULT_MESSAGE_TIME_WINDOW_MS,
            max_files_in_memory: DEFAULT_MAX_FILES_IN_MEMORY,
            message_count_trigger: DEFAULT_MESSAGE_COUNT_TRIGGER,
            max_pending_tasks: 10,
            max_outcomes: 10,
            title_max_chars: 80,
            summary_max_chars: 500,
            project_root: None,
        }
    }
}

impl PipelineConfig {
    /// Get the pairing window as a Duration.
    pub fn message_time_window(&self) -> Duration {
        Duration::from_millis(self.message_time_window_ms)
    }

    /// Set the project root.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Set the pairing window.
    pub fn with_message_time_window(mut self, window: Duration) -> Self {
        self.message_time_window_ms = window.as_millis() as u64;
        self
    }

    /// Set the file ledger cap.
    pub fn with_max_files(mut self, max: usize) -> Self {
        self.max_files_in_memory = max;
        self
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> MemoryResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> MemoryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
