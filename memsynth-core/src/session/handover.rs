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

//! Handover snapshot: tasks, file progress and the inferred session state.

use super::learning::LearningFields;
use super::status::{ProjectPhase, SessionStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    P0,
    P1,
    P2,
}

/// Work left open at the end of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PendingTask {
    #[serde(rename = "TASK_ID")]
    pub id: String,
    #[serde(rename = "TASK_DESCRIPTION")]
    pub description: String,
    #[serde(rename = "TASK_PRIORITY")]
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FileProgress {
    pub file_name: String,
    pub file_status: FileStatus,
}

/// Everything the next session needs to resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SessionHandover {
    pub project_phase: ProjectPhase,
    pub active_file: String,
    pub last_action: String,
    pub next_action: String,
    pub blockers: String,
    pub file_progress: Vec<FileProgress>,
    pub session_status: SessionStatus,
    pub completion_percent: u8,
    pub pending_tasks: Vec<PendingTask>,
    #[serde(flatten)]
    pub learning: LearningFields,
}

impl SessionHandover {
    pub fn is_blocked(&self) -> bool {
        self.session_status == SessionStatus::Blocked
    }
}
