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

//! Session Handover State
//!
//! Snapshot of where a session stands when it is saved, so the next session
//! can pick up the work:
//!
//! - project phase and session status
//! - active file, last and next action, blockers
//! - pending tasks and per-file progress
//! - learning deltas from preflight/postflight assessments

mod handover;
mod learning;
mod status;

pub use handover::{FileProgress, FileStatus, PendingTask, SessionHandover, TaskPriority};
pub use learning::{LearningFields, LEARNING_PLACEHOLDER};
pub use status::{ProjectPhase, SessionStatus};
