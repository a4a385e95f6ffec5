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

//! Memsynth Core
//!
//! Data model for session memory synthesis: the raw session payload, the
//! pipeline configuration, and the structured record the pipeline emits.

pub mod config;
pub mod conversation;
pub mod decision;
pub mod error;
pub mod lenient;
pub mod observation;
pub mod observation_types;
pub mod payload;
pub mod record;
pub mod session;

pub use config::{
    PipelineConfig, DEFAULT_MAX_FILES_IN_MEMORY, DEFAULT_MESSAGE_COUNT_TRIGGER,
    DEFAULT_MESSAGE_TIME_WINDOW_MS,
};
pub use conversation::{
    Conversation, ConversationMessage, ConversationPhase, MessageRole, PhaseSummary, ToolCall,
    ToolConfidence,
};
pub use decision::{Decision, DecisionOption, Importance};
pub use error::{MemoryError, MemoryResult};
pub use observation::{parse_timestamp, Fact, Observation, Timestamp, UserPrompt};
pub use observation_types::ObservationType;
pub use payload::{
    is_valid_description, FileEntry, LearningAssessment, LegacyFileChange, ManualDecision,
    ManualDecisionSpec, RecentContext, SessionPayload, GENERIC_FILE_DESCRIPTION,
};
pub use record::{
    ClassifiedObservation, DecisionCounts, DetectedDiagram, DiagramComplexity, DiagramSource,
    GeneratedDiagram, ImportanceTier, RelatedDoc, SessionRecord,
};
pub use session::{
    FileProgress, FileStatus, LearningFields, PendingTask, ProjectPhase, SessionHandover,
    SessionStatus, TaskPriority, LEARNING_PLACEHOLDER,
};
