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

//! Conversation transcript types
//!
//! Turn-by-turn view of a session produced by pairing prompts with the
//! observations recorded around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageRole {
    User,
    Assistant,
}

/// How sure the detector is that a tool name denotes a real tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolConfidence {
    Low,
    Medium,
    High,
}

/// A tool call recovered from observation facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ToolCall {
    /// Canonical tool name, e.g. "Read".
    #[serde(rename = "TOOL_NAME")]
    pub tool: String,
    /// The fact text the call was found in.
    #[serde(rename = "DESCRIPTION")]
    pub detail: String,
    pub confidence: ToolConfidence,
}

/// Conversational phase of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationPhase {
    Research,
    Planning,
    Implementation,
    Debugging,
    Verification,
    Discussion,
}

impl ConversationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationPhase::Research => "Research",
            ConversationPhase::Planning => "Planning",
            ConversationPhase::Implementation => "Implementation",
            ConversationPhase::Debugging => "Debugging",
            ConversationPhase::Verification => "Verification",
            ConversationPhase::Discussion => "Discussion",
        }
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of the reconstructed conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    /// None when the source timestamp was missing or malformed.
    pub timestamp: Option<DateTime<Utc>>,
    pub tool_calls: Vec<ToolCall>,
    pub phase: Option<ConversationPhase>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp,
            tool_calls: Vec::new(),
            phase: None,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp,
            tool_calls: Vec::new(),
            phase: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

/// Accumulated time spent in one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PhaseSummary {
    #[serde(rename = "PHASE_NAME")]
    pub phase: ConversationPhase,
    pub duration_seconds: i64,
    /// Formatted duration, e.g. "1h 5m".
    pub duration: String,
    pub turn_count: usize,
}

/// Result of pairing prompts with observations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<ConversationMessage>,
    pub phases: Vec<PhaseSummary>,
    pub duration: String,
    pub flow_pattern: String,
    pub tool_count: usize,
}
