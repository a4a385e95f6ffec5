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

//! Session Record
//!
//! The single output of the pipeline: a flat mapping of named fields that
//! the template renderer consumes. Keys serialize in SCREAMING_SNAKE_CASE
//! (`TITLE`, `DECISIONS`, `LEARNING_INDEX`, ...).
//!
//! # Record Layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ SessionRecord                                             │
//! │  metadata     TITLE DATE TIME SPEC_FOLDER DURATION        │
//! │  content      SUMMARY OUTCOMES OBSERVATIONS FILES         │
//! │  conversation CONVERSATION PHASES FLOW_PATTERN TOOL_COUNT │
//! │  decisions    DECISIONS DECISION_COUNT ...                │
//! │  diagrams     DIAGRAMS AUTO_FLOWCHART ...                 │
//! │  handover     (flattened SessionHandover + learning)      │
//! └───────────────────────────────────────────────────────────┘
//! ```

use crate::conversation::{ConversationMessage, PhaseSummary};
use crate::decision::Decision;
use crate::observation_types::ObservationType;
use crate::payload::FileEntry;
use crate::session::SessionHandover;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An observation after classification and anchoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ClassifiedObservation {
    #[serde(rename = "TYPE")]
    pub observation_type: ObservationType,
    pub title: String,
    pub narrative: String,
    pub facts: Vec<String>,
    pub files: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub anchor_id: String,
    pub has_diagram: bool,
}

/// Structural complexity tier of a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramComplexity {
    Simple,
    Moderate,
    Complex,
}

impl DiagramComplexity {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagramComplexity::Simple => "simple",
            DiagramComplexity::Moderate => "moderate",
            DiagramComplexity::Complex => "complex",
        }
    }
}

impl fmt::Display for DiagramComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the observation the diagram was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramSource {
    Narrative,
    Fact,
}

/// An ASCII diagram found in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DetectedDiagram {
    pub title: String,
    pub source: DiagramSource,
    #[serde(rename = "ASCII_ART")]
    pub art: String,
    pub diagram_type: String,
    pub complexity: DiagramComplexity,
    pub anchor_id: String,
    pub box_count: usize,
    pub arrow_count: usize,
    pub line_count: usize,
}

/// A diagram generated by the pipeline rather than found in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GeneratedDiagram {
    pub title: String,
    #[serde(rename = "ASCII_ART")]
    pub art: String,
}

/// A companion document found next to the session's spec folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RelatedDoc {
    pub file_name: String,
    pub relative_path: String,
    pub description: String,
}

/// Decision tallies by importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecisionCounts {
    #[serde(rename = "DECISION_COUNT")]
    pub total: usize,
    #[serde(rename = "HIGH_IMPORTANCE_COUNT")]
    pub high: usize,
    #[serde(rename = "MEDIUM_IMPORTANCE_COUNT")]
    pub medium: usize,
    #[serde(rename = "LOW_IMPORTANCE_COUNT")]
    pub low: usize,
}

/// Retention tier of the whole session memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceTier {
    Critical,
    Important,
    Normal,
}

/// The synthesized session memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SessionRecord {
    // Metadata
    pub title: String,
    pub date: String,
    pub time: String,
    pub spec_folder: String,
    pub duration: String,
    pub is_simulated: bool,

    // Content
    pub summary: String,
    pub outcomes: Vec<String>,
    pub observations: Vec<ClassifiedObservation>,
    pub observation_count: usize,
    pub files: Vec<FileEntry>,
    pub file_count: usize,
    pub has_files: bool,

    // Conversation
    pub conversation: Vec<ConversationMessage>,
    pub message_count: usize,
    pub tool_count: usize,
    pub phases: Vec<PhaseSummary>,
    pub flow_pattern: String,
    pub auto_save_triggered: bool,

    // Decisions
    pub decisions: Vec<Decision>,
    #[serde(flatten)]
    pub decision_counts: DecisionCounts,
    pub has_decisions: bool,

    // Diagrams
    pub diagrams: Vec<DetectedDiagram>,
    pub diagram_count: usize,
    pub has_diagrams: bool,
    pub auto_flowchart: String,
    pub auto_decision_trees: Vec<GeneratedDiagram>,
    pub diagram_type_counts: BTreeMap<String, usize>,
    pub pattern_counts: BTreeMap<String, usize>,

    // Handover and learning
    #[serde(flatten)]
    pub handover: SessionHandover,
    pub has_pending_tasks: bool,
    pub importance_tier: ImportanceTier,

    // Related documentation
    pub related_docs: Vec<RelatedDoc>,
    pub has_related_docs: bool,
}

impl SessionRecord {
    /// Serialize to a JSON value keyed by field name.
    pub fn to_json(&self) -> serde_json::Value {
        // Serialization of plain data with string keys cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Attach related documents.
    pub fn with_related_docs(mut self, docs: Vec<RelatedDoc>) -> Self {
        self.has_related_docs = !docs.is_empty();
        self.related_docs = docs;
        self
    }
}
