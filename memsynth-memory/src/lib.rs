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

//! Memsynth Memory Pipeline
//!
//! Turns a raw development-session transcript into a structured session
//! memory record:
//! - **Classification**: semantic type and anchor for every observation
//! - **File Ledger**: one entry per touched file, best description wins
//! - **Conversation**: prompts paired with nearby observations, phases, tools
//! - **Decisions**: manual or mined, with rendered decision trees
//! - **Diagrams**: detected box-drawing art plus generated flowcharts
//! - **Handover**: project phase, blockers, pending tasks, Learning Index
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      SessionCollector                        │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────┐              │
//! │  │ classifier │  │   files    │  │conversation│              │
//! │  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘              │
//! │        │               │               │                     │
//! │  ┌─────▼──────┐  ┌─────▼──────┐  ┌─────▼──────┐              │
//! │  │ decisions  │  │  diagrams  │  │session_state│ ◄─ learning │
//! │  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘              │
//! │        └───────────────┼───────────────┘                     │
//! │                  SessionRecord ──► DocProbe (async)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use memsynth_memory::{PipelineConfig, SessionCollector, SessionPayload};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let payload = SessionPayload::from_json(&std::fs::read_to_string("session.json")?)?;
//!     let collector = SessionCollector::new(PipelineConfig::default());
//!     let record = collector.collect(Some(&payload)).await;
//!     println!("{}", record.to_json());
//!     Ok(())
//! }
//! ```

pub mod anchor;
pub mod ascii;
pub mod classifier;
pub mod collector;
pub mod conversation;
pub mod decision_tree;
pub mod decisions;
pub mod diagrams;
pub mod docs;
pub mod files;
pub mod learning;
pub mod session_state;
pub mod text;
pub mod tools;

// Re-exports
pub use anchor::{AnchorDomain, AnchorRegistry};
pub use classifier::{classify, classify_all, ClassificationRule, CLASSIFICATION_RULES};
pub use collector::SessionCollector;
pub use conversation::{format_duration, pair_conversation};
pub use decision_tree::render_decision_tree;
pub use decisions::{extract_decisions, parse_decision, DecisionExtraction};
pub use diagrams::{contains_diagram, detect_diagrams, render_flowchart, DiagramReport};
pub use docs::{DocProbe, FixedSpecFolder, FsDocProbe, NoSpecFolder, SpecFolderResolver, COMPANION_DOCS};
pub use files::{build_file_ledger, normalize_path, FileLedger};
pub use learning::{build_learning_fields, learning_index};
pub use session_state::{build_handover, HandoverInputs};
pub use tools::{count_tools, detect_tool_calls};

pub use memsynth_core::{
    MemoryError, MemoryResult, Observation, PipelineConfig, SessionPayload, SessionRecord,
    UserPrompt,
};
