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

//! Session State Inference
//!
//! Heuristics that turn tool usage and observation text into a handover
//! snapshot.
//!
//! # Project Phase
//!
//! ```text
//! write ratio > 0.4                       → IMPLEMENTATION
//! decisions && writes < reads             → PLANNING
//! feature observations && writes > 0      → REVIEW
//! read ratio > 0.6                        → RESEARCH
//! otherwise                               → IMPLEMENTATION
//! ```
//!
//! # Completion
//!
//! ```text
//! COMPLETED → 100
//! otherwise   min(50, 5·messages) + 30·writes/tools + min(20, 3·observations)
//!             capped at 95, or at min(90, 5·messages) when BLOCKED
//! ```

use crate::files::normalize_path;
use crate::learning::build_learning_fields;
use crate::text::sentences;
use crate::tools::{is_read_tool, is_write_tool};
use memsynth_core::{
    ClassifiedObservation, FileEntry, FileProgress, FileStatus, PendingTask,
    PipelineConfig, ProjectPhase, SessionHandover, SessionPayload, SessionStatus, TaskPriority,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub const NO_BLOCKERS: &str = "None";
pub const DEFAULT_NEXT_ACTION: &str = "Continue implementation";
pub const UNKNOWN: &str = "N/A";

static BLOCKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)block|stuck|issue|problem|error|fail|cannot|can't").expect("blocker regex")
});

static COMPLETION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:completed?|done|finished|all tests pass(?:ing|ed)?|shipped|merged)\b")
        .expect("completion regex")
});

static TASK_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\btodo:|\btask:|\bremaining:|-\s*\[ \])\s*(.+)$").expect("task marker regex")
});

static NEXT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bnext(?: step)?:\s*(.+)$").expect("next marker regex"));

static URGENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:must|critical|urgent|required|blocker)\b").expect("urgency regex")
});

static CREATED_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:creat|new file|added new|initial|scaffold)").expect("created regex")
});

static DELETED_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:delet|remov)").expect("deleted regex"));

/// Everything the state inference reads.
#[derive(Debug, Clone, Copy)]
pub struct HandoverInputs<'a> {
    pub payload: &'a SessionPayload,
    pub observations: &'a [ClassifiedObservation],
    pub tool_counts: &'a BTreeMap<String, usize>,
    pub files: &'a [FileEntry],
    pub message_count: usize,
    pub has_decisions: bool,
    pub config: &'a PipelineConfig,
}

/// Tool usage split into reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolUsage {
    pub reads: usize,
    pub writes: usize,
    pub total: usize,
}

impl ToolUsage {
    pub fn from_counts(counts: &BTreeMap<String, usize>) -> Self {
        counts.iter().fold(Self::default(), |mut usage, (tool, &n)| {
            usage.total += n;
            if is_write_tool(tool) {
                usage.writes += n;
            } else if is_read_tool(tool) {
                usage.reads += n;
            }
            usage
        })
    }

    fn ratio(&self, n: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            n as f64 / self.total as f64
        }
    }
}

/// Observations ordered latest first: by timestamp, then by position.
fn latest_first(observations: &[ClassifiedObservation]) -> Vec<&ClassifiedObservation> {
    let mut ordered: Vec<(usize, &ClassifiedObservation)> = observations.iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| (b.timestamp, ib).cmp(&(a.timestamp, ia)));
    ordered.into_iter().map(|(_, o)| o).collect()
}

pub fn infer_project_phase(
    usage: ToolUsage,
    has_decisions: bool,
    observations: &[ClassifiedObservation],
) -> ProjectPhase {
    let has_features = observations
        .iter()
        .any(|o| o.observation_type.is_feature_work());

    if usage.ratio(usage.writes) > 0.4 {
        ProjectPhase::Implementation
    } else if has_decisions && usage.writes < usage.reads {
        ProjectPhase::Planning
    } else if has_features && usage.writes > 0 {
        ProjectPhase::Review
    } else if usage.ratio(usage.reads) > 0.6 {
        ProjectPhase::Research
    } else {
        ProjectPhase::Implementation
    }
}

/// First narrative sentence that reads like a blocker.
pub fn find_blockers(observations: &[ClassifiedObservation]) -> String {
    observations
        .iter()
        .flat_map(|o| sentences(&o.narrative))
        .find(|s| BLOCKER.is_match(s))
        .unwrap_or_else(|| NO_BLOCKERS.to_string())
}

pub fn infer_status(blockers: &str, observations: &[ClassifiedObservation]) -> SessionStatus {
    if blockers != NO_BLOCKERS {
        return SessionStatus::Blocked;
    }
    let completed = latest_first(observations)
        .first()
        .is_some_and(|o| COMPLETION.is_match(&format!("{}\n{}", o.title, o.narrative)));
    if completed {
        SessionStatus::Completed
    } else {
        SessionStatus::InProgress
    }
}

pub fn completion_percent(
    status: SessionStatus,
    usage: ToolUsage,
    message_count: usize,
    observation_count: usize,
) -> u8 {
    if status == SessionStatus::Completed {
        return 100;
    }
    let message_part = (5 * message_count).min(50);
    let write_part = if usage.total == 0 {
        0
    } else {
        30 * usage.writes / usage.total
    };
    let observation_part = (3 * observation_count).min(20);
    let cap = if status == SessionStatus::Blocked {
        (5 * message_count).min(90)
    } else {
        95
    };
    (message_part + write_part + observation_part).min(cap) as u8
}

fn is_generic_next_action(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(DEFAULT_NEXT_ACTION)
}

/// Next action and whether it came from the session rather than the default.
pub fn resolve_next_action(
    payload: &SessionPayload,
    observations: &[ClassifiedObservation],
) -> (String, bool) {
    let from_context = payload
        .recent_context
        .iter()
        .filter_map(|c| c.next_action.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty() && !is_generic_next_action(s));
    if let Some(next) = from_context {
        return (next.to_string(), true);
    }

    let from_observations = latest_first(observations).into_iter().find_map(|o| {
        o.narrative
            .lines()
            .chain(o.facts.iter().flat_map(|f| f.lines()))
            .filter_map(|line| NEXT_MARKER.captures(line).map(|c| c[1].trim().to_string()))
            .find(|s| !s.is_empty() && !is_generic_next_action(s))
    });
    match from_observations {
        Some(next) => (next, true),
        None => (DEFAULT_NEXT_ACTION.to_string(), false),
    }
}

fn task_priority(description: &str) -> TaskPriority {
    if URGENT.is_match(description) {
        TaskPriority::P1
    } else {
        TaskPriority::P2
    }
}

/// Collect open tasks, meaningful next action first.
pub fn collect_pending_tasks(
    observations: &[ClassifiedObservation],
    next_action: Option<&str>,
    max: usize,
) -> Vec<PendingTask> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries: Vec<(String, TaskPriority)> = Vec::new();

    if let Some(next) = next_action {
        seen.insert(next.to_lowercase());
        entries.push((next.to_string(), TaskPriority::P0));
    }

    let lines = observations.iter().flat_map(|o| {
        o.narrative
            .lines()
            .chain(o.facts.iter().flat_map(|f| f.lines()))
    });
    for line in lines {
        let Some(caps) = TASK_MARKER.captures(line) else {
            continue;
        };
        let description = caps[1].trim();
        if description.is_empty() || !seen.insert(description.to_lowercase()) {
            continue;
        }
        entries.push((description.to_string(), task_priority(description)));
    }

    if entries.len() > max {
        debug!(found = entries.len(), max, "pending tasks capped");
    }
    entries
        .into_iter()
        .take(max)
        .enumerate()
        .map(|(i, (description, priority))| PendingTask {
            id: format!("T{:03}", i + 1),
            description,
            priority,
        })
        .collect()
}

pub fn file_status(description: &str) -> FileStatus {
    if DELETED_WORDS.is_match(description) {
        FileStatus::Deleted
    } else if CREATED_WORDS.is_match(description) {
        FileStatus::Created
    } else {
        FileStatus::Modified
    }
}

fn active_file(inputs: &HandoverInputs<'_>) -> String {
    let root = inputs.config.project_root.as_deref();
    latest_first(inputs.observations)
        .into_iter()
        .find_map(|o| o.files.last())
        .map(|f| normalize_path(f, root).unwrap_or_else(|| f.clone()))
        .or_else(|| inputs.files.first().map(|f| f.path.clone()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Build the handover snapshot.
pub fn build_handover(inputs: HandoverInputs<'_>) -> SessionHandover {
    let usage = ToolUsage::from_counts(inputs.tool_counts);
    let project_phase = infer_project_phase(usage, inputs.has_decisions, inputs.observations);
    let blockers = find_blockers(inputs.observations);
    let session_status = infer_status(&blockers, inputs.observations);
    let completion = completion_percent(
        session_status,
        usage,
        inputs.message_count,
        inputs.observations.len(),
    );
    let (next_action, meaningful) = resolve_next_action(inputs.payload, inputs.observations);
    let pending_tasks = collect_pending_tasks(
        inputs.observations,
        meaningful.then_some(next_action.as_str()),
        inputs.config.max_pending_tasks,
    );
    let last_action = latest_first(inputs.observations)
        .first()
        .map(|o| o.title.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let file_progress = inputs
        .files
        .iter()
        .map(|f| FileProgress {
            file_name: f.path.clone(),
            file_status: file_status(&f.description),
        })
        .collect();

    debug!(
        phase = project_phase.as_str(),
        status = session_status.as_str(),
        completion,
        tasks = pending_tasks.len(),
        "inferred session state"
    );

    SessionHandover {
        project_phase,
        active_file: active_file(&inputs),
        last_action,
        next_action,
        blockers,
        file_progress,
        session_status,
        completion_percent: completion,
        pending_tasks,
        learning: build_learning_fields(
            inputs.payload.preflight.as_ref(),
            inputs.payload.postflight.as_ref(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use memsynth_core::{ObservationType, RecentContext};

    fn obs(kind: ObservationType, title: &str, narrative: &str, facts: &[&str]) -> ClassifiedObservation {
        ClassifiedObservation {
            observation_type: kind,
            title: title.into(),
            narrative: narrative.into(),
            facts: facts.iter().map(|f| f.to_string()).collect(),
            files: vec![],
            timestamp: None,
            anchor_id: String::new(),
            has_diagram: false,
        }
    }

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_project_phase_rules() {
        let none: Vec<ClassifiedObservation> = vec![];
        let usage = ToolUsage::from_counts(&counts(&[("Edit", 5), ("Read", 5)]));
        assert_eq!(infer_project_phase(usage, false, &none), ProjectPhase::Implementation);

        let usage = ToolUsage::from_counts(&counts(&[("Edit", 1), ("Read", 5)]));
        assert_eq!(infer_project_phase(usage, true, &none), ProjectPhase::Planning);

        let features = vec![obs(ObservationType::Feature, "Add cache", "", &[])];
        assert_eq!(infer_project_phase(usage, false, &features), ProjectPhase::Review);

        let usage = ToolUsage::from_counts(&counts(&[("Read", 7), ("Bash", 3)]));
        assert_eq!(infer_project_phase(usage, false, &none), ProjectPhase::Research);

        let usage = ToolUsage::from_counts(&counts(&[("Bash", 3)]));
        assert_eq!(infer_project_phase(usage, false, &none), ProjectPhase::Implementation);
    }

    #[test]
    fn test_blockers_and_status() {
        let observations = vec![
            obs(ObservationType::Feature, "Setup", "Installed deps. Stuck on the linker flags.", &[]),
        ];
        let blockers = find_blockers(&observations);
        assert_eq!(blockers, "Stuck on the linker flags.");
        assert_eq!(infer_status(&blockers, &observations), SessionStatus::Blocked);

        let observations = vec![obs(ObservationType::Feature, "Wrap up", "Feature finished and merged.", &[])];
        let blockers = find_blockers(&observations);
        assert_eq!(blockers, NO_BLOCKERS);
        assert_eq!(infer_status(&blockers, &observations), SessionStatus::Completed);
        assert_eq!(infer_status(NO_BLOCKERS, &[]), SessionStatus::InProgress);
    }

    #[test]
    fn test_completion_percent() {
        let usage = ToolUsage { reads: 5, writes: 5, total: 10 };
        assert_eq!(completion_percent(SessionStatus::Completed, usage, 0, 0), 100);
        // 20 + 15 + 9
        assert_eq!(completion_percent(SessionStatus::InProgress, usage, 4, 3), 44);
        // 50 + 30 + 20 capped at 95
        let all_writes = ToolUsage { reads: 0, writes: 4, total: 4 };
        assert_eq!(completion_percent(SessionStatus::InProgress, all_writes, 30, 30), 95);
        // blocked cap is min(90, 5 * messages)
        assert_eq!(completion_percent(SessionStatus::Blocked, all_writes, 2, 30), 10);
    }

    #[test]
    fn test_pending_tasks_capped_with_next_action_first() {
        let facts: Vec<String> = (0..15).map(|i| format!("TODO: item {}", i)).collect();
        let fact_refs: Vec<&str> = facts.iter().map(String::as_str).collect();
        let mut observations = vec![obs(ObservationType::Feature, "Work", "- [ ] Item 0\ntask: must fix CI", &fact_refs)];
        observations[0].narrative.push_str("\nremaining: docs");

        let tasks = collect_pending_tasks(&observations, Some("Ship the release"), 10);
        assert_eq!(tasks.len(), 10);
        assert_eq!(tasks[0].description, "Ship the release");
        assert_eq!(tasks[0].priority, TaskPriority::P0);
        assert_eq!(tasks[0].id, "T001");
        assert_eq!(tasks[1].description, "Item 0");
        assert_eq!(tasks[2].description, "must fix CI");
        assert_eq!(tasks[2].priority, TaskPriority::P1);
        assert_eq!(tasks[3].description, "docs");
        // "TODO: item 0" duplicates "Item 0"
        assert_eq!(tasks[4].description, "item 1");
        assert_eq!(tasks[4].priority, TaskPriority::P2);
    }

    #[test]
    fn test_next_action_sources() {
        let observations = vec![
            obs(ObservationType::Feature, "Older", "Next: write docs", &[]),
            obs(ObservationType::Feature, "Newer", "", &["Next step: add metrics"]),
        ];
        let payload = SessionPayload::default();
        assert_eq!(
            resolve_next_action(&payload, &observations),
            ("add metrics".to_string(), true)
        );

        let payload = SessionPayload {
            recent_context: vec![RecentContext {
                next_action: Some("Review PR".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(resolve_next_action(&payload, &observations).0, "Review PR");
        assert_eq!(
            resolve_next_action(&SessionPayload::default(), &[]),
            (DEFAULT_NEXT_ACTION.to_string(), false)
        );
    }

    #[test]
    fn test_generic_next_action_is_not_a_task() {
        let observations = vec![obs(ObservationType::Feature, "Docs", "TODO: write docs", &[])];
        let payload = SessionPayload {
            recent_context: vec![RecentContext {
                next_action: Some(" continue implementation ".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            resolve_next_action(&payload, &observations),
            (DEFAULT_NEXT_ACTION.to_string(), false)
        );

        let observations = vec![obs(
            ObservationType::Feature,
            "Wrap up",
            "Next: Continue implementation",
            &["TODO: write docs"],
        )];
        let (next, meaningful) = resolve_next_action(&SessionPayload::default(), &observations);
        assert!(!meaningful);

        let tasks = collect_pending_tasks(&observations, meaningful.then_some(next.as_str()), 10);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "T001");
        assert_eq!(tasks[0].description, "write docs");
        assert_eq!(tasks[0].priority, TaskPriority::P2);
    }

    #[test]
    fn test_latest_observation_by_timestamp() {
        let mut early = obs(ObservationType::Feature, "Early", "", &[]);
        early.timestamp = Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
        early.files = vec!["src/late.rs".into()];
        let mut first = obs(ObservationType::Feature, "First", "", &[]);
        first.timestamp = Some(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
        let observations = vec![early, first];
        assert_eq!(latest_first(&observations)[0].title, "Early");

        let config = PipelineConfig::default();
        let payload = SessionPayload::default();
        let tool_counts = BTreeMap::new();
        let handover = build_handover(HandoverInputs {
            payload: &payload,
            observations: &observations,
            tool_counts: &tool_counts,
            files: &[],
            message_count: 2,
            has_decisions: false,
            config: &config,
        });
        assert_eq!(handover.last_action, "Early");
        assert_eq!(handover.active_file, "src/late.rs");
        assert_eq!(handover.next_action, DEFAULT_NEXT_ACTION);
        assert!(handover.pending_tasks.is_empty());
        assert!(!handover.learning.has_learning_data);
    }

    #[test]
    fn test_file_status_keywords() {
        assert_eq!(file_status("Created the parser module"), FileStatus::Created);
        assert_eq!(file_status("Removed legacy shim"), FileStatus::Deleted);
        assert_eq!(file_status("Tweaked error text"), FileStatus::Modified);
    }
}
