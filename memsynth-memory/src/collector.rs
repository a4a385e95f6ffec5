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

//! Session Collector
//!
//! Orchestrates the extractors and merges their output into one
//! [`SessionRecord`].
//!
//! ```text
//! payload ─┬─► classify ──────────┬─► decisions ──┐
//!          ├─► file ledger        ├─► diagrams ───┤
//!          ├─► conversation ──────┘               ├─► SessionRecord
//!          └─► tool counts ─► handover/learning ──┘        │
//!                                                          ▼
//!                                       related docs (async probe)
//! ```
//!
//! Synthesis is synchronous and pure. The only I/O is the related-doc
//! probe in [`SessionCollector::collect`].

use crate::anchor::{AnchorDomain, AnchorRegistry};
use crate::classifier::classify_all;
use crate::conversation::pair_conversation;
use crate::decisions::extract_decisions;
use crate::diagrams::detect_diagrams;
use crate::docs::{DocProbe, FsDocProbe, NoSpecFolder, SpecFolderResolver};
use crate::files::build_file_ledger;
use crate::session_state::{build_handover, HandoverInputs, UNKNOWN};
use crate::text::truncate_chars;
use crate::tools::{count_tools, detect_tool_calls};
use chrono::{DateTime, Utc};
use memsynth_core::{
    DecisionCounts, ImportanceTier, PipelineConfig, SessionPayload, SessionRecord, ToolCall,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_TITLE: &str = "Development Session";
pub const SIMULATED_TITLE: &str = "Simulated Session";
const SIMULATED_SUMMARY: &str = "Simulated session: no payload was provided.";

/// Builds session records from payloads.
pub struct SessionCollector {
    config: PipelineConfig,
    probe: Arc<dyn DocProbe>,
    resolver: Arc<dyn SpecFolderResolver>,
}

impl SessionCollector {
    /// Create a collector that probes the filesystem under the configured
    /// project root (or the working directory).
    pub fn new(config: PipelineConfig) -> Self {
        let root = config
            .project_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config,
            probe: Arc::new(FsDocProbe::new(root)),
            resolver: Arc::new(NoSpecFolder),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn DocProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SpecFolderResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Collect a record for the payload, stamped with the current time.
    pub async fn collect(&self, payload: Option<&SessionPayload>) -> SessionRecord {
        self.collect_at(payload, Utc::now()).await
    }

    /// Collect a record with an explicit clock.
    ///
    /// A missing payload yields the simulated record. A failing doc probe
    /// leaves the related-doc list empty.
    pub async fn collect_at(
        &self,
        payload: Option<&SessionPayload>,
        now: DateTime<Utc>,
    ) -> SessionRecord {
        let Some(payload) = payload else {
            warn!("no session payload, emitting simulated record");
            return self.simulated(now);
        };

        let record = self.synthesize(payload, now);
        if record.spec_folder.is_empty() {
            return record;
        }
        match self.probe.related_docs(&record.spec_folder).await {
            Ok(docs) => record.with_related_docs(docs),
            Err(e) => {
                warn!(error = %e, spec_folder = %record.spec_folder, "related doc probe failed");
                record
            }
        }
    }

    fn resolve_spec_folder(&self, payload: &SessionPayload) -> String {
        payload
            .spec_folder
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.resolver.resolve())
            .unwrap_or_default()
    }

    fn title(&self, payload: &SessionPayload, spec_folder: &str) -> String {
        if let Some(prompt) = payload
            .user_prompts
            .iter()
            .map(|p| p.prompt.trim())
            .find(|p| !p.is_empty())
        {
            return truncate_chars(prompt, self.config.title_max_chars);
        }
        spec_folder
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    fn summary(&self, payload: &SessionPayload) -> String {
        let from_context = payload
            .recent_context
            .iter()
            .flat_map(|c| [c.learning.as_deref(), c.request.as_deref()])
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty());
        if let Some(summary) = from_context {
            return truncate_chars(summary, self.config.summary_max_chars);
        }
        payload
            .observations
            .iter()
            .map(|o| o.narrative.trim())
            .find(|n| !n.is_empty())
            .map(|n| truncate_chars(n, self.config.summary_max_chars))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// Run every extractor over the payload. Never fails.
    pub fn synthesize(&self, payload: &SessionPayload, now: DateTime<Utc>) -> SessionRecord {
        let config = &self.config;
        let spec_folder = self.resolve_spec_folder(payload);

        let mut observation_anchors = AnchorRegistry::new(AnchorDomain::Observations, &spec_folder);
        let observations = classify_all(&payload.observations, &mut observation_anchors);
        let files = build_file_ledger(payload, &payload.observations, config);
        let conversation = pair_conversation(&payload.user_prompts, &payload.observations, config);
        let extraction = extract_decisions(payload, &observations, &spec_folder);
        let diagrams = detect_diagrams(&observations, &conversation.phases, &spec_folder);

        let all_tool_calls: Vec<ToolCall> = payload
            .observations
            .iter()
            .flat_map(|o| o.fact_texts().flat_map(detect_tool_calls).collect::<Vec<_>>())
            .collect();
        let tool_counts = count_tools(&all_tool_calls);
        debug!(?tool_counts, "counted tool usage");

        let message_count = conversation.messages.len();
        let handover = build_handover(HandoverInputs {
            payload,
            observations: &observations,
            tool_counts: &tool_counts,
            files: &files,
            message_count,
            has_decisions: extraction.counts.total > 0,
            config,
        });

        let importance_tier = importance_tier(&extraction.counts, handover.is_blocked());
        let outcomes: Vec<String> = observations
            .iter()
            .map(|o| o.title.trim())
            .filter(|t| !t.is_empty())
            .take(config.max_outcomes)
            .map(str::to_string)
            .collect();

        let record = SessionRecord {
            title: self.title(payload, &spec_folder),
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            spec_folder,
            duration: conversation.duration.clone(),
            is_simulated: false,

            summary: self.summary(payload),
            outcomes,
            observation_count: observations.len(),
            observations,
            file_count: files.len(),
            has_files: !files.is_empty(),
            files,

            message_count,
            tool_count: conversation.tool_count,
            auto_save_triggered: message_count >= config.message_count_trigger,
            phases: conversation.phases,
            flow_pattern: conversation.flow_pattern,
            conversation: conversation.messages,

            has_decisions: !extraction.decisions.is_empty(),
            decision_counts: extraction.counts,
            decisions: extraction.decisions,

            diagram_count: diagrams.diagrams.len(),
            has_diagrams: !diagrams.diagrams.is_empty(),
            diagrams: diagrams.diagrams,
            auto_flowchart: diagrams.auto_flowchart,
            auto_decision_trees: diagrams.auto_decision_trees,
            diagram_type_counts: diagrams.type_counts,
            pattern_counts: diagrams.pattern_counts,

            has_pending_tasks: !handover.pending_tasks.is_empty(),
            handover,
            importance_tier,

            related_docs: Vec::new(),
            has_related_docs: false,
        };

        info!(
            title = %record.title,
            observations = record.observation_count,
            messages = record.message_count,
            decisions = record.decision_counts.total,
            files = record.file_count,
            status = record.handover.session_status.as_str(),
            "synthesized session record"
        );
        record
    }

    /// Placeholder record for a missing payload.
    pub fn simulated(&self, now: DateTime<Utc>) -> SessionRecord {
        let mut record = self.synthesize(&SessionPayload::default(), now);
        record.title = SIMULATED_TITLE.to_string();
        record.summary = SIMULATED_SUMMARY.to_string();
        record.is_simulated = true;
        record
    }
}

/// Critical with high-importance decisions or blockers, important with any
/// decision, else normal.
pub fn importance_tier(counts: &DecisionCounts, blocked: bool) -> ImportanceTier {
    if counts.high > 0 || blocked {
        ImportanceTier::Critical
    } else if counts.total > 0 {
        ImportanceTier::Important
    } else {
        ImportanceTier::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use memsynth_core::{MemoryError, MemoryResult, Observation, RecentContext, RelatedDoc, UserPrompt};

    struct FailingProbe;

    #[async_trait]
    impl DocProbe for FailingProbe {
        async fn related_docs(&self, spec_folder: &str) -> MemoryResult<Vec<RelatedDoc>> {
            Err(MemoryError::ProbeError {
                path: spec_folder.to_string(),
                reason: "permission denied".into(),
            })
        }
    }

    struct StaticProbe;

    #[async_trait]
    impl DocProbe for StaticProbe {
        async fn related_docs(&self, spec_folder: &str) -> MemoryResult<Vec<RelatedDoc>> {
            Ok(vec![RelatedDoc {
                file_name: "spec.md".into(),
                relative_path: format!("{}/spec.md", spec_folder),
                description: "Feature specification".into(),
            }])
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    #[tokio::test]
    async fn test_missing_payload_is_simulated() {
        let collector = SessionCollector::new(PipelineConfig::default());
        let record = collector.collect_at(None, now()).await;
        assert!(record.is_simulated);
        assert_eq!(record.title, SIMULATED_TITLE);
        assert_eq!(record.handover.learning.learning_index, "N/A");
        assert!(!record.auto_flowchart.is_empty());
        assert_eq!(record.date, "2025-03-04");
        assert_eq!(record.time, "05:06:07");
    }

    #[tokio::test]
    async fn test_probe_failure_degrades_to_empty_docs() {
        let collector =
            SessionCollector::new(PipelineConfig::default()).with_probe(Arc::new(FailingProbe));
        let payload = SessionPayload::default().spec_folder("specs/001-x");
        let record = collector.collect_at(Some(&payload), now()).await;
        assert!(record.related_docs.is_empty());
        assert!(!record.has_related_docs);
    }

    #[tokio::test]
    async fn test_related_docs_attached() {
        let collector =
            SessionCollector::new(PipelineConfig::default()).with_probe(Arc::new(StaticProbe));
        let payload = SessionPayload::default().spec_folder("specs/001-x");
        let record = collector.collect_at(Some(&payload), now()).await;
        assert!(record.has_related_docs);
        assert_eq!(record.related_docs[0].relative_path, "specs/001-x/spec.md");
    }

    #[test]
    fn test_title_fallbacks() {
        let collector = SessionCollector::new(PipelineConfig::default());
        let long_prompt = "a".repeat(200);
        let payload = SessionPayload::default().prompt(UserPrompt::new(long_prompt, now()));
        assert_eq!(collector.synthesize(&payload, now()).title.chars().count(), 80);

        let payload = SessionPayload::default().spec_folder("specs/049-auth-flow/");
        assert_eq!(collector.synthesize(&payload, now()).title, "049-auth-flow");

        let record = collector.synthesize(&SessionPayload::default(), now());
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.importance_tier, ImportanceTier::Normal);
    }

    #[test]
    fn test_resolver_supplies_spec_folder() {
        let collector = SessionCollector::new(PipelineConfig::default())
            .with_resolver(Arc::new(crate::docs::FixedSpecFolder("specs/010-search".into())));
        let record = collector.synthesize(&SessionPayload::default(), now());
        assert_eq!(record.spec_folder, "specs/010-search");

        let payload = SessionPayload::default().spec_folder("specs/011-other");
        assert_eq!(collector.synthesize(&payload, now()).spec_folder, "specs/011-other");
    }

    #[test]
    fn test_summary_sources() {
        let collector = SessionCollector::new(PipelineConfig::default());
        let payload = SessionPayload {
            recent_context: vec![RecentContext {
                request: Some("Add search".into()),
                ..Default::default()
            }],
            ..Default::default()
        }
        .observation(Observation::new("x").narrative("Narrative summary"));
        assert_eq!(collector.synthesize(&payload, now()).summary, "Add search");

        let payload = SessionPayload::default().observation(Observation::new("x").narrative("Narrative summary"));
        assert_eq!(collector.synthesize(&payload, now()).summary, "Narrative summary");
    }

    #[test]
    fn test_auto_save_trigger() {
        let config = PipelineConfig {
            message_count_trigger: 2,
            ..Default::default()
        };
        let collector = SessionCollector::new(config);
        let payload = SessionPayload::default()
            .prompt(UserPrompt::new("one", now()))
            .prompt(UserPrompt::new("two", now() + chrono::Duration::hours(1)));
        let record = collector.synthesize(&payload, now());
        assert_eq!(record.message_count, 2);
        assert!(record.auto_save_triggered);
    }

    #[test]
    fn test_importance_tier() {
        let none = DecisionCounts::default();
        let some = DecisionCounts { total: 1, medium: 1, ..Default::default() };
        let high = DecisionCounts { total: 1, high: 1, ..Default::default() };
        assert_eq!(importance_tier(&none, false), ImportanceTier::Normal);
        assert_eq!(importance_tier(&some, false), ImportanceTier::Important);
        assert_eq!(importance_tier(&high, false), ImportanceTier::Critical);
        assert_eq!(importance_tier(&none, true), ImportanceTier::Critical);
    }
}
