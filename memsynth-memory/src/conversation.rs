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

//! Conversation pairing
//!
//! Rebuilds a turn-by-turn transcript from user prompts and the
//! observations recorded around them.
//!
//! ```text
//!  prompt ──┬── obs (Δt < window) ──┐
//!           └── obs (Δt < window) ──┴──► assistant turn + tool calls
//!  prompt ── (no new obs, within window of previous turn) ──► folded
//! ```
//!
//! Each observation is claimed by its nearest prompt only. Messages are
//! ordered by timestamp with the user turn first on ties.

use crate::text::truncate_chars;
use crate::tools::{detect_tool_calls, is_read_tool, is_write_tool};
use chrono::{DateTime, Utc};
use memsynth_core::{
    Conversation, ConversationMessage, ConversationPhase, Observation, PhaseSummary,
    PipelineConfig, ToolCall, UserPrompt,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

pub const FLOW_DECISION_POINTS: &str = "Sequential with Decision Points";
pub const FLOW_MULTI_PHASE: &str = "Multi-Phase Workflow";
pub const FLOW_LINEAR: &str = "Linear Sequential";

const NARRATIVE_PREVIEW_CHARS: usize = 200;

static DECISION_LANGUAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:options?|decide[ds]?|decision|chose|choose|alternatives?)\b")
        .expect("decision language regex")
});

static DEBUG_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:fix|bug|error|fail|broken|debug)").expect("debug regex"));
static VERIFY_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:test|verify|review|check|validate)").expect("verify regex")
});
static BUILD_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:implement|add|create|build|write)").expect("build regex")
});
static PLAN_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:plan|design|decide|option|approach|architect)").expect("plan regex")
});
static RESEARCH_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:research|investigate|explore|analy|understand|look|find|search)")
        .expect("research regex")
});

/// What a phase rule can look at.
pub struct TurnSignals<'a> {
    pub user_text: &'a str,
    pub tool_calls: &'a [ToolCall],
}

impl TurnSignals<'_> {
    fn any_write(&self) -> bool {
        self.tool_calls.iter().any(|c| is_write_tool(&c.tool))
    }

    fn any_read(&self) -> bool {
        self.tool_calls.iter().any(|c| is_read_tool(&c.tool))
    }
}

/// One `(predicate, phase)` pair of the phase cascade.
pub struct PhaseRule {
    pub phase: ConversationPhase,
    pub predicate: fn(&TurnSignals<'_>) -> bool,
}

/// Phase cascade, first match wins.
pub static PHASE_RULES: &[PhaseRule] = &[
    PhaseRule {
        phase: ConversationPhase::Debugging,
        predicate: |s: &TurnSignals<'_>| DEBUG_WORDS.is_match(s.user_text),
    },
    PhaseRule {
        phase: ConversationPhase::Implementation,
        predicate: |s: &TurnSignals<'_>| s.any_write(),
    },
    PhaseRule {
        phase: ConversationPhase::Verification,
        predicate: |s: &TurnSignals<'_>| VERIFY_WORDS.is_match(s.user_text),
    },
    PhaseRule {
        phase: ConversationPhase::Implementation,
        predicate: |s: &TurnSignals<'_>| BUILD_WORDS.is_match(s.user_text),
    },
    PhaseRule {
        phase: ConversationPhase::Planning,
        predicate: |s: &TurnSignals<'_>| PLAN_WORDS.is_match(s.user_text),
    },
    PhaseRule {
        phase: ConversationPhase::Research,
        predicate: |s: &TurnSignals<'_>| s.any_read() || RESEARCH_WORDS.is_match(s.user_text),
    },
];

/// Classify the phase of one turn.
pub fn classify_phase(user_text: &str, tool_calls: &[ToolCall]) -> ConversationPhase {
    let signals = TurnSignals {
        user_text,
        tool_calls,
    };
    PHASE_RULES
        .iter()
        .find(|rule| (rule.predicate)(&signals))
        .map(|rule| rule.phase)
        .unwrap_or(ConversationPhase::Discussion)
}

/// Format a span in seconds as `"1h 5m"` or `"40m"`.
pub fn format_duration(seconds: i64) -> String {
    let minutes = seconds.max(0) / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

/// Span between the earliest and latest prompt, formatted.
pub fn session_duration<'a>(prompts: impl IntoIterator<Item = &'a UserPrompt>) -> String {
    let times: Vec<DateTime<Utc>> = prompts
        .into_iter()
        .filter_map(UserPrompt::parsed_timestamp)
        .collect();
    match (times.iter().min(), times.iter().max()) {
        (Some(first), Some(last)) => format_duration((*last - *first).num_seconds()),
        _ => format_duration(0),
    }
}

/// One user turn being assembled.
struct Turn {
    user: ConversationMessage,
    assistant: Option<ConversationMessage>,
    phase: ConversationPhase,
    started: Option<DateTime<Utc>>,
    ended: Option<DateTime<Utc>>,
}

impl Turn {
    /// Classify from the current user content and stamp both messages.
    fn reclassify(&mut self) {
        let tool_calls = self
            .assistant
            .as_ref()
            .map(|a| a.tool_calls.as_slice())
            .unwrap_or_default();
        let phase = classify_phase(&self.user.content, tool_calls);
        self.phase = phase;
        self.user.phase = Some(phase);
        if let Some(a) = self.assistant.as_mut() {
            a.phase = Some(phase);
        }
    }
}

/// Index of the prompt nearest to each observation, within the window.
fn claim_observations(
    prompt_times: &[Option<DateTime<Utc>>],
    observations: &[Observation],
    window_ms: i64,
) -> HashMap<usize, Vec<usize>> {
    let mut claims: HashMap<usize, Vec<usize>> = HashMap::new();
    for (obs_idx, obs) in observations.iter().enumerate() {
        let Some(obs_time) = obs.parsed_timestamp() else {
            continue;
        };
        let nearest = prompt_times
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (i, (obs_time - t).num_milliseconds().abs())))
            .filter(|(_, delta)| *delta < window_ms)
            .min_by_key(|(i, delta)| (*delta, *i));
        if let Some((prompt_idx, _)) = nearest {
            claims.entry(prompt_idx).or_default().push(obs_idx);
        }
    }
    claims
}

fn assistant_turn(
    related: &[&Observation],
    user_time: Option<DateTime<Utc>>,
) -> ConversationMessage {
    let summary = related
        .iter()
        .map(|obs| {
            if obs.narrative.trim().is_empty() {
                obs.title.trim().to_string()
            } else {
                truncate_chars(&obs.narrative, NARRATIVE_PREVIEW_CHARS)
            }
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let tool_calls: Vec<ToolCall> = related
        .iter()
        .flat_map(|obs| obs.fact_texts().flat_map(detect_tool_calls).collect::<Vec<_>>())
        .collect();

    let first_obs_time = related.iter().filter_map(|o| o.parsed_timestamp()).min();
    // An assistant turn never precedes the prompt that triggered it.
    let timestamp = match (user_time, first_obs_time) {
        (Some(u), Some(o)) => Some(u.max(o)),
        (u, o) => u.or(o),
    };

    let mut message = ConversationMessage::assistant(summary, timestamp);
    message.tool_calls = tool_calls;
    message
}

fn summarize_phases(turns: &[Turn]) -> Vec<PhaseSummary> {
    let mut order: Vec<ConversationPhase> = Vec::new();
    let mut spans: HashMap<ConversationPhase, (Option<DateTime<Utc>>, Option<DateTime<Utc>>, usize)> =
        HashMap::new();

    for turn in turns {
        if !order.contains(&turn.phase) {
            order.push(turn.phase);
        }
        let span = spans.entry(turn.phase).or_insert((None, None, 0));
        span.0 = match (span.0, turn.started) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let end = turn.ended.or(turn.started);
        span.1 = match (span.1, end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        span.2 += 1;
    }

    order
        .into_iter()
        .map(|phase| {
            let (first, last, turn_count) = spans[&phase];
            let duration_seconds = match (first, last) {
                (Some(f), Some(l)) => (l - f).num_seconds().max(0),
                _ => 0,
            };
            PhaseSummary {
                phase,
                duration_seconds,
                duration: format_duration(duration_seconds),
                turn_count,
            }
        })
        .collect()
}

fn flow_pattern(messages: &[ConversationMessage], phases: &[PhaseSummary]) -> &'static str {
    if messages.iter().any(|m| DECISION_LANGUAGE.is_match(&m.content)) {
        FLOW_DECISION_POINTS
    } else if phases.len() > 3 {
        FLOW_MULTI_PHASE
    } else {
        FLOW_LINEAR
    }
}

/// Pair prompts with nearby observations into a conversation.
pub fn pair_conversation(
    prompts: &[UserPrompt],
    observations: &[Observation],
    config: &PipelineConfig,
) -> Conversation {
    let window_ms = i64::try_from(config.message_time_window_ms).unwrap_or(i64::MAX);
    let prompts: Vec<&UserPrompt> = prompts.iter().filter(|p| !p.prompt.trim().is_empty()).collect();
    let prompt_times: Vec<Option<DateTime<Utc>>> =
        prompts.iter().map(|p| p.parsed_timestamp()).collect();
    let claims = claim_observations(&prompt_times, observations, window_ms);

    let mut turns: Vec<Turn> = Vec::new();
    for (idx, prompt) in prompts.iter().enumerate() {
        let user_time = prompt_times[idx];
        let related: Vec<&Observation> = claims
            .get(&idx)
            .map(|ids| ids.iter().map(|&i| &observations[i]).collect())
            .unwrap_or_default();

        if related.is_empty() {
            if let Some(previous) = turns.last_mut() {
                let within_window = match (previous.started, user_time) {
                    (Some(prev), Some(now)) => (now - prev).num_milliseconds().abs() < window_ms,
                    _ => false,
                };
                if within_window {
                    previous.user.content.push_str("\n\n");
                    previous.user.content.push_str(prompt.prompt.trim());
                    previous.ended = previous.ended.max(user_time);
                    previous.reclassify();
                    continue;
                }
            }
        }

        let user = ConversationMessage::user(prompt.prompt.trim(), user_time);
        let assistant = (!related.is_empty()).then(|| assistant_turn(&related, user_time));
        let ended = assistant.as_ref().and_then(|a| a.timestamp).or(user_time);
        let mut turn = Turn {
            user,
            assistant,
            phase: ConversationPhase::Discussion,
            started: user_time,
            ended,
        };
        turn.reclassify();
        turns.push(turn);
    }

    let phases = summarize_phases(&turns);
    let mut messages: Vec<ConversationMessage> = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        messages.push(turn.user);
        if let Some(a) = turn.assistant {
            messages.push(a);
        }
    }
    // Stable sort: untimed messages keep their relative order at the end.
    messages.sort_by_key(|m| (m.timestamp.is_none(), m.timestamp, !m.is_user()));

    let tool_count = messages.iter().map(|m| m.tool_calls.len()).sum();
    let flow = flow_pattern(&messages, &phases);
    debug!(
        messages = messages.len(),
        phases = phases.len(),
        tool_count,
        "paired conversation"
    );

    Conversation {
        duration: session_duration(prompts.iter().copied()),
        flow_pattern: flow.to_string(),
        messages,
        phases,
        tool_count,
    }
}
