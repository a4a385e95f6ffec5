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

//! Decision extraction
//!
//! Two mutually exclusive modes:
//!
//! - **Manual**: `_manualDecisions` entries become single-option decisions
//!   with confidence 80 unless the entry supplies its own.
//! - **Mined**: every decision-classified observation is parsed for
//!   `Option X:` lines, the chosen option, rationale, confidence and
//!   keyword-prefixed facts (pros, cons, evidence, caveats, follow-ups).
//!
//! Each decision receives an anchor from the extractor's own registry, and
//! each decision with options receives a rendered tree.

use crate::anchor::{AnchorDomain, AnchorRegistry};
use crate::decision_tree::render_decision_tree;
use crate::text::{prefix_chars, sentences, truncate_chars};
use memsynth_core::{
    ClassifiedObservation, Decision, DecisionCounts, DecisionOption, Importance, ManualDecision,
    ObservationType, SessionPayload,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const DEFAULT_MINED_CONFIDENCE: u8 = 75;
pub const DEFAULT_MANUAL_CONFIDENCE: u8 = 80;
const RATIONALE_FALLBACK_CHARS: usize = 200;
const TITLE_MAX_CHARS: usize = 80;

static OPTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:[-*•]\s*)?((?:option|alternative)\s+[a-z0-9]+)\s*[:)\-]\s*(.*)$")
        .expect("option line regex")
});

static CHOSEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:chose|selected|decided on|went with)\s+([^.;!\n]+)").expect("chosen regex")
});

static RATIONALE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:because|rationale|reason)\b[\s:,-]*(.+)").expect("rationale regex")
});

static CONFIDENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bconfidence\s*[:=]?\s*(\d{1,3})\s*%").expect("confidence regex")
});

/// Which list a keyword-prefixed fact lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FactKind {
    Pro,
    Con,
    Evidence,
    Caveat,
    Followup,
}

/// Keyword-prefix rules. `\b` keeps "disadvantage" out of the pros.
static FACT_PREFIXES: Lazy<Vec<(Regex, FactKind)>> = Lazy::new(|| {
    let rule = |words: &str, kind| {
        let pattern = format!(r"(?i)^\s*(?:[-*•]\s*)?(?:{})\b\s*[:\-]?\s*(.*)$", words);
        (Regex::new(&pattern).expect("fact prefix regex"), kind)
    };
    vec![
        rule("cons?|disadvantages?|drawbacks?|downsides?", FactKind::Con),
        rule("pros?|advantages?|benefits?|upsides?", FactKind::Pro),
        rule("evidence|proof|benchmarks?", FactKind::Evidence),
        rule("caveats?|warnings?|limitations?|risks?", FactKind::Caveat),
        rule("follow[- ]?ups?|next steps?", FactKind::Followup),
    ]
});

/// Decisions plus their importance tallies.
#[derive(Debug, Clone, Default)]
pub struct DecisionExtraction {
    pub decisions: Vec<Decision>,
    pub counts: DecisionCounts,
}

/// Tally decisions by importance.
pub fn count_decisions(decisions: &[Decision]) -> DecisionCounts {
    let mut counts = DecisionCounts {
        total: decisions.len(),
        ..Default::default()
    };
    for decision in decisions {
        match decision.importance {
            Importance::High => counts.high += 1,
            Importance::Medium => counts.medium += 1,
            Importance::Low => counts.low += 1,
        }
    }
    counts
}

fn parse_options(obs: &ClassifiedObservation) -> Vec<DecisionOption> {
    let mut options: Vec<DecisionOption> = Vec::new();
    let lines = obs
        .facts
        .iter()
        .flat_map(|f| f.lines())
        .chain(obs.narrative.lines());
    for line in lines {
        let Some(caps) = OPTION_LINE.captures(line) else {
            continue;
        };
        let label = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
        if options.iter().any(|o| o.label.eq_ignore_ascii_case(&label)) {
            continue;
        }
        let description = caps.get(2).map_or("", |m| m.as_str()).trim();
        options.push(DecisionOption::new(options.len() + 1, label, description));
    }
    options
}

/// True when `phrase` names `label` as a whole word sequence.
fn mentions_label(phrase: &str, label: &str) -> bool {
    let phrase = phrase.to_lowercase();
    let label = label.to_lowercase();
    phrase.match_indices(&label).any(|(i, _)| {
        let before_ok = phrase[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = phrase[i + label.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

fn parse_chosen(obs: &ClassifiedObservation, options: &[DecisionOption]) -> String {
    let phrase = std::iter::once(obs.narrative.as_str())
        .chain(obs.facts.iter().map(String::as_str))
        .find_map(|text| CHOSEN.captures(text).map(|c| c[1].trim().to_string()));

    if let Some(phrase) = &phrase {
        if let Some(option) = options.iter().find(|o| mentions_label(phrase, &o.label)) {
            return option.label.clone();
        }
    }
    match options.first() {
        Some(first) => first.label.clone(),
        None => phrase.map(|p| truncate_chars(&p, TITLE_MAX_CHARS)).unwrap_or_default(),
    }
}

fn parse_rationale(obs: &ClassifiedObservation) -> String {
    sentences(&obs.narrative)
        .iter()
        .find_map(|s| RATIONALE.captures(s).map(|c| c[1].trim().to_string()))
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| prefix_chars(obs.narrative.trim(), RATIONALE_FALLBACK_CHARS))
}

fn parse_confidence(obs: &ClassifiedObservation) -> u8 {
    std::iter::once(obs.narrative.as_str())
        .chain(obs.facts.iter().map(String::as_str))
        .find_map(|text| CONFIDENCE.captures(text))
        .and_then(|c| c[1].parse::<u16>().ok())
        .map(|n| n.min(100) as u8)
        .unwrap_or(DEFAULT_MINED_CONFIDENCE)
}

/// Parse one decision observation, without anchor or tree.
pub fn parse_decision(obs: &ClassifiedObservation) -> Decision {
    let options = parse_options(obs);
    let mut decision = Decision::new(obs.title.trim(), parse_confidence(obs));
    decision.chosen = parse_chosen(obs, &options);
    decision.options = options;
    decision.rationale = parse_rationale(obs);
    decision.context = sentences(&obs.narrative)
        .into_iter()
        .next()
        .map(|s| truncate_chars(&s, RATIONALE_FALLBACK_CHARS))
        .unwrap_or_default();
    decision.timestamp = obs
        .timestamp
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();

    for fact in &obs.facts {
        let Some((caps, kind)) = FACT_PREFIXES
            .iter()
            .find_map(|(re, kind)| re.captures(fact).map(|c| (c, *kind)))
        else {
            continue;
        };
        let text = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        if text.is_empty() {
            continue;
        }
        match kind {
            FactKind::Pro => decision.pros.push(text),
            FactKind::Con => decision.cons.push(text),
            FactKind::Evidence => decision.evidence.push(text),
            FactKind::Caveat => decision.caveats.push(text),
            FactKind::Followup => decision.followup.push(text),
        }
    }
    decision
}

fn manual_decision(entry: &ManualDecision) -> Decision {
    match entry {
        ManualDecision::Text(text) => {
            let text = text.trim();
            let mut decision = Decision::new(truncate_chars(text, TITLE_MAX_CHARS), DEFAULT_MANUAL_CONFIDENCE);
            decision.chosen = text.to_string();
            decision.options = vec![DecisionOption::new(1, text, "")];
            decision
        }
        ManualDecision::Detailed(spec) => {
            let chosen = spec
                .decision
                .as_deref()
                .or(spec.title.as_deref())
                .unwrap_or("Manual decision")
                .trim()
                .to_string();
            let title = spec
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| truncate_chars(t, TITLE_MAX_CHARS))
                .unwrap_or_else(|| truncate_chars(&chosen, TITLE_MAX_CHARS));
            let confidence = spec.confidence.unwrap_or(DEFAULT_MANUAL_CONFIDENCE);
            let mut decision = Decision::new(title, confidence);
            decision.rationale = spec.rationale.clone().unwrap_or_default();
            decision.context = spec.context.clone().unwrap_or_default();
            decision.options = vec![DecisionOption::new(1, chosen.clone(), decision.rationale.clone())];
            decision.chosen = chosen;
            decision
        }
    }
}

/// Extract decisions from the manual list, or else from observations.
pub fn extract_decisions(
    payload: &SessionPayload,
    observations: &[ClassifiedObservation],
    scope: &str,
) -> DecisionExtraction {
    let manual = !payload.manual_decisions.is_empty();
    let mut decisions: Vec<Decision> = if manual {
        payload.manual_decisions.iter().map(manual_decision).collect()
    } else {
        observations
            .iter()
            .filter(|o| o.observation_type == ObservationType::Decision)
            .map(parse_decision)
            .collect()
    };

    let mut anchors = AnchorRegistry::new(AnchorDomain::Decisions, scope);
    for decision in &mut decisions {
        decision.anchor_id = anchors.assign(&decision.title, "decision");
        if !decision.options.is_empty() {
            decision.decision_tree = render_decision_tree(decision);
        }
    }

    let counts = count_decisions(&decisions);
    debug!(
        manual,
        decisions = counts.total,
        high = counts.high,
        "extracted decisions"
    );
    DecisionExtraction { decisions, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsynth_core::ManualDecisionSpec;

    fn decision_obs(title: &str, narrative: &str, facts: &[&str]) -> ClassifiedObservation {
        ClassifiedObservation {
            observation_type: ObservationType::Decision,
            title: title.into(),
            narrative: narrative.into(),
            facts: facts.iter().map(|f| f.to_string()).collect(),
            files: vec![],
            timestamp: None,
            anchor_id: String::new(),
            has_diagram: false,
        }
    }

    #[test]
    fn test_mined_decision() {
        let obs = decision_obs(
            "Session store",
            "We needed durable sessions. We went with Option B because it survives restarts. Confidence: 90%",
            &[
                "Option A: Redis",
                "Option B: Postgres",
                "Pro: already deployed",
                "Disadvantage: slower writes",
                "Caveat: needs vacuum tuning",
                "Follow-up: load test",
                "Evidence: p99 under 5ms",
            ],
        );
        let d = parse_decision(&obs);
        assert_eq!(d.options.len(), 2);
        assert_eq!(d.options[1].description, "Postgres");
        assert_eq!(d.chosen, "Option B");
        assert_eq!(d.rationale, "it survives restarts.");
        assert_eq!(d.confidence, 90);
        assert_eq!(d.importance, Importance::High);
        assert_eq!(d.pros, vec!["already deployed"]);
        assert_eq!(d.cons, vec!["slower writes"]);
        assert_eq!(d.caveats, vec!["needs vacuum tuning"]);
        assert_eq!(d.followup, vec!["load test"]);
        assert_eq!(d.evidence, vec!["p99 under 5ms"]);
        assert_eq!(d.context, "We needed durable sessions.");
    }

    #[test]
    fn test_disadvantage_is_not_an_advantage() {
        let obs = decision_obs("x", "", &["Disadvantages: cost", "Advantages: speed"]);
        let d = parse_decision(&obs);
        assert_eq!(d.cons, vec!["cost"]);
        assert_eq!(d.pros, vec!["speed"]);
    }

    #[test]
    fn test_chosen_falls_back_to_first_option() {
        let obs = decision_obs("Queue", "We went with the simplest thing", &["Option 1: in-memory", "Option 2: Kafka"]);
        let d = parse_decision(&obs);
        assert_eq!(d.chosen, "Option 1");
        assert_eq!(d.confidence, DEFAULT_MINED_CONFIDENCE);
        assert_eq!(d.importance, Importance::Medium);
    }

    #[test]
    fn test_label_match_is_whole_word() {
        assert!(mentions_label("option a because", "Option A"));
        assert!(!mentions_label("option ab", "Option A"));
    }

    #[test]
    fn test_rationale_fallback_is_narrative_prefix() {
        let narrative = "n".repeat(300);
        let obs = decision_obs("x", &narrative, &[]);
        assert_eq!(parse_decision(&obs).rationale.chars().count(), 200);
    }

    #[test]
    fn test_manual_mode_wins() {
        let payload = SessionPayload {
            manual_decisions: vec![
                ManualDecision::Text("Use JWT for auth".into()),
                ManualDecision::Detailed(ManualDecisionSpec {
                    title: Some("Cache layer".into()),
                    decision: Some("Redis".into()),
                    rationale: Some("Fast".into()),
                    context: None,
                    confidence: Some(40),
                }),
            ],
            ..Default::default()
        };
        let observations = vec![decision_obs("Ignored", "chose Option A", &["Option A: x"])];
        let result = extract_decisions(&payload, &observations, "specs/049-auth");
        assert_eq!(result.decisions.len(), 2);
        let first = &result.decisions[0];
        assert_eq!(first.confidence, 80);
        assert_eq!(first.options.len(), 1);
        assert!(first.pros.is_empty());
        assert!(!first.decision_tree.is_empty());
        assert_eq!(first.anchor_id, "decision-jwt-auth-049");
        assert_eq!(result.decisions[1].chosen, "Redis");
        assert_eq!(result.decisions[1].importance, Importance::Low);
        assert_eq!(result.counts.total, 2);
        assert_eq!(result.counts.high, 1);
        assert_eq!(result.counts.low, 1);
    }

    #[test]
    fn test_anchors_unique_and_trees_only_with_options() {
        let observations = vec![
            decision_obs("Pick store", "chose Option A", &["Option A: x", "Option B: y"]),
            decision_obs("Pick store", "no alternatives listed", &[]),
        ];
        let result = extract_decisions(&SessionPayload::default(), &observations, "");
        assert_eq!(result.decisions.len(), 2);
        assert_ne!(result.decisions[0].anchor_id, result.decisions[1].anchor_id);
        assert!(!result.decisions[0].decision_tree.is_empty());
        assert!(result.decisions[1].decision_tree.is_empty());
    }
}
