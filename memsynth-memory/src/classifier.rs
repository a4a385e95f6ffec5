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

//! Observation classification
//!
//! Keyword rules evaluated top to bottom over the lower-cased title,
//! narrative and facts; the first matching rule wins. Order matters: a text
//! that both fixes and adds something is a bugfix.

use crate::anchor::AnchorRegistry;
use crate::diagrams::contains_diagram;
use memsynth_core::{ClassifiedObservation, Observation, ObservationType};
use once_cell::sync::Lazy;
use regex::Regex;

/// One `(pattern, type)` pair of the classification cascade.
pub struct ClassificationRule {
    pub pattern: Regex,
    pub result: ObservationType,
}

impl ClassificationRule {
    fn keywords(words: &[&str], result: ObservationType) -> Self {
        let pattern = format!(r"\b(?:{})", words.join("|"));
        Self {
            pattern: Regex::new(&pattern).expect("classification keywords form a valid regex"),
            result,
        }
    }
}

/// The cascade, in priority order.
pub static CLASSIFICATION_RULES: Lazy<Vec<ClassificationRule>> = Lazy::new(|| {
    vec![
        ClassificationRule::keywords(
            &["fix", "bug", "error", "issue", "broken", "patch"],
            ObservationType::Bugfix,
        ),
        ClassificationRule::keywords(
            &["implement", "add", "create", "new feature"],
            ObservationType::Feature,
        ),
        ClassificationRule::keywords(
            &["refactor", "clean", "restructure", "reorganize"],
            ObservationType::Refactor,
        ),
        ClassificationRule::keywords(
            &["decide", "chose", "select", "option", "alternative"],
            ObservationType::Decision,
        ),
        ClassificationRule::keywords(
            &["research", "investigate", "explore", "analyze"],
            ObservationType::Research,
        ),
        ClassificationRule::keywords(
            &["discover", "found", "learn", "realize"],
            ObservationType::Discovery,
        ),
    ]
});

/// Assign a semantic type to an observation.
///
/// A manual, non-generic type is returned unchanged.
pub fn classify(observation: &Observation) -> ObservationType {
    if let Some(manual) = &observation.observation_type {
        if !manual.is_generic() {
            return manual.clone();
        }
    }
    classify_text(&observation.searchable_text())
}

/// Run the cascade over free text.
pub fn classify_text(text: &str) -> ObservationType {
    let lower = text.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(&lower))
        .map(|rule| rule.result.clone())
        .unwrap_or(ObservationType::Observation)
}

/// Classify and anchor every observation.
pub fn classify_all(
    observations: &[Observation],
    anchors: &mut AnchorRegistry,
) -> Vec<ClassifiedObservation> {
    observations
        .iter()
        .map(|obs| {
            let observation_type = classify(obs);
            let anchor_id = anchors.assign(&obs.title, observation_type.as_str());
            let has_diagram = contains_diagram(&obs.narrative)
                || obs.fact_texts().any(contains_diagram);
            ClassifiedObservation {
                observation_type,
                title: obs.title.clone(),
                narrative: obs.narrative.clone(),
                facts: obs.fact_texts().map(str::to_string).collect(),
                files: obs.files.clone(),
                timestamp: obs.parsed_timestamp(),
                anchor_id,
                has_diagram,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorDomain;

    #[test]
    fn test_bugfix_beats_feature() {
        let obs = Observation::new("Fixed the parser and added tests");
        assert_eq!(classify(&obs), ObservationType::Bugfix);
    }

    #[test]
    fn test_cascade_order() {
        assert_eq!(classify_text("Implemented caching"), ObservationType::Feature);
        assert_eq!(classify_text("Refactored module layout"), ObservationType::Refactor);
        assert_eq!(classify_text("We chose SQLite"), ObservationType::Decision);
        assert_eq!(classify_text("Investigated latency"), ObservationType::Research);
        assert_eq!(classify_text("Realized the cache was cold"), ObservationType::Discovery);
        assert_eq!(classify_text("Meeting notes"), ObservationType::Observation);
    }

    #[test]
    fn test_facts_participate() {
        let obs = Observation::new("Session note").fact("Option A: keep the old API");
        assert_eq!(classify(&obs), ObservationType::Decision);
    }

    #[test]
    fn test_manual_type_wins() {
        let obs = Observation::new("Fixed a bug").observation_type(ObservationType::Research);
        assert_eq!(classify(&obs), ObservationType::Research);
    }

    #[test]
    fn test_generic_manual_type_is_reclassified() {
        let obs = Observation::new("Fixed a bug").observation_type(ObservationType::Observation);
        assert_eq!(classify(&obs), ObservationType::Bugfix);
    }

    #[test]
    fn test_classify_all_anchors_and_flags() {
        let observations = vec![
            Observation::new("Layout").narrative("┌──┐\n└──┘"),
            Observation::new("Layout"),
        ];
        let mut anchors = AnchorRegistry::new(AnchorDomain::Observations, "012-ui");
        let classified = classify_all(&observations, &mut anchors);
        assert!(classified[0].has_diagram);
        assert!(!classified[1].has_diagram);
        assert_eq!(classified[0].anchor_id, "observation-layout-012");
        assert_eq!(classified[1].anchor_id, "observation-layout-012-2");
    }
}
