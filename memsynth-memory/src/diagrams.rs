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

//! Diagram detection and generation
//!
//! Finds box-drawing art in observation narratives and facts, classifies
//! it by type and structural complexity, and generates a conversation
//! flowchart plus one decision tree per decision observation.

use crate::anchor::{AnchorDomain, AnchorRegistry};
use crate::ascii::{self, arrow_down, center_block, frame, LIGHT, ROUNDED};
use crate::decision_tree::render_decision_tree;
use crate::decisions::parse_decision;
use crate::text::center;
use memsynth_core::{
    ClassifiedObservation, DetectedDiagram, DiagramComplexity, DiagramSource, GeneratedDiagram,
    ObservationType, PhaseSummary,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Characters that mark text as a diagram.
pub const DIAGRAM_CHARS: &[char] = &[
    '┌', '┐', '└', '┘', '├', '┤', '┬', '┴', '┼', '─', '│', '╭', '╮', '╰', '╯', '╱', '╲', '▼',
    '▲', '►', '◄',
];

const BOX_CORNERS: &[char] = &['┌', '╭'];
const ARROWS: &[char] = &['▼', '▲', '►', '◄'];
const FLOWCHART_INNER: usize = 28;
const FLOWCHART_WIDTH: usize = FLOWCHART_INNER + 4;

pub fn contains_diagram(text: &str) -> bool {
    text.chars().any(|c| DIAGRAM_CHARS.contains(&c))
}

/// Structural measurements of one piece of art.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagramShape {
    pub boxes: usize,
    pub arrows: usize,
    pub lines: usize,
    pub diagonals: bool,
}

impl DiagramShape {
    pub fn measure(art: &str) -> Self {
        Self {
            boxes: art.chars().filter(|c| BOX_CORNERS.contains(c)).count(),
            arrows: art.chars().filter(|c| ARROWS.contains(c)).count(),
            lines: art.lines().count(),
            diagonals: art.contains('╱') || art.contains('╲'),
        }
    }

    /// Complexity tier by element count and height.
    pub fn complexity(&self) -> DiagramComplexity {
        let elements = self.boxes + self.arrows;
        if self.boxes >= 6 || elements >= 12 || self.lines > 30 {
            DiagramComplexity::Complex
        } else if self.boxes >= 3 || elements >= 5 || self.lines > 10 {
            DiagramComplexity::Moderate
        } else {
            DiagramComplexity::Simple
        }
    }
}

/// One `(predicate, type)` pair of the diagram-type cascade.
pub struct DiagramTypeRule {
    pub diagram_type: &'static str,
    pub keywords: Regex,
    pub shape: fn(&DiagramShape) -> bool,
}

impl DiagramTypeRule {
    fn matches(&self, text: &str, shape: &DiagramShape) -> bool {
        self.keywords.is_match(text) || (self.shape)(shape)
    }
}

fn keywords(pattern: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b(?:{})", pattern)).expect("diagram keyword regex")
}

/// Type cascade, first match wins; "ASCII Art" when nothing matches.
pub static DIAGRAM_TYPE_RULES: Lazy<Vec<DiagramTypeRule>> = Lazy::new(|| {
    vec![
        DiagramTypeRule {
            diagram_type: "Decision Tree",
            keywords: keywords("decision|choose|chose|option|yes|no\\b"),
            shape: |s| s.diagonals,
        },
        DiagramTypeRule {
            diagram_type: "Sequence",
            keywords: keywords("sequence|request|response|client|server|handshake"),
            shape: |_| false,
        },
        DiagramTypeRule {
            diagram_type: "Data Flow",
            keywords: keywords("data|pipeline|stream|input|output|etl"),
            shape: |_| false,
        },
        DiagramTypeRule {
            diagram_type: "Architecture",
            keywords: keywords("architecture|layer|component|service|module|system"),
            shape: |_| false,
        },
        DiagramTypeRule {
            diagram_type: "Flowchart",
            keywords: keywords("flow|step|start|process|stage"),
            shape: |s| s.boxes > 0 && s.arrows > 0,
        },
    ]
});

pub const FALLBACK_DIAGRAM_TYPE: &str = "ASCII Art";

/// Classify art by type, using the owning observation's title as context.
pub fn classify_diagram(title: &str, art: &str, shape: &DiagramShape) -> &'static str {
    let text = format!("{}\n{}", title, art);
    DIAGRAM_TYPE_RULES
        .iter()
        .find(|rule| rule.matches(&text, shape))
        .map(|rule| rule.diagram_type)
        .unwrap_or(FALLBACK_DIAGRAM_TYPE)
}

/// Lines from the first to the last line that carries diagram glyphs.
fn extract_art(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines.iter().position(|l| contains_diagram(l))?;
    let last = lines.iter().rposition(|l| contains_diagram(l))?;
    Some(lines[first..=last].join("\n"))
}

/// Everything the detector produces.
#[derive(Debug, Clone, Default)]
pub struct DiagramReport {
    pub diagrams: Vec<DetectedDiagram>,
    pub auto_flowchart: String,
    pub auto_decision_trees: Vec<GeneratedDiagram>,
    pub type_counts: BTreeMap<String, usize>,
    pub pattern_counts: BTreeMap<String, usize>,
}

fn terminal(label: &str) -> Vec<String> {
    let boxed = frame(&[center(label, FLOWCHART_INNER)], FLOWCHART_INNER, ROUNDED);
    center_block(&boxed, FLOWCHART_WIDTH)
}

/// Render the conversation phases as a vertical flowchart.
pub fn render_flowchart(phases: &[PhaseSummary]) -> String {
    let mut lines = terminal("Session Start");
    for (i, phase) in phases.iter().enumerate() {
        lines.extend(arrow_down(FLOWCHART_WIDTH));
        let turns = if phase.turn_count == 1 { "turn" } else { "turns" };
        let body = vec![
            format!("{}. {}", i + 1, phase.phase),
            format!("   {} {}, {}", phase.turn_count, turns, phase.duration),
        ];
        lines.extend(frame(&body, FLOWCHART_INNER, LIGHT));
    }
    lines.extend(arrow_down(FLOWCHART_WIDTH));
    lines.extend(terminal("Session Complete"));
    ascii::join(&lines)
}

fn detected(
    obs: &ClassifiedObservation,
    source: DiagramSource,
    art: String,
    anchors: &mut AnchorRegistry,
) -> DetectedDiagram {
    let shape = DiagramShape::measure(&art);
    let diagram_type = classify_diagram(&obs.title, &art, &shape);
    DetectedDiagram {
        title: obs.title.clone(),
        source,
        diagram_type: diagram_type.to_string(),
        complexity: shape.complexity(),
        anchor_id: anchors.assign(&obs.title, "diagram"),
        box_count: shape.boxes,
        arrow_count: shape.arrows,
        line_count: shape.lines,
        art,
    }
}

/// Detect diagrams and generate the flowchart and decision trees.
pub fn detect_diagrams(
    observations: &[ClassifiedObservation],
    phases: &[PhaseSummary],
    scope: &str,
) -> DiagramReport {
    let mut anchors = AnchorRegistry::new(AnchorDomain::Diagrams, scope);
    let mut diagrams = Vec::new();

    for obs in observations {
        if let Some(art) = extract_art(&obs.narrative) {
            diagrams.push(detected(obs, DiagramSource::Narrative, art, &mut anchors));
        }
        for fact in &obs.facts {
            if let Some(art) = extract_art(fact) {
                diagrams.push(detected(obs, DiagramSource::Fact, art, &mut anchors));
            }
        }
    }

    let mut type_counts = BTreeMap::new();
    let mut pattern_counts = BTreeMap::new();
    for diagram in &diagrams {
        *type_counts.entry(diagram.diagram_type.clone()).or_insert(0) += 1;
        *pattern_counts
            .entry(diagram.complexity.as_str().to_string())
            .or_insert(0) += 1;
    }

    let auto_decision_trees: Vec<GeneratedDiagram> = observations
        .iter()
        .filter(|o| o.observation_type == ObservationType::Decision)
        .map(|o| GeneratedDiagram {
            title: o.title.clone(),
            art: render_decision_tree(&parse_decision(o)),
        })
        .collect();

    debug!(
        detected = diagrams.len(),
        decision_trees = auto_decision_trees.len(),
        phases = phases.len(),
        "detected diagrams"
    );

    DiagramReport {
        diagrams,
        auto_flowchart: render_flowchart(phases),
        auto_decision_trees,
        type_counts,
        pattern_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsynth_core::ConversationPhase;

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

    #[test]
    fn test_contains_diagram() {
        assert!(contains_diagram("a ─ b"));
        assert!(contains_diagram("► next"));
        assert!(!contains_diagram("plain text -> arrow"));
    }

    #[test]
    fn test_extract_art_trims_prose() {
        let text = "Intro line\n┌──┐\n│ab│\n└──┘\nOutro";
        assert_eq!(extract_art(text).unwrap(), "┌──┐\n│ab│\n└──┘");
        assert!(extract_art("nothing here").is_none());
    }

    #[test]
    fn test_complexity_tiers() {
        let simple = DiagramShape::measure("┌─┐\n└─┘");
        assert_eq!(simple.complexity(), DiagramComplexity::Simple);
        let moderate = DiagramShape { boxes: 3, arrows: 1, lines: 8, diagonals: false };
        assert_eq!(moderate.complexity(), DiagramComplexity::Moderate);
        let complex = DiagramShape { boxes: 7, arrows: 6, lines: 40, diagonals: false };
        assert_eq!(complex.complexity(), DiagramComplexity::Complex);
    }

    #[test]
    fn test_type_cascade() {
        let plain = DiagramShape::measure("┌─┐");
        assert_eq!(classify_diagram("Client handshake", "┌─┐", &plain), "Sequence");
        assert_eq!(classify_diagram("Service layout", "┌─┐", &plain), "Architecture");
        assert_eq!(classify_diagram("ETL", "┌─┐", &plain), "Data Flow");
        let diag = DiagramShape::measure("╱╲");
        assert_eq!(classify_diagram("Thing", "╱╲", &diag), "Decision Tree");
        let flow = DiagramShape::measure("┌─┐\n ▼");
        assert_eq!(classify_diagram("Thing", "┌─┐\n ▼", &flow), "Flowchart");
        assert_eq!(classify_diagram("Thing", "┌─┐", &plain), FALLBACK_DIAGRAM_TYPE);
    }

    #[test]
    fn test_detect_counts_and_anchors() {
        let observations = vec![
            obs(ObservationType::Feature, "Layout", "┌──┐\n└──┘", &["├── src"]),
            obs(ObservationType::Research, "Notes", "no art", &[]),
        ];
        let report = detect_diagrams(&observations, &[], "specs/012-ui");
        assert_eq!(report.diagrams.len(), 2);
        assert_eq!(report.diagrams[0].source, DiagramSource::Narrative);
        assert_eq!(report.diagrams[1].source, DiagramSource::Fact);
        assert_eq!(report.diagrams[0].anchor_id, "diagram-layout-012");
        assert_eq!(report.diagrams[1].anchor_id, "diagram-layout-012-2");
        assert_eq!(report.pattern_counts["simple"], 2);
        assert_eq!(report.type_counts.values().sum::<usize>(), 2);
        assert!(report.auto_decision_trees.is_empty());
    }

    #[test]
    fn test_decision_trees_generated_without_art() {
        let observations = vec![obs(
            ObservationType::Decision,
            "Pick queue",
            "We chose Option A",
            &["Option A: in-memory", "Option B: Kafka"],
        )];
        let report = detect_diagrams(&observations, &[], "");
        assert!(report.diagrams.is_empty());
        assert_eq!(report.auto_decision_trees.len(), 1);
        assert!(report.auto_decision_trees[0].art.contains("Decision Logged"));
    }

    #[test]
    fn test_flowchart_always_generated() {
        let empty = render_flowchart(&[]);
        assert!(empty.contains("Session Start"));
        assert!(empty.contains("Session Complete"));

        let phases = vec![PhaseSummary {
            phase: ConversationPhase::Research,
            duration_seconds: 600,
            duration: "10m".into(),
            turn_count: 2,
        }];
        let chart = render_flowchart(&phases);
        assert!(chart.contains("1. Research"));
        assert!(chart.contains("2 turns, 10m"));
        assert!(chart.find("Research").unwrap() < chart.find("Session Complete").unwrap());
    }
}
