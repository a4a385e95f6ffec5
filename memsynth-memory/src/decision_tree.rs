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

//! Decision tree rendering
//!
//! ```text
//!  ┌──────────── header ────────────┐
//!  │ title, context, confidence     │
//!  └────────────────────────────────┘
//!                  ▼
//!            ╱──────────╲
//!           ╱  question  ╲
//!            ╲──────────╱
//!          ┌──────┴──────┐
//!       [option]      [option]     (2 options side by side,
//!          └──────┬──────┘          3+ stacked, at most 4)
//!                  ▼
//!   rationale / caveats / follow-up boxes
//!                  ▼
//!          ╭ Decision Logged ╮
//! ```

use crate::ascii::{self, arrow_down, branch_line, center_block, frame, glyph_line, DOUBLE, LIGHT, ROUNDED};
use crate::text::{center, truncate_chars, wrap};
use memsynth_core::{Decision, DecisionOption};

/// Total width of a rendered tree.
pub const TREE_WIDTH: usize = 60;
const FULL_INNER: usize = TREE_WIDTH - 4;
const COLUMN_INNER: usize = 24;
const COLUMN_GAP: usize = 4;
const MAX_OPTION_BOXES: usize = 4;
const MAX_DESCRIPTION_LINES: usize = 3;
const MIN_DIAMOND_INNER: usize = 12;

fn header(decision: &Decision) -> Vec<String> {
    let mut lines = wrap(&format!("DECISION: {}", decision.title), FULL_INNER);
    if !decision.context.trim().is_empty() {
        lines.extend(
            wrap(&format!("Context: {}", decision.context.trim()), FULL_INNER)
                .into_iter()
                .take(2),
        );
    }
    let mut meta = format!("Confidence: {}%", decision.confidence);
    if !decision.timestamp.is_empty() {
        meta.push_str(&format!(" | {}", decision.timestamp));
    }
    lines.push(meta);
    frame(&lines, FULL_INNER, LIGHT)
}

fn question(options: &[DecisionOption]) -> String {
    if options.len() > 3 {
        format!("Select from {} options?", options.len())
    } else {
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        format!("{}?", labels.join(" or "))
    }
}

fn diamond(options: &[DecisionOption]) -> Vec<String> {
    let q = truncate_chars(&question(options), FULL_INNER - 6);
    let inner = (q.chars().count() + 2).max(MIN_DIAMOND_INNER);
    let rule: String = "─".repeat(inner);
    let block = vec![
        format!(" ╱{}╲ ", rule),
        format!("╱{}╲", center(&q, inner + 2)),
        format!("╲{}╱", " ".repeat(inner + 2)),
        format!(" ╲{}╱ ", rule),
    ];
    center_block(&block, TREE_WIDTH)
}

fn option_box(option: &DecisionOption, chosen: bool, inner: usize) -> Vec<String> {
    let label = if chosen {
        format!("✓ {} (CHOSEN)", option.label)
    } else {
        option.label.clone()
    };
    let mut lines = vec![label];
    lines.extend(
        wrap(&option.description, inner)
            .into_iter()
            .take(MAX_DESCRIPTION_LINES),
    );
    frame(&lines, inner, if chosen { DOUBLE } else { LIGHT })
}

fn is_chosen(decision: &Decision, option: &DecisionOption) -> bool {
    decision
        .chosen_option()
        .is_some_and(|c| c.option_number == option.option_number)
}

fn two_columns(decision: &Decision) -> Vec<String> {
    let box_width = COLUMN_INNER + 4;
    let left_center = box_width / 2 - 1;
    let right_center = box_width + COLUMN_GAP + left_center;
    let middle = (TREE_WIDTH - 1) / 2;

    let mut left = option_box(&decision.options[0], is_chosen(decision, &decision.options[0]), COLUMN_INNER);
    let mut right = option_box(&decision.options[1], is_chosen(decision, &decision.options[1]), COLUMN_INNER);
    let height = left.len().max(right.len());
    let blank = " ".repeat(box_width);
    left.resize(height, blank.clone());
    right.resize(height, blank);

    let mut out = vec![
        branch_line(TREE_WIDTH, left_center, right_center, ('┌', '┐'), (middle, '┴')),
        glyph_line(TREE_WIDTH, &[(left_center, '▼'), (right_center, '▼')]),
    ];
    out.extend(
        left.iter()
            .zip(&right)
            .map(|(l, r)| format!("{}{}{}", l, " ".repeat(COLUMN_GAP), r)),
    );
    out.push(glyph_line(TREE_WIDTH, &[(left_center, '│'), (right_center, '│')]));
    out.push(branch_line(TREE_WIDTH, left_center, right_center, ('└', '┘'), (middle, '┬')));
    out.push(glyph_line(TREE_WIDTH, &[(middle, '▼')]));
    out
}

fn stacked(decision: &Decision) -> Vec<String> {
    let mut out = arrow_down(TREE_WIDTH);
    for option in decision.options.iter().take(MAX_OPTION_BOXES) {
        out.extend(option_box(option, is_chosen(decision, option), FULL_INNER));
    }
    if decision.options.len() > MAX_OPTION_BOXES {
        out.push(format!(
            "  ... {} more option(s)",
            decision.options.len() - MAX_OPTION_BOXES
        ));
    }
    out.extend(arrow_down(TREE_WIDTH));
    out
}

fn list_box(heading: &str, items: &[String]) -> Vec<String> {
    let mut lines = vec![heading.to_string()];
    for item in items {
        lines.extend(wrap(&format!("- {}", item), FULL_INNER));
    }
    frame(&lines, FULL_INNER, LIGHT)
}

/// Render a decision as an ASCII tree.
pub fn render_decision_tree(decision: &Decision) -> String {
    let mut lines = header(decision);

    if decision.options.is_empty() {
        if !decision.chosen.trim().is_empty() {
            lines.extend(arrow_down(TREE_WIDTH));
            let chosen = wrap(&format!("✓ {}", decision.chosen.trim()), FULL_INNER);
            lines.extend(frame(&chosen, FULL_INNER, DOUBLE));
        }
        lines.extend(arrow_down(TREE_WIDTH));
    } else {
        lines.extend(arrow_down(TREE_WIDTH));
        lines.extend(diamond(&decision.options));
        if decision.options.len() == 2 {
            lines.extend(two_columns(decision));
        } else {
            lines.extend(stacked(decision));
        }
    }

    if !decision.rationale.trim().is_empty() {
        let rationale = wrap(&format!("Rationale: {}", decision.rationale.trim()), FULL_INNER);
        lines.extend(frame(&rationale, FULL_INNER, LIGHT));
        lines.extend(arrow_down(TREE_WIDTH));
    }
    if !decision.caveats.is_empty() {
        lines.extend(list_box("Caveats:", &decision.caveats));
        lines.extend(arrow_down(TREE_WIDTH));
    }
    if !decision.followup.is_empty() {
        lines.extend(list_box("Follow-up:", &decision.followup));
        lines.extend(arrow_down(TREE_WIDTH));
    }

    let terminal = frame(&["Decision Logged".to_string()], 17, ROUNDED);
    lines.extend(center_block(&terminal, TREE_WIDTH));
    ascii::join(&lines)
}
