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

//! Tool-call detection in observation facts
//!
//! Facts mention tools in many ways: `Tool: Read`, `Bash(cargo test)`,
//! `Edit src/lib.rs`, or just "read the docs". Only the first three forms
//! count as calls; a tool word in running prose, or a bare capitalized
//! mention mid-sentence, is discarded.

use memsynth_core::{ToolCall, ToolConfidence};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Tools the detector knows about, in canonical spelling.
pub const KNOWN_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "NotebookEdit",
    "Bash",
    "Grep",
    "Glob",
    "LS",
    "Task",
    "TodoWrite",
    "WebFetch",
    "WebSearch",
];

/// Tools that change files.
pub const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Tools that only gather information.
pub const READ_TOOLS: &[&str] = &["Read", "Grep", "Glob", "LS", "WebFetch", "WebSearch"];

static TOOL_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", KNOWN_TOOLS.join("|"))).expect("tool name regex")
});

static EXPLICIT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\btool\s*:|\busing|\bused|\bran|\bcalled|\binvoked|\[)\s*$")
        .expect("explicit prefix regex")
});

static PROSE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:to|will|would|should|can|could|must|i|we|you|they|then|and|or|not|did|didn't)\s+$")
        .expect("prose prefix regex")
});

static PROSE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s+(?:the|a|an|more|about|through|up|over|it|them|this|that|some|all)\b")
        .expect("prose suffix regex")
});

fn canonical(name: &str) -> Option<&'static str> {
    KNOWN_TOOLS
        .iter()
        .copied()
        .find(|t| t.eq_ignore_ascii_case(name))
}

/// Classify one tool-name match inside `text`.
///
/// Returns None when the match sits in prose.
fn assess(text: &str, start: usize, end: usize, canonical_name: &str) -> Option<ToolConfidence> {
    let before = &text[..start];
    let after = &text[end..];
    let matched = &text[start..end];

    if EXPLICIT_PREFIX.is_match(before)
        || after.starts_with('(')
        || after.starts_with(']')
        || after.trim_start().to_lowercase().starts_with("tool")
    {
        return Some(ToolConfidence::High);
    }

    let exact_case = matched == canonical_name;
    if !exact_case || PROSE_PREFIX.is_match(before) || PROSE_SUFFIX.is_match(after) {
        return None;
    }

    if before.trim().is_empty() && (after.starts_with(':') || after.starts_with(' ')) {
        Some(ToolConfidence::Medium)
    } else {
        Some(ToolConfidence::Low)
    }
}

/// Detect tool calls in a single fact, one per tool name.
pub fn detect_tool_calls(fact: &str) -> Vec<ToolCall> {
    let mut calls: Vec<ToolCall> = Vec::new();
    for m in TOOL_NAME.find_iter(fact) {
        let Some(name) = canonical(m.as_str()) else {
            continue;
        };
        let Some(confidence) = assess(fact, m.start(), m.end(), name) else {
            continue;
        };
        if confidence == ToolConfidence::Low {
            continue;
        }
        if calls.iter().any(|c| c.tool == name) {
            continue;
        }
        calls.push(ToolCall {
            tool: name.to_string(),
            detail: fact.trim().to_string(),
            confidence,
        });
    }
    calls
}

/// Count calls per tool name.
pub fn count_tools<'a>(calls: impl IntoIterator<Item = &'a ToolCall>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for call in calls {
        *counts.entry(call.tool.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn is_write_tool(name: &str) -> bool {
    WRITE_TOOLS.contains(&name)
}

pub fn is_read_tool(name: &str) -> bool {
    READ_TOOLS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools(fact: &str) -> Vec<String> {
        detect_tool_calls(fact).into_iter().map(|c| c.tool).collect()
    }

    #[test]
    fn test_explicit_forms_are_high_confidence() {
        let calls = detect_tool_calls("Tool: Read src/main.rs");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].confidence, ToolConfidence::High);
        assert_eq!(tools("Bash(cargo test --all)"), vec!["Bash"]);
        assert_eq!(tools("Used grep to find callers"), vec!["Grep"]);
        assert_eq!(tools("[Edit] src/lib.rs"), vec!["Edit"]);
    }

    #[test]
    fn test_leading_tool_name_is_medium() {
        let calls = detect_tool_calls("Edit: src/lib.rs updated");
        assert_eq!(calls[0].tool, "Edit");
        assert_eq!(calls[0].confidence, ToolConfidence::Medium);
        assert_eq!(tools("Write docs/README.md"), vec!["Write"]);
    }

    #[test]
    fn test_prose_is_discarded() {
        assert!(tools("Need to read the docs before changing anything").is_empty());
        assert!(tools("We will edit the config later").is_empty());
        assert!(tools("Read the whole module first").is_empty());
        assert!(tools("Split the Task into steps").is_empty());
    }

    #[test]
    fn test_one_call_per_tool_per_fact() {
        assert_eq!(tools("Tool: Read a.rs, Tool: Read b.rs"), vec!["Read"]);
        assert_eq!(tools("Tool: Read a.rs then Tool: Edit a.rs"), vec!["Read", "Edit"]);
    }

    #[test]
    fn test_counts_and_categories() {
        let calls = [
            detect_tool_calls("Tool: Read a"),
            detect_tool_calls("Tool: Read b"),
            detect_tool_calls("Tool: Edit c"),
        ]
        .concat();
        let counts = count_tools(&calls);
        assert_eq!(counts["Read"], 2);
        assert_eq!(counts["Edit"], 1);
        assert!(is_write_tool("Edit"));
        assert!(is_read_tool("Grep"));
        assert!(!is_write_tool("Bash"));
    }
}
