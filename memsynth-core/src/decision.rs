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

//! Structured decision records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Retention priority of a decision, derived from its confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    /// >= 80 high, >= 50 medium, else low.
    pub fn from_confidence(confidence: u8) -> Self {
        match confidence {
            80.. => Importance::High,
            50..=79 => Importance::Medium,
            _ => Importance::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One alternative considered by a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DecisionOption {
    /// 1-based position.
    pub option_number: usize,
    /// Short label, e.g. "Option A".
    pub label: String,
    /// Free-text description after the label.
    pub description: String,
}

impl DecisionOption {
    pub fn new(option_number: usize, label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            option_number,
            label: label.into(),
            description: description.into(),
        }
    }
}

/// A decision extracted from the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Decision {
    pub title: String,
    pub context: String,
    pub timestamp: String,
    pub options: Vec<DecisionOption>,
    pub chosen: String,
    pub rationale: String,
    /// 0-100.
    pub confidence: u8,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub evidence: Vec<String>,
    pub caveats: Vec<String>,
    pub followup: Vec<String>,
    /// ASCII rendering; empty when the decision has no options.
    pub decision_tree: String,
    #[serde(rename = "DECISION_ANCHOR_ID")]
    pub anchor_id: String,
    pub importance: Importance,
}

impl Decision {
    /// Create a decision with derived importance and no options.
    pub fn new(title: impl Into<String>, confidence: u8) -> Self {
        let confidence = confidence.min(100);
        Self {
            title: title.into(),
            context: String::new(),
            timestamp: String::new(),
            options: Vec::new(),
            chosen: String::new(),
            rationale: String::new(),
            confidence,
            pros: Vec::new(),
            cons: Vec::new(),
            evidence: Vec::new(),
            caveats: Vec::new(),
            followup: Vec::new(),
            decision_tree: String::new(),
            anchor_id: String::new(),
            importance: Importance::from_confidence(confidence),
        }
    }

    /// The option matching `chosen`, if any.
    pub fn chosen_option(&self) -> Option<&DecisionOption> {
        self.options
            .iter()
            .find(|o| o.label.eq_ignore_ascii_case(&self.chosen))
    }
}
