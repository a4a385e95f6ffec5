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

//! Learning fields as rendered into the session record.

use serde::{Deserialize, Serialize};

/// Value used for every learning field when no assessment pair exists.
pub const LEARNING_PLACEHOLDER: &str = "N/A";

/// Preflight/postflight scores, deltas and the derived Learning Index.
///
/// All values are display strings so the placeholder can stand in for a
/// number without the renderer having to special-case it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LearningFields {
    pub has_learning_data: bool,
    pub preflight_know_score: String,
    pub preflight_uncertainty_score: String,
    pub preflight_context_score: String,
    pub postflight_know_score: String,
    pub postflight_uncertainty_score: String,
    pub postflight_context_score: String,
    pub delta_know_score: String,
    pub delta_uncertainty_score: String,
    pub delta_context_score: String,
    pub learning_index: String,
    pub learning_summary: String,
    pub gaps_closed: Vec<String>,
    pub new_gaps: Vec<String>,
}

impl LearningFields {
    /// All fields set to the placeholder.
    pub fn placeholder() -> Self {
        let na = || LEARNING_PLACEHOLDER.to_string();
        Self {
            has_learning_data: false,
            preflight_know_score: na(),
            preflight_uncertainty_score: na(),
            preflight_context_score: na(),
            postflight_know_score: na(),
            postflight_uncertainty_score: na(),
            postflight_context_score: na(),
            delta_know_score: na(),
            delta_uncertainty_score: na(),
            delta_context_score: na(),
            learning_index: na(),
            learning_summary: na(),
            gaps_closed: Vec::new(),
            new_gaps: Vec::new(),
        }
    }
}

impl Default for LearningFields {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_everywhere() {
        let fields = LearningFields::placeholder();
        assert!(!fields.has_learning_data);
        assert_eq!(fields.learning_index, LEARNING_PLACEHOLDER);
        assert_eq!(fields.delta_know_score, LEARNING_PLACEHOLDER);
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["LEARNING_SUMMARY"], LEARNING_PLACEHOLDER);
    }
}
