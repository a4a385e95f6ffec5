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

//! Observation Type Taxonomy
//!
//! Semantic types assigned to session observations, either supplied by the
//! caller or inferred by the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of a session observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObservationType {
    /// A defect was fixed.
    Bugfix,
    /// New functionality was added.
    Feature,
    /// Existing code was restructured.
    Refactor,
    /// A choice between alternatives was made.
    Decision,
    /// Investigation or analysis work.
    Research,
    /// Something new was found or learned.
    Discovery,
    /// Generic observation, the classifier's fallback.
    Observation,
    /// Caller-supplied type outside the standard set.
    Custom(String),
}

impl Default for ObservationType {
    fn default() -> Self {
        ObservationType::Observation
    }
}

impl ObservationType {
    /// Get all standard observation types.
    pub fn all_standard() -> Vec<ObservationType> {
        vec![
            ObservationType::Bugfix,
            ObservationType::Feature,
            ObservationType::Refactor,
            ObservationType::Decision,
            ObservationType::Research,
            ObservationType::Discovery,
            ObservationType::Observation,
        ]
    }

    /// Whether this is the generic fallback type.
    ///
    /// A generic type never overrides classification.
    pub fn is_generic(&self) -> bool {
        matches!(self, ObservationType::Observation)
    }

    /// Check if this is a custom type.
    pub fn is_custom(&self) -> bool {
        matches!(self, ObservationType::Custom(_))
    }

    /// Whether the observation describes building something new.
    pub fn is_feature_work(&self) -> bool {
        matches!(self, ObservationType::Feature)
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &str {
        match self {
            ObservationType::Bugfix => "bugfix",
            ObservationType::Feature => "feature",
            ObservationType::Refactor => "refactor",
            ObservationType::Decision => "decision",
            ObservationType::Research => "research",
            ObservationType::Discovery => "discovery",
            ObservationType::Observation => "observation",
            ObservationType::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for ObservationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObservationType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bugfix" | "bug_fix" | "fix" => Ok(ObservationType::Bugfix),
            "feature" | "implementation" => Ok(ObservationType::Feature),
            "refactor" | "refactoring" => Ok(ObservationType::Refactor),
            "decision" => Ok(ObservationType::Decision),
            "research" => Ok(ObservationType::Research),
            "discovery" => Ok(ObservationType::Discovery),
            "observation" | "" => Ok(ObservationType::Observation),
            _ => Ok(ObservationType::Custom(s.trim().to_string())),
        }
    }
}

impl From<String> for ObservationType {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<ObservationType> for String {
    fn from(t: ObservationType) -> Self {
        t.as_str().to_string()
    }
}
