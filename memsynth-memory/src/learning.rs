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

//! Learning Index
//!
//! Weighted score of how much a session moved the agent's self-assessment:
//!
//! ```text
//! index = round(clamp(0.40 * dK + 0.35 * dU + 0.25 * dC, 0, 100))
//!
//! dK = post.knowledge   - pre.knowledge
//! dU = pre.uncertainty  - post.uncertainty   (less uncertainty is progress)
//! dC = post.context     - pre.context
//! ```
//!
//! Computed only when both assessments carry a knowledge score; otherwise
//! every field is the placeholder. A missing uncertainty or context score
//! contributes a zero delta.

use memsynth_core::{LearningAssessment, LearningFields, LEARNING_PLACEHOLDER};
use tracing::debug;

pub const KNOWLEDGE_WEIGHT: f64 = 0.40;
pub const UNCERTAINTY_WEIGHT: f64 = 0.35;
pub const CONTEXT_WEIGHT: f64 = 0.25;

/// Weighted Learning Index, rounded and clamped to 0..=100.
pub fn learning_index(delta_knowledge: f64, delta_uncertainty: f64, delta_context: f64) -> u8 {
    let raw = delta_knowledge * KNOWLEDGE_WEIGHT
        + delta_uncertainty * UNCERTAINTY_WEIGHT
        + delta_context * CONTEXT_WEIGHT;
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}

/// Signed integer rendering of a delta, e.g. `+20`, `-5`, `0`.
pub fn format_delta(delta: f64) -> String {
    let rounded = delta.round() as i64;
    if rounded > 0 {
        format!("+{}", rounded)
    } else {
        rounded.to_string()
    }
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|s| (s.round() as i64).to_string())
        .unwrap_or_else(|| LEARNING_PLACEHOLDER.to_string())
}

#[derive(Debug, Clone, Copy)]
enum Metric {
    Knowledge,
    Uncertainty,
    Context,
}

impl Metric {
    fn gain(self) -> &'static str {
        match self {
            Metric::Knowledge => "knowledge gain",
            Metric::Uncertainty => "uncertainty reduction",
            Metric::Context => "context improvement",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Metric::Knowledge => "knowledge",
            Metric::Uncertainty => "uncertainty",
            Metric::Context => "context",
        }
    }
}

fn band(metric: Metric, delta: f64) -> Option<String> {
    if delta > 20.0 {
        Some(format!("significant {}", metric.gain()))
    } else if delta > 10.0 {
        Some(format!("moderate {}", metric.gain()))
    } else if delta > 0.0 {
        Some(format!("slight {}", metric.gain()))
    } else if delta < -10.0 {
        Some(format!("{} regressed", metric.name()))
    } else {
        None
    }
}

fn qualifier(index: u8) -> &'static str {
    match index {
        40.. => "Highly productive session",
        25..=39 => "Good learning session",
        10..=24 => "Moderate learning session",
        _ => "Limited learning session",
    }
}

/// Human-readable summary from the per-metric bands and the index.
pub fn learning_summary(index: u8, dk: f64, du: f64, dc: f64) -> String {
    let bands: Vec<String> = [
        band(Metric::Knowledge, dk),
        band(Metric::Uncertainty, du),
        band(Metric::Context, dc),
    ]
    .into_iter()
    .flatten()
    .collect();

    if bands.is_empty() {
        format!("{}.", qualifier(index))
    } else {
        format!("{}: {}.", qualifier(index), bands.join(", "))
    }
}

/// Build the learning fields from an optional assessment pair.
pub fn build_learning_fields(
    preflight: Option<&LearningAssessment>,
    postflight: Option<&LearningAssessment>,
) -> LearningFields {
    let (Some(pre), Some(post)) = (preflight, postflight) else {
        return LearningFields::placeholder();
    };
    let (Some(pre_k), Some(post_k)) = (pre.knowledge_score, post.knowledge_score) else {
        return LearningFields::placeholder();
    };

    let dk = post_k - pre_k;
    let du = match (pre.uncertainty_score, post.uncertainty_score) {
        (Some(a), Some(b)) => a - b,
        _ => 0.0,
    };
    let dc = match (pre.context_score, post.context_score) {
        (Some(a), Some(b)) => b - a,
        _ => 0.0,
    };
    let index = learning_index(dk, du, dc);
    debug!(index, dk, du, dc, "computed learning index");

    LearningFields {
        has_learning_data: true,
        preflight_know_score: format_score(pre.knowledge_score),
        preflight_uncertainty_score: format_score(pre.uncertainty_score),
        preflight_context_score: format_score(pre.context_score),
        postflight_know_score: format_score(post.knowledge_score),
        postflight_uncertainty_score: format_score(post.uncertainty_score),
        postflight_context_score: format_score(post.context_score),
        delta_know_score: format_delta(dk),
        delta_uncertainty_score: format_delta(du),
        delta_context_score: format_delta(dc),
        learning_index: index.to_string(),
        learning_summary: learning_summary(index, dk, du, dc),
        gaps_closed: post.gaps_closed.clone(),
        new_gaps: post.new_gaps.clone(),
    }
}
