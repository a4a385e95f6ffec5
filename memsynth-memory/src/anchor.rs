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

//! Anchor IDs
//!
//! Short cross-reference IDs of the form `{category}-{slug}-{scope}`, e.g.
//! `decision-jwt-auth-tokens-049`.
//!
//! Uniqueness is local: each extractor owns one [`AnchorRegistry`] for the
//! duration of a call, so an anchor minted for a decision may equal one
//! minted for an observation.

use serde::{Deserialize, Serialize};

const MAX_SLUG_WORDS: usize = 4;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "it", "its", "this", "that", "we", "our",
    "i", "into", "via", "use", "using",
];

/// Which extractor a registry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorDomain {
    Decisions,
    Observations,
    Diagrams,
}

/// Build a base anchor ID. Deterministic for identical inputs.
pub fn generate(title: &str, category: &str, scope: &str) -> String {
    format!("{}-{}-{}", slugify(category, 1), title_slug(title), scope_token(scope))
}

/// Append `-2`, `-3`, ... until `anchor` is absent from `used`.
///
/// The caller records the returned ID in `used`.
pub fn ensure_unique(anchor: &str, used: &[String]) -> String {
    if !used.iter().any(|u| u == anchor) {
        return anchor.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{anchor}-{n}");
        if !used.iter().any(|u| *u == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Used-ID list for one extractor within one call.
#[derive(Debug, Clone)]
pub struct AnchorRegistry {
    domain: AnchorDomain,
    scope: String,
    used: Vec<String>,
}

impl AnchorRegistry {
    pub fn new(domain: AnchorDomain, scope: impl Into<String>) -> Self {
        Self {
            domain,
            scope: scope.into(),
            used: Vec::new(),
        }
    }

    pub fn domain(&self) -> AnchorDomain {
        self.domain
    }

    /// Generate, deduplicate and record an anchor.
    pub fn assign(&mut self, title: &str, category: &str) -> String {
        let base = generate(title, category, &self.scope);
        let anchor = ensure_unique(&base, &self.used);
        self.used.push(anchor.clone());
        anchor
    }

    pub fn used(&self) -> &[String] {
        &self.used
    }
}

fn title_slug(title: &str) -> String {
    let words: Vec<String> = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .map(|w| w.to_ascii_lowercase())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(&w.as_str()))
        .take(MAX_SLUG_WORDS)
        .collect();
    if words.is_empty() {
        "untitled".to_string()
    } else {
        words.join("-")
    }
}

fn slugify(text: &str, max_words: usize) -> String {
    let slug = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(max_words)
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "note".to_string()
    } else {
        slug
    }
}

/// Leading number of the spec folder's last component, else a short hash.
fn scope_token(scope: &str) -> String {
    let scope = scope.trim().trim_end_matches('/');
    if scope.is_empty() {
        return "000000".to_string();
    }
    let last = scope.rsplit(['/', '\\']).next().unwrap_or(scope);
    let digits: String = last.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty() {
        return digits;
    }
    let hash = blake3::hash(scope.as_bytes());
    hex::encode(&hash.as_bytes()[..3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_shape() {
        let anchor = generate("Use JWT for the auth tokens", "decision", "specs/049-auth-flow");
        assert_eq!(anchor, "decision-jwt-auth-tokens-049");
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate("Cache layout", "observation", "scratch");
        let b = generate("Cache layout", "observation", "scratch");
        assert_eq!(a, b);
        assert!(a.starts_with("observation-cache-layout-"));
        assert_eq!(a.rsplit('-').next().unwrap().len(), 6);
    }

    #[test]
    fn test_empty_inputs_fall_back() {
        assert_eq!(generate("", "", ""), "note-untitled-000000");
        assert_eq!(generate("the and of", "bugfix", ""), "bugfix-untitled-000000");
    }

    #[test]
    fn test_ensure_unique_suffixes() {
        let used = vec!["a".to_string(), "a-2".to_string()];
        assert_eq!(ensure_unique("a", &used), "a-3");
        assert_eq!(ensure_unique("b", &used), "b");
    }

    #[test]
    fn test_registry_yields_distinct_ids_for_same_title() {
        let mut registry = AnchorRegistry::new(AnchorDomain::Decisions, "specs/007-cache");
        let ids: Vec<String> = (0..25).map(|_| registry.assign("Same title", "decision")).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 25);
        assert_eq!(ids[0], "decision-same-title-007");
        assert_eq!(ids[1], "decision-same-title-007-2");
        assert_eq!(registry.used().len(), 25);
    }

    #[test]
    fn test_registries_are_independent() {
        let mut decisions = AnchorRegistry::new(AnchorDomain::Decisions, "001-x");
        let mut observations = AnchorRegistry::new(AnchorDomain::Observations, "001-x");
        let a = decisions.assign("Pick store", "entry");
        let b = observations.assign("Pick store", "entry");
        assert_eq!(a, b);
        assert_eq!(observations.domain(), AnchorDomain::Observations);
    }
}
