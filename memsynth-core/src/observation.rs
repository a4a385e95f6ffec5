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

//! Session Observations and Prompts
//!
//! Observations are the atomic events recorded during a development session.
//! They arrive as JSON from the host agent:
//!
//! ```json
//! {
//!     "type": "decision",
//!     "title": "Chose JWT for auth",
//!     "narrative": "We chose Option A because it is stateless.",
//!     "facts": ["Option A: JWT", {"text": "Edited auth", "files": ["src/auth.rs"]}],
//!     "files": ["src/auth.rs"],
//!     "timestamp": "2025-01-15T10:00:00Z"
//! }
//! ```
//!
//! Timestamps are kept as supplied and parsed on demand; a malformed
//! timestamp never rejects the payload.

use crate::lenient;
use crate::observation_types::ObservationType;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A timestamp as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// RFC 3339 or `YYYY-MM-DD HH:MM:SS` text.
    Text(String),
}

impl Timestamp {
    /// Build a timestamp from a UTC datetime.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp::Text(dt.to_rfc3339())
    }

    /// Parse into a UTC datetime, if well formed.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Timestamp::Text(s) => parse_timestamp(s),
        }
    }
}

// Float epochs round to the nearest millisecond.
impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
                .map(Timestamp::Millis)
                .ok_or_else(|| serde::de::Error::custom("timestamp out of range")),
            Value::String(s) => Ok(Timestamp::Text(s)),
            other => Err(serde::de::Error::custom(format!(
                "expected timestamp, found {}",
                other
            ))),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::from_datetime(dt)
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Timestamp::Text(s.to_string())
    }
}

/// Parse a textual timestamp leniently.
///
/// Accepts RFC 3339, naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`
/// (taken as UTC), and bare epoch milliseconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    s.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// A single fact attached to an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fact {
    /// Plain statement.
    Text(String),
    /// Statement with the files it touched.
    Structured {
        #[serde(default, deserialize_with = "lenient::string")]
        text: String,
        #[serde(default, deserialize_with = "lenient::vec")]
        files: Vec<String>,
    },
}

impl Fact {
    /// The statement text.
    pub fn text(&self) -> &str {
        match self {
            Fact::Text(s) => s,
            Fact::Structured { text, .. } => text,
        }
    }

    /// Files embedded in the fact, if any.
    pub fn files(&self) -> &[String] {
        match self {
            Fact::Text(_) => &[],
            Fact::Structured { files, .. } => files,
        }
    }
}

impl From<&str> for Fact {
    fn from(s: &str) -> Self {
        Fact::Text(s.to_string())
    }
}

/// An observation recorded during the session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Caller-supplied type; classified when absent or generic.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub observation_type: Option<ObservationType>,
    /// Short action description.
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    /// Full context paragraph.
    #[serde(default, deserialize_with = "lenient::string")]
    pub narrative: String,
    /// Concise factual statements.
    #[serde(default, deserialize_with = "lenient::vec")]
    pub facts: Vec<Fact>,
    /// Files touched.
    #[serde(default, deserialize_with = "lenient::vec")]
    pub files: Vec<String>,
    /// When the observation was recorded.
    #[serde(
        default,
        deserialize_with = "lenient::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<Timestamp>,
}

impl Observation {
    /// Create a new observation with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the type.
    pub fn observation_type(mut self, observation_type: ObservationType) -> Self {
        self.observation_type = Some(observation_type);
        self
    }

    /// Set the narrative.
    pub fn narrative(mut self, narrative: impl Into<String>) -> Self {
        self.narrative = narrative.into();
        self
    }

    /// Add a fact.
    pub fn fact(mut self, fact: impl Into<Fact>) -> Self {
        self.facts.push(fact.into());
        self
    }

    /// Add a file.
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Set the timestamp.
    pub fn timestamp(mut self, timestamp: impl Into<Timestamp>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Parsed timestamp, if present and well formed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(Timestamp::parse)
    }

    /// Iterate over fact texts.
    pub fn fact_texts(&self) -> impl Iterator<Item = &str> {
        self.facts.iter().map(Fact::text)
    }

    /// Title, narrative and facts joined by newlines.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(self.title.len() + self.narrative.len());
        text.push_str(&self.title);
        text.push('\n');
        text.push_str(&self.narrative);
        for fact in self.fact_texts() {
            text.push('\n');
            text.push_str(fact);
        }
        text
    }
}

/// A prompt typed by the user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserPrompt {
    /// Prompt text.
    #[serde(default, deserialize_with = "lenient::string")]
    pub prompt: String,
    /// When the prompt was sent.
    #[serde(
        default,
        deserialize_with = "lenient::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<Timestamp>,
}

impl UserPrompt {
    /// Create a prompt.
    pub fn new(prompt: impl Into<String>, timestamp: impl Into<Timestamp>) -> Self {
        Self {
            prompt: prompt.into(),
            timestamp: Some(timestamp.into()),
        }
    }

    /// Parsed timestamp, if present and well formed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(Timestamp::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_builder() {
        let obs = Observation::new("Fixed parser")
            .observation_type(ObservationType::Bugfix)
            .narrative("The tokenizer dropped trailing commas")
            .fact("Edited src/lexer.rs")
            .file("src/lexer.rs")
            .timestamp("2025-01-15T10:00:00Z");

        assert_eq!(obs.title, "Fixed parser");
        assert_eq!(obs.observation_type, Some(ObservationType::Bugfix));
        assert_eq!(obs.facts.len(), 1);
        assert_eq!(obs.files, vec!["src/lexer.rs"]);
        assert!(obs.parsed_timestamp().is_some());
    }

    #[test]
    fn test_timestamp_formats() {
        let rfc = parse_timestamp("2025-01-15T10:00:00Z").unwrap();
        let naive = parse_timestamp("2025-01-15 10:00:00").unwrap();
        let millis = Timestamp::Millis(rfc.timestamp_millis()).parse().unwrap();
        assert_eq!(rfc, naive);
        assert_eq!(rfc, millis);
        assert!(parse_timestamp("yesterday-ish").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_deserialize_mixed_facts() {
        let json = r#"{
            "title": "Wired auth",
            "narrative": "Added middleware",
            "facts": ["plain fact", {"text": "edited", "files": ["src/a.rs"]}],
            "timestamp": 1736935200000
        }"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert!(obs.observation_type.is_none());
        assert_eq!(obs.facts[0].text(), "plain fact");
        assert_eq!(obs.facts[1].files(), ["src/a.rs".to_string()]);
        assert!(obs.parsed_timestamp().is_some());
    }

    #[test]
    fn test_bad_timestamp_does_not_reject_observation() {
        let obs: Observation =
            serde_json::from_str(r#"{"title": "x", "timestamp": "not a date"}"#).unwrap();
        assert!(obs.timestamp.is_some());
        assert!(obs.parsed_timestamp().is_none());
    }

    #[test]
    fn test_loosely_typed_observation_decodes() {
        let json = r#"{
            "type": 7,
            "title": "Tuned cache",
            "facts": null,
            "files": null,
            "timestamp": 1736935200000.0
        }"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert!(obs.observation_type.is_none());
        assert!(obs.facts.is_empty());
        assert!(obs.files.is_empty());
        assert_eq!(obs.timestamp, Some(Timestamp::Millis(1_736_935_200_000)));
        assert_eq!(
            obs.parsed_timestamp(),
            Some(Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_wrongly_typed_prompt_timestamp_is_dropped() {
        let prompt: UserPrompt =
            serde_json::from_str(r#"{"prompt": "go", "timestamp": {"at": 1}}"#).unwrap();
        assert_eq!(prompt.prompt, "go");
        assert!(prompt.timestamp.is_none());
        let prompt: UserPrompt =
            serde_json::from_str(r#"{"prompt": "go", "timestamp": 1736935200000.4}"#).unwrap();
        assert_eq!(prompt.timestamp, Some(Timestamp::Millis(1_736_935_200_000)));
    }

    #[test]
    fn test_searchable_text_includes_facts() {
        let obs = Observation::new("Title").narrative("Body").fact("Fact one");
        assert_eq!(obs.searchable_text(), "Title\nBody\nFact one");
    }
}
