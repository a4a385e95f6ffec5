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

//! Field deserializers that never reject a payload.
//!
//! Host agents send loosely typed JSON. A wrongly typed optional field
//! degrades to its empty value instead of failing the whole decode.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Any value that fails to decode becomes `None`.
pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A list whose undecodable entries are dropped; `null` or a non-list is empty.
pub fn vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// A string; `null` and non-strings are empty, numbers keep their digits.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

/// A numeric score given as a number or numeric text.
pub fn score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?))
}

/// A percentage rounded and clamped to 0..=100.
pub fn percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?).map(|n| n.round().clamp(0.0, 100.0) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Fields {
        #[serde(deserialize_with = "vec")]
        items: Vec<String>,
        #[serde(deserialize_with = "score")]
        score: Option<f64>,
        #[serde(deserialize_with = "percent")]
        percent: Option<u8>,
        #[serde(deserialize_with = "option")]
        flag: Option<bool>,
        #[serde(deserialize_with = "string")]
        label: String,
    }

    fn decode(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_lists_drop_bad_entries() {
        assert_eq!(decode(r#"{"items": ["a", 3, "b"]}"#).items, vec!["a", "b"]);
        assert!(decode(r#"{"items": null}"#).items.is_empty());
        assert!(decode(r#"{"items": "a"}"#).items.is_empty());
    }

    #[test]
    fn test_scores_accept_numeric_text() {
        assert_eq!(decode(r#"{"score": "40"}"#).score, Some(40.0));
        assert_eq!(decode(r#"{"score": " 72.5 "}"#).score, Some(72.5));
        assert_eq!(decode(r#"{"score": "high"}"#).score, None);
        assert_eq!(decode(r#"{"score": null}"#).score, None);
    }

    #[test]
    fn test_percent_rounds_and_clamps() {
        assert_eq!(decode(r#"{"percent": 85.5}"#).percent, Some(86));
        assert_eq!(decode(r#"{"percent": 140}"#).percent, Some(100));
        assert_eq!(decode(r#"{"percent": -3}"#).percent, Some(0));
        assert_eq!(decode(r#"{"percent": "70%"}"#).percent, Some(70));
    }

    #[test]
    fn test_wrong_types_fall_back() {
        let decoded = decode(r#"{"flag": "yes", "label": null}"#);
        assert_eq!(decoded.flag, None);
        assert_eq!(decoded.label, "");
        assert_eq!(decode(r#"{"label": 12}"#).label, "12");
    }
}
