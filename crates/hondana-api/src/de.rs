//! Lenient deserializers for upstream quirks.
//!
//! Upstream APIs serialize an empty map as `[]` and omit or null out fields
//! freely. These helpers fold every such variant into an empty default.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Language code → text.
pub type LocalizedString = BTreeMap<String, String>;

/// Accept a `{lang: text}` map, an empty array, or null.
pub fn localized<'de, D>(deserializer: D) -> Result<LocalizedString, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(lang, text)| match text {
                Value::String(s) => Some((lang, s)),
                _ => None,
            })
            .collect(),
        _ => LocalizedString::new(),
    })
}

/// Accept either a JSON object (its values are taken, in key order) or an
/// array. Null and scalars become an empty list; entries that fail to decode
/// are skipped.
pub fn values<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let entries: Vec<Value> = match value {
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Array(items) => items,
        _ => Vec::new(),
    };
    Ok(entries
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

/// Null-tolerant `Vec<T>`: null or a non-array becomes empty.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// A string, a number rendered as text, or empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// A number, or a string holding one. Anything else is `None`.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A string, or `None` for anything else.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A non-negative integer, or a numeric string holding one.
pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Like [`opt_u64`], narrowed to `u32`. Out-of-range values are `None`.
pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_u64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "localized")]
        title: LocalizedString,
        #[serde(default, deserialize_with = "values")]
        ids: Vec<u32>,
        #[serde(default, deserialize_with = "list")]
        names: Vec<String>,
        #[serde(default, deserialize_with = "text")]
        label: String,
        #[serde(default, deserialize_with = "number")]
        score: Option<f64>,
        #[serde(default, deserialize_with = "opt_string")]
        stamp: Option<String>,
        #[serde(default, deserialize_with = "opt_u64")]
        views: Option<u64>,
        #[serde(default, deserialize_with = "opt_u32")]
        year: Option<u32>,
    }

    #[test]
    fn test_empty_array_as_localized_map() {
        let probe: Probe = serde_json::from_str(r#"{ "title": [] }"#).unwrap();
        assert!(probe.title.is_empty());
    }

    #[test]
    fn test_object_values_and_arrays() {
        let probe: Probe =
            serde_json::from_str(r#"{ "ids": { "a": 1, "b": 2 }, "names": null }"#).unwrap();
        assert_eq!(probe.ids, vec![1, 2]);
        assert!(probe.names.is_empty());

        let probe: Probe = serde_json::from_str(r#"{ "ids": [3, "bad", 4] }"#).unwrap();
        assert_eq!(probe.ids, vec![3, 4]);
    }

    #[test]
    fn test_text_and_number() {
        let probe: Probe = serde_json::from_str(r#"{ "label": 12, "score": "8.5" }"#).unwrap();
        assert_eq!(probe.label, "12");
        assert_eq!(probe.score, Some(8.5));

        let probe: Probe = serde_json::from_str(r#"{ "label": null, "score": "n/a" }"#).unwrap();
        assert_eq!(probe.label, "");
        assert_eq!(probe.score, None);
    }

    #[test]
    fn test_wrong_typed_optionals_become_none() {
        let probe: Probe =
            serde_json::from_str(r#"{ "stamp": 1700000000, "views": "1200", "year": "2020" }"#)
                .unwrap();
        assert_eq!(probe.stamp, None);
        assert_eq!(probe.views, Some(1200));
        assert_eq!(probe.year, Some(2020));

        let probe: Probe =
            serde_json::from_str(r#"{ "stamp": "2024-01-01", "views": -3, "year": { "y": 1 } }"#)
                .unwrap();
        assert_eq!(probe.stamp.as_deref(), Some("2024-01-01"));
        assert_eq!(probe.views, None);
        assert_eq!(probe.year, None);

        let probe: Probe = serde_json::from_str(r#"{ "views": 7.0, "year": 5000000000 }"#).unwrap();
        assert_eq!(probe.views, Some(7));
        assert_eq!(probe.year, None);
    }
}
