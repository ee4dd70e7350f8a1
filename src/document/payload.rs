//! The description payload embedded in a drawing's `longText`.
//!
//! Legacy documents write it with single quotes (`{'value': 5}`); quotes are
//! normalized before decoding.

use serde::{Deserialize, Deserializer};

/// Structured content of a non-empty `longText`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DescriptionPayload {
    /// Explicit label value. Range checks happen at resolution time.
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default, deserialize_with = "flag")]
    pub two: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    pub three: Option<bool>,
}

impl DescriptionPayload {
    /// Parses a `longText` value.
    ///
    /// Returns `Ok(None)` for empty text and `Err` with the decoder message
    /// when the text is not a payload object.
    pub fn parse(long_text: &str) -> Result<Option<Self>, String> {
        if long_text.trim().is_empty() {
            return Ok(None);
        }
        let normalized = long_text.replace('\'', "\"");
        serde_json::from_str(&normalized)
            .map(Some)
            .map_err(|e| e.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Number(f64),
}

fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawFlag> = Option::deserialize(deserializer)?;
    Ok(raw.map(|flag| match flag {
        RawFlag::Bool(b) => b,
        RawFlag::Number(n) => n != 0.0,
    }))
}
