//! Per-label display metadata, captured once per name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::LabelValue;

/// An opaque RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a stroke color.
    ///
    /// The viewer writes `#RRGGBB`; drawings synthesized from a label volume
    /// carry `rgba(r,g,b,a)`. `rgb(r,g,b)` is accepted as well. The alpha
    /// channel is discarded.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex);
        }
        let inner = text
            .strip_prefix("rgba(")
            .or_else(|| text.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let mut channels = inner.split(',').map(str::trim);
        let r = channels.next()?.parse().ok()?;
        let g = channels.next()?.parse().ok()?;
        let b = channels.next()?.parse().ok()?;
        let alpha = channels.next();
        if channels.next().is_some() || alpha.is_some_and(|a| a.parse::<f64>().is_err()) {
            return None;
        }
        Some(Self { r, g, b })
    }

    /// Formats as `rgba(r,g,b,alpha)`.
    pub fn to_rgba(self, alpha: f64) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, alpha)
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    // Only the first six digits are significant; `#RRGGBBAA` keeps its color.
    if hex.len() < 6 || !hex.is_char_boundary(6) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Style and processing hints for one label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub value: LabelValue,
    /// Intensity threshold for the segmentation engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub three: Option<bool>,
}

impl LabelStyle {
    pub fn new(color: Rgb, value: LabelValue) -> Self {
        Self {
            r: color.r,
            g: color.g,
            b: color.b,
            value,
            threshold: None,
            two: None,
            three: None,
        }
    }

    pub fn color(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

/// Label name -> style, insert-if-absent only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptionLedger {
    entries: BTreeMap<String, LabelStyle>,
}

impl DescriptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `style` for `name` unless an entry already exists.
    ///
    /// Returns true when the entry was inserted.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, style: LabelStyle) -> bool {
        let mut inserted = false;
        self.entries.entry(name.into()).or_insert_with(|| {
            inserted = true;
            style
        });
        inserted
    }

    pub fn get(&self, name: &str) -> Option<&LabelStyle> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelStyle)> {
        self.entries.iter().map(|(name, style)| (name.as_str(), style))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
