//! Name <-> value registry ("slab").

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

use super::LabelValue;
use crate::error::LabelBridgeError;

/// Lowest value handed out to a name seen without an explicit value.
const AUTO_MIN: u8 = 100;
/// Highest value handed out to a name seen without an explicit value.
const AUTO_MAX: u8 = 254;

/// Prefix of names synthesized for drawings that only carry a value.
pub const SYNTHESIZED_PREFIX: &str = "lbl_";

/// What the registry does when a random draw lands on a value that already
/// belongs to another name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Accept the draw as-is. Two names may end up sharing a value.
    #[default]
    Allow,
    /// Draw among the unused values of the automatic range instead; falls back
    /// to a plain draw once that range is exhausted.
    Avoid,
}

/// The outcome of resolving one drawing's label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    /// The registry key, synthesized (`lbl_<value>`) for value-only drawings.
    pub name: String,
    pub value: LabelValue,
    /// True when this call created the mapping.
    pub newly_registered: bool,
    /// Another name that already held `value` when this mapping was created.
    pub shares_value_with: Option<String>,
}

/// Bidirectional mapping between label names and label values.
///
/// Entries are immutable once written: the first value registered for a name
/// wins for the lifetime of the registry. The reverse index keeps the first
/// name registered for each value.
#[derive(Clone, Debug)]
pub struct LabelRegistry {
    by_name: BTreeMap<String, LabelValue>,
    by_value: BTreeMap<LabelValue, String>,
    rng: StdRng,
    policy: CollisionPolicy,
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelRegistry {
    /// Creates an empty registry with an entropy-seeded random source.
    pub fn new() -> Self {
        Self::with_rng(StdRng::seed_from_u64(rand::random()))
    }

    /// Creates an empty registry whose automatic values are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Creates an empty registry drawing automatic values from `rng`.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            by_name: BTreeMap::new(),
            by_value: BTreeMap::new(),
            rng,
            policy: CollisionPolicy::default(),
        }
    }

    /// Sets the collision policy for automatic values.
    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seeds the registry from an existing name -> value mapping.
    ///
    /// Entries with value 0 are background aliases (`"none"`) and are skipped.
    pub fn extend_from_slab<I, S>(&mut self, slab: I) -> Result<(), LabelBridgeError>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        for (name, raw) in slab {
            if raw == 0 {
                continue;
            }
            let value = LabelValue::try_from(i64::from(raw))?;
            self.insert(name, value);
        }
        Ok(())
    }

    /// Registers `name -> value` unless `name` is already known.
    ///
    /// Returns true when the mapping was inserted.
    pub fn insert(&mut self, name: impl Into<String>, value: LabelValue) -> bool {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return false;
        }
        self.by_value.entry(value).or_insert_with(|| name.clone());
        self.by_name.insert(name, value);
        true
    }

    /// Resolves a drawing's label to a value.
    ///
    /// A registered name always returns its existing value and `explicit` is
    /// ignored. Otherwise `explicit` is registered under `name` (or under
    /// `lbl_<value>` when `name` is empty). A non-empty name without an
    /// explicit value gets a random value in `100..=254`. An empty name
    /// without a value cannot be resolved.
    pub fn resolve(&mut self, name: &str, explicit: Option<LabelValue>) -> Option<Registration> {
        if !name.is_empty() {
            if let Some(&value) = self.by_name.get(name) {
                return Some(Registration {
                    name: name.to_string(),
                    value,
                    newly_registered: false,
                    shares_value_with: None,
                });
            }
        }

        let (name, value) = match (name.is_empty(), explicit) {
            (false, Some(value)) => (name.to_string(), value),
            (true, Some(value)) => (format!("{SYNTHESIZED_PREFIX}{value}"), value),
            (false, None) => (name.to_string(), self.draw()),
            (true, None) => return None,
        };

        // A synthesized name may already exist from an earlier drawing.
        if let Some(&existing) = self.by_name.get(&name) {
            return Some(Registration {
                name,
                value: existing,
                newly_registered: false,
                shares_value_with: None,
            });
        }

        let shares_value_with = self.by_value.get(&value).cloned();
        self.insert(name.clone(), value);
        Some(Registration {
            name,
            value,
            newly_registered: true,
            shares_value_with,
        })
    }

    /// Value registered for `name`.
    pub fn get(&self, name: &str) -> Option<LabelValue> {
        self.by_name.get(name).copied()
    }

    /// First name registered for `value`.
    pub fn name_of(&self, value: LabelValue) -> Option<&str> {
        self.by_value.get(&value).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, LabelValue)> {
        self.by_name.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// The plain `name -> value` mapping, as stored in session files.
    pub fn to_slab(&self) -> BTreeMap<String, u8> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.get()))
            .collect()
    }

    fn draw(&mut self) -> LabelValue {
        let raw = match self.policy {
            CollisionPolicy::Allow => self.rng.random_range(AUTO_MIN..=AUTO_MAX),
            CollisionPolicy::Avoid => {
                let used: BTreeSet<u8> = self.by_value.keys().map(|v| v.get()).collect();
                let free: Vec<u8> = (AUTO_MIN..=AUTO_MAX)
                    .filter(|v| !used.contains(v))
                    .collect();
                if free.is_empty() {
                    self.rng.random_range(AUTO_MIN..=AUTO_MAX)
                } else {
                    free[self.rng.random_range(0..free.len())]
                }
            }
        };
        // AUTO_MIN..=AUTO_MAX lies inside the label range.
        LabelValue(raw)
    }
}
