//! Label identity shared by both conversion directions.
//!
//! A label is known by its name (e.g. `"liver"`) and by the integer value its
//! voxels carry in the label volume. [`LabelRegistry`] owns the name/value
//! pairing ("slab"), [`DescriptionLedger`] owns the display style captured the
//! first time each name is decoded.

mod ledger;
mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LabelBridgeError;

pub use ledger::{DescriptionLedger, LabelStyle, Rgb};
pub use registry::{CollisionPolicy, LabelRegistry, Registration};

/// A voxel value naming a label: always in `1..=254`, 0 is background.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct LabelValue(u8);

impl LabelValue {
    /// Smallest value a label may carry.
    pub const MIN: u8 = 1;
    /// Largest value a label may carry.
    pub const MAX: u8 = 254;

    /// Creates a label value, rejecting background and 255.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Returns the underlying voxel value.
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for LabelValue {
    type Error = LabelBridgeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(LabelValue::new)
            .ok_or(LabelBridgeError::LabelValueOutOfRange(value))
    }
}

impl From<LabelValue> for u8 {
    fn from(value: LabelValue) -> Self {
        value.0
    }
}

impl fmt::Debug for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelValue({})", self.0)
    }
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_and_255_are_not_labels() {
        assert!(LabelValue::new(0).is_none());
        assert!(LabelValue::new(255).is_none());
        assert_eq!(LabelValue::new(1).map(LabelValue::get), Some(1));
        assert_eq!(LabelValue::new(254).map(LabelValue::get), Some(254));
    }

    #[test]
    fn try_from_rejects_out_of_range() {
        assert!(LabelValue::try_from(5i64).is_ok());
        for bad in [-1i64, 0, 255, 1000] {
            match LabelValue::try_from(bad) {
                Err(LabelBridgeError::LabelValueOutOfRange(v)) => assert_eq!(v, bad),
                other => panic!("expected LabelValueOutOfRange, got {other:?}"),
            }
        }
    }

    #[test]
    fn serde_is_transparent() {
        let value: LabelValue = serde_json::from_str("7").unwrap();
        assert_eq!(value.get(), 7);
        assert_eq!(serde_json::to_string(&value).unwrap(), "7");
        assert!(serde_json::from_str::<LabelValue>("0").is_err());
    }
}
