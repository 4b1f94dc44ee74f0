//! Review-level value types.

use serde::{Deserialize, Serialize};

use crate::VouchError;

/// A star rating, 1 through 5 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, VouchError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Self::range_error())
        }
    }

    /// Accept a JSON number only when it is an integer in range.
    pub fn from_f64(value: f64) -> Result<Self, VouchError> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(Self::range_error());
        }
        if value < f64::from(Self::MIN) || value > f64::from(Self::MAX) {
            return Err(Self::range_error());
        }
        Self::new(value as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    fn range_error() -> VouchError {
        VouchError::InvalidInput("Rating must be an integer between 1 and 5".into())
    }
}

/// Where a review came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSource {
    /// Submitted by a verified user through the proximity gate.
    #[default]
    User,
    /// Historical review imported from another platform.
    Imported,
}
