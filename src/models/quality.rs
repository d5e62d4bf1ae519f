//! Learner's recall rating, 0 (blackout) to 5 (perfect).
use crate::error::{FlashcardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest rating that counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Validates a raw rating. Out-of-range values are rejected, never clamped.
    pub fn new(value: i32) -> Result<Self> {
        match u8::try_from(value) {
            Ok(q) if q <= 5 => Ok(Self(q)),
            _ => Err(FlashcardError::InvalidRating(value)),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// True for ratings below 3, which reset the repetition streak.
    pub fn is_lapse(self) -> bool {
        self.0 < PASSING_QUALITY
    }
}

impl TryFrom<i32> for Quality {
    type Error = FlashcardError;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> u8 {
        quality.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_range() {
        for value in 0..=5 {
            assert_eq!(Quality::new(value).unwrap().value() as i32, value);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        for value in [-1, 6, 255, i32::MIN, i32::MAX] {
            match Quality::new(value) {
                Err(FlashcardError::InvalidRating(v)) => assert_eq!(v, value),
                other => panic!("expected InvalidRating, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_lapse_boundary() {
        assert!(Quality::new(2).unwrap().is_lapse());
        assert!(!Quality::new(3).unwrap().is_lapse());
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<Quality>("4").is_ok());
        assert!(serde_json::from_str::<Quality>("7").is_err());
    }
}
