//! Per-card SM-2 scheduling data.
use crate::error::{FlashcardError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// The four scheduling fields stored on every card. They are always written
/// together; `due_date` equals the review day plus `interval`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub interval: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub due_date: NaiveDate,
}

impl SchedulingState {
    /// State of a freshly created card: never reviewed and due immediately.
    pub fn new_card(today: NaiveDate) -> Self {
        Self {
            interval: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            repetitions: 0,
            due_date: today,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.due_date <= today
    }

    /// Checks a state that did not come out of the scheduler, such as one
    /// read from an import file.
    pub fn validate(&self) -> Result<()> {
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return Err(FlashcardError::InvalidSchedule(format!(
                "ease factor {} is below {}",
                self.ease_factor, MIN_EASE_FACTOR
            )));
        }
        if self.repetitions > 0 && self.interval == 0 {
            return Err(FlashcardError::InvalidSchedule(format!(
                "interval 0 after {} repetitions",
                self.repetitions
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_is_due_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let state = SchedulingState::new_card(today);

        assert_eq!(state.interval, 0);
        assert_eq!(state.repetitions, 0);
        assert_eq!(state.ease_factor, 2.5);
        assert!(state.is_due(today));
        assert!(!state.is_due(today.pred_opt().unwrap()));
    }

    #[test]
    fn test_validate() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(SchedulingState::new_card(today).validate().is_ok());

        let low_ease = SchedulingState {
            ease_factor: 1.2,
            ..SchedulingState::new_card(today)
        };
        assert!(matches!(low_ease.validate(), Err(FlashcardError::InvalidSchedule(_))));

        let nan_ease = SchedulingState {
            ease_factor: f64::NAN,
            ..SchedulingState::new_card(today)
        };
        assert!(nan_ease.validate().is_err());

        let no_interval = SchedulingState {
            interval: 0,
            ease_factor: 2.5,
            repetitions: 4,
            due_date: today,
        };
        assert!(no_interval.validate().is_err());

        let lapsed = SchedulingState {
            interval: 1,
            ease_factor: MIN_EASE_FACTOR,
            repetitions: 0,
            due_date: today,
        };
        assert!(lapsed.validate().is_ok());
    }

    #[test]
    fn test_due_date_serializes_as_iso_date() {
        let state = SchedulingState::new_card(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["due_date"], "2024-03-01");
    }
}
