//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each card has an ease factor (EF) that adjusts based on performance
//! - Quality grades 0-2: repetitions reset to 0, card comes back tomorrow
//! - Quality grades 3-5: interval grows progressively (1 day → 6 days → interval * EF)
//! - EF is adjusted after every review and never falls below 1.3
//!
//! Interval growth uses the interval and EF the card had *before* this review.
//! The scheduler does not read the clock; the caller passes the review day.

use super::{Quality, SchedulingState, scheduling_state::MIN_EASE_FACTOR};
use crate::error::Result;
use chrono::{Days, NaiveDate};
use log::debug;

/// Computes the scheduling state that follows a review of `quality`.
///
/// Fails with `InvalidRating` when `quality` is outside 0-5. The input state
/// is left untouched.
pub fn compute_next_state(
    quality: i32,
    state: &SchedulingState,
    today: NaiveDate,
) -> Result<SchedulingState> {
    let quality = Quality::new(quality)?;
    Ok(next_state(quality, state, today))
}

/// Same as [`compute_next_state`] for an already validated rating.
pub fn next_state(quality: Quality, state: &SchedulingState, today: NaiveDate) -> SchedulingState {
    let (interval, repetitions) = if quality.is_lapse() {
        (1, 0)
    } else {
        let repetitions = state.repetitions.saturating_add(1);
        let interval = match repetitions {
            1 => 1,
            2 => 6,
            _ => grow_interval(state.interval, state.ease_factor),
        };
        (interval, repetitions)
    };

    let ease_factor = next_ease_factor(state.ease_factor, quality);
    let due_date = today
        .checked_add_days(Days::new(u64::from(interval)))
        .unwrap_or(NaiveDate::MAX);

    debug!(
        "sm2: q={} reps {}->{} interval {}->{} ef {:.2}->{:.2} due {}",
        quality, state.repetitions, repetitions, state.interval, interval, state.ease_factor, ease_factor, due_date
    );

    SchedulingState {
        interval,
        ease_factor,
        repetitions,
        due_date,
    }
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
fn next_ease_factor(ease_factor: f64, quality: Quality) -> f64 {
    let miss = 5.0 - f64::from(quality.value());
    let updated = ease_factor + (0.1 - miss * (0.08 + miss * 0.02));
    if updated < MIN_EASE_FACTOR {
        MIN_EASE_FACTOR
    } else {
        updated
    }
}

// Rounds half away from zero. A repeating card never drops below one day.
fn grow_interval(interval: u32, ease_factor: f64) -> u32 {
    let grown = (f64::from(interval) * ease_factor).round() as u32;
    grown.max(1)
}

/// Interval each quality 0-5 would produce from `state`, indexed by quality.
pub fn preview_intervals(state: &SchedulingState, today: NaiveDate) -> [u32; 6] {
    let mut intervals = [0; 6];
    for (value, slot) in intervals.iter_mut().enumerate() {
        if let Ok(quality) = Quality::new(value as i32) {
            *slot = next_state(quality, state, today).interval;
        }
    }
    intervals
}
