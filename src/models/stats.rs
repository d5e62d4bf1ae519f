//! Read-side study statistics over an owner's cards and review history.
use super::{Flashcard, ReviewEvent};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// Interval (days) from which a card counts as mastered.
pub const MASTERY_INTERVAL: u32 = 21;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StudyStats {
    pub total_decks: usize,
    pub total_cards: usize,
    pub due_today: usize,
    pub reviews_last_week: usize,
    /// Mean rating over all reviews, two decimals. 0 without reviews.
    pub average_quality: f64,
    /// Share of cards (0.0-1.0) whose interval reached [`MASTERY_INTERVAL`].
    pub mastery_rate: f64,
    /// Consecutive days with at least one review, ending today or yesterday.
    /// Review days are taken in the UTC offset of `now`.
    pub current_streak: u32,
}

impl StudyStats {
    pub fn compute(
        total_decks: usize,
        cards: &[Flashcard],
        reviews: &[ReviewEvent],
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let week_ago = now.with_timezone(&Utc) - Duration::days(7);

        let due_today = cards.iter().filter(|c| c.schedule.is_due(today)).count();
        let mastered = cards
            .iter()
            .filter(|c| c.schedule.interval >= MASTERY_INTERVAL)
            .count();
        let reviews_last_week = reviews.iter().filter(|r| r.reviewed_at >= week_ago).count();

        Self {
            total_decks,
            total_cards: cards.len(),
            due_today,
            reviews_last_week,
            average_quality: average_quality(reviews),
            mastery_rate: if cards.is_empty() {
                0.0
            } else {
                mastered as f64 / cards.len() as f64
            },
            current_streak: current_streak(reviews, today, now.offset()),
        }
    }
}

fn average_quality(reviews: &[ReviewEvent]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.quality.value())).sum();
    let mean = f64::from(sum) / reviews.len() as f64;
    (mean * 100.0).round() / 100.0
}

fn current_streak(reviews: &[ReviewEvent], today: NaiveDate, offset: &FixedOffset) -> u32 {
    let days: BTreeSet<NaiveDate> = reviews
        .iter()
        .map(|r| r.reviewed_at.with_timezone(offset).date_naive())
        .collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}
