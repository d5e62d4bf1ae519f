//! Learning session management for spaced repetition practice.
//! Handles multi-round flashcard review on top of the review service.

use super::{Flashcard, LearningCard, Quality, SchedulingState};
use crate::database::CardRepository;
use crate::error::Result;
use crate::service::ReviewService;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;

/// Manages a learning session with multiple review rounds.
/// Cards that aren't mastered (grade < 3) are repeated in subsequent rounds.
pub struct LearningSession {
    pub deck_id: i64,
    pub all_cards: Vec<LearningCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_back: bool,
    pub round_number: usize,
}

impl LearningSession {
    /// Creates a new learning session from cards that are due for review.
    pub fn new_from_due_cards(deck_id: i64, cards: Vec<Flashcard>) -> Self {
        let all_cards: Vec<LearningCard> = cards.into_iter().map(LearningCard::new).collect();
        let indices: Vec<usize> = (0..all_cards.len()).collect();

        Self {
            deck_id,
            all_cards,
            current_round_cards: indices,
            current_index: 0,
            show_back: false,
            round_number: 1,
        }
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn reveal(&mut self) {
        self.show_back = true;
    }

    /// Moves to the next card, or to the next round at the end of this one.
    pub fn next_card(&mut self) {
        self.show_back = false;
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that were not passed. With none
    /// left, the round list empties and the session is complete.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.all_cards.get(idx).is_some_and(|card| !card.is_learned))
            .collect();

        self.current_index = 0;
        if !failed.is_empty() {
            self.round_number += 1;
            debug!("Round {}: {} cards to retry", self.round_number, failed.len());
        }
        self.current_round_cards = failed;
    }

    /// Grades the current card through the review service and keeps the
    /// returned schedule on the in-memory card.
    pub fn grade_current_card<R: CardRepository>(
        &mut self,
        service: &ReviewService<R>,
        owner_id: i64,
        quality: i32,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<SchedulingState>> {
        let grade = Quality::new(quality)?;
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some(learning) = self.all_cards.get_mut(idx) else {
            return Ok(None);
        };

        let next = service.submit_review(owner_id, learning.card.id, quality, today, now)?;
        learning.card.schedule = next.clone();
        learning.record_grade(grade);
        Ok(Some(next))
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| self.all_cards.get(idx).is_some_and(|card| card.is_learned))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// Returns true when no card is left to study.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
