//! Review workflow on top of a [`CardRepository`]: the layer an API or the
//! CLI calls to grade cards and fetch study sets.

use crate::config::Config;
use crate::database::CardRepository;
use crate::error::{FlashcardError, Result};
use crate::models::due::DEFAULT_DUE_LIMIT;
use crate::models::{
    DueQuery, Flashcard, NewCard, NewReview, Quality, SchedulingState, StudyStats, select_due, sm2,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use log::{info, warn};

pub struct ReviewService<R> {
    repo: R,
    due_limit: usize,
    max_conflict_retries: u32,
}

impl<R: CardRepository> ReviewService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            due_limit: DEFAULT_DUE_LIMIT,
            max_conflict_retries: Config::default().max_conflict_retries,
        }
    }

    pub fn with_config(repo: R, config: &Config) -> Self {
        Self {
            repo,
            due_limit: config.due_limit,
            max_conflict_retries: config.max_conflict_retries,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Adds a card with the default schedule, due on `today`.
    pub fn add_card(
        &self,
        owner_id: i64,
        deck_id: i64,
        front: &str,
        back: &str,
        tags: Vec<String>,
        today: NaiveDate,
    ) -> Result<Flashcard> {
        let card = self
            .repo
            .create_card(owner_id, &NewCard::new(deck_id, front, back, tags, today))?;
        info!("Card {} created in deck {}", card.id, deck_id);
        Ok(card)
    }

    /// Grades a card and persists its next schedule together with a review
    /// event.
    ///
    /// The rating is validated before storage is touched. If another review of
    /// the same card is written between our read and our write, the card is
    /// reloaded and the rating is applied to the newer state, so every stored
    /// review builds on the one before it.
    pub fn submit_review(
        &self,
        owner_id: i64,
        card_id: i64,
        quality: i32,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<SchedulingState> {
        let quality = Quality::new(quality)?;
        let review = NewReview {
            card_id,
            user_id: owner_id,
            quality,
            reviewed_at: now,
        };

        for attempt in 0..=self.max_conflict_retries {
            let card = self
                .repo
                .find_card(owner_id, card_id)?
                .ok_or(FlashcardError::CardNotFound(card_id))?;

            let next = sm2::next_state(quality, &card.schedule, today);
            if self.repo.store_review(card_id, &card.schedule, &next, &review)? {
                info!(
                    "Card {} reviewed with quality {}, next due {} (interval {})",
                    card_id, quality, next.due_date, next.interval
                );
                return Ok(next);
            }
            warn!(
                "Card {} changed during review (attempt {}), retrying",
                card_id,
                attempt + 1
            );
        }

        Err(FlashcardError::Conflict(card_id))
    }

    /// Due cards of one deck, most overdue first.
    pub fn due_cards(
        &self,
        owner_id: i64,
        deck_id: i64,
        query: DueQuery,
        today: NaiveDate,
    ) -> Result<Vec<Flashcard>> {
        if self.repo.find_deck(owner_id, deck_id)?.is_none() {
            return Err(FlashcardError::DeckNotFound(deck_id));
        }
        let cards = self.repo.deck_cards(owner_id, deck_id)?;
        let limit = query.limit_or(self.due_limit);

        Ok(select_due(&cards, today, limit, query.ignore_date)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Study statistics as seen from `now`, whose offset decides which
    /// calendar day each review falls on.
    pub fn stats(
        &self,
        owner_id: i64,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<StudyStats> {
        let decks = self.repo.list_decks(owner_id)?;
        let cards = self.repo.owner_cards(owner_id)?;
        let reviews = self.repo.owner_reviews(owner_id)?;
        Ok(StudyStats::compute(decks.len(), &cards, &reviews, today, now))
    }
}
