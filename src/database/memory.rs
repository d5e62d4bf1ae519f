//! In-memory store for tests and short-lived sessions.

use super::CardRepository;
use crate::error::{FlashcardError, Result};
use crate::models::{Deck, Flashcard, NewCard, NewReview, ReviewEvent, SchedulingState};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    decks: Vec<Deck>,
    cards: Vec<Flashcard>,
    reviews: Vec<ReviewEvent>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn owns_deck(&self, owner_id: i64, deck_id: i64) -> bool {
        self.decks.iter().any(|d| d.id == deck_id && d.owner_id == owner_id)
    }

    fn card_mut(&mut self, owner_id: i64, card_id: i64) -> Option<&mut Flashcard> {
        let deck_ids: Vec<i64> = self
            .decks
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .map(|d| d.id)
            .collect();
        self.cards
            .iter_mut()
            .find(|c| c.id == card_id && deck_ids.contains(&c.deck_id))
    }

    fn remove_cards(&mut self, keep: impl Fn(&Flashcard) -> bool) {
        let removed: Vec<i64> = self.cards.iter().filter(|c| !keep(*c)).map(|c| c.id).collect();
        self.cards.retain(|c| keep(c));
        self.reviews.retain(|r| !removed.contains(&r.card_id));
    }
}

/// [`CardRepository`] kept entirely in memory behind one mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CardRepository for MemoryStore {
    fn create_deck(
        &self,
        owner_id: i64,
        name: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<Deck> {
        let mut tables = self.tables();
        let deck = Deck {
            id: tables.next_id(),
            owner_id,
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
        };
        tables.decks.push(deck.clone());
        Ok(deck)
    }

    fn list_decks(&self, owner_id: i64) -> Result<Vec<Deck>> {
        let mut decks: Vec<Deck> = self
            .tables()
            .decks
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        decks.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(decks)
    }

    fn find_deck(&self, owner_id: i64, deck_id: i64) -> Result<Option<Deck>> {
        Ok(self
            .tables()
            .decks
            .iter()
            .find(|d| d.id == deck_id && d.owner_id == owner_id)
            .cloned())
    }

    fn update_deck(
        &self,
        owner_id: i64,
        deck_id: i64,
        name: &str,
        description: &str,
    ) -> Result<bool> {
        let mut tables = self.tables();
        match tables
            .decks
            .iter_mut()
            .find(|d| d.id == deck_id && d.owner_id == owner_id)
        {
            Some(deck) => {
                deck.name = name.to_string();
                deck.description = description.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_deck(&self, owner_id: i64, deck_id: i64) -> Result<bool> {
        let mut tables = self.tables();
        if !tables.owns_deck(owner_id, deck_id) {
            return Ok(false);
        }
        tables.decks.retain(|d| d.id != deck_id);
        tables.remove_cards(|c| c.deck_id != deck_id);
        Ok(true)
    }

    fn create_card(&self, owner_id: i64, card: &NewCard) -> Result<Flashcard> {
        let mut tables = self.tables();
        if !tables.owns_deck(owner_id, card.deck_id) {
            return Err(FlashcardError::DeckNotFound(card.deck_id));
        }
        let card = Flashcard {
            id: tables.next_id(),
            deck_id: card.deck_id,
            front: card.front.clone(),
            back: card.back.clone(),
            tags: card.tags.clone(),
            schedule: card.schedule.clone(),
        };
        tables.cards.push(card.clone());
        Ok(card)
    }

    fn find_card(&self, owner_id: i64, card_id: i64) -> Result<Option<Flashcard>> {
        Ok(self.tables().card_mut(owner_id, card_id).map(|c| c.clone()))
    }

    fn update_card_content(
        &self,
        owner_id: i64,
        card_id: i64,
        front: &str,
        back: &str,
        tags: &[String],
    ) -> Result<bool> {
        let mut tables = self.tables();
        match tables.card_mut(owner_id, card_id) {
            Some(card) => {
                card.front = front.to_string();
                card.back = back.to_string();
                card.tags = tags.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_card(&self, owner_id: i64, card_id: i64) -> Result<bool> {
        let mut tables = self.tables();
        if tables.card_mut(owner_id, card_id).is_none() {
            return Ok(false);
        }
        tables.remove_cards(|c| c.id != card_id);
        Ok(true)
    }

    fn deck_cards(&self, owner_id: i64, deck_id: i64) -> Result<Vec<Flashcard>> {
        let tables = self.tables();
        if !tables.owns_deck(owner_id, deck_id) {
            return Ok(Vec::new());
        }
        Ok(tables
            .cards
            .iter()
            .filter(|c| c.deck_id == deck_id)
            .cloned()
            .collect())
    }

    fn owner_cards(&self, owner_id: i64) -> Result<Vec<Flashcard>> {
        let tables = self.tables();
        Ok(tables
            .cards
            .iter()
            .filter(|c| tables.owns_deck(owner_id, c.deck_id))
            .cloned()
            .collect())
    }

    fn owner_reviews(&self, owner_id: i64) -> Result<Vec<ReviewEvent>> {
        let mut reviews: Vec<ReviewEvent> = self
            .tables()
            .reviews
            .iter()
            .filter(|r| r.user_id == owner_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| (r.reviewed_at, r.id));
        Ok(reviews)
    }

    fn store_review(
        &self,
        card_id: i64,
        expected: &SchedulingState,
        next: &SchedulingState,
        review: &NewReview,
    ) -> Result<bool> {
        let mut tables = self.tables();
        let id = tables.last_id + 1;
        let Some(card) = tables.cards.iter_mut().find(|c| c.id == card_id) else {
            return Ok(false);
        };
        if card.schedule != *expected {
            return Ok(false);
        }
        card.schedule = next.clone();
        tables.last_id = id;
        tables.reviews.push(ReviewEvent {
            id,
            card_id: review.card_id,
            user_id: review.user_id,
            quality: review.quality,
            reviewed_at: review.reviewed_at,
        });
        Ok(true)
    }
}
