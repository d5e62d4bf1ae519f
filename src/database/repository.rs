//! Persistence seam between the review service and a concrete store.
//!
//! Every lookup is scoped by owner: a deck or card belonging to someone else
//! is reported exactly like a missing one (`None` / `false`).

use crate::error::Result;
use crate::models::{Deck, Flashcard, NewCard, NewReview, ReviewEvent, SchedulingState};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub trait CardRepository {
    fn create_deck(&self, owner_id: i64, name: &str, description: &str, now: DateTime<Utc>)
    -> Result<Deck>;

    /// Owner's decks ordered by name.
    fn list_decks(&self, owner_id: i64) -> Result<Vec<Deck>>;

    fn find_deck(&self, owner_id: i64, deck_id: i64) -> Result<Option<Deck>>;

    fn update_deck(&self, owner_id: i64, deck_id: i64, name: &str, description: &str)
    -> Result<bool>;

    /// Removes the deck with its cards and their review history.
    fn delete_deck(&self, owner_id: i64, deck_id: i64) -> Result<bool>;

    /// Fails with `DeckNotFound` when the deck does not belong to `owner_id`.
    fn create_card(&self, owner_id: i64, card: &NewCard) -> Result<Flashcard>;

    fn find_card(&self, owner_id: i64, card_id: i64) -> Result<Option<Flashcard>>;

    /// Edits front, back and tags. Scheduling fields are not touched.
    fn update_card_content(
        &self,
        owner_id: i64,
        card_id: i64,
        front: &str,
        back: &str,
        tags: &[String],
    ) -> Result<bool>;

    fn delete_card(&self, owner_id: i64, card_id: i64) -> Result<bool>;

    /// Cards of one deck in id (creation) order. Empty for a foreign deck.
    fn deck_cards(&self, owner_id: i64, deck_id: i64) -> Result<Vec<Flashcard>>;

    /// Every card across the owner's decks, in id order.
    fn owner_cards(&self, owner_id: i64) -> Result<Vec<Flashcard>>;

    /// Review history of `owner_id`, oldest first.
    fn owner_reviews(&self, owner_id: i64) -> Result<Vec<ReviewEvent>>;

    /// Writes `next` and appends `review` as one unit, but only while the
    /// stored schedule of `card_id` still equals `expected`. Returns `false`
    /// and writes nothing when another review got there first.
    fn store_review(
        &self,
        card_id: i64,
        expected: &SchedulingState,
        next: &SchedulingState,
        review: &NewReview,
    ) -> Result<bool>;

    /// Cards whose front or back contains `query` (case-insensitive) and
    /// that carry `tag`. Empty arguments match everything.
    fn search_cards(&self, owner_id: i64, query: &str, tag: &str) -> Result<Vec<Flashcard>> {
        let query = query.to_lowercase();
        Ok(self
            .owner_cards(owner_id)?
            .into_iter()
            .filter(|card| {
                query.is_empty()
                    || card.front.to_lowercase().contains(&query)
                    || card.back.to_lowercase().contains(&query)
            })
            .filter(|card| tag.is_empty() || card.has_tag(tag))
            .collect())
    }

    /// Distinct tags used by the owner's cards, sorted.
    fn all_tags(&self, owner_id: i64) -> Result<Vec<String>> {
        let tags: BTreeSet<String> = self
            .owner_cards(owner_id)?
            .into_iter()
            .flat_map(|card| card.tags)
            .collect();
        Ok(tags.into_iter().collect())
    }
}
