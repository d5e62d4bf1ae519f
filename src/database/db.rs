//! SQLite store for decks, flashcards and review history
//!
//! Handles database initialization, CRUD operations for decks and flashcards,
//! and the atomic write of SM-2 scheduling data together with its review event.

use super::CardRepository;
use crate::error::{FlashcardError, Result};
use crate::models::{Deck, Flashcard, NewCard, NewReview, Quality, ReviewEvent, SchedulingState};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS decks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deck_id INTEGER NOT NULL,
        front TEXT NOT NULL,
        back TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        interval INTEGER NOT NULL DEFAULT 0,
        ease_factor REAL NOT NULL DEFAULT 2.5,
        repetitions INTEGER NOT NULL DEFAULT 0,
        due_date TEXT NOT NULL,
        FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        card_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        quality INTEGER NOT NULL,
        reviewed_at TEXT NOT NULL,
        FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_decks_owner_id ON decks(owner_id);
    CREATE INDEX IF NOT EXISTS idx_cards_deck_id ON cards(deck_id);
    CREATE INDEX IF NOT EXISTS idx_cards_due_date ON cards(due_date);
    CREATE INDEX IF NOT EXISTS idx_reviews_card_id ON reviews(card_id);
";

const CARD_COLUMNS: &str =
    "c.id, c.deck_id, c.front, c.back, c.tags, c.interval, c.ease_factor, c.repetitions, c.due_date";

/// SQLite-backed [`CardRepository`]. The connection sits behind a mutex so a
/// single store can be shared between threads.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening flashcard database at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Open transactions roll back on drop, so a poisoned lock is still usable.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn query_cards(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Flashcard>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let cards = stmt
            .query_map(params, card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }
}

fn deck_from_row(row: &Row<'_>) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Flashcard> {
    let tags: String = row.get(4)?;
    let tags: Vec<String> = serde_json::from_str(&tags)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Flashcard {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        tags,
        schedule: SchedulingState {
            interval: row.get(5)?,
            ease_factor: row.get(6)?,
            repetitions: row.get(7)?,
            due_date: row.get(8)?,
        },
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewEvent> {
    let raw: i32 = row.get(3)?;
    let quality = Quality::new(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e)))?;

    Ok(ReviewEvent {
        id: row.get(0)?,
        card_id: row.get(1)?,
        user_id: row.get(2)?,
        quality,
        reviewed_at: row.get(4)?,
    })
}

impl CardRepository for SqliteStore {
    fn create_deck(
        &self,
        owner_id: i64,
        name: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<Deck> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO decks (owner_id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![owner_id, name, description, now],
        )?;
        let id = conn.last_insert_rowid();
        info!("Deck '{}' created with id {}", name, id);

        Ok(Deck {
            id,
            owner_id,
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
        })
    }

    fn list_decks(&self, owner_id: i64) -> Result<Vec<Deck>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, name, description, created_at
             FROM decks WHERE owner_id = ?1 ORDER BY name, id",
        )?;
        let decks = stmt
            .query_map(params![owner_id], deck_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(decks)
    }

    fn find_deck(&self, owner_id: i64, deck_id: i64) -> Result<Option<Deck>> {
        let deck = self
            .conn()
            .query_row(
                "SELECT id, owner_id, name, description, created_at
                 FROM decks WHERE id = ?1 AND owner_id = ?2",
                params![deck_id, owner_id],
                deck_from_row,
            )
            .optional()?;
        Ok(deck)
    }

    fn update_deck(
        &self,
        owner_id: i64,
        deck_id: i64,
        name: &str,
        description: &str,
    ) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE decks SET name = ?1, description = ?2 WHERE id = ?3 AND owner_id = ?4",
            params![name, description, deck_id, owner_id],
        )?;
        Ok(changed > 0)
    }

    fn delete_deck(&self, owner_id: i64, deck_id: i64) -> Result<bool> {
        let changed = self.conn().execute(
            "DELETE FROM decks WHERE id = ?1 AND owner_id = ?2",
            params![deck_id, owner_id],
        )?;
        Ok(changed > 0)
    }

    fn create_card(&self, owner_id: i64, card: &NewCard) -> Result<Flashcard> {
        if self.find_deck(owner_id, card.deck_id)?.is_none() {
            return Err(FlashcardError::DeckNotFound(card.deck_id));
        }

        let tags = serde_json::to_string(&card.tags)?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO cards (deck_id, front, back, tags, interval, ease_factor, repetitions, due_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                card.deck_id,
                card.front,
                card.back,
                tags,
                card.schedule.interval,
                card.schedule.ease_factor,
                card.schedule.repetitions,
                card.schedule.due_date
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Card {} added to deck {}", id, card.deck_id);

        Ok(Flashcard {
            id,
            deck_id: card.deck_id,
            front: card.front.clone(),
            back: card.back.clone(),
            tags: card.tags.clone(),
            schedule: card.schedule.clone(),
        })
    }

    fn find_card(&self, owner_id: i64, card_id: i64) -> Result<Option<Flashcard>> {
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards c JOIN decks d ON c.deck_id = d.id
             WHERE c.id = ?1 AND d.owner_id = ?2"
        );
        let card = self
            .conn()
            .query_row(&sql, params![card_id, owner_id], card_from_row)
            .optional()?;
        Ok(card)
    }

    fn update_card_content(
        &self,
        owner_id: i64,
        card_id: i64,
        front: &str,
        back: &str,
        tags: &[String],
    ) -> Result<bool> {
        let tags = serde_json::to_string(tags)?;
        let changed = self.conn().execute(
            "UPDATE cards SET front = ?1, back = ?2, tags = ?3
             WHERE id = ?4 AND deck_id IN (SELECT id FROM decks WHERE owner_id = ?5)",
            params![front, back, tags, card_id, owner_id],
        )?;
        Ok(changed > 0)
    }

    fn delete_card(&self, owner_id: i64, card_id: i64) -> Result<bool> {
        let changed = self.conn().execute(
            "DELETE FROM cards
             WHERE id = ?1 AND deck_id IN (SELECT id FROM decks WHERE owner_id = ?2)",
            params![card_id, owner_id],
        )?;
        Ok(changed > 0)
    }

    fn deck_cards(&self, owner_id: i64, deck_id: i64) -> Result<Vec<Flashcard>> {
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards c JOIN decks d ON c.deck_id = d.id
             WHERE c.deck_id = ?1 AND d.owner_id = ?2 ORDER BY c.id"
        );
        self.query_cards(&sql, params![deck_id, owner_id])
    }

    fn owner_cards(&self, owner_id: i64) -> Result<Vec<Flashcard>> {
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards c JOIN decks d ON c.deck_id = d.id
             WHERE d.owner_id = ?1 ORDER BY c.id"
        );
        self.query_cards(&sql, params![owner_id])
    }

    fn owner_reviews(&self, owner_id: i64) -> Result<Vec<ReviewEvent>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, card_id, user_id, quality, reviewed_at
             FROM reviews WHERE user_id = ?1 ORDER BY reviewed_at, id",
        )?;
        let reviews = stmt
            .query_map(params![owner_id], review_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    fn store_review(
        &self,
        card_id: i64,
        expected: &SchedulingState,
        next: &SchedulingState,
        review: &NewReview,
    ) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE cards
             SET interval = ?1, ease_factor = ?2, repetitions = ?3, due_date = ?4
             WHERE id = ?5 AND interval = ?6 AND ease_factor = ?7 AND repetitions = ?8 AND due_date = ?9",
            params![
                next.interval,
                next.ease_factor,
                next.repetitions,
                next.due_date,
                card_id,
                expected.interval,
                expected.ease_factor,
                expected.repetitions,
                expected.due_date
            ],
        )?;
        if changed == 0 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO reviews (card_id, user_id, quality, reviewed_at) VALUES (?1, ?2, ?3, ?4)",
            params![review.card_id, review.user_id, review.quality.value(), review.reviewed_at],
        )?;
        tx.commit()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 9, 30, 0).unwrap()
    }

    fn store_with_deck() -> (SqliteStore, Deck) {
        let store = SqliteStore::open_in_memory().unwrap();
        let deck = store.create_deck(1, "Polish Vocabulary", "", now()).unwrap();
        (store, deck)
    }

    fn add(store: &SqliteStore, deck: &Deck, front: &str, tags: &[&str]) -> Flashcard {
        let tags = tags.iter().map(|t| t.to_string()).collect();
        store
            .create_card(deck.owner_id, &NewCard::new(deck.id, front, "back", tags, today()))
            .unwrap()
    }

    #[test]
    fn test_create_card_uses_default_schedule() {
        let (store, deck) = store_with_deck();
        let card = add(&store, &deck, "cześć", &["greeting"]);

        let loaded = store.find_card(1, card.id).unwrap().unwrap();
        assert_eq!(loaded, card);
        assert_eq!(loaded.schedule, SchedulingState::new_card(today()));
        assert_eq!(loaded.tags, vec!["greeting".to_string()]);
    }

    #[test]
    fn test_card_lookup_is_owner_scoped() {
        let (store, deck) = store_with_deck();
        let card = add(&store, &deck, "dziękuję", &[]);

        assert!(store.find_card(2, card.id).unwrap().is_none());
        assert!(store.find_card(1, card.id + 100).unwrap().is_none());
        assert!(store.deck_cards(2, deck.id).unwrap().is_empty());
        assert!(!store.delete_card(2, card.id).unwrap());
        assert!(matches!(
            store.create_card(2, &NewCard::new(deck.id, "x", "y", Vec::new(), today())),
            Err(FlashcardError::DeckNotFound(_))
        ));
    }

    #[test]
    fn test_due_date_stored_as_iso_text() {
        let (store, deck) = store_with_deck();
        add(&store, &deck, "proszę", &[]);

        let raw: String = store
            .conn()
            .query_row("SELECT due_date FROM cards", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, "2024-04-02");
    }

    #[test]
    fn test_store_review_compare_and_set() {
        let (store, deck) = store_with_deck();
        let card = add(&store, &deck, "tak", &[]);
        let next = crate::models::sm2::compute_next_state(5, &card.schedule, today()).unwrap();
        let review = NewReview {
            card_id: card.id,
            user_id: 1,
            quality: Quality::new(5).unwrap(),
            reviewed_at: now(),
        };

        assert!(store.store_review(card.id, &card.schedule, &next, &review).unwrap());
        // Stale expectation: nothing written, no second event.
        assert!(!store.store_review(card.id, &card.schedule, &next, &review).unwrap());

        let loaded = store.find_card(1, card.id).unwrap().unwrap();
        assert_eq!(loaded.schedule, next);
        let reviews = store.owner_reviews(1).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].quality.value(), 5);
        assert_eq!(reviews[0].reviewed_at, now());
    }

    #[test]
    fn test_delete_deck_cascades() {
        let (store, deck) = store_with_deck();
        let card = add(&store, &deck, "nie", &[]);
        let next = crate::models::sm2::compute_next_state(3, &card.schedule, today()).unwrap();
        let review = NewReview {
            card_id: card.id,
            user_id: 1,
            quality: Quality::new(3).unwrap(),
            reviewed_at: now(),
        };
        store.store_review(card.id, &card.schedule, &next, &review).unwrap();

        assert!(store.delete_deck(1, deck.id).unwrap());
        assert!(store.find_card(1, card.id).unwrap().is_none());
        assert!(store.owner_reviews(1).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_search() {
        let (store, deck) = store_with_deck();
        let card = add(&store, &deck, "kot", &["animals"]);
        add(&store, &deck, "pies", &["animals", "pets"]);
        add(&store, &deck, "dom", &[]);

        assert!(
            store
                .update_card_content(1, card.id, "Kot", "cat", &["animals".to_string()])
                .unwrap()
        );

        let found = store.search_cards(1, "kot", "").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].back, "cat");
        assert_eq!(store.search_cards(1, "", "pets").unwrap().len(), 1);
        assert_eq!(store.search_cards(1, "", "").unwrap().len(), 3);
        assert_eq!(store.all_tags(1).unwrap(), vec!["animals", "pets"]);
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite3");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_deck(4, "Spanish", "verbs", now()).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let decks = store.list_decks(4).unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].description, "verbs");
        assert_eq!(decks[0].created_at, now());
    }
}
