//! Command handlers behind the CLI.
//! Each handler calls into the review service and prints plain text or JSON.

use crate::OutputFormat;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use flashcards_srs::export::json::{DeckBundle, export_deck_to_path, import_deck};
use flashcards_srs::models::sm2::preview_intervals;
use flashcards_srs::{
    CardRepository, DueQuery, Flashcard, LearningSession, ReviewService, SchedulingState,
    SqliteStore,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::Path;

pub struct App {
    pub service: ReviewService<SqliteStore>,
    pub owner_id: i64,
    pub today: NaiveDate,
    /// Local time on `today`, stamped on new decks and reviews.
    pub now: DateTime<FixedOffset>,
    pub format: OutputFormat,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn schedule_line(state: &SchedulingState) -> String {
    format!(
        "due {}  interval {}d  ease {:.2}  reps {}",
        state.due_date, state.interval, state.ease_factor, state.repetitions
    )
}

fn print_cards(cards: &[Flashcard]) {
    if cards.is_empty() {
        println!("  (no cards)");
    }
    for card in cards {
        let tags = if card.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", card.tags.join(", "))
        };
        println!("  #{} {} -> {}{}", card.id, card.front, card.back, tags);
        println!("      {}", schedule_line(&card.schedule));
    }
}

impl App {
    fn repo(&self) -> &SqliteStore {
        self.service.repository()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }

    pub fn add_deck(&self, name: &str, description: &str) -> Result<()> {
        let deck = self
            .repo()
            .create_deck(self.owner_id, name, description, self.now_utc())?;
        match self.format {
            OutputFormat::Json => print_json(&deck),
            OutputFormat::Plain => {
                println!("Deck '{}' created (id {})", deck.name, deck.id);
                Ok(())
            }
        }
    }

    pub fn list_decks(&self) -> Result<()> {
        let decks = self.repo().list_decks(self.owner_id)?;
        match self.format {
            OutputFormat::Json => print_json(&decks),
            OutputFormat::Plain => {
                if decks.is_empty() {
                    println!("(no decks)");
                }
                for deck in &decks {
                    let cards = self.repo().deck_cards(self.owner_id, deck.id)?;
                    let due = cards.iter().filter(|c| c.schedule.is_due(self.today)).count();
                    println!(
                        "#{} {} ({} cards, {} due)",
                        deck.id,
                        deck.name,
                        cards.len(),
                        due
                    );
                }
                Ok(())
            }
        }
    }

    pub fn show_deck(&self, deck_id: i64) -> Result<()> {
        let Some(deck) = self.repo().find_deck(self.owner_id, deck_id)? else {
            bail!("Deck {} not found", deck_id);
        };
        let cards = self.repo().deck_cards(self.owner_id, deck_id)?;
        match self.format {
            OutputFormat::Json => print_json(&DeckBundle::from_deck(&deck, &cards)),
            OutputFormat::Plain => {
                println!("#{} {}", deck.id, deck.name);
                if !deck.description.is_empty() {
                    println!("  {}", deck.description);
                }
                print_cards(&cards);
                Ok(())
            }
        }
    }

    pub fn rename_deck(&self, deck_id: i64, name: &str, description: &str) -> Result<()> {
        if !self
            .repo()
            .update_deck(self.owner_id, deck_id, name, description)?
        {
            bail!("Deck {} not found", deck_id);
        }
        println!("Deck {} updated", deck_id);
        Ok(())
    }

    pub fn delete_deck(&self, deck_id: i64) -> Result<()> {
        if !self.repo().delete_deck(self.owner_id, deck_id)? {
            bail!("Deck {} not found", deck_id);
        }
        println!("Deck {} deleted", deck_id);
        Ok(())
    }

    pub fn add_card(&self, deck_id: i64, front: &str, back: &str, tags: Vec<String>) -> Result<()> {
        let card = self
            .service
            .add_card(self.owner_id, deck_id, front, back, tags, self.today)?;
        match self.format {
            OutputFormat::Json => print_json(&card),
            OutputFormat::Plain => {
                println!("Card #{} added, due {}", card.id, card.schedule.due_date);
                Ok(())
            }
        }
    }

    pub fn show_card(&self, card_id: i64) -> Result<()> {
        let Some(card) = self.repo().find_card(self.owner_id, card_id)? else {
            bail!("Card {} not found", card_id);
        };
        match self.format {
            OutputFormat::Json => print_json(&card),
            OutputFormat::Plain => {
                print_cards(std::slice::from_ref(&card));
                let previews = preview_intervals(&card.schedule, self.today);
                let previews: Vec<String> = previews
                    .iter()
                    .enumerate()
                    .map(|(q, days)| format!("{}:{}d", q, days))
                    .collect();
                println!("      next interval by grade  {}", previews.join("  "));
                Ok(())
            }
        }
    }

    pub fn edit_card(&self, card_id: i64, front: &str, back: &str, tags: &[String]) -> Result<()> {
        if !self
            .repo()
            .update_card_content(self.owner_id, card_id, front, back, tags)?
        {
            bail!("Card {} not found", card_id);
        }
        println!("Card {} updated", card_id);
        Ok(())
    }

    pub fn delete_card(&self, card_id: i64) -> Result<()> {
        if !self.repo().delete_card(self.owner_id, card_id)? {
            bail!("Card {} not found", card_id);
        }
        println!("Card {} deleted", card_id);
        Ok(())
    }

    pub fn review(&self, card_id: i64, quality: i32) -> Result<()> {
        let next = self
            .service
            .submit_review(self.owner_id, card_id, quality, self.today, self.now_utc())?;
        match self.format {
            OutputFormat::Json => print_json(&next),
            OutputFormat::Plain => {
                println!("Card #{}: {}", card_id, schedule_line(&next));
                Ok(())
            }
        }
    }

    fn due_cards(
        &self,
        deck_id: i64,
        limit: Option<usize>,
        ignore_date: bool,
    ) -> Result<Vec<Flashcard>> {
        let query = DueQuery { limit, ignore_date };
        Ok(self
            .service
            .due_cards(self.owner_id, deck_id, query, self.today)?)
    }

    pub fn due(&self, deck_id: i64, limit: Option<usize>, ignore_date: bool) -> Result<()> {
        let cards = self.due_cards(deck_id, limit, ignore_date)?;
        match self.format {
            OutputFormat::Json => print_json(&cards),
            OutputFormat::Plain => {
                if cards.is_empty() {
                    println!("Nothing due - study complete for {}", self.today);
                } else {
                    print_cards(&cards);
                }
                Ok(())
            }
        }
    }

    /// Runs an interactive session on stdin/stdout until every card passes
    /// or the user quits with `q`.
    pub fn study(&self, deck_id: i64, limit: Option<usize>, ignore_date: bool) -> Result<()> {
        let cards = self.due_cards(deck_id, limit, ignore_date)?;
        let mut session = LearningSession::new_from_due_cards(deck_id, cards);
        if session.is_completed() {
            println!("Nothing due - study complete for {}", self.today);
            return Ok(());
        }

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        let mut round = 0;

        while !session.is_completed() {
            if session.round_number != round {
                round = session.round_number;
                println!("\n== {} ==", session.phase_message());
            }
            let Some(current) = session.current_card() else {
                break;
            };
            println!("\n{}", current.card.front);
            print!("(enter to reveal) ");
            io::stdout().flush()?;
            if lines.next().transpose()?.is_none() {
                break;
            }

            session.reveal();
            if let Some(current) = session.current_card() {
                println!("{}", current.card.back);
            }

            loop {
                print!("grade 0-5 (q to quit): ");
                io::stdout().flush()?;
                let Some(line) = lines.next().transpose()? else {
                    return Ok(());
                };
                let line = line.trim();
                if line == "q" {
                    return Ok(());
                }
                let Ok(quality) = line.parse::<i32>() else {
                    continue;
                };
                let graded = session.grade_current_card(
                    &self.service,
                    self.owner_id,
                    quality,
                    self.today,
                    self.now_utc(),
                );
                match graded {
                    Ok(Some(next)) => {
                        println!("  {}", schedule_line(&next));
                        break;
                    }
                    Ok(None) => break,
                    Err(flashcards_srs::FlashcardError::InvalidRating(_)) => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            session.next_card();
        }

        println!("\nSession complete.");
        Ok(())
    }

    pub fn search(&self, query: &str, tag: &str) -> Result<()> {
        let cards = self.repo().search_cards(self.owner_id, query, tag)?;
        match self.format {
            OutputFormat::Json => print_json(&cards),
            OutputFormat::Plain => {
                print_cards(&cards);
                Ok(())
            }
        }
    }

    pub fn tags(&self) -> Result<()> {
        let tags = self.repo().all_tags(self.owner_id)?;
        match self.format {
            OutputFormat::Json => print_json(&tags),
            OutputFormat::Plain => {
                for tag in &tags {
                    println!("{}", tag);
                }
                Ok(())
            }
        }
    }

    pub fn stats(&self) -> Result<()> {
        let stats = self.service.stats(self.owner_id, self.today, self.now)?;
        match self.format {
            OutputFormat::Json => print_json(&stats),
            OutputFormat::Plain => {
                println!("Decks:              {}", stats.total_decks);
                println!("Cards:              {}", stats.total_cards);
                println!("Due today:          {}", stats.due_today);
                println!("Reviews (7 days):   {}", stats.reviews_last_week);
                println!("Average quality:    {:.2}/5", stats.average_quality);
                println!("Mastered:           {:.0}%", stats.mastery_rate * 100.0);
                println!("Streak:             {} days", stats.current_streak);
                Ok(())
            }
        }
    }

    pub fn export(&self, deck_id: i64, path: &Path) -> Result<()> {
        let Some(deck) = self.repo().find_deck(self.owner_id, deck_id)? else {
            bail!("Deck {} not found", deck_id);
        };
        let cards = self.repo().deck_cards(self.owner_id, deck_id)?;
        export_deck_to_path(&DeckBundle::from_deck(&deck, &cards), path)
            .with_context(|| format!("Failed to export deck to {}", path.display()))?;
        println!("Deck '{}' exported to {}", deck.name, path.display());
        Ok(())
    }

    pub fn import(&self, path: &Path) -> Result<()> {
        let deck = import_deck(self.repo(), self.owner_id, path, self.today, self.now_utc())
            .with_context(|| format!("Failed to import {}", path.display()))?;
        println!("Deck '{}' imported (id {})", deck.name, deck.id);
        Ok(())
    }
}
