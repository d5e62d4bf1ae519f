mod app;

use anyhow::{Context, Result};
use app::App;
use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use clap::{Parser, Subcommand};
use flashcards_srs::{Config, ReviewService, SqliteStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flashcards", about = "Spaced-repetition flashcards (SM-2)", version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Owner of decks and reviews
    #[arg(long, global = true, default_value = "1")]
    user: i64,

    /// Review day as YYYY-MM-DD (default: local date)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Manage decks
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Manage cards
    #[command(subcommand)]
    Card(CardCommand),

    /// Grade a card (0 = blackout .. 5 = perfect)
    Review {
        card: i64,
        #[arg(allow_negative_numbers = true)]
        quality: i32,
    },

    /// List cards due for study
    Due {
        deck: i64,
        /// Maximum cards (default from config)
        #[arg(long)]
        limit: Option<usize>,
        /// Include cards that are not due yet
        #[arg(long)]
        ignore_date: bool,
    },

    /// Interactive study session over the due cards
    Study {
        deck: i64,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        ignore_date: bool,
    },

    /// Search cards by text and tag
    Search {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value = "")]
        tag: String,
    },

    /// List all tags
    Tags,

    /// Study statistics
    Stats,

    /// Export a deck to JSON
    Export { deck: i64, path: PathBuf },

    /// Import a deck from JSON
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum DeckCommand {
    /// Create a deck
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List decks
    List,
    /// Show a deck with its cards
    Show { deck: i64 },
    /// Rename a deck
    Rename {
        deck: i64,
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a deck, its cards and their history
    Delete { deck: i64 },
}

#[derive(Subcommand)]
enum CardCommand {
    /// Add a card to a deck
    Add {
        deck: i64,
        front: String,
        back: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Show a card with its schedule
    Show { card: i64 },
    /// Replace a card's text and tags
    Edit {
        card: i64,
        front: String,
        back: String,
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a card
    Delete { card: i64 },
}

fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Moves the local wall clock onto `today`, keeping time of day and offset.
fn clock_on(today: NaiveDate, local_now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    if today == local_now.date_naive() {
        return local_now;
    }
    today
        .and_time(local_now.time())
        .and_local_timezone(*local_now.offset())
        .single()
        .unwrap_or(local_now)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    let local_now = Local::now().fixed_offset();
    let today = cli.today.unwrap_or_else(|| local_now.date_naive());
    let app = App {
        service: ReviewService::with_config(store, &config),
        owner_id: cli.user,
        today,
        now: clock_on(today, local_now),
        format: cli.format,
    };

    match cli.command {
        Command::Deck(cmd) => match cmd {
            DeckCommand::Add { name, description } => app.add_deck(&name, &description),
            DeckCommand::List => app.list_decks(),
            DeckCommand::Show { deck } => app.show_deck(deck),
            DeckCommand::Rename {
                deck,
                name,
                description,
            } => app.rename_deck(deck, &name, &description),
            DeckCommand::Delete { deck } => app.delete_deck(deck),
        },
        Command::Card(cmd) => match cmd {
            CardCommand::Add {
                deck,
                front,
                back,
                tags,
            } => app.add_card(deck, &front, &back, parse_tags(tags)),
            CardCommand::Show { card } => app.show_card(card),
            CardCommand::Edit {
                card,
                front,
                back,
                tags,
            } => app.edit_card(card, &front, &back, &parse_tags(tags)),
            CardCommand::Delete { card } => app.delete_card(card),
        },
        Command::Review { card, quality } => app.review(card, quality),
        Command::Due {
            deck,
            limit,
            ignore_date,
        } => app.due(deck, limit, ignore_date),
        Command::Study {
            deck,
            limit,
            ignore_date,
        } => app.study(deck, limit, ignore_date),
        Command::Search { query, tag } => app.search(&query, &tag),
        Command::Tags => app.tags(),
        Command::Stats => app.stats(),
        Command::Export { deck, path } => app.export(deck, &path),
        Command::Import { path } => app.import(&path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(Some("a, b,,c ".to_string())), vec!["a", "b", "c"]);
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn test_cli_parses_review_and_today() {
        let cli = Cli::try_parse_from([
            "flashcards",
            "--today",
            "2024-03-01",
            "review",
            "7",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(matches!(cli.command, Command::Review { card: 7, quality: 4 }));
    }

    #[test]
    fn test_cli_due_flags() {
        let cli =
            Cli::try_parse_from(["flashcards", "due", "3", "--limit", "5", "--ignore-date"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Due {
                deck: 3,
                limit: Some(5),
                ignore_date: true
            }
        ));
    }

    #[test]
    fn test_clock_follows_today_override() {
        use chrono::TimeZone;

        let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
        let wall = pacific.with_ymd_and_hms(2024, 6, 20, 21, 15, 0).unwrap();
        assert_eq!(clock_on(wall.date_naive(), wall), wall);

        let simulated = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let moved = clock_on(simulated, wall);
        assert_eq!(moved.date_naive(), simulated);
        assert_eq!(moved.time(), wall.time());
        assert_eq!(moved.offset(), wall.offset());
    }
}
