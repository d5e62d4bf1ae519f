//! Selection of the cards a study session should show.
//!
//! Cards are ordered strictly by how overdue they are. Ease factor and lapse
//! history play no part in the ordering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SchedulingState;

pub const DEFAULT_DUE_LIMIT: usize = 20;

/// Anything that carries a due date can go through [`select_due`].
pub trait HasDueDate {
    fn due_date(&self) -> NaiveDate;
}

impl HasDueDate for SchedulingState {
    fn due_date(&self) -> NaiveDate {
        self.due_date
    }
}

/// Options a caller passes when asking for due cards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueQuery {
    pub limit: Option<usize>,
    /// Return cards regardless of due date ("practice anyway").
    #[serde(default)]
    pub ignore_date: bool,
}

impl DueQuery {
    pub fn limit_or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }
}

/// Returns at most `limit` cards, most overdue first.
///
/// Unless `ignore_date_filter` is set, only cards with `due_date <= today` are
/// kept. Cards sharing a due date stay in input order. An empty result means
/// nothing is due.
pub fn select_due<T: HasDueDate>(
    cards: &[T],
    today: NaiveDate,
    limit: usize,
    ignore_date_filter: bool,
) -> Vec<&T> {
    let mut selected: Vec<&T> = cards
        .iter()
        .filter(|card| ignore_date_filter || card.due_date() <= today)
        .collect();

    // sort_by_key is stable
    selected.sort_by_key(|card| card.due_date());
    selected.truncate(limit);
    selected
}
