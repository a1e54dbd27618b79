use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Item;

/// Where a battle session currently stands.
///
/// - `Empty`: the source returned no eligible items, nothing to rank
/// - `Unavailable`: the source could not be reached; `SessionView::error` says why
/// - `Trivial`: exactly one eligible item, ranked without any battles
/// - `Awaiting`: a comparison is waiting for the user's pick
/// - `Done`: every item has been placed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Empty,
    Unavailable,
    Trivial,
    Awaiting,
    Done,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Unavailable => "unavailable",
            Self::Trivial => "trivial",
            Self::Awaiting => "awaiting",
            Self::Done => "done",
        }
    }
}

/// A pending battle: the challenger being placed against the current pivot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub challenger: Item,
    pub pivot: Item,
}

/// A leaderboard row. Positions are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub item: Item,
}

/// How far along a session is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    /// Items in the ranked sequence.
    pub ranked: usize,
    /// Items still waiting, including the one currently being placed.
    pub remaining: usize,
    /// Comparisons resolved so far in this session.
    pub comparisons: usize,
}

/// Everything a presentation surface needs to draw a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Option<Uuid>,
    pub status: SessionStatus,
    pub matchup: Option<Matchup>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub progress: Progress,
    /// Source error message when `status` is `Unavailable`.
    pub error: Option<String>,
}

/// Body of `POST /api/v1/session/choice`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceInput {
    /// `true` when the challenger beat the pivot.
    pub challenger_won: bool,
}
