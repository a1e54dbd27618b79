//! Plain-text rendering for the terminal.

use crate::models::{LeaderboardEntry, Matchup, SessionStatus, SessionView};

const MEDALS: [char; 3] = ['🥇', '🥈', '🥉'];

/// Render a leaderboard as numbered lines, medals for the podium.
///
/// Example output:
/// ```text
/// 🥇  1. Heat
/// 🥈  2. Ran
/// 🥉  3. Alien
///     4. Tenet
/// ```
pub fn render_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let width = entries.len().to_string().len();
    let mut output = String::new();
    for entry in entries {
        let marker = MEDALS
            .get(entry.position - 1)
            .map(|m| m.to_string())
            .unwrap_or_else(|| " ".to_string());
        output.push_str(&format!(
            "{} {:>width$}. {}\n",
            marker,
            entry.position,
            entry.item.title,
            width = width + 1
        ));
    }
    output
}

/// The two choices of a matchup, as shown by `battle play`.
pub fn render_matchup(matchup: &Matchup) -> String {
    format!(
        "  [1] {}\n  [2] {}\n",
        matchup.challenger.title, matchup.pivot.title
    )
}

/// One-line summary of where a session stands.
pub fn render_status(view: &SessionView) -> String {
    match view.status {
        SessionStatus::Empty => "Not enough films to run battles!".to_string(),
        SessionStatus::Unavailable => format!(
            "Could not load films: {}",
            view.error.as_deref().unwrap_or("unknown error")
        ),
        SessionStatus::Trivial => "Only one eligible film, nothing to battle.".to_string(),
        SessionStatus::Done => format!(
            "All {} films ranked in {} battles.",
            view.progress.ranked, view.progress.comparisons
        ),
        SessionStatus::Awaiting => format!(
            "{} ranked, {} to go, {} battles so far",
            view.progress.ranked, view.progress.remaining, view.progress.comparisons
        ),
    }
}
