//! A battle session: one ranking engine with an explicit create/reset lifecycle.
//!
//! The session ties the engine to its collaborators. It pulls items from the
//! [`ItemSource`] when it starts or resets, pushes ranks to the optional
//! [`RankSink`] after every placement, and saves a [`Snapshot`] after every
//! transition so the ranking survives a restart.
//!
//! Persistence and write-back failures are logged and never interrupt the
//! session: the in-memory engine state is always the source of truth.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::Database;
use crate::engine::{EngineState, Step};
use crate::models::*;
use crate::source::{ItemSource, RankSink};
use crate::sync::{push_ranks, SyncReport};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active ranking session")]
    NoActiveSession,
}

/// What the session currently holds.
#[derive(Debug, Clone)]
enum Phase {
    /// Not loaded yet, or the source returned no eligible items.
    Empty,
    /// The source failed; the message is shown to the user.
    Unavailable(String),
    Active(Snapshot),
}

pub struct BattleSession {
    source: Arc<dyn ItemSource>,
    sink: Option<Arc<dyn RankSink>>,
    store: Option<Database>,
    phase: Phase,
    last_sync: Option<SyncReport>,
}

impl BattleSession {
    pub fn new(source: Arc<dyn ItemSource>) -> Self {
        Self {
            source,
            sink: None,
            store: None,
            phase: Phase::Empty,
            last_sync: None,
        }
    }

    /// Write ranks back after every placement.
    pub fn with_sink(mut self, sink: Arc<dyn RankSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Persist snapshots to `store` and resume from it on load.
    pub fn with_store(mut self, store: Database) -> Self {
        self.store = Some(store);
        self
    }

    /// Resume the stored snapshot if there is one, otherwise start fresh
    /// from the source.
    pub async fn load(&mut self) {
        if let Some(mut snapshot) = self.stored_snapshot() {
            snapshot.state.tick();
            tracing::info!(
                "Resuming session {} ({} ranked, {} remaining)",
                snapshot.id,
                snapshot.state.ranked_order().len(),
                snapshot.state.remaining()
            );
            self.phase = Phase::Active(snapshot);
            return;
        }
        self.start_fresh().await;
    }

    /// Discard all session state and query the source again.
    pub async fn reset(&mut self) {
        if let Phase::Active(snapshot) = &self.phase {
            tracing::info!("Resetting session {}", snapshot.id);
            if let Some(store) = &self.store {
                if let Err(e) = store.delete_snapshot(snapshot.id) {
                    tracing::warn!("Failed to delete snapshot {}: {}", snapshot.id, e);
                }
            }
        }
        self.phase = Phase::Empty;
        self.last_sync = None;
        self.start_fresh().await;
    }

    /// Record the user's pick for the outstanding comparison.
    pub async fn choose(&mut self, challenger_won: bool) -> Result<Step, SessionError> {
        let Phase::Active(snapshot) = &mut self.phase else {
            return Err(SessionError::NoActiveSession);
        };

        let mut placed: Option<Vec<Item>> = None;
        let step = snapshot
            .state
            .resolve_with(challenger_won, |ranked| placed = Some(ranked.to_vec()));

        match step {
            Step::Idle => {
                tracing::debug!("Choice ignored: no comparison outstanding");
                return Ok(step);
            }
            Step::Narrowed => tracing::debug!("Search narrowed"),
            Step::Placed { index } => tracing::info!(
                "Placed at position {} ({} remaining)",
                index + 1,
                snapshot.state.remaining()
            ),
        }

        let session_id = snapshot.id;
        Self::persist(self.store.as_ref(), snapshot);

        if let (Some(ranked), Some(sink)) = (placed, &self.sink) {
            let report = push_ranks(sink.as_ref(), session_id, &ranked).await;
            if let Some(store) = &self.store {
                if let Err(e) = store.record_rank_writes(&report.writes) {
                    tracing::warn!("Failed to record rank writes: {}", e);
                }
            }
            self.last_sync = Some(report);
        }

        Ok(step)
    }

    pub fn engine(&self) -> Option<&EngineState> {
        match &self.phase {
            Phase::Active(snapshot) => Some(&snapshot.state),
            _ => None,
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match &self.phase {
            Phase::Active(snapshot) => Some(snapshot.id),
            _ => None,
        }
    }

    /// Report from the most recent rank write-back, if any ran.
    pub fn last_sync(&self) -> Option<&SyncReport> {
        self.last_sync.as_ref()
    }

    pub fn view(&self) -> SessionView {
        match &self.phase {
            Phase::Empty => SessionView {
                session_id: None,
                status: SessionStatus::Empty,
                matchup: None,
                leaderboard: Vec::new(),
                progress: Progress::default(),
                error: None,
            },
            Phase::Unavailable(message) => SessionView {
                session_id: None,
                status: SessionStatus::Unavailable,
                matchup: None,
                leaderboard: Vec::new(),
                progress: Progress::default(),
                error: Some(message.clone()),
            },
            Phase::Active(snapshot) => {
                let state = &snapshot.state;
                let status = if state.is_trivial() {
                    SessionStatus::Trivial
                } else if state.is_done() {
                    SessionStatus::Done
                } else {
                    SessionStatus::Awaiting
                };

                SessionView {
                    session_id: Some(snapshot.id),
                    status,
                    matchup: state.current_comparison().map(|c| Matchup {
                        challenger: c.challenger.clone(),
                        pivot: c.pivot.clone(),
                    }),
                    leaderboard: leaderboard(state.ranked_order()),
                    progress: Progress {
                        ranked: state.ranked_order().len(),
                        remaining: state.remaining(),
                        comparisons: state.comparisons(),
                    },
                    error: None,
                }
            }
        }
    }

    async fn start_fresh(&mut self) {
        let items = match self.source.fetch_items().await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Failed to load films: {}", e);
                self.phase = Phase::Unavailable(e.to_string());
                return;
            }
        };

        let state = match EngineState::start(items) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Cannot start session: {}", e);
                self.phase = Phase::Empty;
                return;
            }
        };

        let now = Utc::now();
        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            state,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(
            "Started session {} with {} films",
            snapshot.id,
            snapshot.state.ranked_order().len() + snapshot.state.remaining()
        );
        self.phase = Phase::Active(snapshot);
        if let Phase::Active(snapshot) = &mut self.phase {
            Self::persist(self.store.as_ref(), snapshot);
        }
    }

    fn stored_snapshot(&self) -> Option<Snapshot> {
        let store = self.store.as_ref()?;
        match store.load_latest() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Ignoring unreadable snapshot: {}", e);
                None
            }
        }
    }

    fn persist(store: Option<&Database>, snapshot: &mut Snapshot) {
        if let Some(store) = store {
            if let Err(e) = store.save_snapshot(snapshot) {
                tracing::warn!("Failed to save snapshot {}: {}", snapshot.id, e);
            }
        }
    }
}

/// 1-based leaderboard rows for a ranked sequence.
pub fn leaderboard(ranked: &[Item]) -> Vec<LeaderboardEntry> {
    ranked
        .iter()
        .enumerate()
        .map(|(index, item)| LeaderboardEntry {
            position: index + 1,
            item: item.clone(),
        })
        .collect()
}
