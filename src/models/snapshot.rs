use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::EngineState;

/// A persisted battle session.
///
/// Only one snapshot is live at a time. Resetting a session deletes it, and the
/// next session gets a fresh id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub state: EngineState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One attempted rank write-back, kept for the debug panel and `leaderboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankWrite {
    pub session_id: Uuid,
    pub item_id: String,
    /// 1-based leaderboard position that was sent.
    pub position: usize,
    pub succeeded: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
