mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::models::*;

/// Local SQLite store for session snapshots.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "film-battle")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("film-battle.db");
        Self::open(db_path)
    }

    /// Open `path` when given, otherwise the platform data directory.
    pub fn open_configured(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Self::open_default(),
        }
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Session snapshots
    // ============================================================

    /// The most recently updated snapshot, if any.
    pub fn load_latest(&self) -> Result<Option<Snapshot>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let row = conn
            .query_row(
                "SELECT id, state, created_at, updated_at
                 FROM sessions ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, state, created_at, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(Snapshot {
            id: parse_uuid(id),
            state: serde_json::from_str(&state)?,
            created_at: parse_datetime(created_at),
            updated_at: parse_datetime(updated_at),
        }))
    }

    /// Insert or replace a snapshot. `updated_at` is refreshed.
    pub fn save_snapshot(&self, snapshot: &mut Snapshot) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        snapshot.updated_at = Utc::now();
        let state = serde_json::to_string(&snapshot.state)?;

        conn.execute(
            "INSERT INTO sessions (id, state, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            (
                snapshot.id.to_string(),
                &state,
                snapshot.created_at.to_rfc3339(),
                snapshot.updated_at.to_rfc3339(),
            ),
        )?;
        Ok(())
    }

    pub fn delete_snapshot(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "DELETE FROM rank_writes WHERE session_id = ?",
            [id.to_string()],
        )?;
        let rows = conn.execute("DELETE FROM sessions WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Delete every snapshot. Returns how many were removed.
    pub fn clear_snapshots(&self) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute("DELETE FROM rank_writes", [])?;
        let rows = conn.execute("DELETE FROM sessions", [])?;
        Ok(rows)
    }

    // ============================================================
    // Rank write log
    // ============================================================

    pub fn record_rank_writes(&self, writes: &[RankWrite]) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rank_writes (session_id, item_id, position, succeeded, error, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?;
            for write in writes {
                stmt.execute((
                    write.session_id.to_string(),
                    &write.item_id,
                    write.position as i64,
                    write.succeeded,
                    &write.error,
                    write.created_at.to_rfc3339(),
                ))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Rank writes for a session, oldest first.
    pub fn get_rank_writes(&self, session_id: Uuid) -> Result<Vec<RankWrite>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT session_id, item_id, position, succeeded, error, created_at
             FROM rank_writes WHERE session_id = ? ORDER BY id",
        )?;

        let writes = stmt
            .query_map([session_id.to_string()], |row| {
                Ok(RankWrite {
                    session_id: parse_uuid(row.get::<_, String>(0)?),
                    item_id: row.get(1)?,
                    position: row.get::<_, i64>(2)? as usize,
                    succeeded: row.get(3)?,
                    error: row.get(4)?,
                    created_at: parse_datetime(row.get::<_, String>(5)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(writes)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
