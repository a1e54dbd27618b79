use chrono::Utc;
use film_battle::db::Database;
use film_battle::engine::EngineState;
use film_battle::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn new_snapshot(titles: &[&str]) -> Snapshot {
    let items = titles.iter().map(|t| Item::new(*t, *t)).collect();
    let now = Utc::now();
    Snapshot {
        id: Uuid::new_v4(),
        state: EngineState::start(items).expect("Failed to start engine"),
        created_at: now,
        updated_at: now,
    }
}

fn rank_write(session_id: Uuid, item_id: &str, position: usize, error: Option<&str>) -> RankWrite {
    RankWrite {
        session_id,
        item_id: item_id.to_string(),
        position,
        succeeded: error.is_none(),
        error: error.map(str::to_string),
        created_at: Utc::now(),
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "snapshots" {
        describe "load_latest" {
            it "returns None when nothing was saved" {
                assert!(db.load_latest().expect("Query failed").is_none());
            }

            it "returns the saved engine state" {
                let mut snapshot = new_snapshot(&["A", "B", "C"]);
                snapshot.state.resolve(true);
                db.save_snapshot(&mut snapshot).expect("Failed to save");

                let loaded = db.load_latest().expect("Query failed").expect("Missing snapshot");
                assert_eq!(loaded.id, snapshot.id);
                assert_eq!(loaded.state, snapshot.state);
                assert_eq!(loaded.state.comparisons(), 1);
            }
        }

        describe "save_snapshot" {
            it "updates an existing snapshot in place" {
                let mut snapshot = new_snapshot(&["A", "B"]);
                db.save_snapshot(&mut snapshot).expect("Failed to save");
                let first_update = snapshot.updated_at;

                snapshot.state.resolve(false);
                db.save_snapshot(&mut snapshot).expect("Failed to save again");

                let loaded = db.load_latest().expect("Query failed").expect("Missing snapshot");
                assert!(loaded.state.is_done());
                assert!(snapshot.updated_at >= first_update);
                assert_eq!(db.clear_snapshots().expect("Failed to clear"), 1);
            }
        }

        describe "delete_snapshot" {
            it "removes the snapshot and its rank writes" {
                let mut snapshot = new_snapshot(&["A", "B"]);
                db.save_snapshot(&mut snapshot).expect("Failed to save");
                db.record_rank_writes(&[rank_write(snapshot.id, "A", 1, None)])
                    .expect("Failed to record");

                assert!(db.delete_snapshot(snapshot.id).expect("Delete failed"));
                assert!(db.load_latest().expect("Query failed").is_none());
                assert!(db.get_rank_writes(snapshot.id).expect("Query failed").is_empty());
            }

            it "returns false for an unknown id" {
                assert!(!db.delete_snapshot(Uuid::new_v4()).expect("Delete failed"));
            }
        }
    }

    describe "rank_writes" {
        it "returns writes in insertion order with their outcome" {
            let mut snapshot = new_snapshot(&["A", "B"]);
            db.save_snapshot(&mut snapshot).expect("Failed to save");

            db.record_rank_writes(&[
                rank_write(snapshot.id, "B", 1, None),
                rank_write(snapshot.id, "A", 2, Some("Server error: 502")),
            ])
            .expect("Failed to record");

            let writes = db.get_rank_writes(snapshot.id).expect("Query failed");
            assert_eq!(writes.len(), 2);
            assert_eq!(writes[0].item_id, "B");
            assert_eq!(writes[0].position, 1);
            assert!(writes[0].succeeded);
            assert!(!writes[1].succeeded);
            assert_eq!(writes[1].error.as_deref(), Some("Server error: 502"));
        }
    }

    describe "on disk" {
        it "keeps snapshots across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("battle.db");

            let mut snapshot = new_snapshot(&["A", "B", "C"]);
            {
                let disk = Database::open(path.clone()).expect("Failed to open");
                disk.migrate().expect("Failed to migrate");
                disk.save_snapshot(&mut snapshot).expect("Failed to save");
            }

            let reopened = Database::open(path).expect("Failed to reopen");
            reopened.migrate().expect("Failed to migrate");
            let loaded = reopened.load_latest().expect("Query failed").expect("Missing snapshot");
            assert_eq!(loaded.state, snapshot.state);
        }
    }
}
