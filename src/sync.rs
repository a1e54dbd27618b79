//! Writing the current leaderboard back to the rank sink.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{Item, RankWrite};
use crate::source::RankSink;

/// Outcome of one write-back pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub written: usize,
    pub failed: usize,
    /// Every attempted write, in leaderboard order.
    pub writes: Vec<RankWrite>,
}

/// Send `(item_id, position)` for every ranked item, 1-based.
///
/// Failures are logged and counted; the pass always runs to the end.
pub async fn push_ranks(sink: &dyn RankSink, session_id: Uuid, ranked: &[Item]) -> SyncReport {
    let mut report = SyncReport::default();

    for (index, item) in ranked.iter().enumerate() {
        let position = index + 1;
        let result = sink.set_rank(&item.id, position).await;

        let error = match result {
            Ok(()) => {
                report.written += 1;
                None
            }
            Err(e) => {
                tracing::warn!("Failed to sync rank {} for {}: {}", position, item.title, e);
                report.failed += 1;
                Some(e.to_string())
            }
        };

        report.writes.push(RankWrite {
            session_id,
            item_id: item.id.clone(),
            position,
            succeeded: error.is_none(),
            error,
            created_at: Utc::now(),
        });
    }

    tracing::debug!(
        "Rank sync: {} written, {} failed",
        report.written,
        report.failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FlakySink {
        fail_on: Option<String>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl RankSink for FlakySink {
        async fn set_rank(&self, item_id: &str, position: usize) -> Result<(), SourceError> {
            self.calls.lock().unwrap().push((item_id.to_string(), position));
            if self.fail_on.as_deref() == Some(item_id) {
                return Err(SourceError::Server("boom".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn positions_are_one_based_in_order() {
        let sink = FlakySink::default();
        let ranked = vec![Item::new("b", "B"), Item::new("a", "A")];

        let report = push_ranks(&sink, Uuid::new_v4(), &ranked).await;

        assert_eq!(report.written, 2);
        assert_eq!(report.failed, 0);
        let calls = sink.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("b".to_string(), 1), ("a".to_string(), 2)]);
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_pass() {
        let sink = FlakySink {
            fail_on: Some("a".to_string()),
            ..Default::default()
        };
        let ranked = vec![Item::new("a", "A"), Item::new("b", "B"), Item::new("c", "C")];

        let report = push_ranks(&sink, Uuid::new_v4(), &ranked).await;

        assert_eq!(report.written, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(sink.calls.lock().unwrap().len(), 3);
        assert!(!report.writes[0].succeeded);
        assert!(report.writes[0].error.as_deref().unwrap().contains("boom"));
    }
}
