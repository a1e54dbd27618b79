//! Boundaries to the external store: where items come from and where ranks go.
//!
//! The session only sees the [`ItemSource`] and [`RankSink`] traits. The Notion
//! client implements both; [`FileSource`] serves a local JSON list for offline
//! sessions and tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Item;

/// Errors from the external store.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: integration token missing or invalid")]
    Unauthorized,

    #[error("Rate limited by the API")]
    RateLimited,

    #[error("Server error: {0}")]
    Server(String),

    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Failed to read items: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid item list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Supplies the eligible items for a new session, already filtered and
/// extracted, in placement order.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<Item>, SourceError>;
}

/// Receives per-item rank writes. Positions are 1-based.
#[async_trait]
pub trait RankSink: Send + Sync {
    async fn set_rank(&self, item_id: &str, position: usize) -> Result<(), SourceError>;
}

/// Items read from a JSON array of `{"id", "title", "image"}` objects.
///
/// The file is re-read on every fetch, so editing it and resetting the
/// session picks up the change.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ItemSource for FileSource {
    async fn fetch_items(&self) -> Result<Vec<Item>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let items: Vec<Item> = serde_json::from_str(&raw)?;
        tracing::info!("Loaded {} films from {}", items.len(), self.path.display());
        Ok(items)
    }
}

/// A fixed list of items, handy for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: Vec<Item>,
}

impl StaticSource {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl ItemSource for StaticSource {
    async fn fetch_items(&self) -> Result<Vec<Item>, SourceError> {
        Ok(self.items.clone())
    }
}
