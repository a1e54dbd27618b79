//! HTTP client for the Notion REST API.
//!
//! Configuration comes from [`Config`]:
//! - `NOTION_TOKEN` - integration token
//! - `NOTION_DATABASE_ID` - database holding the films
//! - `NOTION_API_URL` - base URL (default: `https://api.notion.com/v1`)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::extract;
use crate::config::{Config, FieldNames};
use crate::models::Item;
use crate::source::{ItemSource, RankSink, SourceError};

/// API version sent with every request.
const NOTION_VERSION: &str = "2022-06-28";

/// Largest page size the query endpoint accepts.
const PAGE_SIZE: u32 = 100;

/// One page of `POST /databases/{id}/query` results.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

/// HTTP client for a single Notion database.
#[derive(Debug, Clone)]
pub struct NotionClient {
    base_url: String,
    token: String,
    database_id: String,
    fields: FieldNames,
    client: Client,
}

impl NotionClient {
    /// Create client from configuration. Fails when credentials are missing.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let token = config
            .notion_token
            .clone()
            .ok_or(SourceError::NotConfigured("NOTION_TOKEN is not set"))?;
        let database_id = config
            .database_id
            .clone()
            .ok_or(SourceError::NotConfigured("NOTION_DATABASE_ID is not set"))?;
        Ok(Self::new(&config.notion_url, token, database_id, config.fields.clone()))
    }

    /// Create with explicit configuration.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        database_id: impl Into<String>,
        fields: FieldNames,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            database_id: database_id.into(),
            fields,
            client: Client::new(),
        }
    }

    /// Build a request with auth and version headers.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Handle response, converting HTTP errors to SourceError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, SourceError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(SourceError::NotFound(body)),
                StatusCode::BAD_REQUEST => Err(SourceError::BadRequest(body)),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::Unauthorized),
                StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited),
                _ => Err(SourceError::Server(format!("{}: {}", status, body))),
            }
        }
    }

    /// Fetch every page of the database, following pagination cursors.
    pub async fn query_all(&self) -> Result<Vec<Value>, SourceError> {
        let path = format!("/databases/{}/query", self.database_id);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": PAGE_SIZE });
            if let Some(ref c) = cursor {
                body["start_cursor"] = json!(c);
            }

            let response = self
                .request(reqwest::Method::POST, &path)
                .json(&body)
                .send()
                .await?;
            let batch: QueryResponse = self.handle_response(response).await?;
            tracing::debug!("Fetched {} pages (has_more: {})", batch.results.len(), batch.has_more);
            pages.extend(batch.results);

            match batch.next_cursor {
                Some(next) if batch.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(pages)
    }

    /// Set the rank number property on one page.
    pub async fn update_rank(&self, page_id: &str, position: usize) -> Result<(), SourceError> {
        let mut properties = serde_json::Map::new();
        properties.insert(self.fields.rank.clone(), json!({ "number": position }));
        let body = json!({ "properties": properties });
        let response = self
            .request(reqwest::Method::PATCH, &format!("/pages/{}", page_id))
            .json(&body)
            .send()
            .await?;
        let _: Value = self.handle_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ItemSource for NotionClient {
    async fn fetch_items(&self) -> Result<Vec<Item>, SourceError> {
        let pages = self.query_all().await?;
        let items = extract::extract_items(&pages, &self.fields);
        tracing::info!(
            "Loaded {} battle eligible films out of {} pages",
            items.len(),
            pages.len()
        );
        Ok(items)
    }
}

#[async_trait]
impl RankSink for NotionClient {
    async fn set_rank(&self, item_id: &str, position: usize) -> Result<(), SourceError> {
        self.update_rank(item_id, position).await
    }
}
