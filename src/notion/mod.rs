//! Notion as the source of films and the sink for ranks.

mod client;
pub mod extract;

pub use client::NotionClient;
