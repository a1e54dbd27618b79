//! Film Battle: rank films from a Notion database through pairwise battles.
//!
//! Films are placed one at a time by binary insertion, so a full ranking of
//! `n` films takes roughly `n log n` clicks. See [`engine`] for the ranking
//! state machine and [`session`] for how it is driven.

pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod notion;
pub mod render;
pub mod session;
pub mod source;
pub mod sync;
