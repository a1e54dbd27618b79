//! Domain models for Film Battle.
//!
//! # Core Concepts
//!
//! - [`Item`]: A film pulled from the external database. Immutable once loaded;
//!   ranking only ever moves items between sequences.
//! - [`Snapshot`]: The persisted form of a battle session, so a ranking can be
//!   resumed after a restart.
//! - [`SessionView`]: Read-only projection of a session used by every
//!   presentation surface (HTML page, JSON API, terminal).

mod item;
mod snapshot;
mod view;

pub use item::*;
pub use snapshot::*;
pub use view::*;
