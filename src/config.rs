//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

/// Default Notion API base URL.
pub const DEFAULT_NOTION_URL: &str = "https://api.notion.com/v1";

const DEFAULT_TITLE_FIELDS: &[&str] = &["Film Title", "Title", "Name"];
const DEFAULT_IMAGE_FIELDS: &[&str] = &["Default Image", "Poster", "Image"];
const DEFAULT_ELIGIBLE_FIELDS: &[&str] = &["Battle Eligible", "Eligible"];

/// Ordered fallbacks for the record properties the item source reads.
///
/// The first name present on a record wins, which keeps the tool working when
/// the database schema drifts (a renamed column, a copy of the template).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldNames {
    pub title: Vec<String>,
    pub image: Vec<String>,
    pub eligible: Vec<String>,
    /// Number property the rank is written to.
    pub rank: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            title: to_owned(DEFAULT_TITLE_FIELDS),
            image: to_owned(DEFAULT_IMAGE_FIELDS),
            eligible: to_owned(DEFAULT_ELIGIBLE_FIELDS),
            rank: "Rank".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Notion integration token (from NOTION_TOKEN)
    pub notion_token: Option<String>,
    /// Database to pull films from (from NOTION_DATABASE_ID or DATABASE_ID)
    pub database_id: Option<String>,
    /// API base URL (from NOTION_API_URL)
    pub notion_url: String,
    pub fields: FieldNames,
    /// Write ranks back after every placement (from FILM_BATTLE_SYNC_RANKS)
    pub sync_ranks: bool,
    /// Heading of the battle page (from FILM_BATTLE_PAGE_TITLE)
    pub page_title: String,
    /// Show the engine state panel on the battle page (from FILM_BATTLE_DEBUG)
    pub debug: bool,
    /// Snapshot database path (from FILM_BATTLE_DB)
    pub db_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let fields = FieldNames {
            title: list_var("FILM_BATTLE_TITLE_FIELDS").unwrap_or_else(|| to_owned(DEFAULT_TITLE_FIELDS)),
            image: list_var("FILM_BATTLE_IMAGE_FIELDS").unwrap_or_else(|| to_owned(DEFAULT_IMAGE_FIELDS)),
            eligible: list_var("FILM_BATTLE_ELIGIBLE_FIELDS")
                .unwrap_or_else(|| to_owned(DEFAULT_ELIGIBLE_FIELDS)),
            rank: std::env::var("FILM_BATTLE_RANK_FIELD").unwrap_or_else(|_| "Rank".to_string()),
        };

        Self {
            notion_token: std::env::var("NOTION_TOKEN").ok(),
            database_id: std::env::var("NOTION_DATABASE_ID")
                .or_else(|_| std::env::var("DATABASE_ID"))
                .ok(),
            notion_url: std::env::var("NOTION_API_URL")
                .unwrap_or_else(|_| DEFAULT_NOTION_URL.to_string()),
            fields,
            sync_ranks: bool_var("FILM_BATTLE_SYNC_RANKS"),
            page_title: std::env::var("FILM_BATTLE_PAGE_TITLE")
                .unwrap_or_else(|_| "Battle Mode".to_string()),
            debug: bool_var("FILM_BATTLE_DEBUG"),
            db_path: std::env::var("FILM_BATTLE_DB").ok().map(PathBuf::from),
        }
    }

    /// Configuration with defaults and no Notion credentials (for testing).
    pub fn local() -> Self {
        Self {
            notion_token: None,
            database_id: None,
            notion_url: DEFAULT_NOTION_URL.to_string(),
            fields: FieldNames::default(),
            sync_ranks: false,
            page_title: "Battle Mode".to_string(),
            debug: false,
            db_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn list_var(key: &str) -> Option<Vec<String>> {
    let names: Vec<String> = std::env::var(key)
        .ok()?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!names.is_empty()).then_some(names)
}

pub(crate) fn bool_var(key: &str) -> bool {
    std::env::var(key)
        .map(|v| parse_bool(&v))
        .unwrap_or(false)
}

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" YES "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn default_fields_prefer_film_title() {
        let fields = FieldNames::default();
        assert_eq!(fields.title[0], "Film Title");
        assert_eq!(fields.eligible[0], "Battle Eligible");
        assert_eq!(fields.rank, "Rank");
    }

    #[test]
    fn local_config_has_no_credentials() {
        let config = Config::local();
        assert!(config.notion_token.is_none());
        assert!(!config.sync_ranks);
        assert_eq!(config.page_title, "Battle Mode");
    }
}
