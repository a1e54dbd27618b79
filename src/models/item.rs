use serde::{Deserialize, Serialize};

/// Title used when a record has no resolvable title field.
pub const UNTITLED: &str = "Untitled";

/// A film taking part in battles.
///
/// `id` is the external page id and is the only thing the rank sink needs.
/// The display payload is never modified after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    /// Poster or still URL, if the record carries one.
    #[serde(default)]
    pub image: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}
