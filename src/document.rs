//! Free-text documents.

use serde::{Deserialize, Serialize};

/// An encyclopedia-style page for an entity.
///
/// `title` is canonical: when a document is fetched through a redirect
/// the title differs from the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Canonical title.
    pub title: String,

    /// Raw page markup.
    #[serde(default)]
    pub content: String,
}

impl Document {
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}
