//! Ledger entry for a generated creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of content a creation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreationType {
    Article,
    BlogTitle,
    Image,
    ResumeReview,
}

impl CreationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationType::Article => "article",
            CreationType::BlogTitle => "blog-title",
            CreationType::Image => "image",
            CreationType::ResumeReview => "resume-review",
        }
    }
}

impl fmt::Display for CreationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of one successful generation.
///
/// `content` holds generated text for text capabilities and the hosted
/// asset URL for image capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creation {
    /// Unique creation identifier.
    pub id: String,

    /// User who requested the generation.
    pub user_id: String,

    /// Prompt (or a short description of the operation).
    pub prompt: String,

    /// Generated text or asset URL.
    pub content: String,

    #[serde(rename = "type")]
    pub creation_type: CreationType,

    /// Whether the creation is shown in the community feed.
    #[serde(default)]
    pub publish: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Creation {
    pub fn new(
        user_id: impl Into<String>,
        prompt: impl Into<String>,
        content: impl Into<String>,
        creation_type: CreationType,
        publish: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            prompt: prompt.into(),
            content: content.into(),
            creation_type,
            publish,
            created_at: Utc::now(),
        }
    }
}
