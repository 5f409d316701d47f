use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document whose text has already been extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInput {
    pub id: Uuid,
    /// File name or URL, used as the document column in result rows
    pub title: String,
    pub text: String,
    pub content_hash: String,
    pub received_at: DateTime<Utc>,
}

impl DocumentInput {
    #[must_use]
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            content_hash: compute_hash(&text),
            text,
            received_at: Utc::now(),
        }
    }

    /// Read a plain-text file; the file name becomes the title.
    pub async fn from_text_file(path: &Path) -> std::io::Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(file_title(path), text))
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// File name of a path, or the whole path when it has none.
pub(crate) fn file_title(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or_else(|| path.to_string_lossy().to_string(), String::from)
}

fn compute_hash(content: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
