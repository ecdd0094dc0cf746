use serde_json::Value;

use crate::index::IndexMatch;

pub const UNKNOWN_MOON: &str = "Unknown Moon";
pub const NO_TITLE: &str = "No Title Available";
pub const NO_CONTENT: &str = "No Content Available";
pub const NO_SOURCE: &str = "No Source Available";

/// Chunk metadata parsed once at the retrieval boundary. Keys the index did
/// not return are `None`; the display defaults above are applied only when
/// rendering, so downstream stages never touch raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMetadata {
    pub moon_name: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub source_url: Option<String>,
}

impl ChunkMetadata {
    /// Wire metadata keys are `moon_name`, `title`, `Document Content`, and
    /// `source`, matching the upsert record shape.
    pub fn from_value(value: &Value) -> Self {
        Self {
            moon_name: string_field(value, "moon_name"),
            title: string_field(value, "title"),
            content: string_field(value, "Document Content"),
            source_url: string_field(value, "source"),
        }
    }

    pub fn moon_name_or_default(&self) -> &str {
        self.moon_name.as_deref().unwrap_or(UNKNOWN_MOON)
    }
}

/// A similarity-search result with parsed metadata. Ephemeral, one query.
#[derive(Debug, Clone)]
pub struct Match {
    pub id: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

impl Match {
    pub fn from_index(hit: IndexMatch) -> Self {
        Self {
            metadata: ChunkMetadata::from_value(&hit.metadata),
            id: hit.id,
            score: hit.score,
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
}
