// src/models/mod.rs
pub mod chat;
pub mod video;

use serde::Deserialize;

/// List payloads arrive either paginated (`{"results": [...]}`) or as a bare
/// array, depending on the backend view.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Paginated { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListEnvelope::Paginated { results } => results,
            ListEnvelope::Plain(items) => items,
        }
    }
}
