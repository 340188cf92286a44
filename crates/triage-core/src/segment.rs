//! Indexed ticket segments and the status reported by the vector store stage.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ticket::Category;

/// Per-segment metadata persisted alongside the embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub ticket_id: String,
    pub subject: String,
    pub category: Category,
    pub chunk_index: u32,
    /// Number of segments the source ticket was split into.
    pub total_chunks: u32,
}

/// A segment waiting to be embedded and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDocument {
    pub content: String,
    pub metadata: SegmentMetadata,
}

impl SegmentDocument {
    /// Build documents for every chunk of one ticket.
    pub fn from_chunks(
        ticket_id: &str,
        subject: &str,
        category: Category,
        chunks: &[String],
    ) -> Vec<Self> {
        let total = chunks.len() as u32;
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| Self {
                content: chunk.clone(),
                metadata: SegmentMetadata {
                    ticket_id: ticket_id.to_string(),
                    subject: subject.to_string(),
                    category,
                    chunk_index: i as u32,
                    total_chunks: total,
                },
            })
            .collect()
    }
}

/// A previously stored segment returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSegment {
    pub content: String,
    pub metadata: SegmentMetadata,
    /// Similarity to the query; higher is closer.
    pub score: f32,
}

/// Result of writing a ticket's segments to the vector store.
///
/// Informational only: a failed store never blocks later stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StoreStatus {
    Stored { count: usize, category: Category },
    Failed { reason: String },
}

impl StoreStatus {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored { count, category } => {
                write!(f, "Success: Stored {count} chunks in {category} vector store")
            }
            Self::Failed { reason } => write!(f, "Failed: {reason}"),
        }
    }
}
