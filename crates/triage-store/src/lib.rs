//! Storage layer: one partition per ticket category, Arrow IPC files or LanceDB.

mod error;
mod ipc;

#[cfg(feature = "lancedb")]
mod lance;

pub use error::StoreError;
pub use ipc::IpcStore;
#[cfg(feature = "lancedb")]
pub use lance::LanceStore;

use arrow::record_batch::RecordBatch;
use triage_core::{Category, StoredSegment};

/// Persistent, category-partitioned store of embedded ticket segments.
///
/// Batches must follow [`triage_core::schema::segments::segment_schema`].
/// Partitions are created on first append; reading a partition that was
/// never written is not an error.
#[async_trait::async_trait]
pub trait SegmentStore: Send + Sync {
    /// Append rows to the category's partition. Returns the number of rows written.
    async fn append(&self, category: Category, batch: RecordBatch) -> Result<usize, StoreError>;

    /// Up to `limit` rows nearest to `query`, most similar first.
    async fn search(
        &self,
        category: Category,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<StoredSegment>, StoreError>;

    /// Number of rows in the category's partition (0 if it does not exist).
    async fn count(&self, category: Category) -> Result<usize, StoreError>;
}

/// Cosine similarity; 0.0 when either vector has zero length.
pub(crate) fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
