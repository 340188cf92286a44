//! The vector index seen by the workflow: embed-and-store, embed-and-query.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};
use triage_ai::Embed;
use triage_core::schema::segments;
use triage_core::{Category, SegmentDocument, StoreStatus, StoredSegment};
use triage_store::SegmentStore;

/// Similarity index over past ticket segments, partitioned by category.
///
/// Both operations are total: storage problems surface as
/// [`StoreStatus::Failed`], query problems as an empty result.
#[async_trait::async_trait]
pub trait Index: Send + Sync {
    async fn store(&self, category: Category, documents: Vec<SegmentDocument>) -> StoreStatus;

    /// Up to `k` segments from the category's partition, most similar first.
    async fn query(&self, category: Category, text: &str, k: usize) -> Vec<StoredSegment>;
}

/// [`Index`] that embeds text locally and persists rows in a [`SegmentStore`].
pub struct VectorIndex {
    store: Arc<dyn SegmentStore>,
    embedder: Mutex<Box<dyn Embed>>,
    dim: usize,
}

impl VectorIndex {
    pub fn new(store: Arc<dyn SegmentStore>, embedder: Box<dyn Embed>) -> Self {
        let dim = embedder.dim();
        Self {
            store,
            embedder: Mutex::new(embedder),
            dim,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut embedder = self
            .embedder
            .lock()
            .map_err(|e| anyhow::anyhow!("embedder lock poisoned: {e}"))?;
        embedder.embed_batch(texts)
    }

    async fn try_store(
        &self,
        category: Category,
        documents: &[SegmentDocument],
    ) -> anyhow::Result<usize> {
        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let embeddings = self.embed(&texts)?;
        let batch = segments::to_batch(documents, &embeddings, self.dim as i32, Utc::now())?;
        Ok(self.store.append(category, batch).await?)
    }

    async fn try_query(
        &self,
        category: Category,
        text: &str,
        k: usize,
    ) -> anyhow::Result<Vec<StoredSegment>> {
        let vector = self
            .embed(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))?;
        Ok(self.store.search(category, &vector, k).await?)
    }
}

#[async_trait::async_trait]
impl Index for VectorIndex {
    async fn store(&self, category: Category, documents: Vec<SegmentDocument>) -> StoreStatus {
        if documents.is_empty() {
            return StoreStatus::failed("Missing category or chunks");
        }

        match self.try_store(category, &documents).await {
            Ok(count) => {
                info!(category = %category, count, "stored ticket segments");
                StoreStatus::Stored { count, category }
            }
            Err(e) => {
                warn!(category = %category, error = %e, "failed to store ticket segments");
                StoreStatus::failed(e.to_string())
            }
        }
    }

    async fn query(&self, category: Category, text: &str, k: usize) -> Vec<StoredSegment> {
        match self.try_query(category, text, k).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(category = %category, error = %e, "similarity query failed");
                vec![]
            }
        }
    }
}
