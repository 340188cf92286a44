//! LanceDB segment store: each category partition is its own LanceDB database
//! at `<base>/<category>` holding a single `<category>_tickets` table.

use std::path::{Path, PathBuf};

use arrow::array::{Array, Float32Array, RecordBatchIterator};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::{debug, info};
use triage_core::config::partition_path;
use triage_core::schema::segments;
use triage_core::{Category, StoredSegment};

use crate::{SegmentStore, StoreError};

/// LanceDB store for the category partitions.
pub struct LanceStore {
    base: PathBuf,
}

impl LanceStore {
    /// Use `base` as the root directory. Partitions are connected on demand.
    pub fn open(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
        }
    }

    async fn connect(&self, dir: &Path) -> Result<lancedb::Connection, StoreError> {
        let uri = dir
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        Ok(db)
    }

    /// Open the category's table if its partition and table both exist.
    async fn existing_table(&self, category: Category) -> Result<Option<lancedb::Table>, StoreError> {
        let dir = partition_path(&self.base, category);
        if !dir.exists() {
            return Ok(None);
        }
        let db = self.connect(&dir).await?;
        let names = db.table_names().execute().await?;
        if !names.iter().any(|n| n == category.collection()) {
            return Ok(None);
        }
        let table = db.open_table(category.collection()).execute().await?;
        Ok(Some(table))
    }
}

#[async_trait::async_trait]
impl SegmentStore for LanceStore {
    async fn append(&self, category: Category, batch: RecordBatch) -> Result<usize, StoreError> {
        let rows = batch.num_rows();
        let dir = partition_path(&self.base, category);
        std::fs::create_dir_all(&dir)?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        let db = self.connect(&dir).await?;
        let table_name = category.collection();
        let existing = db.table_names().execute().await?;
        if existing.iter().any(|n| n == table_name) {
            let table = db.open_table(table_name).execute().await?;
            table.add(Box::new(reader)).execute().await?;
        } else {
            db.create_table(table_name, Box::new(reader))
                .execute()
                .await?;
        }

        info!(
            table = table_name,
            rows,
            "appended segments to LanceDB partition"
        );
        Ok(rows)
    }

    async fn search(
        &self,
        category: Category,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<StoredSegment>, StoreError> {
        let Some(table) = self.existing_table(category).await? else {
            return Ok(vec![]);
        };

        let results: Vec<RecordBatch> = table
            .vector_search(query)?
            .limit(limit)
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut hits = Vec::new();
        for batch in &results {
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>().cloned());
            for (i, row) in segments::from_batch(batch)?.into_iter().enumerate() {
                let distance = distances
                    .as_ref()
                    .filter(|d| !d.is_null(i))
                    .map(|d| d.value(i))
                    .unwrap_or(2.0);
                hits.push(StoredSegment {
                    content: row.content,
                    metadata: row.metadata,
                    // Squared L2 over unit vectors: d = 2 - 2cos.
                    score: 1.0 - distance / 2.0,
                });
            }
        }

        debug!(category = %category, hits = hits.len(), "LanceDB partition search");
        Ok(hits)
    }

    async fn count(&self, category: Category) -> Result<usize, StoreError> {
        match self.existing_table(category).await? {
            Some(table) => Ok(table.count_rows(None).await?),
            None => Ok(0),
        }
    }
}
