//! Arrow IPC file store: each category partition is a single
//! `<base>/<category>/segments.arrow` file searched by brute-force cosine
//! similarity.
//!
//! Pure Rust with no native dependencies. Suited to the volume of a single
//! support desk; appends rewrite the partition file atomically.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use tracing::{debug, info};
use triage_core::config::partition_path;
use triage_core::schema::segments;
use triage_core::{Category, StoredSegment};

use crate::{SegmentStore, StoreError, cosine_sim};

const SEGMENTS_FILE: &str = "segments.arrow";

/// Segment store backed by one Arrow IPC file per category.
#[derive(Debug, Clone)]
pub struct IpcStore {
    base: PathBuf,
}

impl IpcStore {
    /// Use `base` as the root directory. Nothing is created until the first append.
    pub fn open(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
        }
    }

    /// Path of the partition file for a category.
    pub fn partition_file(&self, category: Category) -> PathBuf {
        partition_path(&self.base, category).join(SEGMENTS_FILE)
    }

    fn append_blocking(&self, category: Category, batch: RecordBatch) -> Result<usize, StoreError> {
        let path = self.partition_file(category);
        let rows = batch.num_rows();

        let mut batches = if path.exists() {
            read_ipc(&path)?
        } else {
            Vec::new()
        };

        if let Some(existing) = batches.first() {
            let expected = embedding_dim(existing)?;
            let found = embedding_dim(&batch)?;
            if expected != found {
                return Err(StoreError::DimensionMismatch { expected, found });
            }
        }

        batches.push(batch);

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        // Write beside the live file, then swap it in.
        let tmp = path.with_extension("arrow.tmp");
        write_ipc(&tmp, &batches)?;
        std::fs::rename(&tmp, &path)?;

        info!(
            category = %category,
            rows,
            path = %path.display(),
            "appended segments to IPC partition"
        );
        Ok(rows)
    }

    fn search_blocking(
        &self,
        category: Category,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<StoredSegment>, StoreError> {
        let path = self.partition_file(category);
        if !path.exists() || limit == 0 {
            return Ok(vec![]);
        }

        let mut scored = Vec::new();
        for batch in read_ipc(&path)? {
            for row in segments::from_batch(&batch)? {
                let score = cosine_sim(query, &row.embedding);
                scored.push(StoredSegment {
                    content: row.content,
                    metadata: row.metadata,
                    score,
                });
            }
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        debug!(category = %category, hits = scored.len(), "IPC partition search");
        Ok(scored)
    }

    fn count_blocking(&self, category: Category) -> Result<usize, StoreError> {
        let path = self.partition_file(category);
        if !path.exists() {
            return Ok(0);
        }
        Ok(read_ipc(&path)?.iter().map(|b| b.num_rows()).sum())
    }
}

#[async_trait::async_trait]
impl SegmentStore for IpcStore {
    async fn append(&self, category: Category, batch: RecordBatch) -> Result<usize, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.append_blocking(category, batch))
            .await
            .map_err(|e| StoreError::Other(format!("append task failed: {e}")))?
    }

    async fn search(
        &self,
        category: Category,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<StoredSegment>, StoreError> {
        let store = self.clone();
        let query = query.to_vec();
        tokio::task::spawn_blocking(move || store.search_blocking(category, &query, limit))
            .await
            .map_err(|e| StoreError::Other(format!("search task failed: {e}")))?
    }

    async fn count(&self, category: Category) -> Result<usize, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.count_blocking(category))
            .await
            .map_err(|e| StoreError::Other(format!("count task failed: {e}")))?
    }
}

/// Read every RecordBatch from an Arrow IPC file.
fn read_ipc(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    let file = File::open(path)?;
    let reader = FileReader::try_new(file, None)?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

fn write_ipc(path: &Path, batches: &[RecordBatch]) -> Result<(), StoreError> {
    let Some(first) = batches.first() else {
        return Err(StoreError::Other("no record batches provided".into()));
    };
    let file = File::create(path)?;
    let mut writer = FileWriter::try_new(file, &first.schema())?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.finish()?;
    Ok(())
}

fn embedding_dim(batch: &RecordBatch) -> Result<usize, StoreError> {
    let schema = batch.schema();
    let field = schema.field_with_name("embedding")?;
    match field.data_type() {
        arrow::datatypes::DataType::FixedSizeList(_, dim) => Ok(*dim as usize),
        other => Err(StoreError::Other(format!(
            "embedding column has unexpected type {other:?}"
        ))),
    }
}
