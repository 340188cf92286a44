/// Arrow schema and row conversion for indexed ticket segments.
pub mod segments {
    use std::sync::Arc;

    use arrow::array::{
        Array, ArrayRef, FixedSizeListArray, FixedSizeListBuilder, Float32Array, Float32Builder,
        LargeStringArray, StringArray, TimestampNanosecondArray, UInt32Array,
    };
    use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;
    use chrono::{DateTime, Utc};

    use crate::segment::{SegmentDocument, SegmentMetadata};
    use crate::ticket::Category;

    /// Default embedding width (all-MiniLM-L6-v2).
    pub const DEFAULT_DIM: i32 = 384;

    /// Schema for one category partition of stored ticket segments.
    pub fn segment_schema(dim: i32) -> Schema {
        Schema::new(vec![
            Field::new("ticket_id", DataType::Utf8, false),
            Field::new("subject", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("total_chunks", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
                true,
            ),
            Field::new(
                "stored_at",
                DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
                false,
            ),
        ])
    }

    /// A segment row read back from storage, embedding included.
    #[derive(Debug, Clone)]
    pub struct SegmentRow {
        pub content: String,
        pub metadata: SegmentMetadata,
        pub embedding: Vec<f32>,
    }

    /// Build a RecordBatch from documents and their embeddings (same order).
    pub fn to_batch(
        docs: &[SegmentDocument],
        embeddings: &[Vec<f32>],
        dim: i32,
        stored_at: DateTime<Utc>,
    ) -> Result<RecordBatch, ArrowError> {
        if docs.len() != embeddings.len() {
            return Err(ArrowError::InvalidArgumentError(format!(
                "{} documents but {} embeddings",
                docs.len(),
                embeddings.len()
            )));
        }

        let n = docs.len();
        let mut emb_builder = FixedSizeListBuilder::new(Float32Builder::new(), dim);
        for emb in embeddings {
            if emb.len() != dim as usize {
                return Err(ArrowError::InvalidArgumentError(format!(
                    "embedding has {} dimensions, expected {dim}",
                    emb.len()
                )));
            }
            emb_builder.values().append_slice(emb);
            emb_builder.append(true);
        }

        let stored_nanos = stored_at.timestamp_nanos_opt().unwrap_or_default();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                docs.iter().map(|d| d.metadata.ticket_id.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                docs.iter().map(|d| d.metadata.subject.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                docs.iter().map(|d| d.metadata.category.as_str()),
            )),
            Arc::new(UInt32Array::from_iter_values(
                docs.iter().map(|d| d.metadata.chunk_index),
            )),
            Arc::new(UInt32Array::from_iter_values(
                docs.iter().map(|d| d.metadata.total_chunks),
            )),
            Arc::new(StringArray::from_iter_values(
                docs.iter().map(|d| d.content.as_str()),
            )),
            Arc::new(emb_builder.finish()),
            Arc::new(TimestampNanosecondArray::from(vec![stored_nanos; n]).with_timezone("UTC")),
        ];

        let schema: SchemaRef = Arc::new(segment_schema(dim));
        RecordBatch::try_new(schema, columns)
    }

    /// Read segment rows out of a batch produced by [`to_batch`] (or a
    /// vector-search result over the same schema). Rows with a null
    /// embedding are skipped.
    pub fn from_batch(batch: &RecordBatch) -> Result<Vec<SegmentRow>, ArrowError> {
        let ticket_id = column(batch, "ticket_id")?;
        let subject = column(batch, "subject")?;
        let category = column(batch, "category")?;
        let content = column(batch, "content")?;
        let chunk_index = u32_column(batch, "chunk_index")?;
        let total_chunks = u32_column(batch, "total_chunks")?;

        let emb_col = column(batch, "embedding")?;
        let fsl = emb_col
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| ArrowError::SchemaError("embedding column is not FixedSizeList".into()))?;
        let dim = fsl.value_length() as usize;
        let flat_values = fsl
            .values()
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| ArrowError::SchemaError("embedding values are not Float32".into()))?;

        let mut rows = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            if fsl.is_null(row) {
                continue;
            }

            let category_name = get_string(category.as_ref(), row).unwrap_or_default();
            let category: Category = category_name.parse().map_err(ArrowError::ParseError)?;

            let offset = row * dim;
            rows.push(SegmentRow {
                content: get_string(content.as_ref(), row).unwrap_or_default(),
                metadata: SegmentMetadata {
                    ticket_id: get_string(ticket_id.as_ref(), row).unwrap_or_default(),
                    subject: get_string(subject.as_ref(), row).unwrap_or_default(),
                    category,
                    chunk_index: chunk_index.value(row),
                    total_chunks: total_chunks.value(row),
                },
                embedding: flat_values.values()[offset..offset + dim].to_vec(),
            });
        }

        Ok(rows)
    }

    fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, ArrowError> {
        batch
            .column_by_name(name)
            .ok_or_else(|| ArrowError::SchemaError(format!("missing '{name}' column")))
    }

    fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, ArrowError> {
        column(batch, name)?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| ArrowError::SchemaError(format!("'{name}' column is not UInt32")))
    }

    fn get_string(col: &dyn Array, row: usize) -> Option<String> {
        if col.is_null(row) {
            return None;
        }
        col.as_any()
            .downcast_ref::<StringArray>()
            .map(|arr| arr.value(row).to_string())
            .or_else(|| {
                col.as_any()
                    .downcast_ref::<LargeStringArray>()
                    .map(|arr| arr.value(row).to_string())
            })
    }
}
