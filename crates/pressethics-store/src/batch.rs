//! Arrow conversions between case-index rows and domain types.
//!
//! Source exports disagree on column types (`LargeUtf8` text, `Int64` or
//! string clause ids), so every column is cast to the index type before use.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, FixedSizeListBuilder, Float32Array, Float32Builder, Int32Array, Int64Array,
    StringArray, TimestampMillisecondArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use pressethics_core::schema::cases;
use pressethics_core::{ClauseId, PriorVerdict, SimilarCase};
use tracing::warn;

use crate::StoreError;

/// Column LanceDB appends to vector search results.
pub const DISTANCE: &str = "_distance";

fn column<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a ArrayRef, StoreError> {
    batch
        .column_by_name(name)
        .ok_or(StoreError::MissingColumn(name))
}

/// All values of a column as strings; nulls become empty strings.
pub fn string_values(batch: &RecordBatch, name: &'static str) -> Result<Vec<String>, StoreError> {
    let col = cast(column(batch, name)?, &DataType::Utf8)?;
    let arr = col
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| StoreError::Other(format!("column '{name}' did not cast to Utf8")))?;
    Ok((0..arr.len())
        .map(|i| {
            if arr.is_null(i) {
                String::new()
            } else {
                arr.value(i).to_string()
            }
        })
        .collect())
}

/// Clause ids as nullable integers. Unparseable values become null.
fn clause_values(batch: &RecordBatch) -> Result<Vec<Option<i64>>, StoreError> {
    let Some(col) = batch.column_by_name(cases::CLAUSE_ID) else {
        return Ok(vec![None; batch.num_rows()]);
    };
    let col = cast(col, &DataType::Int64)?;
    let arr = col
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| StoreError::Other("clause_id did not cast to Int64".into()))?;
    Ok(arr.iter().collect())
}

/// Convert vector-search results into cases, sorted by descending similarity.
///
/// Similarity is `1 - cosine distance`. Stored clause ids outside the code
/// are logged and dropped rather than propagated.
pub fn cases_from_batches(batches: &[RecordBatch]) -> Result<Vec<SimilarCase>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        let ids = string_values(batch, cases::CASE_ID)?;
        let texts = string_values(batch, cases::CASE_TEXT)?;
        let verdicts = string_values(batch, cases::VERDICT)?;
        let clauses = clause_values(batch)?;
        let distances = cast(column(batch, DISTANCE)?, &DataType::Float32)?;
        let distances = distances
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| StoreError::Other("_distance did not cast to Float32".into()))?;

        for row in 0..batch.num_rows() {
            let matched_clause_id = clauses[row].and_then(|raw| {
                let id = ClauseId::from_i64(raw);
                if id.is_none() {
                    warn!(case_id = %ids[row], clause_id = raw, "stored clause id outside 1..=16");
                }
                id
            });
            let distance = if distances.is_null(row) {
                1.0
            } else {
                distances.value(row)
            };
            out.push(SimilarCase {
                case_id: ids[row].clone(),
                case_text: texts[row].clone(),
                matched_clause_id,
                prior_verdict: PriorVerdict::from_text(&verdicts[row]),
                similarity_score: 1.0 - distance,
            });
        }
    }
    out.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    Ok(out)
}

/// Project a source batch onto the index schema with its embeddings attached.
pub fn embedded_batch(
    source: &RecordBatch,
    embeddings: &[Vec<f32>],
    model_name: &str,
    dim: usize,
    embedded_at_ms: i64,
) -> Result<RecordBatch, StoreError> {
    let n = source.num_rows();
    if embeddings.len() != n {
        return Err(StoreError::EmbeddingCount {
            rows: n,
            got: embeddings.len(),
        });
    }

    let clause_ids: Int32Array = clause_values(source)?
        .into_iter()
        .map(|v| v.and_then(|x| i32::try_from(x).ok()))
        .collect();

    let mut emb_builder = FixedSizeListBuilder::new(Float32Builder::new(), dim as i32);
    for emb in embeddings {
        if emb.len() != dim {
            return Err(StoreError::Dimension {
                expected: dim,
                got: emb.len(),
            });
        }
        emb_builder.values().append_slice(emb);
        emb_builder.append(true);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(string_values(source, cases::CASE_ID)?)),
        Arc::new(StringArray::from(string_values(source, cases::CASE_TEXT)?)),
        Arc::new(StringArray::from(string_values(source, cases::VERDICT)?)),
        Arc::new(clause_ids),
        Arc::new(emb_builder.finish()),
        Arc::new(StringArray::from(vec![model_name; n])),
        Arc::new(TimestampMillisecondArray::from(vec![embedded_at_ms; n]).with_timezone("UTC")),
    ];
    Ok(RecordBatch::try_new(
        Arc::new(cases::index_schema(dim as i32)),
        columns,
    )?)
}
