//! Index build: reads prior rulings from Parquet, embeds `case_text`, writes to LanceDB.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use pressethics_core::cases;
use pressethics_store::batch::{embedded_batch, string_values};
use pressethics_store::{CaseIndex, read_parquet};

pub const EMBED_BATCH_SIZE: usize = 32;

pub struct BuildStats {
    pub total_rows: usize,
    pub elapsed_secs: f64,
}

/// Identity of the embedding model recorded on every row.
pub struct ModelInfo<'a> {
    pub name: &'a str,
    pub dim: usize,
}

/// Read Parquet → embed case text → replace the LanceDB table.
///
/// `embed` is called with at most `EMBED_BATCH_SIZE` texts at a time.
pub async fn build_index<F>(
    index: &CaseIndex,
    parquet_path: &Path,
    model: ModelInfo<'_>,
    mut embed: F,
) -> anyhow::Result<BuildStats>
where
    F: FnMut(&[&str]) -> anyhow::Result<Vec<Vec<f32>>>,
{
    let start = Instant::now();

    let source_batches = read_parquet(parquet_path)
        .with_context(|| format!("reading {}", parquet_path.display()))?;
    let total_rows: usize = source_batches.iter().map(|b| b.num_rows()).sum();
    eprintln!("  Read {total_rows} cases from {}", parquet_path.display());
    if total_rows == 0 {
        anyhow::bail!("{} contains no cases", parquet_path.display());
    }

    let embedded_at = chrono::Utc::now().timestamp_millis();
    let mut output_batches: Vec<RecordBatch> = Vec::with_capacity(source_batches.len());
    let mut processed = 0usize;

    for batch in source_batches.iter().filter(|b| b.num_rows() > 0) {
        let texts = string_values(batch, cases::CASE_TEXT)
            .with_context(|| format!("reading '{}' column", cases::CASE_TEXT))?;
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(EMBED_BATCH_SIZE) {
            embeddings.extend(embed(chunk).context("generating embeddings")?);
        }

        output_batches.push(
            embedded_batch(batch, &embeddings, model.name, model.dim, embedded_at)
                .context("building index batch")?,
        );

        processed += texts.len();
        eprint!(
            "\r  Embedded {processed}/{total_rows} ({:.1}%)",
            processed as f64 / total_rows as f64 * 100.0
        );
    }
    eprintln!();

    eprintln!("  Writing to LanceDB...");
    index
        .replace(output_batches)
        .await
        .context("writing case index table")?;

    Ok(BuildStats {
        total_rows,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;
    use pressethics_core::{ClauseId, PriorVerdict};
    use tempfile::TempDir;

    fn write_cases(path: &Path) {
        let schema = Arc::new(Schema::new(vec![
            Field::new(cases::CASE_ID, DataType::Utf8, false),
            Field::new(cases::CASE_TEXT, DataType::Utf8, false),
            Field::new(cases::VERDICT, DataType::Utf8, false),
            Field::new(cases::CLAUSE_ID, DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2024-001", "2024-002", "2024-003"])),
                Arc::new(StringArray::from(vec![
                    "피의자 얼굴 사진을 모자이크 없이 게재",
                    "자살 방법을 구체적으로 묘사",
                    "지역 축제 소개 기사",
                ])),
                Arc::new(StringArray::from(vec!["주의", "경고", "위반 없음"])),
                Arc::new(Int64Array::from(vec![Some(7), Some(3), None])),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    /// One-hot on the first keyword found; good enough to check wiring.
    fn keyword_embed(texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0; 3];
                let slot = if t.contains("얼굴") {
                    0
                } else if t.contains("자살") {
                    1
                } else {
                    2
                };
                v[slot] = 1.0;
                v
            })
            .collect())
    }

    #[tokio::test]
    async fn build_then_search() {
        let tmp = TempDir::new().unwrap();
        let parquet = tmp.path().join("cases.parquet");
        write_cases(&parquet);
        let index = CaseIndex::create(&tmp.path().join("lancedb"), cases::DEFAULT_TABLE)
            .await
            .unwrap();

        let stats = build_index(
            &index,
            &parquet,
            ModelInfo {
                name: "keyword",
                dim: 3,
            },
            keyword_embed,
        )
        .await
        .unwrap();
        assert_eq!(stats.total_rows, 3);
        assert_eq!(index.count().await.unwrap(), 3);

        let query = keyword_embed(&["피의자 얼굴 공개"]).unwrap().remove(0);
        let hits = index.search(&query, 2).await.unwrap();
        assert_eq!(hits[0].case_id, "2024-001");
        assert_eq!(hits[0].matched_clause_id, ClauseId::new(7));
        assert_eq!(hits[0].prior_verdict, PriorVerdict::Violation);
    }

    #[tokio::test]
    async fn embedding_failure_aborts_build() {
        let tmp = TempDir::new().unwrap();
        let parquet = tmp.path().join("cases.parquet");
        write_cases(&parquet);
        let index = CaseIndex::create(&tmp.path().join("lancedb"), cases::DEFAULT_TABLE)
            .await
            .unwrap();

        let result = build_index(
            &index,
            &parquet,
            ModelInfo {
                name: "broken",
                dim: 3,
            },
            |_: &[&str]| anyhow::bail!("model not loaded"),
        )
        .await;
        assert!(result.is_err());
        assert!(index.table_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_parquet_is_reported() {
        let tmp = TempDir::new().unwrap();
        let index = CaseIndex::create(&tmp.path().join("lancedb"), cases::DEFAULT_TABLE)
            .await
            .unwrap();
        let err = build_index(
            &index,
            &tmp.path().join("absent.parquet"),
            ModelInfo { name: "m", dim: 3 },
            keyword_embed,
        )
        .await
        .err()
        .unwrap();
        assert!(err.to_string().contains("absent.parquet"));
    }
}
