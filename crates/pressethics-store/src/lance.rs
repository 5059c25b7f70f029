//! LanceDB case index.
//!
//! One table (default `press_ethics_cases`) of prior rulings with a
//! fixed-width embedding column. The analysis path only reads; `replace`
//! is used by `index build`.

use std::path::{Path, PathBuf};

use arrow::array::RecordBatchIterator;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{ExecutableQuery, QueryBase};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pressethics_core::SimilarCase;
use tracing::{debug, info};

use crate::StoreError;
use crate::batch::cases_from_batches;

pub struct CaseIndex {
    db: lancedb::Connection,
    path: PathBuf,
    table_name: String,
}

impl CaseIndex {
    /// Open an existing index directory. Never creates anything.
    pub async fn open(path: &Path, table_name: &str) -> Result<Self, StoreError> {
        if !path.is_dir() {
            return Err(StoreError::IndexNotFound(path.to_path_buf()));
        }
        Self::connect(path, table_name).await
    }

    /// Open or create the index directory, for building.
    pub async fn create(path: &Path, table_name: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;
        Self::connect(path, table_name).await
    }

    async fn connect(path: &Path, table_name: &str) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 index path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
            table_name: table_name.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub async fn table_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.db.table_names().execute().await?)
    }

    async fn table(&self) -> Result<lancedb::Table, StoreError> {
        if !self.table_names().await?.contains(&self.table_name) {
            return Err(StoreError::TableNotFound(self.table_name.clone()));
        }
        Ok(self.db.open_table(&self.table_name).execute().await?)
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.table().await?.count_rows(None).await?)
    }

    /// Cosine k-NN over the embedding column, most similar first.
    ///
    /// An empty table, or a query that matches nothing, is an error rather
    /// than an empty list.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SimilarCase>, StoreError> {
        let table = self.table().await?;
        if table.count_rows(None).await? == 0 {
            return Err(StoreError::EmptyIndex(self.table_name.clone()));
        }

        let batches: Vec<RecordBatch> = table
            .vector_search(query)?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await?
            .try_collect()
            .await?;

        let cases = cases_from_batches(&batches)?;
        if cases.is_empty() {
            return Err(StoreError::EmptyIndex(self.table_name.clone()));
        }
        debug!(
            table = %self.table_name,
            k,
            returned = cases.len(),
            best = cases[0].similarity_score,
            "vector search complete"
        );
        Ok(cases)
    }

    /// Drop and recreate the table from `batches`.
    pub async fn replace(&self, batches: Vec<RecordBatch>) -> Result<usize, StoreError> {
        let Some(first) = batches.first() else {
            return Err(StoreError::Other("no record batches provided".into()));
        };
        let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        let schema = first.schema();
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), schema);

        if self.table_names().await?.contains(&self.table_name) {
            self.db.drop_table(&self.table_name, &[]).await?;
        }
        self.db
            .create_table(&self.table_name, Box::new(reader))
            .execute()
            .await?;

        info!(
            table = %self.table_name,
            rows = total_rows,
            "created case index table"
        );
        Ok(total_rows)
    }
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::ParquetNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::batch::embedded_batch;
    use crate::batch::tests::source_batch;
    use pressethics_core::schema::cases;
    use pressethics_core::{ClauseId, PriorVerdict};
    use tempfile::TempDir;

    const TABLE: &str = "press_ethics_cases";

    async fn seeded_index(tmp: &TempDir) -> CaseIndex {
        let index = CaseIndex::create(&tmp.path().join("lancedb"), TABLE)
            .await
            .unwrap();
        let source = source_batch(&[
            ("2023-01", "피의자 얼굴 노출", "주의", Some(7)),
            ("2023-02", "자살 방법 상세 보도", "경고", Some(3)),
            ("2023-03", "기업 홍보성 기사", "위반 없음", None),
            ("2023-04", "사생활 사진 게재", "주의", Some(12)),
        ]);
        let batch = embedded_batch(
            &source,
            &[
                vec![1.0, 0.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0],
                vec![0.7071, 0.0, 0.0, 0.7071],
            ],
            "test-model",
            4,
            0,
        )
        .unwrap();
        assert_eq!(index.replace(vec![batch]).await.unwrap(), 4);
        index
    }

    #[tokio::test]
    async fn open_missing_directory_is_index_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = CaseIndex::open(&tmp.path().join("nope"), TABLE).await;
        assert!(matches!(result, Err(StoreError::IndexNotFound(_))));
    }

    #[tokio::test]
    async fn missing_table_is_table_not_found() {
        let tmp = TempDir::new().unwrap();
        let index = CaseIndex::create(&tmp.path().join("lancedb"), TABLE)
            .await
            .unwrap();
        let result = index.search(&[1.0, 0.0, 0.0, 0.0], 3).await;
        assert!(matches!(result, Err(StoreError::TableNotFound(t)) if t == TABLE));
    }

    #[tokio::test]
    async fn empty_table_is_empty_index() {
        let tmp = TempDir::new().unwrap();
        let index = CaseIndex::create(&tmp.path().join("lancedb"), TABLE)
            .await
            .unwrap();
        index
            .db
            .create_empty_table(TABLE, Arc::new(cases::index_schema(4)))
            .execute()
            .await
            .unwrap();
        let result = index.search(&[1.0, 0.0, 0.0, 0.0], 3).await;
        assert!(matches!(result, Err(StoreError::EmptyIndex(_))));
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let tmp = TempDir::new().unwrap();
        let index = seeded_index(&tmp).await;

        let reopened = CaseIndex::open(index.path(), TABLE).await.unwrap();
        let results = reopened.search(&[1.0, 0.0, 0.0, 0.0], 3).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].case_id, "2023-01");
        assert_eq!(results[0].matched_clause_id, ClauseId::new(7));
        assert_eq!(results[0].prior_verdict, PriorVerdict::Violation);
        assert!((results[0].similarity_score - 1.0).abs() < 1e-3);
        assert_eq!(results[1].case_id, "2023-04");
        assert!(
            results
                .windows(2)
                .all(|w| w[0].similarity_score >= w[1].similarity_score)
        );
    }

    #[tokio::test]
    async fn replace_does_not_append() {
        let tmp = TempDir::new().unwrap();
        let index = seeded_index(&tmp).await;
        let source = source_batch(&[("n", "새 사례", "주의", Some(1))]);
        let batch = embedded_batch(&source, &[vec![0.0, 0.0, 0.0, 1.0]], "m", 4, 0).unwrap();
        index.replace(vec![batch]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.table_names().await.unwrap(), vec![TABLE.to_string()]);
    }

    #[test]
    fn missing_parquet_errors() {
        let result = read_parquet(Path::new("/nonexistent/cases.parquet"));
        assert!(matches!(result, Err(StoreError::ParquetNotFound(_))));
    }
}
