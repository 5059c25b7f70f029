/// Arrow schemas for prior press-ethics rulings.
///
/// The source Parquet file carries the four text columns; the index table
/// adds the embedding and provenance columns written by `index build`.
pub mod cases {
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use std::sync::Arc;

    pub const CASE_ID: &str = "case_id";
    pub const CASE_TEXT: &str = "case_text";
    pub const VERDICT: &str = "verdict";
    pub const CLAUSE_ID: &str = "clause_id";
    pub const EMBEDDING: &str = "embedding";
    pub const EMBEDDING_MODEL: &str = "embedding_model";
    pub const EMBEDDED_AT: &str = "embedded_at";

    /// Default LanceDB table holding the case index.
    pub const DEFAULT_TABLE: &str = "press_ethics_cases";

    fn text_fields() -> Vec<Field> {
        vec![
            Field::new(CASE_ID, DataType::Utf8, false),
            Field::new(CASE_TEXT, DataType::Utf8, false),
            Field::new(VERDICT, DataType::Utf8, false),
            Field::new(CLAUSE_ID, DataType::Int32, true),
        ]
    }

    /// Columns required in a prior-case Parquet export.
    pub fn source_schema() -> Schema {
        Schema::new(text_fields())
    }

    /// Full index table layout with a `dimension`-wide embedding column.
    pub fn index_schema(dimension: i32) -> Schema {
        let mut fields = text_fields();
        fields.push(Field::new(
            EMBEDDING,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension,
            ),
            true,
        ));
        fields.push(Field::new(EMBEDDING_MODEL, DataType::Utf8, true));
        fields.push(Field::new(
            EMBEDDED_AT,
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            true,
        ));
        Schema::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::cases;
    use arrow::datatypes::DataType;

    #[test]
    fn source_schema_has_text_columns() {
        let schema = cases::source_schema();
        assert_eq!(schema.fields().len(), 4);
        assert!(schema.field_with_name(cases::CASE_TEXT).is_ok());
        assert!(schema.field_with_name(cases::CLAUSE_ID).unwrap().is_nullable());
    }

    #[test]
    fn index_schema_embedding_width() {
        let schema = cases::index_schema(1024);
        assert_eq!(schema.fields().len(), 7);
        match schema.field_with_name(cases::EMBEDDING).unwrap().data_type() {
            DataType::FixedSizeList(_, n) => assert_eq!(*n, 1024),
            other => panic!("unexpected embedding type {other:?}"),
        }
    }
}
