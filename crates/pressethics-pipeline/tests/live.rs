//! Live run against a real article, Gemini, and a built case index.
//!
//! Needs `GEMINI_KEY`, a built index at `PRESSETHICS_INDEX` (default
//! `./lancedb`), the exported embedding model, and
//! `PRESSETHICS_LIVE_URL` pointing at an article that names a criminal
//! suspect and shows their face.
//!
//! ```sh
//! cargo test -p pressethics-pipeline --features index --test live -- --ignored
//! ```
#![cfg(feature = "index")]

use std::path::PathBuf;

use pressethics_core::{ClauseId, PipelineConfig};
use pressethics_pipeline::{Pipeline, RecordingSink, StageStatus};

fn env_or_panic(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        panic!(
            "{name} is not set.\n\
             Set GEMINI_KEY and PRESSETHICS_LIVE_URL, build the index with\n\
             \x20 pressethics index build cases.parquet\n\
             and export the embedder with\n\
             \x20 optimum-cli export onnx --model intfloat/multilingual-e5-large-instruct models/multilingual-e5-large-instruct/"
        )
    })
}

#[tokio::test]
#[ignore]
async fn named_suspect_with_face_photo_cites_clause_7_or_12() {
    let api_key = env_or_panic("GEMINI_KEY");
    let url = env_or_panic("PRESSETHICS_LIVE_URL");

    let mut config = PipelineConfig::default();
    if let Ok(path) = std::env::var("PRESSETHICS_INDEX") {
        config.index_path = PathBuf::from(path);
    }
    let sink = std::sync::Arc::new(RecordingSink::default());
    let pipeline = Pipeline::gemini(config, &api_key)
        .unwrap()
        .with_progress(sink.clone());

    let report = pipeline.run(&url).await.unwrap();

    let verdict = report.verdict();
    assert!(verdict.is_violation(), "expected a violation:\n{}", verdict.final_text);
    assert!(
        verdict.cites(ClauseId::new(7).unwrap()) || verdict.cites(ClauseId::new(12).unwrap()),
        "expected 제7조 or 제12조, got {:?}",
        verdict.cited_clauses
    );
    assert!(verdict.cited_clauses.iter().all(|c| (1..=16).contains(&c.get())));
    assert_eq!(
        sink.events()
            .iter()
            .filter(|e| e.status == StageStatus::Failed)
            .count(),
        0
    );
}
