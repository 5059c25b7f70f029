pub mod citation;
pub mod clause;
pub mod config;
pub mod schema;
pub mod types;
pub mod verdict;

pub use citation::{Citation, CitationIssue, CitationScan};
pub use clause::{ClauseId, EthicsClause, CODE};
pub use config::{ConfigError, ImagePolicy, PipelineConfig};
pub use schema::cases;
pub use types::{Article, ImageAnnotation, PriorVerdict, SimilarCase};
pub use verdict::{Outcome, Review, Verdict, NO_VIOLATION};
