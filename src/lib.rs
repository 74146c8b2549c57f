// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod crawler;
pub mod database;
pub mod error;
pub mod exporter;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod utils;

pub use config::{Config, CrawlerConfig, DatabaseConfig, PipelineConfig};
pub use crawler::{FacetReport, ListingCrawler, ListingFacet};
pub use database::{
    ApplyStats, Baseline, BaselineLoader, ChangeApplier, NovelDbClient, SchemaManager,
};
pub use error::{PipelineError, Result};
pub use exporter::{ChangeLogWriter, SnapshotStore};
pub use models::{ChangeLogEntry, Column, Decision, FieldChange, NovelRecord, RawRecord};
pub use parser::{RecordNormalizer, RecordRejected, clean_text};
pub use pipeline::{
    CrawlProgress, CrawlStats, DiffEngine, ReconcilePlan, Reconciler, RunReport, crawl_to_snapshot,
};
pub use utils::{
    HealthCheck, HealthReport, HealthStatus, PhaseMetrics, PhaseTimer, Validator,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(clean_text(Some("a<br>b")), "a b");
    }
}
