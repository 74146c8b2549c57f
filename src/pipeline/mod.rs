// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod diff;
mod orchestrator;
mod progress;

pub use diff::{DiffEngine, ReconcilePlan};
pub use orchestrator::{Reconciler, RunReport, crawl_to_snapshot};
pub use progress::{CrawlProgress, CrawlStats};
