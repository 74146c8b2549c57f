// file: src/pipeline/orchestrator.rs
// description: coordinates crawling, snapshotting and reconciliation runs
// reference: orchestrates asynchronous sync workflow

use crate::config::{Config, CrawlerConfig};
use crate::crawler::ListingCrawler;
use crate::database::{BaselineLoader, ChangeApplier, NovelDbClient, SchemaManager};
use crate::error::Result;
use crate::exporter::{ChangeLogWriter, SnapshotStore};
use crate::models::{NovelRecord, RawRecord};
use crate::parser::RecordNormalizer;
use crate::pipeline::diff::DiffEngine;
use crate::pipeline::progress::{CrawlProgress, CrawlStats};
use crate::utils::PhaseTimer;
use chrono::{DateTime, FixedOffset, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of one reconciliation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<FixedOffset>,
    pub received: usize,
    pub rejected: usize,
    pub superseded: usize,
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: usize,
    pub change_log_entries: usize,
    pub change_log_path: Option<PathBuf>,
    pub duration: Duration,
}

impl RunReport {
    pub fn log_summary(&self) {
        info!("=== Reconciliation Summary ({}) ===", self.run_id);
        info!("Started: {}", self.started_at.format("%Y-%m-%d %H:%M:%S %:z"));
        info!("Duration: {:.2} seconds", self.duration.as_secs_f64());
        info!("Records received: {}", self.received);
        info!("Records rejected: {}", self.rejected);
        info!("Duplicates superseded: {}", self.superseded);
        info!("Inserted: {}", self.inserted);
        info!("Updated: {}", self.updated);
        info!("Unchanged: {}", self.unchanged);
        match &self.change_log_path {
            Some(path) => info!(
                "Change log: {} entries in {}",
                self.change_log_entries,
                path.display()
            ),
            None => info!("Change log: not written"),
        }
        info!("==================================");
    }
}

pub struct Reconciler {
    config: Config,
    db_client: NovelDbClient,
}

impl Reconciler {
    pub async fn new(config: Config) -> Result<Self> {
        let db_client = NovelDbClient::new(config.database.clone()).await?;
        Ok(Self::with_client(config, db_client))
    }

    pub fn with_client(config: Config, db_client: NovelDbClient) -> Self {
        Self { config, db_client }
    }

    pub fn client(&self) -> &NovelDbClient {
        &self.db_client
    }

    /// The run clock, expressed in the listing's own offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        let normalizer = RecordNormalizer::new(self.config.pipeline.source_utc_offset_hours);
        Utc::now().with_timezone(&normalizer.source_offset())
    }

    pub async fn reconcile(&self, raw_records: &[RawRecord]) -> Result<RunReport> {
        self.reconcile_at(raw_records, self.now()).await
    }

    /// Runs one reconciliation with `started_at` as the run timestamp. The
    /// whole plan is built before storage is touched; the change log is
    /// written only after the storage transaction has committed.
    pub async fn reconcile_at(
        &self,
        raw_records: &[RawRecord],
        started_at: DateTime<FixedOffset>,
    ) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let run_timer = PhaseTimer::start("reconcile");
        info!("Starting reconciliation run {} with {} records", run_id, raw_records.len());

        SchemaManager::new(&self.db_client).initialize().await?;
        let baseline = BaselineLoader::new(&self.db_client).load().await?;
        run_timer.mark("baseline loaded");

        let (candidates, rejected) = self.normalize_all(raw_records, started_at);

        let diff_timer = PhaseTimer::start("diff");
        let plan = DiffEngine::new(started_at).plan(&baseline, &candidates);
        diff_timer.finish(candidates.len());
        info!(
            "Planned {} inserts, {} updates, {} unchanged",
            plan.inserts.len(),
            plan.updates.len(),
            plan.unchanged
        );

        let apply_timer = PhaseTimer::start("apply");
        let stats = ChangeApplier::new(&self.db_client, self.config.pipeline.chunk_size)
            .apply(&plan.inserts, &plan.updates)
            .await?;
        apply_timer.finish((stats.inserted + stats.updated) as usize);

        let change_log_path = match ChangeLogWriter::new(&self.config.pipeline.change_log_dir)
            .write(&plan.change_log, started_at)
        {
            Ok(path) => path,
            Err(e) => {
                error!("Failed to write change log for run {}: {}", run_id, e);
                None
            }
        };

        run_timer.warn_if_over(Duration::from_secs(300));
        let duration = run_timer.finish(raw_records.len()).duration;

        Ok(RunReport {
            run_id,
            started_at,
            received: raw_records.len(),
            rejected,
            superseded: plan.superseded,
            inserted: stats.inserted,
            updated: stats.updated,
            unchanged: plan.unchanged,
            change_log_entries: plan.change_log.len(),
            change_log_path,
            duration,
        })
    }

    pub async fn reconcile_snapshot(&self, snapshot: &SnapshotStore) -> Result<RunReport> {
        let records = snapshot.read()?;
        self.reconcile(&records).await
    }

    fn normalize_all(
        &self,
        raw_records: &[RawRecord],
        now: DateTime<FixedOffset>,
    ) -> (Vec<NovelRecord>, usize) {
        let normalizer = RecordNormalizer::new(self.config.pipeline.source_utc_offset_hours);
        let mut candidates = Vec::with_capacity(raw_records.len());
        let mut rejected = 0;

        for (index, raw) in raw_records.iter().enumerate() {
            match normalizer.normalize(raw, now) {
                Ok(record) => candidates.push(record),
                Err(e) => {
                    rejected += 1;
                    warn!("Skipping record #{}: {}", index, e);
                }
            }
        }

        (candidates, rejected)
    }
}

/// Crawls every listing facet and stores the combined records as a snapshot.
pub async fn crawl_to_snapshot(
    config: &CrawlerConfig,
    snapshot: &SnapshotStore,
    colored: bool,
) -> Result<CrawlStats> {
    let timer = PhaseTimer::start("crawl");

    let crawler = ListingCrawler::new(config.clone())?;
    let progress = Arc::new(CrawlProgress::with_color(crawler.facet_count(), colored));
    let crawler = crawler.with_progress(progress.clone());

    let records = crawler.crawl_records().await;
    progress.finish();
    let stats = progress.get_stats();

    if records.is_empty() {
        warn!("Crawl produced no records");
    }
    snapshot.write(&records)?;

    timer.finish(records.len());
    info!(
        "Fetched {} pages ({} skipped, {:.1}% ok, {:.1} pages/s)",
        stats.pages_fetched,
        stats.pages_skipped,
        stats.page_success_rate(),
        stats.pages_per_second()
    );

    Ok(stats)
}
