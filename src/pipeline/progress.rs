// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for listing crawls
// reference: uses indicatif for progress bars and tracks page metrics

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    pub facets_completed: usize,
    pub pages_fetched: usize,
    pub pages_skipped: usize,
    pub records_collected: usize,
    pub duration_secs: u64,
}

impl CrawlStats {
    pub fn pages_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.pages_fetched as f64 / self.duration_secs as f64
    }

    pub fn page_success_rate(&self) -> f64 {
        let total = self.pages_fetched + self.pages_skipped;
        if total == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / total as f64) * 100.0
    }
}

/// Shared between concurrently crawled facets; every counter is atomic.
pub struct CrawlProgress {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    facets_completed: Arc<AtomicUsize>,
    pages_fetched: Arc<AtomicUsize>,
    pages_skipped: Arc<AtomicUsize>,
    records_collected: Arc<AtomicUsize>,
    start_time: Instant,
}

impl CrawlProgress {
    pub fn with_color(total_facets: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();
        Self::build(multi_progress, total_facets, colored)
    }

    /// Counts without drawing anything.
    pub fn hidden(total_facets: usize) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        Self::build(multi_progress, total_facets, false)
    }

    fn build(multi_progress: MultiProgress, total_facets: usize, colored: bool) -> Self {
        let main_bar = create_progress_bar(&multi_progress, total_facets as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            facets_completed: Arc::new(AtomicUsize::new(0)),
            pages_fetched: Arc::new(AtomicUsize::new(0)),
            pages_skipped: Arc::new(AtomicUsize::new(0)),
            records_collected: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_page_fetched(&self, records: usize) {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);
        self.records_collected.fetch_add(records, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn inc_page_skipped(&self) {
        self.pages_skipped.fetch_add(1, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn finish_facet(&self, name: &str) {
        self.facets_completed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.main_bar.set_message(format!("{name} done"));
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Crawl complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> CrawlStats {
        CrawlStats {
            facets_completed: self.facets_completed.load(Ordering::SeqCst),
            pages_fetched: self.pages_fetched.load(Ordering::SeqCst),
            pages_skipped: self.pages_skipped.load(Ordering::SeqCst),
            records_collected: self.records_collected.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let pages = self.pages_fetched.load(Ordering::SeqCst);
        let skipped = self.pages_skipped.load(Ordering::SeqCst);
        let records = self.records_collected.load(Ordering::SeqCst);

        self.detail_bar.set_message(format!(
            "Pages: {} | Skipped: {} | Records: {}",
            pages, skipped, records
        ));
    }
}

impl Drop for CrawlProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let style = if colored {
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} facets {msg}",
            )
            .map(|style| style.progress_chars("█▓▒░"))
    } else {
        ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} facets {msg}")
            .map(|style| style.progress_chars("=>-"))
    };
    bar.set_style(style.unwrap_or_else(|_| ProgressStyle::default_bar()));
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_stats_calculations() {
        let mut stats = CrawlStats::default();
        stats.pages_fetched = 90;
        stats.pages_skipped = 10;
        stats.duration_secs = 10;

        assert_eq!(stats.pages_per_second(), 9.0);
        assert!((stats.page_success_rate() - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_crawl_stats_zero_duration() {
        let stats = CrawlStats::default();
        assert_eq!(stats.pages_per_second(), 0.0);
        assert_eq!(stats.page_success_rate(), 0.0);
    }

    #[test]
    fn test_progress_counts() {
        let progress = CrawlProgress::hidden(7);

        progress.inc_page_fetched(30);
        progress.inc_page_fetched(12);
        progress.inc_page_skipped();
        progress.finish_facet("free_regular");

        let stats = progress.get_stats();
        assert_eq!(stats.pages_fetched, 2);
        assert_eq!(stats.pages_skipped, 1);
        assert_eq!(stats.records_collected, 42);
        assert_eq!(stats.facets_completed, 1);
    }
}
