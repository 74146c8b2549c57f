// file: src/crawler/client.rs
// description: paginated listing crawler with 429 backoff
// reference: https://docs.rs/reqwest

use crate::config::CrawlerConfig;
use crate::crawler::facets::{LISTING_FACETS, ListingFacet};
use crate::crawler::listing::{ListingResponse, map_listing_item};
use crate::error::{PipelineError, Result};
use crate::models::RawRecord;
use crate::pipeline::CrawlProgress;
use futures::stream::{self, StreamExt};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What one facet produced. Facets return their records instead of pushing
/// into a shared list.
#[derive(Debug, Clone, Default)]
pub struct FacetReport {
    pub facet: &'static str,
    pub records: Vec<RawRecord>,
    pub pages_fetched: u32,
    pub pages_skipped: u32,
}

enum PageOutcome {
    Items(Vec<Value>),
    Skipped,
}

pub struct ListingCrawler {
    client: Client,
    config: CrawlerConfig,
    facets: Vec<ListingFacet>,
    progress: Option<Arc<CrawlProgress>>,
}

impl ListingCrawler {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        Self::with_facets(config, LISTING_FACETS.to_vec())
    }

    pub fn with_facets(config: CrawlerConfig, facets: Vec<ListingFacet>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| PipelineError::Config(format!("Invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, user_agent);
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PipelineError::Crawl(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            facets,
            progress: None,
        })
    }

    pub fn with_progress(mut self, progress: Arc<CrawlProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    /// Crawls every facet, at most `parallel_facets` at a time, and returns
    /// the reports in completion order.
    pub async fn crawl(&self) -> Vec<FacetReport> {
        info!(
            "Crawling {} facets with {} in parallel",
            self.facets.len(),
            self.config.parallel_facets
        );

        let reports: Vec<FacetReport> = stream::iter(self.facets.iter())
            .map(|facet| self.crawl_facet(facet))
            .buffer_unordered(self.config.parallel_facets.max(1))
            .collect()
            .await;

        let total: usize = reports.iter().map(|r| r.records.len()).sum();
        info!("Crawl collected {} records", total);
        reports
    }

    /// Convenience over [`crawl`](Self::crawl) that flattens all records.
    pub async fn crawl_records(&self) -> Vec<RawRecord> {
        self.crawl()
            .await
            .into_iter()
            .flat_map(|report| report.records)
            .collect()
    }

    async fn crawl_facet(&self, facet: &ListingFacet) -> FacetReport {
        let mut report = FacetReport {
            facet: facet.name,
            ..FacetReport::default()
        };

        for page in 1..=self.config.max_pages {
            match self.fetch_page(facet, page).await {
                PageOutcome::Items(items) if items.is_empty() => {
                    debug!("{}: last page reached at {}", facet.name, page);
                    break;
                }
                PageOutcome::Items(items) => {
                    let before = report.records.len();
                    report.records.extend(
                        items
                            .iter()
                            .filter_map(|item| map_listing_item(item, &self.config.platform)),
                    );
                    report.pages_fetched += 1;

                    let added = report.records.len() - before;
                    debug!("{}: page {} gave {} records", facet.name, page, added);
                    if let Some(progress) = &self.progress {
                        progress.inc_page_fetched(added);
                    }
                }
                PageOutcome::Skipped => {
                    report.pages_skipped += 1;
                    if let Some(progress) = &self.progress {
                        progress.inc_page_skipped();
                    }
                }
            }
        }

        info!(
            "{}: {} records from {} pages ({} skipped)",
            facet.name,
            report.records.len(),
            report.pages_fetched,
            report.pages_skipped
        );
        if let Some(progress) = &self.progress {
            progress.finish_facet(facet.name);
        }

        report
    }

    async fn fetch_page(&self, facet: &ListingFacet, page: u32) -> PageOutcome {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), facet.path);
        let paging = [
            ("page", page.to_string()),
            ("rows", self.config.rows_per_page.to_string()),
        ];
        let mut rate_limited = 0u32;

        loop {
            let response = match self
                .client
                .get(&url)
                .query(facet.query)
                .query(&paging)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("{}: page {} request failed: {}", facet.name, page, e);
                    return PageOutcome::Skipped;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if rate_limited >= self.config.max_rate_limit_retries {
                    warn!(
                        "{}: page {} still rate limited after {} retries, skipping",
                        facet.name, page, rate_limited
                    );
                    return PageOutcome::Skipped;
                }
                rate_limited += 1;

                let wait_secs = rand::thread_rng().gen_range(
                    self.config.rate_limit_wait_min_secs..=self.config.rate_limit_wait_max_secs,
                );
                warn!(
                    "{}: HTTP 429 on page {}, retrying in {}s",
                    facet.name, page, wait_secs
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if status != StatusCode::OK {
                warn!("{}: HTTP {} on page {}, skipping", facet.name, status, page);
                return PageOutcome::Skipped;
            }

            return match response.json::<ListingResponse>().await {
                Ok(body) => PageOutcome::Items(body.content.list),
                Err(e) => {
                    warn!("{}: page {} has an unexpected body: {}", facet.name, page, e);
                    PageOutcome::Skipped
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_FACET: ListingFacet = ListingFacet {
        name: "test_facet",
        path: "/free/getList",
        query: &[("tab", "regular")],
    };

    fn config(base_url: &str) -> CrawlerConfig {
        CrawlerConfig {
            base_url: base_url.to_string(),
            platform: "Munpia".to_string(),
            rows_per_page: 2,
            max_pages: 10,
            parallel_facets: 2,
            request_timeout_secs: 5,
            user_agent: "novel-sync-test".to_string(),
            rate_limit_wait_min_secs: 0,
            rate_limit_wait_max_secs: 0,
            max_rate_limit_retries: 2,
        }
    }

    fn page_body(ids: &[i64]) -> serde_json::Value {
        let list: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| json!({"nvSrl": id, "title": format!("novel {id}"), "updateDate": "-"}))
            .collect();
        json!({"content": {"list": list}})
    }

    async fn mount_page(server: &MockServer, page: &str, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/free/getList"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_pages_until_empty_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/free/getList"))
            .and(query_param("tab", "regular"))
            .and(query_param("rows", "2"))
            .and(query_param("page", "1"))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[1, 2])))
            .mount(&server)
            .await;
        mount_page(&server, "2", 200, page_body(&[3])).await;
        mount_page(&server, "3", 200, page_body(&[])).await;

        let crawler = ListingCrawler::with_facets(config(&server.uri()), vec![TEST_FACET]).unwrap();
        let reports = crawler.crawl().await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].pages_fetched, 2);
        let ids: Vec<serde_json::Value> = reports[0].records.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(reports[0].records[0]["href"], json!("https://novel.munpia.com/1"));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_rate_limited_page_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/free/getList"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        mount_page(&server, "1", 200, page_body(&[7])).await;
        mount_page(&server, "2", 200, page_body(&[])).await;

        let crawler = ListingCrawler::with_facets(config(&server.uri()), vec![TEST_FACET]).unwrap();
        let records = crawler.crawl_records().await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], json!(7));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_server_error_skips_page() {
        let server = MockServer::start().await;

        mount_page(&server, "1", 500, json!({})).await;
        mount_page(&server, "2", 200, page_body(&[4, 5])).await;
        mount_page(&server, "3", 200, page_body(&[])).await;

        let crawler = ListingCrawler::with_facets(config(&server.uri()), vec![TEST_FACET]).unwrap();
        let reports = crawler.crawl().await;

        assert_eq!(reports[0].pages_skipped, 1);
        assert_eq!(reports[0].pages_fetched, 1);
        assert_eq!(reports[0].records.len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit_retries_skip_and_cap_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/free/getList"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let mut config = config(&server.uri());
        config.max_pages = 3;
        let progress = Arc::new(CrawlProgress::hidden(1));
        let crawler = ListingCrawler::with_facets(config, vec![TEST_FACET])
            .unwrap()
            .with_progress(progress.clone());

        let reports = crawler.crawl().await;

        assert!(reports[0].records.is_empty());
        assert_eq!(reports[0].pages_skipped, 3);
        // one attempt plus two retries per page
        assert_eq!(server.received_requests().await.unwrap().len(), 9);

        let stats = progress.get_stats();
        assert_eq!(stats.pages_skipped, 3);
        assert_eq!(stats.facets_completed, 1);
    }

    #[tokio::test]
    async fn test_facets_crawled_independently() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pl/getList"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[100])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pl/getList"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[])))
            .mount(&server)
            .await;
        mount_page(&server, "1", 200, page_body(&[200, 201])).await;
        mount_page(&server, "2", 200, page_body(&[])).await;

        let paid = ListingFacet {
            name: "paid",
            path: "/pl/getList",
            query: &[("tab", "new")],
        };
        let crawler =
            ListingCrawler::with_facets(config(&server.uri()), vec![paid, TEST_FACET]).unwrap();

        let mut reports = crawler.crawl().await;
        reports.sort_by_key(|r| r.facet);

        assert_eq!(reports[0].facet, "paid");
        assert_eq!(reports[0].records.len(), 1);
        assert_eq!(reports[1].facet, "test_facet");
        assert_eq!(reports[1].records.len(), 2);
    }
}
