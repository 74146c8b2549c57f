// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// SQLite refuses statements with more bind parameters than this.
pub const SQLITE_MAX_BIND_PARAMS: usize = 32_766;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    pub base_url: String,
    pub platform: String,
    pub rows_per_page: u32,
    pub max_pages: u32,
    pub parallel_facets: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub rate_limit_wait_min_secs: u64,
    pub rate_limit_wait_max_secs: u64,
    pub max_rate_limit_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub table_name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Rows per bulk statement when applying inserts and updates.
    pub chunk_size: usize,
    pub snapshot_path: PathBuf,
    pub change_log_dir: PathBuf,
    /// Offset applied to listing timestamps that carry no zone of their own.
    #[serde(default = "default_source_offset")]
    pub source_utc_offset_hours: i32,
}

fn default_source_offset() -> i32 {
    9
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("NOVEL_SYNC")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            crawler: CrawlerConfig {
                base_url: "https://mm.munpia.com".to_string(),
                platform: "Munpia".to_string(),
                rows_per_page: 30,
                max_pages: 100_000,
                parallel_facets: 4,
                request_timeout_secs: 30,
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36"
                    .to_string(),
                rate_limit_wait_min_secs: 5,
                rate_limit_wait_max_secs: 10,
                max_rate_limit_retries: 20,
            },
            database: DatabaseConfig {
                url: "sqlite://data/munpia_novel.db?mode=rwc".to_string(),
                table_name: "novel".to_string(),
                max_connections: 4,
            },
            pipeline: PipelineConfig {
                chunk_size: 1000,
                snapshot_path: PathBuf::from("data/munpia_novel_info.json"),
                change_log_dir: PathBuf::from("change_logs"),
                source_utc_offset_hours: default_source_offset(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        crate::utils::Validator::validate_chunk_size(self.pipeline.chunk_size)
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        crate::utils::Validator::validate_table_name(&self.database.table_name)
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        crate::utils::Validator::validate_url(&self.crawler.base_url)
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if self.crawler.parallel_facets == 0 {
            return Err(PipelineError::Config(
                "parallel_facets must be greater than 0".to_string(),
            ));
        }

        if self.crawler.rows_per_page == 0 {
            return Err(PipelineError::Config(
                "rows_per_page must be greater than 0".to_string(),
            ));
        }

        if self.crawler.rate_limit_wait_min_secs > self.crawler.rate_limit_wait_max_secs {
            return Err(PipelineError::Config(format!(
                "rate_limit_wait_min_secs ({}) exceeds rate_limit_wait_max_secs ({})",
                self.crawler.rate_limit_wait_min_secs, self.crawler.rate_limit_wait_max_secs
            )));
        }

        if self.database.max_connections == 0 {
            return Err(PipelineError::Config(
                "max_connections must be greater than 0".to_string(),
            ));
        }

        if !(-12..=14).contains(&self.pipeline.source_utc_offset_hours) {
            return Err(PipelineError::Config(format!(
                "source_utc_offset_hours out of range: {}",
                self.pipeline.source_utc_offset_hours
            )));
        }

        Ok(())
    }
}
