// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use novel_sync::utils::logging::{format_field, format_info, format_success, format_warning};
use novel_sync::{
    Config, HealthCheck, HealthReport, NovelDbClient, NovelRecord, Reconciler, RunReport,
    SchemaManager, SnapshotStore, Validator, crawl_to_snapshot,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "novel_sync")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Crawls web novel listings and reconciles them into SQLite", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml",
        env = "NOVEL_SYNC_CONFIG"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every listing facet and write the snapshot file
    Crawl {
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Reconcile a snapshot file into the novel table
    Reconcile {
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Crawl, write the snapshot, then reconcile it
    Run,

    Verify {
        #[arg(long)]
        create_schema: bool,
    },

    Stats,

    /// Print the first and last rows by id
    Show {
        #[arg(short, long, default_value_t = 5)]
        limit: u32,
    },

    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    novel_sync::utils::logging::init_logger(cli.color, cli.verbose);

    info!("Novel listing sync");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        let config = Config::default_config();
        config.validate().context("Built-in configuration is invalid")?;
        config
    };

    match cli.command {
        Commands::Crawl { output } => {
            cmd_crawl(&config, output, cli.color).await?;
        }
        Commands::Reconcile { input } => {
            cmd_reconcile(&config, input).await?;
        }
        Commands::Run => {
            cmd_crawl(&config, None, cli.color).await?;
            cmd_reconcile(&config, None).await?;
        }
        Commands::Verify { create_schema } => {
            cmd_verify(&config, create_schema).await?;
        }
        Commands::Stats => {
            cmd_stats(&config).await?;
        }
        Commands::Show { limit } => {
            cmd_show(&config, limit).await?;
        }
        Commands::Reset { confirm } => {
            cmd_reset(&config, confirm).await?;
        }
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<NovelDbClient> {
    NovelDbClient::new(config.database.clone())
        .await
        .context("Failed to open SQLite database")
}

async fn cmd_crawl(config: &Config, output: Option<PathBuf>, colored: bool) -> Result<()> {
    let path = output.unwrap_or_else(|| config.pipeline.snapshot_path.clone());
    let snapshot = SnapshotStore::new(path);

    let stats = crawl_to_snapshot(&config.crawler, &snapshot, colored)
        .await
        .context("Crawl failed")?;

    println!(
        "{}",
        format_success(&format!(
            "Crawled {} records into {}",
            stats.records_collected,
            snapshot.path().display()
        ))
    );
    if stats.pages_skipped > 0 {
        println!(
            "{}",
            format_warning(&format!("{} pages were skipped", stats.pages_skipped))
        );
    }

    Ok(())
}

async fn cmd_reconcile(config: &Config, input: Option<PathBuf>) -> Result<()> {
    let path = input.unwrap_or_else(|| config.pipeline.snapshot_path.clone());
    let snapshot = SnapshotStore::new(path);

    let reconciler = Reconciler::new(config.clone())
        .await
        .context("Failed to set up reconciliation")?;

    let report = reconciler
        .reconcile_snapshot(&snapshot)
        .await
        .context("Reconciliation failed; no changes were applied")?;

    report.log_summary();
    print_run_report(&report);

    reconciler.client().close().await;
    Ok(())
}

fn print_run_report(report: &RunReport) {
    println!("{}", format_success("Reconciliation committed"));
    println!("{}", format_field("Received", report.received));
    println!("{}", format_field("Rejected", report.rejected));
    println!("{}", format_field("Inserted", report.inserted));
    println!("{}", format_field("Updated", report.updated));
    println!("{}", format_field("Unchanged", report.unchanged));
    if let Some(path) = &report.change_log_path {
        println!("{}", format_field("Change log", path.display()));
    }
}

async fn cmd_verify(config: &Config, create_schema: bool) -> Result<()> {
    info!("Verifying database schema");

    let client = connect(config).await?;
    let schema_manager = SchemaManager::new(&client);

    let connection = HealthCheck::probe("sqlite", "ping returned an unexpected value", async {
        client.ping().await
    })
    .await;
    let schema = HealthCheck::probe(
        &format!("table {}", client.table_name()),
        "table is missing",
        schema_manager.verify_schema(),
    )
    .await;

    let report = HealthReport::new(
        vec![connection, schema],
        env!("CARGO_PKG_VERSION").to_string(),
    );
    println!("{}", report.format());

    if !report.is_healthy() {
        if create_schema {
            info!("Creating schema");
            schema_manager
                .initialize()
                .await
                .context("Failed to create schema")?;
            println!("{}", format_success("Schema created"));
        } else {
            println!("{}", format_info("Use --create-schema to create the table"));
        }
    }

    client.close().await;
    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    let client = connect(config).await?;

    let rows = client.count_rows().await.context("Failed to count rows")?;

    println!("{}", format_info("Database contains:"));
    println!("{}", format_field("Table", client.table_name()));
    println!("{}", format_field("Novels", rows));

    client.close().await;
    Ok(())
}

async fn cmd_show(config: &Config, limit: u32) -> Result<()> {
    let client = connect(config).await?;

    if !client.table_exists(client.table_name()).await? {
        println!("{}", format_warning("Table does not exist yet"));
        return Ok(());
    }

    let first = client.fetch_first(limit).await.context("Failed to read rows")?;
    let last = client.fetch_last(limit).await.context("Failed to read rows")?;

    println!("{}", format_info(&format!("First {} rows", first.len())));
    for row in &first {
        println!("{}", describe_row(row));
    }
    println!("{}", format_info(&format!("Last {} rows", last.len())));
    for row in &last {
        println!("{}", describe_row(row));
    }

    client.close().await;
    Ok(())
}

fn describe_row(row: &NovelRecord) -> String {
    format!(
        "  {:>10}  {}  by {}  views={} chapters={}  crawled {}",
        row.id,
        Validator::truncate_text(row.title.as_deref().unwrap_or("-"), 40),
        row.author.as_deref().unwrap_or("-"),
        row.views,
        row.chapter,
        row.crawltime
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    )
}

async fn cmd_reset(config: &Config, confirm: bool) -> Result<()> {
    if !confirm {
        error!("This will delete all data. Use --confirm to proceed");
        return Ok(());
    }

    warn!("Resetting database - all data will be lost");

    let client = connect(config).await?;

    let schema_manager = SchemaManager::new(&client);
    schema_manager
        .drop_all_tables()
        .await
        .context("Failed to drop table")?;

    schema_manager
        .initialize()
        .await
        .context("Failed to recreate schema")?;

    info!("Schema recreated - database reset complete");
    client.close().await;

    Ok(())
}
