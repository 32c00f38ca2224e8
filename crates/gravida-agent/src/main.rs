//! Gravida: pregnancy drug-safety acquisition pipeline.
//! Entry point for the `gravida` binary.
//!
//! Usage:
//!   gravida run                  scrape the configured medication list
//!   gravida catalog [--limit N]  crawl the drugs.com pregnancy catalog
//!   gravida validate             report completeness of the stored records

mod config;

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gravida_db::{Database, MedicationRepository, SqliteMedicationRepository, ValidationReport};
use gravida_ingestion::fetch::{ConnectionLimiter, ReqwestTransport};
use gravida_ingestion::{Fetcher, Orchestrator};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Run,
    Catalog { limit: Option<usize> },
    Validate,
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    match args.first().map(String::as_str) {
        None | Some("run") => Ok(Command::Run),
        Some("validate") => Ok(Command::Validate),
        Some("catalog") => {
            let limit = match args.get(1).map(String::as_str) {
                None => None,
                Some("--limit") => {
                    let value = args.get(2).context("--limit needs a value")?;
                    Some(value.parse().with_context(|| format!("invalid --limit: {value}"))?)
                }
                Some(other) => bail!("unexpected argument: {other}"),
            };
            Ok(Command::Catalog { limit })
        }
        Some(other) => bail!("unknown command: {other} (expected run, catalog or validate)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gravida=debug,info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    info!("Gravida starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load()?;
    info!(
        "Configuration loaded. Database: {}, sources: {:?}, min confidence: {}",
        config.database.path, config.sources.enabled, config.consolidation.min_confidence
    );

    let db = Database::open(&config.database.path)
        .with_context(|| format!("opening database {}", config.database.path))?;
    let repo = Arc::new(SqliteMedicationRepository::new(db));
    info!("Database ready: {} records stored.", repo.count().await?);

    if command == Command::Validate {
        let records = repo.read_all().await?;
        println!("{}", ValidationReport::from_records(&records));
        return Ok(());
    }

    let transport = ReqwestTransport::new(config.fetch.timeout(), config.fetch.max_connections_per_host)?;
    let limiter = ConnectionLimiter::new(config.fetch.max_connections, config.fetch.max_connections_per_host);
    let fetcher = Fetcher::new(Arc::new(transport), config.fetch.policy(), limiter);

    let orchestrator = Orchestrator::with_sources(
        &fetcher,
        &config.sources.enabled,
        repo.clone(),
        config.consolidation_policy(),
        config.pacing.policy(),
    );

    let summary = match command {
        Command::Catalog { limit } => orchestrator.run_catalog(limit).await,
        _ => {
            let queries = config.queries(&orchestrator.source_order());
            if queries.iter().all(|q| q.sources.is_empty()) {
                warn!("No per-medication source enabled; nothing to do.");
            }
            orchestrator.run(&queries).await
        }
    };

    println!("{summary}");
    for error in &summary.errors {
        warn!("{error}");
    }
    info!("Database now holds {} records.", repo.count().await?);
    Ok(())
}
