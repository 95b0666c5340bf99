use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures_util::future::join_all;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soflex_credit::config::{Config, Logging, StorageBackend};
use soflex_credit::{
    Address, CreditScoreService, LedgerHistoryClient, MemoryScoreRepository, RetryingHistoryClient,
    ScoreReport, ScoreRepository, ScoringError, ShyftHistoryClient, SqliteScoreRepository,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "soflex-credit", version, about = "On-chain credit scores for Solana wallets")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute and store credit scores for one or more wallets
    Score {
        /// Wallet addresses to score
        #[arg(required = true)]
        addresses: Vec<String>,

        /// Transactions sampled per wallet (overrides ledger.tx_num)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Print one JSON object per wallet
        #[arg(long)]
        json: bool,
    },
    /// Show the last stored score for a wallet
    Show { address: String },
}

fn init_tracing(logging: &Logging) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.directory)
        .with_context(|| format!("failed to create log directory {}", logging.directory))?;

    let file_appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_prefix);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level)),
        )
        .init();

    Ok(guard)
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load_from_file(DEFAULT_CONFIG_PATH)?,
        None => Config::default(),
    };
    config.apply_env();
    Ok(config)
}

async fn open_repository(config: &Config) -> Result<Arc<dyn ScoreRepository>> {
    let repository: Arc<dyn ScoreRepository> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(
            SqliteScoreRepository::connect(&config.storage.database_url)
                .await
                .context("failed to open score database")?,
        ),
        StorageBackend::Memory => {
            warn!("Using in-memory score storage; scores are lost on exit");
            Arc::new(MemoryScoreRepository::new())
        }
    };
    Ok(repository)
}

fn build_ledger(config: &Config) -> Result<Arc<dyn LedgerHistoryClient>> {
    let client = ShyftHistoryClient::new(config.ledger.client_config())
        .context("failed to create ledger history client")?;
    Ok(Arc::new(RetryingHistoryClient::new(client, config.retry.clone())))
}

/// Drops repeated addresses while keeping first-seen order
fn dedup_addresses(addresses: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    addresses
        .into_iter()
        .filter(|address| seen.insert(address.trim().to_string()))
        .collect()
}

fn print_result(address: &str, result: &Result<ScoreReport, ScoringError>, json: bool) {
    match (result, json) {
        (Ok(report), true) => match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(e) => println!("{}", serde_json::json!({ "address": address, "error": e.to_string() })),
        },
        (Err(e), true) => {
            println!("{}", serde_json::json!({ "address": address, "error": e.to_string() }));
        }
        (Ok(report), false) => {
            let note = match &report.persist_failure {
                Some(e) => format!(" ({})", e).yellow().to_string(),
                None => String::new(),
            };
            println!(
                "{} {} [sent {}, received {}]{}",
                address.bold(),
                report.score.to_string().green(),
                report.counts.sent,
                report.counts.received,
                note
            );
        }
        (Err(e), false) => {
            let hint = if e.is_retryable() { " (transient, try again)" } else { "" };
            println!("{} {}{}", address.bold(), e.to_string().red(), hint);
        }
    }
}

async fn run_score(config: Config, addresses: Vec<String>, limit: Option<u32>, json: bool) -> Result<()> {
    let mut config = config;
    if let Some(limit) = limit {
        config.ledger.tx_num = limit;
    }
    config.validate()?;

    let service = CreditScoreService::new(build_ledger(&config)?, open_repository(&config).await?)
        .with_tx_num(config.ledger.tx_num);

    let addresses = dedup_addresses(addresses);
    info!("🔍 Scoring {} wallet(s) with {} sampled transaction(s) each", addresses.len(), service.tx_num());

    let scoring = join_all(addresses.iter().map(|address| service.score_address(address)));
    let results = tokio::select! {
        results = scoring => results,
        _ = signal::ctrl_c() => {
            warn!("🛑 Interrupted; in-flight scoring cancelled");
            bail!("interrupted");
        }
    };

    let mut failures = 0;
    let mut unsaved = 0;
    for (address, result) in addresses.iter().zip(results.iter()) {
        match result {
            Err(_) => failures += 1,
            Ok(report) if !report.persisted() => unsaved += 1,
            Ok(_) => {}
        }
        print_result(address, result, json);
    }

    if failures > 0 {
        bail!("{} of {} wallet(s) could not be scored", failures, addresses.len());
    }
    if unsaved > 0 {
        bail!("{} of {} score(s) computed but not stored", unsaved, addresses.len());
    }
    Ok(())
}

async fn run_show(config: Config, address: String) -> Result<()> {
    let address = Address::new(&address)?;
    let repository = open_repository(&config).await?;

    match repository.get_score(&address).await? {
        Some(stored) => println!(
            "{} {:.2} (updated {})",
            stored.wallet_address.bold(),
            stored.on_chain_credit_score,
            stored.updated_at.to_rfc3339()
        ),
        None => println!("{} {}", address.as_str().bold(), "no stored score".dimmed()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let _guard = init_tracing(&config.logging)?;

    let result = match cli.command {
        Command::Score { addresses, limit, json } => run_score(config, addresses, limit, json).await,
        Command::Show { address } => run_show(config, address).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
