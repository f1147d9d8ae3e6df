mod analyzer;
mod config;
mod insights;
mod model;
mod normalizer;
mod parser;
mod scraper;
mod storage;
mod utils;

use crate::analyzer::{Analyzer, AnalyzerImpl};
use crate::config::{load_config_or_default, AppConfig};
use crate::insights::{format_money, InsightFormatter};
use crate::model::{ProductSnapshot, StorageError, TrackError};
use crate::normalizer::normalize_snapshot;
use crate::parser::{AmazonParser, Parser};
use crate::scraper::{HttpFetcher, PageFetcher};
use crate::storage::{HistoryStore, SqliteStorage};
use crate::utils::extract_product_id;
use chrono::Utc;
use clap::{Parser as _, Subcommand};
use futures::future::join_all;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(clap::Parser)]
#[command(name = "price-sniper", version, about = "Track product prices and get insights into their trends")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: String,

    /// Database path (overrides config)
    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the current price of one or more products and record it
    Track {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Show trend insights for a tracked product
    Insights { id: String },
    /// List all tracked products
    List,
    /// Print every recorded price of a product
    History { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {:?}", panic_info);
    }));

    let cli = Cli::parse();

    let mut config = match load_config_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let mut storage = match SqliteStorage::new(&config.db_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ok = match cli.command {
        Commands::Track { urls } => run_track(&urls, &mut storage, &config).await,
        Commands::Insights { id } => report(run_insights(&storage, &id, &config)),
        Commands::List => report(run_list(&storage)),
        Commands::History { id } => report(run_history(&storage, &id)),
    };

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn report(result: Result<(), StorageError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("Storage error: {}", e);
            println!("Error: {}", e);
            false
        }
    }
}

async fn run_track(urls: &[String], storage: &mut SqliteStorage, config: &AppConfig) -> bool {
    let fetcher = match HttpFetcher::new(config) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return false;
        }
    };
    let parser = AmazonParser::new(config.default_currency.clone());

    let mut all_ok = true;
    for result in track_urls(urls, &fetcher, &parser, storage).await {
        match result {
            Ok(snapshot) => {
                println!("Successfully tracked: {}", snapshot.title);
                println!("Current Price: {}", format_money(&snapshot.currency, snapshot.price));
                println!("ASIN: {}", snapshot.id);
            }
            Err(e) => {
                all_ok = false;
                println!("Failed to track product: {}", e);
            }
        }
    }
    all_ok
}

/// Fetches all pages concurrently, then records the snapshots one by one in
/// fetch-time order.
async fn track_urls(
    urls: &[String],
    fetcher: &dyn PageFetcher,
    parser: &AmazonParser,
    store: &mut dyn HistoryStore,
) -> Vec<Result<ProductSnapshot, TrackError>> {
    let mut fetched = join_all(urls.iter().map(|url| fetch_snapshot(url, fetcher, parser))).await;
    fetched.sort_by_key(|r| r.as_ref().ok().map(|s| s.timestamp));

    let mut results = Vec::with_capacity(fetched.len());
    for result in fetched {
        let recorded = match result {
            Ok(snapshot) => record_snapshot(store, &snapshot).map(|_| snapshot),
            Err(e) => Err(e),
        };
        if let Err(e) = &recorded {
            warn!("Track failed: {}", e);
        }
        results.push(recorded);
    }
    results
}

async fn fetch_snapshot(
    url: &str,
    fetcher: &dyn PageFetcher,
    parser: &AmazonParser,
) -> Result<ProductSnapshot, TrackError> {
    let id = extract_product_id(url).ok_or_else(|| TrackError::InvalidUrl(url.to_string()))?;

    info!("Fetching price data for {}...", url);
    let html = fetcher.fetch(url).await?;

    info!("Parsing product page for {}...", id);
    let mut snapshot = parser.parse(&html, &id, url, Utc::now())?;
    normalize_snapshot(&mut snapshot);
    Ok(snapshot)
}

fn record_snapshot(store: &mut dyn HistoryStore, snapshot: &ProductSnapshot) -> Result<(), TrackError> {
    store.append(&snapshot.id, snapshot.observation(), &snapshot.title, &snapshot.url)?;
    Ok(())
}

fn run_insights(store: &dyn HistoryStore, id: &str, config: &AppConfig) -> Result<(), StorageError> {
    let outcome = AnalyzerImpl::new().analyze(store, id)?;
    let formatter = InsightFormatter::with_threshold(config.wait_threshold_percent);
    let ruler = "=".repeat(60);
    println!("\n{}", ruler);
    println!("{}", formatter.format(&outcome));
    println!("{}", ruler);
    Ok(())
}

fn run_list(store: &dyn HistoryStore) -> Result<(), StorageError> {
    let mut ids: Vec<String> = store.list_identifiers()?.into_iter().collect();
    if ids.is_empty() {
        println!("No products are currently being tracked.");
        return Ok(());
    }
    ids.sort();

    println!("Tracking {} product(s):", ids.len());
    for id in ids {
        if let Some(history) = store.get(&id)? {
            println!("  - {}: {}", id, history.title);
        }
    }
    Ok(())
}

fn run_history(store: &dyn HistoryStore, id: &str) -> Result<(), StorageError> {
    let Some(history) = store.get(id)? else {
        println!("No price history found for {}.", id);
        return Ok(());
    };

    println!("{} ({})", history.title, history.id);
    println!("Source: {}", history.source_url);
    for observation in &history.observations {
        println!(
            "  {}  {}",
            observation.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            format_money(&observation.currency, observation.price)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParserError, ScraperError};
    use std::collections::HashMap;

    struct StubFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait::async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or(ScraperError::InvalidResponse(404))
        }
    }

    fn page(title: &str, price: &str) -> String {
        format!(
            r#"<span id="productTitle"> {} </span><span class="a-offscreen">{}</span>"#,
            title, price
        )
    }

    fn stub(pages: &[(&str, String)]) -> StubFetcher {
        StubFetcher {
            pages: pages
                .iter()
                .map(|(url, html)| (url.to_string(), html.clone()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn track_records_each_fetched_product() {
        let a = "https://www.amazon.com/dp/B000000001";
        let b = "https://www.amazon.com/gp/product/B000000002/ref=x";
        let fetcher = stub(&[(a, page("Desk   Lamp", "$24.99")), (b, page("Chair", "$120.00"))]);
        let parser = AmazonParser::new("USD");
        let mut store = SqliteStorage::open_in_memory().unwrap();

        let results = track_urls(&[a.to_string(), b.to_string()], &fetcher, &parser, &mut store).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let lamp = store.get("B000000001").unwrap().unwrap();
        assert_eq!(lamp.title, "Desk Lamp");
        assert_eq!(lamp.source_url, a);
        assert_eq!(lamp.prices(), vec![24.99]);
        assert_eq!(store.list_identifiers().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn repeated_tracking_grows_history() {
        let url = "https://www.amazon.com/dp/B000000003";
        let parser = AmazonParser::new("USD");
        let mut store = SqliteStorage::open_in_memory().unwrap();

        for (title, price) in [("Mug", "$10.00"), ("Mug v2", "$8.50")] {
            let fetcher = stub(&[(url, page(title, price))]);
            let results = track_urls(&[url.to_string()], &fetcher, &parser, &mut store).await;
            assert!(results[0].is_ok());
        }

        let history = store.get("B000000003").unwrap().unwrap();
        assert_eq!(history.prices(), vec![10.0, 8.5]);
        assert_eq!(history.title, "Mug v2");
    }

    #[tokio::test]
    async fn failures_are_reported_and_not_stored() {
        let bad_url = "https://www.amazon.com/";
        let missing = "https://www.amazon.com/dp/B000000004";
        let no_price = "https://www.amazon.com/dp/B000000005";
        let fetcher = stub(&[(no_price, "<span id=\"productTitle\">Gone</span>".to_string())]);
        let parser = AmazonParser::new("USD");
        let mut store = SqliteStorage::open_in_memory().unwrap();

        let urls = [bad_url.to_string(), missing.to_string(), no_price.to_string()];
        let results = track_urls(&urls, &fetcher, &parser, &mut store).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_err()));
        assert!(results.iter().any(|r| matches!(r, Err(TrackError::InvalidUrl(_)))));
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(TrackError::Scraper(ScraperError::InvalidResponse(404))))));
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(TrackError::Parser(ParserError::MissingField(_))))));
        assert!(store.list_identifiers().unwrap().is_empty());
    }

    #[test]
    fn commands_handle_unknown_products() {
        let store = SqliteStorage::open_in_memory().unwrap();
        let config = AppConfig::default();
        assert!(run_insights(&store, "NOPE", &config).is_ok());
        assert!(run_history(&store, "NOPE").is_ok());
        assert!(run_list(&store).is_ok());
    }
}
