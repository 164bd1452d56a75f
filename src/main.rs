//! dealwatch: polite e-commerce price tracking and deal notification
//!
//! Thin CLI wiring; every decision lives in the library.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dealwatch::{
    config::{Config, LogFormat},
    fetch::PoliteFetcher,
    notify::NullNotifier,
    scheduler::CycleRunner,
    search::SearchEngine,
    store::{MemoryStore, Store},
    types::Platform,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dealwatch")]
#[command(about = "Polite marketplace price tracking and deal alerts")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "dealwatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the recheck scheduler until interrupted
    Start,

    /// Search a marketplace once and print the ranked candidates
    Search {
        /// Marketplace to search (jiji)
        platform: Platform,

        /// Free-text query
        query: String,

        /// Location slug, e.g. "lagos"
        #[arg(short, long)]
        location: Option<String>,

        /// Price ceiling
        #[arg(short, long)]
        max_price: Option<f64>,

        /// Result limit (1-100)
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Track a product URL and check it once
    Check {
        /// Marketplace the URL belongs to
        platform: Platform,

        /// Product page URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    init_logging(&config);

    let fetcher = Arc::new(PoliteFetcher::new(&config.fetch, &config.retry)?);
    let engine = SearchEngine::new(fetcher.clone(), config.search.clone());
    let store = Arc::new(MemoryStore::new());
    let runner = CycleRunner::new(
        config.scheduler.clone(),
        store.clone(),
        fetcher,
        engine,
        Arc::new(NullNotifier),
    );

    match cli.command {
        Commands::Start => {
            let runner = Arc::new(runner);
            let handle = runner.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    handle.shutdown();
                }
            });
            runner.run().await
        }

        Commands::Search {
            platform,
            query,
            location,
            max_price,
            limit,
            format,
        } => {
            let request = runner
                .create_search_request(
                    "cli",
                    platform,
                    &query,
                    location,
                    max_price,
                    Some(limit),
                )
                .await?;
            runner.process_one_request(&request).await?;

            let Some(resolved) = store.find_search_request(&request.id).await? else {
                anyhow::bail!("search request vanished");
            };

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                println!("status: {:?}", resolved.status);
                if let Some(reason) = resolved.blocked_reason.or(resolved.error_message) {
                    println!("reason: {}", reason);
                }
                for (i, c) in resolved.results.iter().enumerate() {
                    println!(
                        "{:>3}. {}  {}  {}",
                        i + 1,
                        c.price
                            .map(|p| format!("{} {:.0}", c.currency, p))
                            .unwrap_or_else(|| "?".to_string()),
                        c.title.as_deref().unwrap_or("(untitled)"),
                        c.url
                    );
                }
            }
            Ok(())
        }

        Commands::Check { platform, url } => {
            let item = runner.track_item("cli", platform, &url).await?;
            runner.force_recheck(&item.id).await?;

            let Some(item) = store.find_item(&item.id).await? else {
                anyhow::bail!("tracked item vanished");
            };
            println!("status:   {}", item.status);
            if let Some(reason) = &item.blocked_reason {
                println!("reason:   {}", reason);
            }
            if let Some(title) = &item.title {
                println!("title:    {}", title);
            }
            if let Some(price) = item.current_price {
                println!(
                    "price:    {} {:.2}",
                    item.currency.as_deref().unwrap_or(""),
                    price
                );
            }
            if let Some(reference) = item.reference_price {
                println!("was:      {:.2}", reference);
            }
            Ok(())
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
