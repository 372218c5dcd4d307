use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use reddit_client::RedditClient;
use redscrape::{output, Harvester};
use redscrape_core::classifier::KeywordClassifier;
use redscrape_core::config::AppConfig;
use redscrape_core::export::ExportFormat;
use redscrape_core::pipeline::CollectionRequest;
use redscrape_core::{Category, CoreError, ErrorExt, FilterKind};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "redscrape=info,reddit_client=info,redscrape_core=info";
const VERBOSE_LOG_FILTER: &str = "redscrape=debug,reddit_client=debug,redscrape_core=debug";
const DEFAULT_RANGE_DAYS: i64 = 7;

#[derive(Parser)]
#[command(name = "redscrape", version, about = "Collect and classify Reddit posts")]
struct Cli {
    #[arg(long, global = true, help = "TOML config file (environment variables take precedence)")]
    config: Option<PathBuf>,

    #[arg(long, short = 'v', global = true, help = "Debug logging unless RUST_LOG is set")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Collect posts from one or more subreddits")]
    Posts {
        #[arg(required = true, help = "Subreddit names, with or without the r/ prefix")]
        subreddits: Vec<String>,
        #[arg(long, help = "all, last-week, last-month, last-year or date-range")]
        filter: Option<FilterKind>,
        #[arg(long, help = "First day of a date range (YYYY-MM-DD)")]
        start: Option<NaiveDate>,
        #[arg(long, help = "Last day of a date range (YYYY-MM-DD)")]
        end: Option<NaiveDate>,
        #[arg(long, default_value = "csv", help = "csv or json")]
        format: ExportFormat,
        #[arg(long, default_value = ".", help = "Directory for exported files")]
        output: PathBuf,
    },
    #[command(about = "Collect one post and all of its comments by URL")]
    Thread {
        url: String,
        #[arg(long, default_value = "csv", help = "csv or json")]
        format: ExportFormat,
        #[arg(long, default_value = ".", help = "Directory for exported files")]
        output: PathBuf,
    },
    #[command(about = "Classify a title and optional body without contacting Reddit")]
    Classify { title: String, body: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let classifier = KeywordClassifier::standard()?;

    if let Commands::Classify { title, body } = &cli.command {
        let card = classifier.score(title, body.as_deref().unwrap_or(""));
        let result = card.result();
        println!("{} ({:.2})", result.category, result.confidence);
        for category in Category::SCORED {
            let score = card.score(category);
            if score > 0 {
                println!("  {}: {}", category, score);
            }
        }
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref()).map_err(|e| {
        let error = CoreError::from(e);
        error.log_error();
        anyhow!(error.user_friendly_message())
    })?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let client = RedditClient::from_config(&config)?;
    let harvester = Harvester::new(client, classifier, config.cache_ttl);

    match cli.command {
        Commands::Posts {
            subreddits,
            filter,
            start,
            end,
            format,
            output,
        } => {
            let (filter, start, end) = date_arguments(filter, start, end);
            let mut failures = 0;
            for subreddit in subreddits {
                let request = CollectionRequest::new(subreddit.clone(), filter).with_dates(start, end);
                let collection = harvester.posts(&request, Utc::now()).await;

                for warning in &collection.warnings {
                    eprintln!("warning: {}", warning);
                }
                if let Some(error) = &collection.error {
                    eprintln!("r/{}: {}", subreddit, error.user_friendly_message());
                    failures += 1;
                    continue;
                }

                println!("r/{}: fetched {} posts", subreddit, collection.len());
                if let Some(path) =
                    output::write_posts(&output, &subreddit, format, &collection.records)?
                {
                    println!("  wrote {}", path.display());
                }
            }
            if failures > 0 {
                return Err(anyhow!("{} subreddit request(s) failed", failures));
            }
        }
        Commands::Thread {
            url,
            format,
            output,
        } => {
            let thread = harvester.thread(&url).await;
            if let Some(error) = &thread.error {
                return Err(anyhow!(error.user_friendly_message()));
            }
            println!("Fetched post with {} comments", thread.comments.len());
            for path in output::write_thread(&output, format, &thread)? {
                println!("  wrote {}", path.display());
            }
        }
        Commands::Classify { .. } => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit dates imply a date range; a date range without dates covers the
/// last week up to today.
fn date_arguments(
    filter: Option<FilterKind>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (FilterKind, Option<NaiveDate>, Option<NaiveDate>) {
    let filter = filter.unwrap_or(if start.is_some() || end.is_some() {
        FilterKind::DateRange
    } else {
        FilterKind::All
    });
    if filter != FilterKind::DateRange {
        return (filter, None, None);
    }

    let today = Utc::now().date_naive();
    let end = end.unwrap_or(today);
    let start = start.unwrap_or(end - Duration::days(DEFAULT_RANGE_DAYS));
    (filter, Some(start), Some(end))
}
