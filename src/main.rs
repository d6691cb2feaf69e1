//! amz-reviews - Amazon review crawler with sentiment analytics
//!
//! Finds a product, samples its reviews and reports a reconciled sentiment distribution.

use amz_reviews::amazon::regions::Region;
use amz_reviews::amazon::Sentiment;
use amz_reviews::analysis::SentimentBackend;
use amz_reviews::commands::AnalyzeCommand;
use amz_reviews::config::{Config, OutputFormat};
use amz_reviews::error::ScrapeError;
use amz_reviews::filters::FilterChainBuilder;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-reviews",
    version,
    about = "Amazon review crawler with sentiment, keyword and rating-trend analytics",
    long_about = "Searches an Amazon storefront for a product, crawls its review pages and \
                  reconciles the rating histogram with sampled review text."
)]
struct Cli {
    /// Amazon storefront
    #[arg(short, long, global = true)]
    region: Option<Region>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Delay after each page load in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse the reviews of the first product matching each query
    #[command(alias = "a")]
    Analyze {
        /// Product queries (quote multi-word queries)
        #[arg(required = true)]
        queries: Vec<String>,

        /// Maximum number of reviews to collect
        #[arg(short, long)]
        max_reviews: Option<usize>,

        /// Maximum number of review pages to visit
        #[arg(long)]
        max_pages: Option<u32>,

        /// Balance the sample: keep at most N reviews per star rating
        #[arg(long)]
        max_per_star: Option<usize>,

        /// Run without a visible browser window
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        headless: Option<bool>,

        /// Directory for reviews.csv, analysis.json and summary.txt
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Only show reviews with exactly this many stars
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        /// Only show reviews with at least this many stars
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        min_rating: Option<u8>,

        /// Only show reviews with this sentiment (positive, neutral, negative)
        #[arg(long)]
        sentiment: Option<Sentiment>,

        /// Required words in shown reviews (comma-separated)
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,

        /// Excluded words from shown reviews (comma-separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Sentiment backend (auto, lexicon, keyword)
        #[arg(long)]
        backend: Option<SentimentBackend>,

        /// Lexicon file with one `term<TAB>score` entry per line
        #[arg(long)]
        lexicon: Option<PathBuf>,
    },

    /// List supported regions
    Regions,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(region) = cli.region {
        config.region = region;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Analyze {
            queries,
            max_reviews,
            max_pages,
            max_per_star,
            headless,
            out,
            rating,
            min_rating,
            sentiment,
            keywords,
            exclude,
            backend,
            lexicon,
        } => {
            if let Some(max) = max_reviews {
                config.max_reviews = max;
            }
            if let Some(max) = max_pages {
                config.max_pages = max;
            }
            if max_per_star.is_some() {
                config.max_per_star = max_per_star;
            }
            if let Some(headless) = headless {
                config.headless = headless;
            }
            if out.is_some() {
                config.output_dir = out;
            }
            if let Some(backend) = backend {
                config.sentiment_backend = backend;
            }
            if lexicon.is_some() {
                config.lexicon_path = lexicon;
            }

            let filters = FilterChainBuilder::new()
                .rating(rating)
                .min_rating(min_rating)
                .sentiment(sentiment)
                .keywords(keywords.unwrap_or_default())
                .exclude_keywords(exclude.unwrap_or_default())
                .build();

            let cmd = AnalyzeCommand::new(config)?.with_filters(filters);
            let mut worst = 0u8;

            for query in &queries {
                match cmd.execute(query).await {
                    Ok(output) => println!("{}", output),
                    Err(err) => {
                        eprintln!("Error: {:#}", err);
                        worst = worse(worst, exit_code(&err));
                    }
                }
            }

            Ok(ExitCode::from(worst))
        }

        Commands::Regions => {
            println!("Supported Amazon regions:\n");
            println!("{:<6} {:<20} {:<10}", "Code", "Domain", "Language");
            println!("{:-<6} {:-<20} {:-<10}", "", "", "");

            for region in Region::all() {
                let language = region.accept_language().split(',').next().unwrap_or_default();
                println!("{:<6} {:<20} {:<10}", region.to_string(), region.domain(), language);
            }

            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 2 when nothing was scraped, 1 for any other failure.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ScrapeError>() {
        Some(scrape) => scrape.exit_code() as u8,
        None => 1,
    }
}

/// A fatal failure outranks an empty result.
fn worse(current: u8, next: u8) -> u8 {
    match (current, next) {
        (1, _) | (_, 1) => 1,
        (0, code) => code,
        (code, _) => code,
    }
}
