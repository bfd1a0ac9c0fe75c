use clap::{Parser, Subcommand};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readmate::commands::{self, ReadRequest};
use readmate::settings::{PreloadOverrides, DEFAULT_SERVER_URL};
use readmate_preload::{PreloadConfig, ReaderApiClient};

#[derive(Parser)]
#[command(name = "readmate")]
#[command(about = "Read books from a remote reader server", long_about = None)]
struct Cli {
    /// Reader server base URL
    #[arg(short, long, env = "READMATE_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Disable background chapter preloading
    #[arg(long, global = true)]
    no_preload: bool,

    /// Chapters to preload after the current one
    #[arg(long, global = true)]
    chapters: Option<usize>,

    /// Reading progress (0-100) that triggers preloading
    #[arg(long, global = true)]
    trigger: Option<f64>,

    /// Maximum chapters kept in the cache
    #[arg(long, global = true)]
    max_cache: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List books on the bookshelf
    Shelf,

    /// List the chapters of a book
    Chapters {
        /// Book URL as shown by `shelf`
        book_url: String,
    },

    /// Print a chapter, optionally reporting reading progress
    Read {
        /// Book URL as shown by `shelf`
        book_url: String,

        /// Chapter index (0-based)
        index: usize,

        /// Reading progress within the chapter (0-100); triggers preloading
        #[arg(short, long)]
        progress: Option<f64>,

        /// Seconds to wait for preloading before printing statistics
        #[arg(short, long, default_value = "10")]
        wait_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "readmate=info,readmate_preload=info".into())
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = Arc::new(ReaderApiClient::new(&cli.server));

    match cli.command {
        Commands::Shelf => {
            let books = commands::shelf(&client).await?;
            print!("{}", commands::format_shelf(&books));
        }

        Commands::Chapters { ref book_url } => {
            let chapters = commands::chapters(&client, book_url).await?;
            if chapters.is_empty() {
                println!("No chapters found.");
            } else {
                print!("{}", commands::format_chapters(&chapters));
            }
        }

        Commands::Read { ref book_url, index, progress, wait_secs } => {
            let overrides = PreloadOverrides {
                no_preload: cli.no_preload,
                chapters: cli.chapters,
                trigger: cli.trigger,
                max_cache: cli.max_cache,
            };
            let config = overrides.apply(PreloadConfig::from_env()?)?;

            let request = ReadRequest {
                book_url: book_url.clone(),
                index,
                progress,
                wait: Duration::from_secs(wait_secs),
            };
            let outcome = commands::read(client, config, &request).await?;

            println!("{}", outcome.chapter.title);
            println!("{}", "=".repeat(70));
            println!("{}", outcome.chapter.content);

            if let Some(stats) = outcome.stats {
                println!();
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        }
    }

    Ok(())
}
