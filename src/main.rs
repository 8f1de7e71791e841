// src/main.rs

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod config;
mod crawler;
mod downloader;
mod error;
mod job;
mod models;
mod session;
#[cfg(test)]
mod testing;

use config::Config;
use job::{JobOutcome, JobRunner, Progress, ProgressReporter};
use models::{ScrapeRequest, SearchMode};

/// Scrape pins by keyword or URL, then download their images.
#[derive(Debug, Parser)]
#[command(name = "pinscrape", version)]
struct Cli {
    /// Search keyword, or a board/search URL with `--mode url`.
    query: String,

    #[arg(short, long, value_enum, default_value_t = SearchMode::Keyword)]
    mode: SearchMode,

    /// Number of pins to collect.
    #[arg(short = 'n', long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Run the browser without a window (login challenges cannot be solved by hand).
    #[arg(long)]
    headless: bool,

    /// Root directory for job output.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Maximum simultaneous image downloads.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print progress and the final summary as JSON lines.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("pinscrape=info".parse()?))
        .init();

    let cli = Cli::parse();

    // Credentials are required before anything else happens.
    let mut config = Config::from_env()?;
    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(n) = cli.concurrency {
        config.download.concurrency = n.max(1);
    }

    let runner = JobRunner::new(config)?;
    let request = ScrapeRequest::new(cli.mode, cli.query, cli.count as usize);

    let (tx, mut rx) = mpsc::unbounded_channel::<Progress>();
    let json = cli.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_progress(&event, json);
        }
    });

    let outcome = {
        let reporter = ProgressReporter::new(tx);
        runner.run(&request, &reporter).await
    };
    printer.await?;

    print_outcome(&outcome, json)?;
    if !outcome.is_completed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Prints one progress update.
fn print_progress(event: &Progress, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Failed to encode progress: {e}"),
        }
    } else {
        println!("[{:>3.0}%] {}", event.fraction * 100.0, event.message);
    }
}

/// Prints the final status line and, on success, where everything went.
fn print_outcome(outcome: &JobOutcome, json: bool) -> Result<()> {
    let summary = match outcome {
        JobOutcome::Completed(summary) => Some(summary),
        _ => None,
    };

    if json {
        let line = serde_json::json!({
            "status": outcome.to_string(),
            "completed": outcome.is_completed(),
            "summary": summary,
        });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    println!("{outcome}");
    if let Some(summary) = summary {
        println!("  Pins:     {}", summary.pins.len());
        println!("  Images:   {}", summary.image_files.len());
        println!("  Metadata: {}", summary.metadata_path.display());
        if !summary.failed_downloads.is_empty() {
            println!(
                "  {} image(s) failed to download; their rows are still in the metadata file:",
                summary.failed_downloads.len()
            );
            for url in &summary.failed_downloads {
                println!("    - {url}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["pinscrape", "modern kitchen"]).unwrap();
        assert_eq!(cli.query, "modern kitchen");
        assert_eq!(cli.mode, SearchMode::Keyword);
        assert_eq!(cli.count, 50);
        assert!(!cli.headless);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_url_mode() {
        let cli = Cli::try_parse_from([
            "pinscrape",
            "--mode",
            "url",
            "-n",
            "120",
            "--headless",
            "https://www.pinterest.com/someone/board/",
        ])
        .unwrap();
        assert_eq!(cli.mode, SearchMode::Url);
        assert_eq!(cli.count, 120);
        assert!(cli.headless);
    }

    #[test]
    fn test_cli_rejects_zero_count() {
        assert!(Cli::try_parse_from(["pinscrape", "-n", "0", "cats"]).is_err());
    }
}
