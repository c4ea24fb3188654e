mod extract;
mod scan;
mod sections;
mod settings;
mod store;
mod sync;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::extract::{EmptyHeading, ExtractOptions};
use crate::sections::SectionTable;
use crate::settings::Settings;
use crate::store::RestStore;

#[derive(Parser)]
#[command(
    name = "profile_sync",
    about = "Sync static student profile pages into the entries table"
)]
struct Cli {
    /// Directory holding the profile pages
    #[arg(long, global = true, default_value = "students")]
    dir: PathBuf,
    /// TOML table of roll ranges replacing the built-in sections
    #[arg(long, global = true)]
    sections: Option<PathBuf>,
    /// Use "Student <roll>" when a page has an <h1> with no text
    #[arg(long, global = true)]
    placeholder_on_empty_name: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every page and upsert it (default)
    Sync {
        /// Key-value file read before the process environment
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
        /// Request timeout in seconds
        #[arg(long, default_value_t = store::DEFAULT_TIMEOUT.as_secs())]
        timeout: u64,
    },
    /// Show what would be sent, without credentials or network
    Preview {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let options = ExtractOptions {
        empty_heading: if cli.placeholder_on_empty_name {
            EmptyHeading::Placeholder
        } else {
            EmptyHeading::Keep
        },
    };
    let command = cli.command.unwrap_or(Commands::Sync {
        env_file: PathBuf::from(".env"),
        timeout: store::DEFAULT_TIMEOUT.as_secs(),
    });

    match command {
        Commands::Sync { env_file, timeout } => {
            let settings = Settings::load(&env_file)
                .with_context(|| format!("loading credentials ({})", env_file.display()))?;
            info!(settings = ?settings, "credentials loaded");
            let table = load_sections(cli.sections.as_deref())?;

            println!("Scanning folder: {}", display_dir(&cli.dir));
            let pages = scan::profile_pages(&cli.dir)?;

            let store = RestStore::new(&settings, Duration::from_secs(timeout))
                .context("building HTTP client")?;
            info!(url = store.url(), "connecting");
            let summary = sync::run(&pages, &table, options, &store);
            summary.print();
        }
        Commands::Preview { limit } => {
            let table = load_sections(cli.sections.as_deref())?;
            println!("Scanning folder: {}", display_dir(&cli.dir));
            let pages = scan::profile_pages(&cli.dir)?;
            let preview = sync::preview(&pages, &table, options);
            print_preview(&preview, limit);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

fn load_sections(path: Option<&Path>) -> Result<SectionTable> {
    match path {
        Some(p) => {
            let table = SectionTable::load(p)?;
            info!(path = %p.display(), rules = table.rules().len(), "loaded sections table");
            Ok(table)
        }
        None => Ok(SectionTable::default()),
    }
}

fn display_dir(dir: &Path) -> String {
    dir.canonicalize()
        .unwrap_or_else(|_| dir.to_path_buf())
        .display()
        .to_string()
}

fn print_preview(preview: &sync::Preview, limit: usize) {
    if preview.records.is_empty() {
        println!("No profiles to sync.");
    } else {
        println!(
            "{:>3} | {:<6} | {:<10} | {:<24} | {:<20} | {}",
            "#", "Roll", "Section", "Name", "Image", "Page"
        );
        println!("{}", "-".repeat(110));
        for (i, r) in preview.records.iter().take(limit).enumerate() {
            println!(
                "{:>3} | {:<6} | {:<10} | {:<24} | {:<20} | {}",
                i + 1,
                r.roll,
                r.section,
                truncate(&r.name, 24),
                truncate(&r.image_url, 20),
                r.page_url
            );
        }
    }

    if !preview.skipped.is_empty() {
        println!("\n--- Skipped ---");
        for (name, reason) in &preview.skipped {
            println!("  {}: {}", name, reason);
        }
    }

    println!(
        "\n{} profiles would be synced, {} skipped",
        preview.records.len(),
        preview.skipped.len()
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
