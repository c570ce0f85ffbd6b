use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use vigil::config::Config;
use vigil::feed;
use vigil::reconcile::{self, Watermark};
use vigil::store::{self, FeedConfig, FeedList, StoreError};
use vigil::util::truncate_to_width;

/// Separator printed between per-feed entry blocks, as it has always been.
const DECORATIVE: &str = "=-=-=-=-=-=-=-=-=-=";

/// Get the config directory path (~/.config/vigil/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("vigil");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    about = "Terminal RSS monitor that reports new entries since your last check"
)]
struct Args {
    /// Path to the feeds file (default: ~/.config/vigil/feeds.json)
    #[arg(long, value_name = "FILE")]
    feeds: Option<PathBuf>,

    /// Maximum entry titles printed per feed
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// List configured feeds instead of checking them
    #[arg(long)]
    list: bool,

    /// Group the feed listing by class tag
    #[arg(long, requires = "list")]
    by_class: bool,

    /// Include watermarks in the feed listing
    #[arg(long, requires = "list")]
    verbose: bool,

    /// Reset every feed's watermark to TIMESTAMP (RFC 3339; defaults to the
    /// epoch, which makes every entry count as new on the next check)
    #[arg(
        long,
        value_name = "TIMESTAMP",
        num_args = 0..=1,
        default_missing_value = "1970-01-01T00:00:00Z"
    )]
    reset_watermarks: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // User-only access on Unix: the feeds file is personal reading habits
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config =
        Config::load(&config_dir.join("config.toml")).context("Failed to load config.toml")?;

    let feeds_path = args
        .feeds
        .clone()
        .or_else(|| config.feeds_path.clone())
        .unwrap_or_else(|| config_dir.join("feeds.json"));

    let mut list = match store::load(&feeds_path) {
        Ok(list) => list,
        Err(StoreError::NotFound(path)) => {
            eprintln!("Error: no feeds file found at {}", path);
            eprintln!();
            eprintln!("To get started, create it with a feed list, e.g.:");
            eprintln!("  {{\"feeds\": [{{\"url\": \"https://example.com/feed.xml\"}}]}}");
            eprintln!();
            eprintln!("Or point at an existing file with --feeds.");
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::Error::new(e).context("Failed to load feeds file"));
        }
    };

    // Handle --list flag
    if args.list {
        print_listing(&list, args.by_class, args.verbose);
        return Ok(());
    }

    // Handle --reset-watermarks flag
    if let Some(ts) = &args.reset_watermarks {
        let instant: DateTime<Utc> = ts
            .parse()
            .with_context(|| format!("Invalid RFC 3339 timestamp: {ts}"))?;
        for feed in &mut list.feeds {
            feed.watermark = Watermark::Timestamp(instant);
        }
        store::save(&feeds_path, &list).context("Failed to save feeds file")?;
        println!(
            "Reset {} watermark(s) to {}",
            list.feeds.len(),
            instant.to_rfc3339()
        );
        return Ok(());
    }

    if list.feeds.is_empty() {
        println!("No feeds configured in {}.", feeds_path.display());
        return Ok(());
    }

    let cap = args.limit.unwrap_or(config.max_titles_per_feed);

    let client = reqwest::Client::builder()
        .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    tracing::info!(
        feeds = list.feeds.len(),
        last_check = ?list.last_check,
        "Checking feeds"
    );

    let fetched = feed::fetch_all(
        &client,
        &list.feeds,
        config.fetch_concurrency,
        Duration::from_secs(config.fetch_timeout_secs),
    )
    .await;

    let result = reconcile::run(&mut list.feeds, fetched, cap);

    println!("{}", result.heading);
    for line in &result.summaries {
        println!("{line}");
    }
    for block in &result.entry_lists {
        println!("{DECORATIVE}");
        println!("{block}");
    }

    // Stamp the check time and persist everything in one atomic replace.
    // Faulted feeds kept their loaded watermarks, so they round-trip as-is.
    list.last_check = Some(Utc::now());
    store::save(&feeds_path, &list).context("Failed to save feeds file")?;

    Ok(())
}

fn print_listing(list: &FeedList, by_class: bool, verbose: bool) {
    if list.feeds.is_empty() {
        println!("No feeds configured.");
        return;
    }

    let mut feeds: Vec<&FeedConfig> = list.feeds.iter().collect();
    if by_class {
        feeds.sort_by(|a, b| a.class.cmp(&b.class));
    }

    for feed in feeds {
        let title = if feed.title.is_empty() {
            "(untitled)"
        } else {
            feed.title.as_str()
        };
        if feed.class.is_empty() {
            println!("=== {}", truncate_to_width(title, 100));
        } else {
            println!("=== {} [{}]", truncate_to_width(title, 100), feed.class);
        }
        println!("    {}", feed.url);
        if verbose {
            println!("    watermark: {}", feed.watermark);
        }
    }

    if verbose {
        match list.last_check {
            Some(t) => println!("Last check: {}", t.to_rfc3339()),
            None => println!("Last check: never"),
        }
    }
}
