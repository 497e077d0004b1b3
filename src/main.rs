use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use newsreel::cli::{Cli, Commands};
use newsreel::config::Config;
use newsreel::errors::NewsreelError;
use newsreel::parser::HttpFeedParser;
use newsreel::scheduler::{Scheduler, SchedulerConfig};
use newsreel::services::{
    FeedService, FetchService, ImportExportService, RetentionService,
};
use newsreel::storage::sqlite::{
    SqliteArticleRepository, SqliteFeedRepository, SqliteStorage,
};
use newsreel::storage::traits::FeedRepository;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newsreel=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Load configuration
    let config = Config::from_env().context("loading configuration")?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)
        .with_context(|| format!("opening database at {}", config.db_path))?;

    let parser = HttpFeedParser::new(Duration::from_secs(config.request_timeout_secs));

    match cli.command {
        Commands::Add { url } => cmd_add(&url, storage, parser),
        Commands::Remove => cmd_remove(storage, parser),
        Commands::List => cmd_list(storage),
        Commands::Import { path } => cmd_import(&path, storage, parser),
        Commands::Export { output } => cmd_export(storage, parser, output),
        Commands::Fetch { id } => cmd_fetch(storage, parser, id),
        Commands::Cleanup { days } => cmd_cleanup(storage, &config, days),
        Commands::Status => cmd_status(storage, parser, &config),
        Commands::Serve => cmd_serve(storage, parser, &config),
    }
}

fn build_fetch_service(
    storage: &SqliteStorage,
    parser: HttpFeedParser,
) -> FetchService<SqliteFeedRepository, SqliteArticleRepository, HttpFeedParser> {
    FetchService::new(
        SqliteFeedRepository::new(storage.clone()),
        SqliteArticleRepository::new(storage.clone()),
        parser,
    )
}

fn cmd_add(url: &str, storage: SqliteStorage, parser: HttpFeedParser) -> anyhow::Result<()> {
    let service = FeedService::new(SqliteFeedRepository::new(storage), parser);

    println!("Validating feed: {}", url);

    match service.add(url) {
        Ok((feed, warning)) => {
            println!("Feed added successfully!");
            println!("  Title: {}", feed.title);
            if let Some(description) = &feed.description {
                println!("  Description: {}", description);
            }
            if let Some(warning) = warning {
                println!("  Warning: {}", warning);
                println!("  Metadata will fill in on the first successful fetch.");
            }
            Ok(())
        }
        Err(NewsreelError::FeedAlreadyExists(_)) => {
            println!("Feed already exists: {}", url);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_remove(storage: SqliteStorage, parser: HttpFeedParser) -> anyhow::Result<()> {
    let service = FeedService::new(SqliteFeedRepository::new(storage), parser);
    let feeds = service.list()?;

    if feeds.is_empty() {
        println!("No feeds to remove.");
        return Ok(());
    }

    // Display numbered list
    println!("Select a feed to remove:\n");
    for (i, feed) in feeds.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, feed.title, feed.url);
    }
    println!();

    // Read user input
    print!("Enter number (or 'q' to cancel): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.eq_ignore_ascii_case("q") {
        println!("Cancelled.");
        return Ok(());
    }

    let index: usize = input
        .parse()
        .map_err(|_| NewsreelError::InvalidInput("Invalid number".to_string()))?;

    if index == 0 || index > feeds.len() {
        return Err(NewsreelError::InvalidInput("Number out of range".to_string()).into());
    }

    let feed = &feeds[index - 1];
    let feed_id = feed
        .id
        .ok_or_else(|| NewsreelError::FeedNotFound("Feed has no ID".to_string()))?;

    service.remove(feed_id)?;
    println!("Removed: {} (articles deleted with it)", feed.title);

    Ok(())
}

fn cmd_list(storage: SqliteStorage) -> anyhow::Result<()> {
    let repo = SqliteFeedRepository::new(storage);
    let feeds = repo.get_all()?;

    if feeds.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    println!("Configured feeds:\n");
    for feed in feeds {
        let state = if feed.is_active { "active" } else { "disabled" };
        println!("  {} [{}]", feed.title, state);
        println!("    URL: {}", feed.url);
        match feed.last_fetched {
            Some(fetched) => println!("    Last fetched: {}", fetched.to_rfc3339()),
            None => println!("    Last fetched: never"),
        }
        if feed.error_count > 0 {
            println!("    Consecutive errors: {}", feed.error_count);
        }
        println!();
    }

    Ok(())
}

fn cmd_import(path: &str, storage: SqliteStorage, parser: HttpFeedParser) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let service = ImportExportService::new(SqliteFeedRepository::new(storage), parser);

    println!("Importing feeds from {}...\n", path);

    let result = service.import_opml(&content)?;

    if !result.added.is_empty() {
        println!("Added {} feeds:", result.added.len());
        for feed in &result.added {
            println!("  + {}", feed.title);
        }
        println!();
    }

    if !result.duplicates.is_empty() {
        println!("Skipped {} duplicates:", result.duplicates.len());
        for url in &result.duplicates {
            println!("  - {}", url);
        }
        println!();
    }

    if !result.invalid.is_empty() {
        println!("Failed {} feeds:", result.invalid.len());
        for (url, error) in &result.invalid {
            println!("  ! {}: {}", url, error);
        }
        println!();
    }

    println!(
        "Import complete: {} added, {} duplicates, {} failed",
        result.added.len(),
        result.duplicates.len(),
        result.invalid.len()
    );

    Ok(())
}

fn cmd_export(
    storage: SqliteStorage,
    parser: HttpFeedParser,
    output: Option<String>,
) -> anyhow::Result<()> {
    let service = ImportExportService::new(SqliteFeedRepository::new(storage), parser);
    let opml = service.export_opml()?;

    match output {
        Some(path) => {
            std::fs::write(&path, &opml)?;
            println!("Exported feeds to {}", path);
        }
        None => {
            println!("{}", opml);
        }
    }

    Ok(())
}

fn cmd_fetch(
    storage: SqliteStorage,
    parser: HttpFeedParser,
    id: Option<i64>,
) -> anyhow::Result<()> {
    let fetch_service = build_fetch_service(&storage, parser);

    match id {
        Some(id) => {
            let repo = SqliteFeedRepository::new(storage);
            let feed = repo
                .get_by_id(id)?
                .ok_or_else(|| NewsreelError::FeedNotFound(format!("id {}", id)))?;

            println!("Fetching {}...", feed.title);
            match fetch_service.fetch_one(&feed) {
                Ok(inserted) => println!("Inserted {} new articles.", inserted),
                Err(e) => println!("Fetch failed (recorded on the feed): {}", e),
            }
        }
        None => {
            println!("Fetching all active feeds...\n");
            let summary = fetch_service.fetch_all()?;
            println!(
                "Run complete: {} new articles, {} errors, {} feeds processed.",
                summary.total_fetched, summary.total_errors, summary.feeds_processed
            );
        }
    }

    Ok(())
}

fn cmd_cleanup(storage: SqliteStorage, config: &Config, days: Option<u32>) -> anyhow::Result<()> {
    let service = RetentionService::new(
        SqliteArticleRepository::new(storage),
        config.max_articles_per_feed,
    );

    let days = days.unwrap_or(config.retention_days);
    let deleted = service.cleanup(days)?;
    println!("Deleted {} articles (keeping {} days).", deleted, days);

    Ok(())
}

fn build_scheduler(
    storage: &SqliteStorage,
    parser: HttpFeedParser,
    config: &Config,
) -> Scheduler {
    let fetch = Arc::new(build_fetch_service(storage, parser));
    let retention = Arc::new(RetentionService::new(
        SqliteArticleRepository::new(storage.clone()),
        config.max_articles_per_feed,
    ));

    Scheduler::new(fetch, retention, SchedulerConfig::from(config))
}

fn cmd_status(
    storage: SqliteStorage,
    parser: HttpFeedParser,
    config: &Config,
) -> anyhow::Result<()> {
    let scheduler = build_scheduler(&storage, parser, config);
    let status = scheduler.status();

    println!("Scheduler status:");
    println!(
        "  Enabled: {}",
        if config.scheduler_enabled {
            "yes"
        } else {
            "no (set NEWSREEL_SCHEDULER_ENABLED=true)"
        }
    );
    println!("  Running: {}", status.running);
    println!("  Fetch job armed: {}", status.fetch_job_armed);
    println!("  Cleanup job armed: {}", status.cleanup_job_armed);
    println!("  Fetch interval: {}s", config.fetch_interval_secs);
    println!("  Cleanup hour: {:02}:00", config.cleanup_hour);
    println!("  Timezone: {}", status.timezone);
    println!("  Retention: {} days", status.retention_days);

    Ok(())
}

fn cmd_serve(storage: SqliteStorage, parser: HttpFeedParser, config: &Config) -> anyhow::Result<()> {
    if !config.scheduler_enabled {
        return Err(NewsreelError::Scheduler(
            "scheduler is disabled; set NEWSREEL_SCHEDULER_ENABLED=true".to_string(),
        )
        .into());
    }

    let mut scheduler = build_scheduler(&storage, parser, config);
    scheduler.start()?;

    println!(
        "Scheduler running (fetch every {}s, cleanup at {:02}:00 {}).",
        config.fetch_interval_secs, config.cleanup_hour, config.timezone
    );
    println!("Press Enter to stop.");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    scheduler.stop();
    println!("Stopped.");

    Ok(())
}
