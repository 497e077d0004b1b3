use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newsreel")]
#[command(about = "RSS/Atom ingestion service with durable article storage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new feed URL
    Add {
        /// Feed URL to add
        url: String,
    },

    /// Remove a feed (interactive selection)
    Remove,

    /// List all feeds with their fetch state
    List,

    /// Import feeds from OPML file
    Import {
        /// Path to OPML file
        path: String,
    },

    /// Export feeds to OPML format
    Export {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Fetch all active feeds, or a single feed by id
    Fetch {
        /// Fetch only the feed with this id
        #[arg(long)]
        id: Option<i64>,
    },

    /// Delete articles past the retention window and over the per-feed cap
    Cleanup {
        /// Days of articles to keep (defaults to NEWSREEL_RETENTION_DAYS)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Show scheduler configuration and job status
    Status,

    /// Run the scheduler until Enter is pressed
    Serve,
}
