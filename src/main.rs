use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use unreadstat::config::{Config, OutputFormat};
use unreadstat::report;
use unreadstat::stats::UnreadStats;
use unreadstat::storage::{Database, DatabaseError};

/// Get the config directory path (~/.config/unreadstat/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("unreadstat"))
}

#[derive(Parser, Debug)]
#[command(name = "unreadstat", about = "Visible unread statistics for a feed reader")]
struct Args {
    /// Config file (default: ~/.config/unreadstat/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file, overrides the config file
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Unread count and newest entry over the whole reading list
    Global {
        /// User name or numeric ID
        #[arg(long)]
        user: String,
    },
    /// Unread counts per feed
    Feeds {
        /// User name or numeric ID
        #[arg(long)]
        user: String,
    },
    /// Unread counts per category
    Categories {
        /// User name or numeric ID
        #[arg(long)]
        user: String,
    },
    /// All three aggregates
    Summary {
        /// User name or numeric ID
        #[arg(long)]
        user: String,
    },
    /// Delete every entry of one of the user's feeds
    ClearEntries {
        /// User name or numeric ID
        #[arg(long)]
        user: String,
        #[arg(long)]
        feed: i64,
    },
}

impl Command {
    fn user(&self) -> &str {
        match self {
            Command::Global { user }
            | Command::Feeds { user }
            | Command::Categories { user }
            | Command::Summary { user }
            | Command::ClearEntries { user, .. } => user,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode JSON")?;
    println!("{json}");
    Ok(())
}

async fn feed_titles(db: &Database, user_id: i64) -> Result<HashMap<i64, String>> {
    let feeds = db.get_feeds(user_id).await.context("Failed to load feeds")?;
    Ok(feeds.into_iter().map(|f| (f.id, f.title)).collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.database_path_in(&config_dir));
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open_with(db_path_str, &config.database_options()).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", DatabaseError::InstanceLocked);
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let json = args.json || config.output == OutputFormat::Json;
    let stats = UnreadStats::new(db);
    let db = stats.store();

    let Some(user) = db
        .resolve_user(args.command.user())
        .await
        .context("Failed to look up user")?
    else {
        eprintln!("Error: unknown user {}", args.command.user());
        std::process::exit(1);
    };

    match args.command {
        Command::Global { .. } => {
            let stat = stats.compute_global_unread_stat(user).await?;
            if json {
                print_json(&stat)?;
            } else {
                print!("{}", report::render_global(&stat));
            }
        }
        Command::Feeds { .. } => {
            let feeds = stats.compute_feed_unread_stats(user).await?;
            if json {
                print_json(&feeds)?;
            } else {
                let titles = feed_titles(db, user).await?;
                print!("{}", report::render_feeds(&feeds, &titles));
            }
        }
        Command::Categories { .. } => {
            let categories = stats.compute_category_unread_stats(user).await?;
            if json {
                print_json(&categories)?;
            } else {
                print!("{}", report::render_categories(&categories));
            }
        }
        Command::Summary { .. } => {
            let summary = stats.compute_summary(user).await?;
            if json {
                print_json(&summary)?;
            } else {
                let titles = feed_titles(db, user).await?;
                print!("{}", report::render_summary(&summary, &titles));
            }
        }
        Command::ClearEntries { feed, .. } => {
            if !db.feed_exists(user, feed).await? {
                eprintln!("Error: feed {feed} not found for user {user}");
                std::process::exit(1);
            }

            let removed = db
                .remove_feed_entries(user, feed)
                .await
                .context("Failed to clear feed entries")?;
            tracing::info!(user_id = user, feed_id = feed, removed, "Cleared feed entries");
            println!("Removed {removed} entries from feed {feed}");
        }
    }

    Ok(())
}
