use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use tributary::config::Config;
use tributary::engine::{Engine, Message};
use tributary::persist::{self, SqliteStore, StateStore};
use tributary::sort::{self, SortPolicy};
use tributary::wire::{self, Request, Response, StdioBridge};

/// Tributary: multi-platform social feed aggregation engine.
///
/// Aggregates posts scraped from open Twitter/X, Bluesky, and Mastodon
/// timelines into one deduplicated, bounded, sortable feed.
#[derive(Parser)]
#[command(name = "tributary", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Run the engine, speaking JSON lines on stdin/stdout
    Run,

    /// Show the persisted feed
    Feed {
        /// Sort policy: chronological, chronological-old, engagement, platform
        #[arg(long)]
        sort: Option<String>,

        /// Show at most this many posts
        #[arg(long, default_value = "25")]
        limit: usize,
    },

    /// Show system status (DB stats, post counts, settings)
    Status,

    /// Wipe the persisted feed
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging. The engine shares stdout with the wire
    // protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tributary=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            let store = SqliteStore::open(&config.db_path)?;
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nTributary is ready. Run: cargo run -- run");
        }

        Commands::Run => run_engine(config).await?,

        Commands::Feed { sort, limit } => {
            let store = open_store(&config)?;
            let state = persist::load_state(&store).await?;
            let policy = sort
                .as_deref()
                .map(SortPolicy::from_name)
                .unwrap_or(state.settings.sort_by);
            let mut feed = sort::order(&state.posts, policy);
            feed.truncate(limit);
            tributary::output::terminal::display_feed(&feed);
            println!("{}", format!("Sorted by: {policy}").dimmed());
        }

        Commands::Status => {
            show_status(&config).await?;
        }

        Commands::Clear => {
            let store = open_store(&config)?;
            let mut state = persist::load_state(&store).await?;
            let cleared = state.posts.len();
            state.posts.clear();
            persist::save_state(&store, &state).await?;
            println!("Cleared {cleared} posts from the persisted feed.");
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    if !Path::new(&config.db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `tributary init` first.",
            config.db_path
        );
    }
    SqliteStore::open(&config.db_path)
}

/// Serve the engine over stdin/stdout JSON lines.
///
/// The engine task owns all state; this loop only parses requests,
/// forwards them on the channel, and writes replies. Notifications and
/// rescan requests come back through the StdioBridge on the same shared
/// writer.
async fn run_engine(config: Config) -> Result<()> {
    let store: Arc<dyn StateStore> = Arc::new(SqliteStore::open(&config.db_path)?);
    let out = Arc::new(tokio::sync::Mutex::new(tokio::io::stdout()));
    let bridge = Arc::new(StdioBridge::new(out.clone()));

    // The load-once barrier: Engine::start completes the durable load
    // before the channel below is ever polled.
    let engine = Engine::start(store, bridge, config).await?;
    let (tx, rx) = mpsc::channel::<Message>(64);
    let engine_task = tokio::spawn(engine.run(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Malformed request line, skipping");
                continue;
            }
        };
        handle_request(request, &tx, &out).await?;
    }

    // stdin closed: drop the sender so the engine flushes and exits.
    drop(tx);
    engine_task.await?;
    Ok(())
}

async fn handle_request(
    request: Request,
    tx: &mpsc::Sender<Message>,
    out: &Arc<tokio::sync::Mutex<tokio::io::Stdout>>,
) -> Result<()> {
    match request {
        Request::GetFeed { sort_by } => {
            let (reply, rx) = oneshot::channel();
            let sort_by = sort_by.as_deref().map(SortPolicy::from_name);
            tx.send(Message::GetFeed { sort_by, reply }).await?;
            let feed = rx.await.unwrap_or_default();
            wire::write_line(out, &Response::Feed { feed }).await?;
        }
        Request::NewPost {
            post,
            source_tab_id,
        } => {
            let (reply, rx) = oneshot::channel();
            tx.send(Message::NewPost {
                post,
                source_tab_id,
                reply: Some(reply),
            })
            .await?;
            write_ack(out, rx).await?;
        }
        Request::OpenPost { url } => {
            let (reply, rx) = oneshot::channel();
            tx.send(Message::OpenPost {
                url,
                reply: Some(reply),
            })
            .await?;
            write_ack(out, rx).await?;
        }
        Request::RefreshFeed => {
            let (reply, rx) = oneshot::channel();
            tx.send(Message::RefreshFeed { reply: Some(reply) }).await?;
            write_ack(out, rx).await?;
        }
        Request::ClearFeed => {
            let (reply, rx) = oneshot::channel();
            tx.send(Message::ClearFeed { reply: Some(reply) }).await?;
            write_ack(out, rx).await?;
        }
        Request::UpdateSettings { settings } => {
            let (reply, rx) = oneshot::channel();
            tx.send(Message::UpdateSettings {
                settings,
                reply: Some(reply),
            })
            .await?;
            write_ack(out, rx).await?;
        }
        // Lifecycle events are one-way; the host expects no reply.
        Request::SessionEvent {
            event,
            session_id,
            url,
        } => {
            tx.send(Message::SessionEvent {
                kind: event.into(),
                session_id,
                url,
            })
            .await?;
        }
    }
    Ok(())
}

async fn write_ack(
    out: &Arc<tokio::sync::Mutex<tokio::io::Stdout>>,
    rx: oneshot::Receiver<tributary::engine::Ack>,
) -> Result<()> {
    let ack = rx.await.unwrap_or_else(|_| Err("engine stopped".to_string()));
    wire::write_line(out, &Response::ack(&ack)).await
}

/// Display system status to the terminal.
async fn show_status(config: &Config) -> Result<()> {
    if !Path::new(&config.db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `tributary init` to set up the database.");
        return Ok(());
    }

    let store = SqliteStore::open(&config.db_path)?;

    // Database file size
    let file_size = std::fs::metadata(&config.db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", config.db_path, file_size);

    match store.last_saved_at().await? {
        Some(saved_at) => println!("Last save: {saved_at}"),
        None => println!("Last save: never"),
    }

    let state = persist::load_state(&store).await?;
    println!(
        "Feed: {} posts (capacity {})",
        state.posts.len(),
        config.feed_capacity
    );
    for platform in [
        tributary::model::Platform::Twitter,
        tributary::model::Platform::Bluesky,
        tributary::model::Platform::Mastodon,
    ] {
        let count = state.posts.iter().filter(|p| p.platform == platform).count();
        if count > 0 {
            println!("  {platform}: {count}");
        }
    }

    println!(
        "Settings: sort {}, notifications {}, auto-refresh {}",
        state.settings.sort_by,
        if state.settings.show_notifications {
            "on"
        } else {
            "off"
        },
        if state.settings.auto_refresh {
            "on"
        } else {
            "off"
        },
    );

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
