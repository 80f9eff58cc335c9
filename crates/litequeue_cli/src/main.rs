mod commands;

use clap::{Parser, Subcommand};
use litequeue_core::QueueConfig;
use miette::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "litequeue")]
#[command(about = "Durable FIFO work queue backed by SQLite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Queue locator: a database path or memory:<name> (overrides config)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Purge the queue database before opening it
    #[arg(long, global = true)]
    reset: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Append an item (reads stdin when DATA is omitted)
    Add {
        /// Payload to enqueue
        data: Option<String>,
    },
    /// Show the oldest items without removing them
    Peek {
        /// Maximum number of items to show
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,
    },
    /// Remove an item by id
    Delete {
        /// Item id
        id: i64,
    },
    /// Print the number of queued items
    Len,
    /// Deliver items to stdout until interrupted
    Consume {
        /// Leave items queued and pause this long between deliveries
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Print items without acknowledging them (pauses 1s unless --delay-ms is set)
        #[arg(long)]
        requeue: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading config from: {:?}", path);
            QueueConfig::load(path)?
        }
        None => QueueConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.locator = Some(db.clone());
    }
    if config.locator.is_none() {
        config.locator = Some(default_db_path().to_string_lossy().into_owned());
    }
    if cli.reset {
        config.reset = true;
    }

    match cli.command {
        Commands::Add { data } => commands::add(config, data).await,
        Commands::Peek { limit } => commands::peek(config, limit).await,
        Commands::Delete { id } => commands::delete(config, id).await,
        Commands::Len => commands::len(config).await,
        Commands::Consume { delay_ms, requeue } => {
            commands::consume(config, delay_ms, requeue).await
        }
    }
}

fn init_logging(debug: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_filter = if debug {
        "litequeue_core=debug,litequeue_db=debug,litequeue=debug,sqlx=warn,info"
    } else {
        "litequeue_core=info,litequeue_db=info,litequeue=info,sqlx=warn,warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let terminal_layer = fmt::layer()
        .with_target(debug)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(terminal_layer)
        .init();
}

/// Database used when neither `--db` nor the config names one.
fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("litequeue")
        .join("queue.db")
}
