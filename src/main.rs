use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vectail::cli::search::SearchRequest;

#[derive(Parser)]
#[command(name = "vectail")]
#[command(about = "Semantic log ingestion into a vector store", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest log lines from stdin into a collection
    Ingest {
        #[arg(short, long, default_value = "universal-logs")]
        collection: String,
        /// Override the collection's TTL, e.g. 7d
        #[arg(long)]
        ttl: Option<humantime::Duration>,
    },
    /// Delete expired records, once or on a schedule
    Sweep {
        /// Collections to sweep (defaults to every collection with a TTL)
        #[arg(short, long)]
        collection: Vec<String>,
        #[arg(long)]
        once: bool,
    },
    /// Semantic search over ingested logs
    Search {
        query: Option<String>,
        #[arg(short, long, default_value = "universal-logs")]
        collection: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0.3)]
        min_score: f32,
        /// Filter by level (ERROR, WARN, INFO, DEBUG)
        #[arg(long)]
        level: Option<String>,
        /// Filter by source label
        #[arg(long)]
        source: Option<String>,
        /// Only logs from the last N hours
        #[arg(long)]
        hours: Option<u64>,
        /// Find logs similar to the stored point with this id
        #[arg(long)]
        similar_to: Option<u64>,
        /// Print collection stats instead of searching
        #[arg(long)]
        stats: bool,
    },
    /// Poll the vector store for reachability
    Status {
        #[arg(long)]
        once: bool,
        #[arg(long, default_value = "30s")]
        interval: humantime::Duration,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vectail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Resolve config path
    let config_path = resolve_config_path(cli.config);

    // Dispatch to appropriate handler
    match cli.command {
        Commands::Ingest { collection, ttl } => {
            vectail::cli::ingest::run(config_path, collection, ttl.map(Into::into)).await?;
        }
        Commands::Sweep { collection, once } => {
            vectail::cli::sweep::run(config_path, collection, once).await?;
        }
        Commands::Search {
            query,
            collection,
            limit,
            min_score,
            level,
            source,
            hours,
            similar_to,
            stats,
        } => {
            let request = SearchRequest {
                query,
                collection,
                limit,
                min_score,
                level,
                source,
                hours,
                similar_to,
                stats,
            };
            vectail::cli::search::run(config_path, request).await?;
        }
        Commands::Status { once, interval } => {
            vectail::cli::status::run(config_path, once, interval.into()).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { stdout } => {
                vectail::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                vectail::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}

fn resolve_config_path(explicit_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path);
    }

    // Check ~/.config/vectail/config.yml
    if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(".config/vectail/config.yml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    // Check /etc/vectail/config.yml
    let system_config = PathBuf::from("/etc/vectail/config.yml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}
