use clap::{Parser, Subcommand};
use finrec_core::{HistoryExclusion, RecommenderStore, StoreConfig, DEFAULT_TOP_K};
use finrec_storage::ModelPersistence;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// A transaction-based collaborative-filtering recommender
#[derive(Parser, Debug)]
#[command(name = "finrec")]
#[command(about = "Recommend items from similar users' transactions", long_about = None)]
struct Args {
    /// Path to the model file
    #[arg(short, long, default_value = "./finrec-model.json")]
    model: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a transaction and persist the updated model
    Add {
        /// User the transaction belongs to
        #[arg(long)]
        user: String,

        /// Transaction id
        #[arg(long)]
        transaction: String,

        /// Comma-separated item ids
        #[arg(long, value_delimiter = ',')]
        items: Vec<String>,
    },

    /// Rank unseen items for a user from similar users' purchases
    Recommend {
        #[arg(long)]
        user: String,

        /// Number of similar users to consider
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Only keep items priced at or under this amount
        #[arg(long)]
        budget: Option<f64>,

        /// JSON object mapping item ids to prices; required with --budget
        #[arg(long)]
        prices: Option<PathBuf>,
    },

    /// Rank items by purchase frequency across other users
    History {
        #[arg(long)]
        user: String,

        /// Maximum number of items to return
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Exclude by transaction-table lookup of the user id instead of by
        /// the user's owned items
        #[arg(long)]
        transaction_key_exclusion: bool,
    },

    /// Jaccard similarity between two users' transaction sets
    Similarity {
        #[arg(long)]
        user1: String,

        #[arg(long)]
        user2: String,
    },

    /// Print model counts
    Stats,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.command {
        Command::History {
            transaction_key_exclusion: true,
            ..
        } => StoreConfig {
            history_exclusion: HistoryExclusion::TransactionKey,
        },
        _ => StoreConfig::default(),
    };

    let store = RecommenderStore::with_config(config);
    let persistence = ModelPersistence::new(&args.model);
    if persistence.load(&store)? {
        info!(
            users = store.user_count(),
            transactions = store.transaction_count(),
            "model ready"
        );
    }

    match args.command {
        Command::Add {
            user,
            transaction,
            items,
        } => {
            store.add_transaction(&user, &transaction, items);
            persistence.save(&store)?;
            println!("recorded transaction {} for {}", transaction, user);
        }

        Command::Recommend {
            user,
            top,
            budget,
            prices,
        } => {
            let recommendations = match (budget, prices) {
                (Some(budget), Some(prices_path)) => {
                    let raw = std::fs::read_to_string(&prices_path)?;
                    let prices: HashMap<String, f64> = serde_json::from_str(&raw)?;
                    store.budget_recommendations(&user, budget, &prices, top)
                }
                (Some(_), None) => anyhow::bail!("--budget requires --prices"),
                _ => store.recommendations(&user, top),
            };

            if recommendations.is_empty() {
                println!("no recommendations for {}", user);
            }
            for item in recommendations {
                println!("{}", item);
            }
        }

        Command::History { user, top, .. } => {
            let recommendations = store.history_recommendations(&user, top);
            if recommendations.is_empty() {
                println!("no recommendations for {}", user);
            }
            for item in recommendations {
                println!("{}", item);
            }
        }

        Command::Similarity { user1, user2 } => {
            println!("{:.4}", store.user_similarity(&user1, &user2));
        }

        Command::Stats => {
            println!("users:        {}", store.user_count());
            println!("transactions: {}", store.transaction_count());
            println!("items:        {}", store.item_count());
        }
    }

    Ok(())
}
