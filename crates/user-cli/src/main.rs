use std::process;

use clap::{Parser, Subcommand};
use tracing::info;
use user_store::{HashStore, MemoryStore, RedbStore, SqliteStore, UserStore};

mod commands;
mod config;

use config::{Backend, LogFormat, StoreArgs};

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// users: manage user records in a key-value store.
///
/// Serve the HTTP API or run one-shot record commands against the same store.
#[derive(Parser)]
#[command(name = "users", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    /// Log output format.
    #[arg(long, global = true, env = "USERS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Auto)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API until Ctrl-C.
    Serve {
        /// Address to listen on.
        #[arg(short, long, env = "USERS_LISTEN", default_value = "0.0.0.0:8000")]
        listen: String,
    },

    /// Create a user record.
    Create {
        /// Display name.
        #[arg(long)]
        name: String,

        /// Email address; identifies the record.
        #[arg(long)]
        email: String,
    },

    /// Show one user record.
    Get {
        /// Email of the record.
        email: String,
    },

    /// Overwrite an existing user record.
    Update {
        /// New display name.
        #[arg(long)]
        name: String,

        /// Email of the record to overwrite.
        #[arg(long)]
        email: String,
    },

    /// Delete a user record.
    Delete {
        /// Email of the record.
        email: String,
    },

    /// List every user record.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show backend details and the record count.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    config::init_logging(cli.log_format, default_level);

    if let Err(e) = dispatch(cli).await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Open the configured backend and run the command against it.
async fn dispatch(cli: Cli) -> Result {
    let args = cli.store;
    match args.backend {
        Backend::Memory => {
            let details = vec![("Backend", "memory (not persisted)".to_string())];
            run(args.users(MemoryStore::new()), cli.command, details).await
        }
        Backend::Sqlite => {
            let path = args.db_path();
            let store = SqliteStore::open(&path)?;
            let details = vec![
                ("Backend", "sqlite".to_string()),
                ("Database", path.display().to_string()),
                ("Size", commands::format_bytes(store.file_size()?)),
                ("Journal mode", store.journal_mode()?),
                ("Keys", store.key_count()?.to_string()),
            ];
            run(args.users(store), cli.command, details).await
        }
        Backend::Redb => {
            let path = args.db_path();
            let store = RedbStore::open(&path)?;
            let details = vec![
                ("Backend", "redb".to_string()),
                ("Database", path.display().to_string()),
                ("Keys", store.key_count()?.to_string()),
            ];
            run(args.users(store), cli.command, details).await
        }
        Backend::Redis => open_redis(&args, cli.command).await,
    }
}

#[cfg(feature = "redis")]
async fn open_redis(args: &StoreArgs, command: Commands) -> Result {
    let store = user_store::RedisStore::open(&args.redis_url)?;
    let details = vec![
        ("Backend", "redis".to_string()),
        ("URL", args.redis_url.clone()),
    ];
    run(args.users(store), command, details).await
}

#[cfg(not(feature = "redis"))]
async fn open_redis(_args: &StoreArgs, _command: Commands) -> Result {
    Err("this build has no redis backend; rebuild with `--features redis`".into())
}

async fn run<S>(users: UserStore<S>, command: Commands, details: Vec<(&str, String)>) -> Result
where
    S: HashStore + Send + Sync + 'static,
{
    match command {
        Commands::Serve { listen } => {
            info!(%listen, "starting user API");
            user_api::start(&listen, users).await
        }
        Commands::Create { name, email } => commands::create(&users, &name, &email),
        Commands::Get { email } => commands::get(&users, &email),
        Commands::Update { name, email } => commands::update(&users, &name, &email),
        Commands::Delete { email } => commands::delete(&users, &email),
        Commands::List { json } => commands::list(&users, json),
        Commands::Status => commands::status(&users, &details),
    }
}
