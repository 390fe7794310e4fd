//! Command-line and environment configuration.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use user_store::{HashStore, UserStore, DEFAULT_KEY_PREFIX};

/// Which key-value store backs the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Process-local map; nothing survives exit.
    Memory,
    /// SQLite database file.
    Sqlite,
    /// redb database file.
    Redb,
    /// Redis server.
    Redis,
}

impl Backend {
    fn default_db(self) -> &'static str {
        match self {
            Self::Redb => "users.redb",
            _ => "users.db",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// JSON when stderr is not a terminal, text otherwise.
    Auto,
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Store selection shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Storage backend.
    #[arg(long, global = true, env = "USERS_BACKEND", value_enum, default_value_t = Backend::Sqlite)]
    pub backend: Backend,

    /// Database file for the sqlite and redb backends.
    #[arg(long, global = true, env = "USERS_DB")]
    pub db: Option<PathBuf>,

    /// Connection URL for the redis backend.
    #[arg(
        long,
        global = true,
        env = "USERS_REDIS_URL",
        default_value = "redis://127.0.0.1:6379/"
    )]
    pub redis_url: String,

    /// Prefix prepended to each email to form its key.
    #[arg(long, global = true, env = "USERS_KEY_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,
}

impl StoreArgs {
    /// The database file, falling back to a per-backend default name.
    pub fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.backend.default_db()))
    }

    /// Wrap `store` in the record adapter with the configured prefix.
    pub fn users<S: HashStore>(&self, store: S) -> UserStore<S> {
        UserStore::builder(store)
            .key_prefix(&self.key_prefix)
            .build()
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_level`. Events go to stderr so command
/// output on stdout stays clean.
pub fn init_logging(format: LogFormat, default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let use_json = match format {
        LogFormat::Json => true,
        LogFormat::Text => false,
        LogFormat::Auto => !std::io::stderr().is_terminal(),
    };

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
