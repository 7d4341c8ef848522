use std::{fmt, path::PathBuf, time::Duration};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::services::{TokenSpecError, TokenTable};

/// Environment variables are read as `CUBBY_<FIELD>`.
pub const ENV_PREFIX: &str = "CUBBY_";

#[derive(Parser, Debug, Default)]
#[command(name = "cubby-api")]
#[command(about = "Token-authorized message cubbies over HTTP")]
pub struct Args {
    /// Bearer tokens (format: token:cubby1;token2:*). Overrides CUBBY_TOKENS.
    #[arg(long)]
    pub tokens: Option<String>,

    /// Path to the redb database file. Overrides CUBBY_DB_PATH.
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// HTTP listen address. Overrides CUBBY_LISTEN.
    #[arg(long)]
    pub listen: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bearer token bindings, e.g. `s3cret:alerts;0ps:*`.
    #[serde(default)]
    pub tokens: String,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_listen")]
    pub listen: String,
    /// How long to wait for another process to release the database file.
    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cubby.db")
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_open_timeout_ms() -> u64 {
    1_000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }

    /// Command-line flags take precedence over the environment.
    pub fn with_args(mut self, args: Args) -> Self {
        if let Some(tokens) = args.tokens {
            self.tokens = tokens;
        }
        if let Some(db_path) = args.db_path {
            self.db_path = db_path;
        }
        if let Some(listen) = args.listen {
            self.listen = listen;
        }
        self
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    pub fn token_table(&self) -> Result<TokenTable, TokenSpecError> {
        self.tokens.parse()
    }
}

// Hand-written so tokens never reach a log line.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tokens", &"<redacted>")
            .field("db_path", &self.db_path)
            .field("listen", &self.listen)
            .field("open_timeout_ms", &self.open_timeout_ms)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("env", &self.env)
            .finish()
    }
}
