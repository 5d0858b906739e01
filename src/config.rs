//! Configuration manager for accounts.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_PORT: u16 = 8888;
const DEFAULT_PER_PAGE: u64 = 15;
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    #[serde(default)]
    pub name: String,
    /// Public URL of current instance.
    #[serde(default)]
    pub url: String,
    /// Listening port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether newly registered accounts must be activated before login.
    #[serde(default)]
    pub activation_required: bool,
    /// Default page size of user listing.
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    #[serde(default)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to JsonWebToken configuration.
    #[serde(skip_serializing)]
    pub token: Option<Token>,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_per_page() -> u64 {
    DEFAULT_PER_PAGE
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            url: String::default(),
            port: DEFAULT_PORT,
            activation_required: false,
            per_page: DEFAULT_PER_PAGE,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            token: None,
            postgres: None,
            argon2: None,
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// Json Web Token configuration.
///
/// A pair of EC PEM keys takes precedence over `secret`.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Token {
    pub secret: Option<String>,
    pub public_key_pem: Option<String>,
    pub private_key_pem: Option<String>,
    /// Update token audience.
    pub audience: Option<String>,
    /// Lifetime of a token, in seconds.
    pub expiration: Option<u64>,
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Instance version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location, then applies environment overrides.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &default_path
        };

        let mut config = match File::open(file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file)
            {
                Ok(mut config) => {
                    if !config.url.is_empty() {
                        config.url = self.normalize_url(&config.url)?;
                    }
                    config
                },
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        // set app version.
        config.version = VERSION.to_owned();
        config.apply_env();

        Ok(Arc::new(config))
    }

    fn apply_env(&mut self) {
        if let Some(port) =
            std::env::var("PORT").ok().and_then(|port| port.parse().ok())
        {
            self.port = port;
        }

        if let Ok(secret) = std::env::var("TOKEN_SECRET") {
            self.token.get_or_insert_with(Token::default).secret = Some(secret);
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found or invalid");
        Self::default()
    }
}
