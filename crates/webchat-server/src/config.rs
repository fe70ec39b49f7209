//! Server configuration resolved once at startup.
//!
//! Values come from command-line flags (each with a `WEBCHAT_*` environment
//! fallback). When `--config` names a TOML file, every key present in that
//! file overrides the corresponding flag; absent keys leave the flag value
//! untouched.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use tracing::info;
use webchat_store::PersistMode;

use crate::error::ServerError;

/// Minimal multi-user web chat server.
#[derive(Debug, Parser)]
#[command(name = "webchat", version, about, long_about = None)]
pub struct Cli {
    /// Config file path (options in the file override command line options).
    #[arg(long, env = "WEBCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind port.
    #[arg(long, env = "WEBCHAT_PORT", default_value = "80")]
    pub port: String,

    /// Directory holding the HTML pages.
    #[arg(long, env = "WEBCHAT_DOCS_DIR", default_value = "./docs/")]
    pub docs_dir: PathBuf,

    /// Directory served under `/static`.
    #[arg(long, env = "WEBCHAT_STATIC_DIR", default_value = "./static/")]
    pub static_dir: PathBuf,

    /// Enable the /get_clients endpoint.
    #[arg(long, env = "WEBCHAT_GET_CLIENTS")]
    pub get_clients: bool,

    /// Persist the message log to disk.
    #[arg(long, env = "WEBCHAT_PERSIST")]
    pub persist: bool,

    /// How often to write data to disk (e.g. `30s`, `5m`, `1h30m`).
    #[arg(long, env = "WEBCHAT_PERSIST_INTERVAL", default_value = "5m")]
    pub persist_interval: String,

    /// Persistence data file.
    #[arg(long, env = "WEBCHAT_PERSIST_FILE", default_value = "data.json")]
    pub persist_file: PathBuf,

    /// What each flush writes: `suffix` (new records only) or `cumulative`.
    #[arg(long, env = "WEBCHAT_PERSIST_MODE", default_value = "suffix")]
    pub persist_mode: PersistMode,

    /// Serve over TLS.
    #[arg(long, env = "WEBCHAT_SSL")]
    pub ssl: bool,

    /// Path to the PEM certificate chain.
    #[arg(long = "cert", env = "WEBCHAT_SSL_CERT")]
    pub ssl_cert: Option<PathBuf>,

    /// Path to the PEM private key.
    #[arg(long = "key", env = "WEBCHAT_SSL_KEY")]
    pub ssl_key: Option<PathBuf>,
}

/// Keys accepted in the TOML config file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub doc_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub port: Option<PortSetting>,
    pub persist: Option<bool>,
    pub persist_file_path: Option<PathBuf>,
    pub persist_interval: Option<String>,
    pub persist_mode: Option<PersistMode>,
    pub get_clients_endpoint: Option<bool>,
    pub ssl: Option<bool>,
    pub ssl_cert_path: Option<PathBuf>,
    pub ssl_key_path: Option<PathBuf>,
}

/// `port = 8080` and `port = "8080"` are both accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PortSetting {
    Number(u16),
    Text(String),
}

/// Resolved configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub docs_dir: PathBuf,
    pub static_dir: PathBuf,
    pub port: u16,
    pub get_clients: bool,
    pub persist: bool,
    pub persist_file: PathBuf,
    /// Kept as text; the persistence scheduler parses it when it starts.
    pub persist_interval: String,
    pub persist_mode: PersistMode,
    pub ssl: bool,
    pub ssl_cert: Option<PathBuf>,
    pub ssl_key: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./docs/"),
            static_dir: PathBuf::from("./static/"),
            port: 80,
            get_clients: false,
            persist: false,
            persist_file: PathBuf::from("data.json"),
            persist_interval: "5m".to_string(),
            persist_mode: PersistMode::Suffix,
            ssl: false,
            ssl_cert: None,
            ssl_key: None,
        }
    }
}

impl ServerConfig {
    /// Build the configuration from parsed flags, then apply the config file
    /// if one was given.
    pub async fn resolve(cli: Cli) -> Result<Self, ServerError> {
        let config_path = cli.config.clone();
        let mut config = Self::from_cli(cli)?;

        if let Some(path) = config_path {
            let file = load_file_config(&path).await?;
            config.apply(file)?;
            info!(
                path = %path.display(),
                "Configuration file options overriding command line options"
            );
        }

        Ok(config)
    }

    pub fn from_cli(cli: Cli) -> Result<Self, ServerError> {
        Ok(Self {
            docs_dir: cli.docs_dir,
            static_dir: cli.static_dir,
            port: parse_port(&cli.port)?,
            get_clients: cli.get_clients,
            persist: cli.persist,
            persist_file: cli.persist_file,
            persist_interval: cli.persist_interval,
            persist_mode: cli.persist_mode,
            ssl: cli.ssl,
            ssl_cert: cli.ssl_cert,
            ssl_key: cli.ssl_key,
        })
    }

    pub fn apply(&mut self, file: FileConfig) -> Result<(), ServerError> {
        if let Some(dir) = file.doc_dir {
            self.docs_dir = dir;
        }
        if let Some(dir) = file.static_dir {
            self.static_dir = dir;
        }
        if let Some(port) = file.port {
            self.port = match port {
                PortSetting::Number(n) => n,
                PortSetting::Text(s) => parse_port(&s)?,
            };
        }
        if let Some(persist) = file.persist {
            self.persist = persist;
        }
        if let Some(path) = file.persist_file_path {
            self.persist_file = path;
        }
        if let Some(interval) = file.persist_interval {
            self.persist_interval = interval;
        }
        if let Some(mode) = file.persist_mode {
            self.persist_mode = mode;
        }
        if let Some(enabled) = file.get_clients_endpoint {
            self.get_clients = enabled;
        }
        if let Some(ssl) = file.ssl {
            self.ssl = ssl;
        }
        if let Some(cert) = file.ssl_cert_path {
            self.ssl_cert = Some(cert);
        }
        if let Some(key) = file.ssl_key_path {
            self.ssl_key = Some(key);
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        ([0, 0, 0, 0], self.port).into()
    }

    /// Certificate and key paths, required once SSL is on.
    pub fn tls_paths(&self) -> Result<(&Path, &Path), ServerError> {
        let cert = self
            .ssl_cert
            .as_deref()
            .ok_or(ServerError::MissingTlsMaterial("certificate"))?;
        let key = self
            .ssl_key
            .as_deref()
            .ok_or(ServerError::MissingTlsMaterial("key"))?;
        Ok((cert, key))
    }
}

async fn load_file_config(path: &Path) -> Result<FileConfig, ServerError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| ServerError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_port(value: &str) -> Result<u16, ServerError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| ServerError::InvalidPort(value.to_string()))
}
