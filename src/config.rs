use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Env var that supplies the session signing secret when the config file doesn't.
pub const SESSION_SECRET_ENV: &str = "PARSE_SESSION_SECRET";

/// Shortest accepted session secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Upper bound on `auth.session_days`.
pub const MAX_SESSION_DAYS: u64 = 365;

#[derive(Parser, Debug)]
#[command(name = "parse", about = "A small social publishing server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Secret used to sign session cookies
    #[arg(long)]
    pub session_secret: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_days: u64,
    /// Adds `Secure` to the session cookie. Turn on behind HTTPS.
    pub secure_cookie: bool,
    pub bcrypt_cost: u32,
    pub session_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "parse_session".to_string(),
            session_days: 7,
            secure_cookie: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            session_secret: None,
        }
    }
}

impl AuthConfig {
    pub fn session_max_age_secs(&self) -> u64 {
        self.session_days.min(MAX_SESSION_DAYS) * 24 * 60 * 60
    }

    /// Rejects settings the session and password code can't honour.
    pub fn check(&self) -> anyhow::Result<()> {
        if self.session_days == 0 || self.session_days > MAX_SESSION_DAYS {
            anyhow::bail!(
                "auth.session_days must be between 1 and {}, got {}",
                MAX_SESSION_DAYS,
                self.session_days
            );
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            anyhow::bail!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.bcrypt_cost
            );
        }
        Ok(())
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // Env beats the file, CLI beats both
        if let Ok(secret) = std::env::var(SESSION_SECRET_ENV) {
            config.auth.session_secret = Some(secret);
        }
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref secret) = cli.session_secret {
            config.auth.session_secret = Some(secret.clone());
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("parse.db"));
        }

        config.auth.check()?;
        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".parse")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("parse.db"))
    }

    /// The session signing secret. Start-up fails without one.
    pub fn session_secret(&self) -> anyhow::Result<&[u8]> {
        let secret = self.auth.session_secret.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "no session secret configured (set [auth] session_secret, {} or --session-secret)",
                SESSION_SECRET_ENV
            )
        })?;
        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!(
                "session secret must be at least {} bytes, got {}",
                MIN_SECRET_LEN,
                secret.len()
            );
        }
        Ok(secret.as_bytes())
    }
}
