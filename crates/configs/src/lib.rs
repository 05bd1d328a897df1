use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080 }
    }
}

/// Empty `url` means no database; services fall back to in-memory storage.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Hex-encoded 64-byte Ed25519 key. A fresh key is generated when unset.
    #[serde(default)]
    pub private_key_path: Option<String>,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_max_password_length")]
    pub max_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            private_key_path: None,
            min_password_length: default_min_password_length(),
            max_password_length: default_max_password_length(),
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_min_password_length() -> usize { 8 }
fn default_max_password_length() -> usize { 72 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("cannot read config {path}: {e}"))?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(|key| std::env::var(key).ok())
    }

    /// Same as [`normalize_and_validate`](Self::normalize_and_validate) with an
    /// explicit environment lookup.
    pub fn normalize_with(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.api.normalize()?;
        self.database.normalize_from(&env);
        self.database.validate()?;
        self.auth.normalize_from(&env);
        self.auth.validate()?;
        Ok(())
    }
}

impl ApiConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("api.port must be in 1..=65535"));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from(&mut self, env: impl Fn(&str) -> Option<String>) {
        if self.url.trim().is_empty() {
            if let Some(url) = env("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_configured() {
            return Ok(());
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from(&mut self, env: impl Fn(&str) -> Option<String>) {
        let unset = self
            .private_key_path
            .as_deref()
            .map_or(true, |path| path.trim().is_empty());
        if unset {
            self.private_key_path = env("PRIVATE_KEY_PATH").filter(|path| !path.trim().is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_password_length == 0 {
            return Err(anyhow!("auth.min_password_length must be >= 1"));
        }
        if self.max_password_length < self.min_password_length {
            return Err(anyhow!("auth.max_password_length must be >= min_password_length"));
        }
        Ok(())
    }
}
