use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub database: DatabaseConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 0)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Store location: a `sqlite:` directory, or `sqlite::memory:`
    pub url: String,

    /// Store name, used as the database file stem
    pub name: String,

    pub max_connections: u32,

    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data".to_string(),
            name: "bugtracker".to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

impl DatabaseConfig {
    /// Path of the database file, or `None` for an in-memory store.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        if self.url.contains(":memory:") {
            return None;
        }

        let dir = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))
            .unwrap_or(&self.url);

        Some(Path::new(dir).join(format!("{}.db", self.name)))
    }

    /// Connection string handed to the driver.
    #[must_use]
    pub fn connection_url(&self) -> String {
        self.file_path().map_or_else(
            || self.url.clone(),
            |path| format!("sqlite://{}?mode=rwc", path.display()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on the auth cookie.
    /// Default: true. Set to false for local development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,

    /// Session token lifetime, also used as the cookie Max-Age
    pub token_ttl_minutes: i64,

    /// Argon2 time cost (iterations), the "salt rounds" knob
    pub hash_rounds: u32,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Whether to re-hash legacy plain-text passwords on login
    pub auto_migrate_password_hashes: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_minutes: 60,
            hash_rounds: 3,
            argon2_memory_cost_kib: 8192,
            argon2_parallelism: 1,
            auto_migrate_password_hashes: true,
        }
    }
}

impl SecurityConfig {
    /// Longest accepted session lifetime (one week).
    pub const MAX_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "bugtracker".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies `.env` and environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Like [`Config::load`], but reads `path` when one is given.
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_file()?,
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Applies `DB_URL`, `DB_NAME`, `JWT_SECRET`, `PORT`, `SALT_ROUNDS` and `LOG_LEVEL`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("DB_URL") {
            self.database.url = url;
        }
        if let Some(name) = lookup("DB_NAME") {
            self.database.name = name;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {port}"))?;
        }
        if let Some(rounds) = lookup("SALT_ROUNDS") {
            self.security.hash_rounds = rounds
                .trim()
                .parse()
                .with_context(|| format!("Invalid SALT_ROUNDS: {rounds}"))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bugtracker").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".bugtracker").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes a default config with a freshly generated signing secret.
    /// Returns `false` when the file already exists.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        let mut config = Self::default();
        config.security.jwt_secret = generate_secret();
        config.save_to_path(path)?;
        info!("Created default config file: {}", path.display());
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("Database URL is not configured (set database.url or DB_URL)");
        }

        if self.database.name.trim().is_empty() {
            anyhow::bail!("Database name is not configured (set database.name or DB_NAME)");
        }

        if self.security.jwt_secret.is_empty() {
            anyhow::bail!("Token signing secret is not configured (set security.jwt_secret or JWT_SECRET)");
        }

        if self.security.hash_rounds == 0 {
            anyhow::bail!("security.hash_rounds must be > 0");
        }

        if !(1..=SecurityConfig::MAX_TOKEN_TTL_MINUTES).contains(&self.security.token_ttl_minutes) {
            anyhow::bail!(
                "security.token_ttl_minutes must be between 1 and {}",
                SecurityConfig::MAX_TOKEN_TTL_MINUTES
            );
        }

        Ok(())
    }
}

/// 64-character hex secret.
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}
