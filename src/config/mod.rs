use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Prefix shared by every environment variable the application reads
pub const ENV_PREFIX: &str = "SNACKSHOP_";

/// Configuration for the application
#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Path of the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// File the log output is appended to
    #[serde(default = "default_log_path")]
    pub log_path: String,
    /// env_logger filter directive, e.g. `info` or `snackshop_invoices=debug`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_path() -> String {
    "snackshop.db".to_string()
}

fn default_log_path() -> String {
    "snackshop.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_path: default_log_path(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Every field has a default, so an empty environment yields a usable config.
    pub fn load() -> Result<Self> {
        let config = envy::prefixed(ENV_PREFIX).from_env::<Config>()?;

        Ok(config)
    }

    /// Build a config from explicit key/value pairs instead of the process environment
    #[cfg(test)]
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::prefixed(ENV_PREFIX).from_iter::<_, Config>(pairs)?;

        Ok(config)
    }

    pub fn database_path(&self) -> &str {
        &self.database_path
    }
}

/// Load the .env file (if any) and read the configuration
pub fn init() -> Result<Config> {
    dotenv().ok();

    Config::load()
}
