//! Service configuration
//!
//! Resolution priority: environment variables override the TOML file, which
//! overrides compiled defaults. The config file is looked up at
//! `$KINOCAT_CONFIG`, then `./kinocat.toml`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Directory holding the database file and the blob store
    pub data_dir: PathBuf,
    /// Keep-alive period for streaming subscribers, seconds
    pub heartbeat_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5730,
            data_dir: default_data_dir(),
            heartbeat_secs: 20,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("kinocat"))
        .unwrap_or_else(|| PathBuf::from("./kinocat_data"))
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Self {
        let path = std::env::var("KINOCAT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("kinocat.toml"));

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Config file unreadable, using defaults");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        };

        if let Ok(port) = std::env::var("KINOCAT_PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(port = %port, "KINOCAT_PORT is not a valid port number, ignored"),
            }
        }
        if let Ok(dir) = std::env::var("KINOCAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("kinocat.db")
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.port, 5730);
        assert_eq!(config.heartbeat_secs, 20);
        assert!(config.database_path().ends_with("kinocat.db"));
        assert!(config.blob_dir().ends_with("blobs"));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("port = 9000\n").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.heartbeat_secs, 20);
    }
}
