//! Sender configuration.
//!
//! Stored as TOML. The path is the first command-line argument, falling
//! back to `ferry-sender.toml` in the working directory. A missing file
//! means all defaults.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use ferry_protocol::{Compression, DEFAULT_PORT};
use ferry_sender::SenderOptions;
use serde::{Deserialize, Serialize};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "ferry-sender.toml";

/// Sender configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Receiver host name or IP address.
    #[serde(default = "default_receiver_host")]
    pub receiver_host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory whose regular files are sent.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// gzip level, 0 to 9.
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Seconds to wait for the checksum reply after the payload.
    #[serde(default = "default_timeout_secs")]
    pub reply_timeout_secs: u64,
}

fn default_receiver_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_source_dir() -> PathBuf {
    "client_files".into()
}

fn default_compression_level() -> u32 {
    Compression::default().level()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            receiver_host: default_receiver_host(),
            port: default_port(),
            source_dir: default_source_dir(),
            compression_level: default_compression_level(),
            connect_timeout_secs: default_timeout_secs(),
            reply_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, or defaults if it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Resolves the receiver address, taking the first result.
    pub fn receiver_addr(&self) -> anyhow::Result<SocketAddr> {
        (self.receiver_host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("resolving {}", self.receiver_host))?
            .next()
            .with_context(|| format!("no address for {}", self.receiver_host))
    }

    pub fn sender_options(&self) -> anyhow::Result<SenderOptions> {
        if self.compression_level > 9 {
            anyhow::bail!(
                "compression_level must be within 0..=9, got {}",
                self.compression_level
            );
        }
        if self.connect_timeout_secs == 0 || self.reply_timeout_secs == 0 {
            anyhow::bail!("timeouts must be positive");
        }
        Ok(SenderOptions {
            compression: Compression::new(self.compression_level),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            reply_timeout: Duration::from_secs(self.reply_timeout_secs),
        })
    }
}

/// Resolves the configuration path from the command line.
pub fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.receiver_host, "localhost");
        assert_eq!(config.port, 25565);
        assert_eq!(config.source_dir, Path::new("client_files"));
        assert_eq!(config.compression_level, 6);
    }

    #[test]
    fn config_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            receiver_host = "127.0.0.1"
            compression_level = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 25565);
        assert_eq!(
            config.receiver_addr().unwrap(),
            "127.0.0.1:25565".parse().unwrap()
        );
        assert_eq!(config.sender_options().unwrap().compression.level(), 9);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let level = Config {
            compression_level: 10,
            ..Config::default()
        };
        assert!(level.sender_options().is_err());

        let timeout = Config {
            reply_timeout_secs: 0,
            ..Config::default()
        };
        assert!(timeout.sender_options().is_err());
    }

    #[test]
    fn missing_file_means_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.receiver_host, "localhost");
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ferry-sender.toml");
        std::fs::write(&path, "source_dir = \"outbox\"\nport = 7000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.source_dir, Path::new("outbox"));
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn config_path_from_args() {
        let args = ["ferry-send"].map(String::from);
        assert_eq!(config_path(args.into_iter()), Path::new(DEFAULT_CONFIG_FILE));
    }
}
