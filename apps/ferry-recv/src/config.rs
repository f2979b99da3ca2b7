//! Receiver configuration.
//!
//! Stored as TOML. The path is the first command-line argument, falling
//! back to `ferry-receiver.toml` in the working directory. A missing file
//! means all defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use ferry_admission::{AdmissionConfig, PeerIdentity};
use ferry_receiver::storage::{DEFAULT_FILE_PREFIX, DEFAULT_SAMPLE_DIR, DEFAULT_SAVE_DIR};
use ferry_receiver::{HEADER_TIMEOUT, ReceiverConfig, SamplingRate, StorageLayout};
use serde::{Deserialize, Serialize};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "ferry-receiver.toml";

/// Receiver configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind.
    #[serde(default = "default_listen_address")]
    pub listen_address: IpAddr,

    /// TCP port (0 = auto-assign).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory for received files.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Directory for sampled copies.
    #[serde(default = "default_sample_dir")]
    pub sample_dir: PathBuf,

    /// Prefix for stored file names.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Probability in `[0, 1]` that a transfer is also written to `sample_dir`.
    #[serde(default)]
    pub sampling_rate: f64,

    /// Admitted connections per peer within `time_window_secs`.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_time_window_secs")]
    pub time_window_secs: u64,

    /// How peers are told apart by the rate limiter.
    #[serde(default)]
    pub peer_identity: PeerIdentity,

    /// Seconds to wait for the file header after accepting.
    #[serde(default = "default_header_timeout_secs")]
    pub header_timeout_secs: u64,
}

fn default_listen_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    ferry_receiver::ReceiverConfig::default().bind_addr.port()
}

fn default_save_dir() -> PathBuf {
    DEFAULT_SAVE_DIR.into()
}

fn default_sample_dir() -> PathBuf {
    DEFAULT_SAMPLE_DIR.into()
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.into()
}

fn default_max_requests() -> u32 {
    AdmissionConfig::default().max_requests()
}

fn default_time_window_secs() -> u64 {
    AdmissionConfig::default().window().as_secs()
}

fn default_header_timeout_secs() -> u64 {
    HEADER_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            port: default_port(),
            save_dir: default_save_dir(),
            sample_dir: default_sample_dir(),
            file_prefix: default_file_prefix(),
            sampling_rate: 0.0,
            max_requests: default_max_requests(),
            time_window_secs: default_time_window_secs(),
            peer_identity: PeerIdentity::default(),
            header_timeout_secs: default_header_timeout_secs(),
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

    /// Validates the file values into the server's configuration.
    pub fn to_receiver_config(&self) -> anyhow::Result<ReceiverConfig> {
        if self.header_timeout_secs == 0 {
            anyhow::bail!("header_timeout_secs must be positive");
        }
        let admission = AdmissionConfig::new(
            self.max_requests,
            Duration::from_secs(self.time_window_secs),
            self.peer_identity,
        )?;

        Ok(ReceiverConfig {
            bind_addr: SocketAddr::new(self.listen_address, self.port),
            storage: StorageLayout {
                save_dir: self.save_dir.clone(),
                sample_dir: self.sample_dir.clone(),
                prefix: self.file_prefix.clone(),
            },
            sampling_rate: SamplingRate::new(self.sampling_rate)?,
            admission,
            header_timeout: Duration::from_secs(self.header_timeout_secs),
        })
    }
}

/// Resolves the configuration path from the command line.
pub fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
