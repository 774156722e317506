//! TOML configuration.
//!
//! ```toml
//! [layout]
//! crate_rows = 2
//! crate_columns = 2
//! crate_width = 5
//! crate_height = 4
//! crates = ["bottomleft", "bottomright", "topright", "topleft"]
//!
//! [device]
//! path = "/dev/spidev0.0"
//!
//! [server]
//! port = 1337
//! allowed_host = "10.0.0.5"
//!
//! [idle]
//! threshold_secs = 10.0
//!
//! [idle.content]
//! kind = "text"
//! message = "Hello"
//! ```
//!
//! Only `[layout]` is required. `crates` may also be a single comma separated string.
//! [`Config::resolve`] checks everything and produces the runtime types, so a bad file fails
//! before any hardware is touched.

use core::time::Duration;
use std::{
    fs,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::info;

use crate::{
    Error, Result,
    arbiter::ArbiterSettings,
    idle::{IdleContent, IdleContentConfig},
    ingest::{ChecksumPolicy, DEFAULT_PORT, ListenerSettings},
    panel::{PanelGeometry, PanelTopology},
};

/// Default hardware sink.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/spidev0.0";

/// Whole configuration file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Crate grid and wiring chain.
    pub layout: LayoutConfig,
    /// Hardware sink.
    #[serde(default)]
    pub device: DeviceConfig,
    /// UDP listener.
    #[serde(default)]
    pub server: ServerConfig,
    /// Idle behaviour.
    #[serde(default)]
    pub idle: IdleConfig,
}

/// `[layout]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Rows of crates.
    pub crate_rows: usize,
    /// Columns of crates.
    pub crate_columns: usize,
    /// LEDs across one crate.
    pub crate_width: usize,
    /// LEDs down one crate.
    pub crate_height: usize,
    /// Orientation of each crate in wiring order.
    pub crates: CrateList,
}

/// Orientation tokens, either as a TOML array or one comma separated string.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CrateList {
    /// `["bottomleft", "topleft"]`
    List(Vec<String>),
    /// `"bottomleft, topleft"`
    Joined(String),
}

impl CrateList {
    /// The individual tokens, trimmed.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::List(tokens) => tokens.iter().map(|token| token.trim().to_owned()).collect(),
            Self::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// `[device]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Device file the frames are written to.
    #[serde(default = "default_device_path")]
    pub path: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: default_device_path(),
        }
    }
}

fn default_device_path() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE_PATH)
}

/// `[server]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind: IpAddr,
    /// UDP port.
    pub port: u16,
    /// Only accept frames from this host.
    pub allowed_host: Option<String>,
    /// CRC mismatch handling.
    pub checksum: ChecksumPolicy,
    /// Frames buffered between the receiver task and the arbiter.
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            allowed_host: None,
            checksum: ChecksumPolicy::default(),
            channel_capacity: 4,
        }
    }
}

/// `[idle]`
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IdleConfig {
    /// Seconds without a live frame before idle content starts.
    pub threshold_secs: f64,
    /// Idle watcher period.
    pub watch_interval_ms: u64,
    /// Filler frame period.
    pub frame_interval_ms: u64,
    /// What to show.
    pub content: IdleContentConfig,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            threshold_secs: 10.0,
            watch_interval_ms: 1000,
            frame_interval_ms: 50,
            content: IdleContentConfig::default(),
        }
    }
}

/// Everything the server needs, validated.
#[derive(Clone, Debug)]
pub struct Resolved {
    /// Panel dimensions.
    pub geometry: PanelGeometry,
    /// Crate placements.
    pub topology: PanelTopology,
    /// Hardware sink path.
    pub device_path: PathBuf,
    /// UDP listener settings.
    pub listener: ListenerSettings,
    /// Arbiter timing.
    pub arbiter: ArbiterSettings,
    /// Prepared idle content.
    pub idle: IdleContent,
}

impl Config {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read and [`Error::ConfigParse`] if it
    /// is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| Error::config(format!("cannot read {}: {err}", path.display())))?;
        let config = Self::from_toml(&text)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] for invalid TOML or unknown fields.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Validate and build the runtime types. Renders idle text and decodes idle images.
    ///
    /// # Errors
    ///
    /// Returns the geometry, orientation or topology error of the layout,
    /// [`Error::Config`] for bad server or idle settings, and [`Error::Image`] for an idle
    /// animation that cannot be decoded.
    pub fn resolve(&self) -> Result<Resolved> {
        let layout = &self.layout;
        let geometry = PanelGeometry::new(
            layout.crate_rows,
            layout.crate_columns,
            layout.crate_width,
            layout.crate_height,
        )?;
        let topology = PanelTopology::resolve(&layout.crates.tokens(), geometry)?;

        if self.server.channel_capacity == 0 {
            return Err(Error::config("server.channel_capacity must be at least 1"));
        }
        let listener = ListenerSettings {
            bind: self.server.bind,
            port: self.server.port,
            allowed_host: self.server.allowed_host.clone(),
            checksum: self.server.checksum,
            channel_capacity: self.server.channel_capacity,
        };

        let arbiter = self.idle.arbiter_settings()?;
        let idle = IdleContent::prepare(&self.idle.content, &geometry)?;

        Ok(Resolved {
            geometry,
            topology,
            device_path: self.device.path.clone(),
            listener,
            arbiter,
            idle,
        })
    }
}

impl IdleConfig {
    /// Timing settings for the arbiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a negative or non-finite threshold, or a zero interval.
    pub fn arbiter_settings(&self) -> Result<ArbiterSettings> {
        let idle_threshold = Duration::try_from_secs_f64(self.threshold_secs).map_err(|_| {
            Error::config(format!(
                "idle.threshold_secs must be a non-negative number, got {}",
                self.threshold_secs
            ))
        })?;
        if self.watch_interval_ms == 0 || self.frame_interval_ms == 0 {
            return Err(Error::config(
                "idle.watch_interval_ms and idle.frame_interval_ms must be positive",
            ));
        }
        Ok(ArbiterSettings {
            idle_threshold,
            watch_interval: Duration::from_millis(self.watch_interval_ms),
            frame_interval: Duration::from_millis(self.frame_interval_ms),
        })
    }
}
