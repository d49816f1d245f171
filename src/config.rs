//! # Bridge Configuration
//!
//! Configuration is read once at startup from a `config.json` that sits next
//! to the executable, then handed by reference to every collaborator.
//!
//! ## Keys
//!
//! Both snake_case names and the legacy upper-case names are accepted:
//!
//! | Key | Legacy name | Default |
//! |-----|-------------|---------|
//! | `backend_url` | `LARAVEL_API_URL` | none (polling disabled) |
//! | `polling_interval_ms` | `POLLING_INTERVAL_MS` | 5000 |
//! | `polling_enabled` | `POLLING_ENABLED` | true |
//! | `port` | `PORT` | 9100 |
//! | `alert_sound_enabled` | `ALERT_SOUND_ENABLED` | false |
//! | `vfd_port` | `VFD_PORT` | none (VFD disabled) |
//! | `vfd_baud_rate` | `VFD_BAUD_RATE` | 9600 |
//! | `customer_view_enabled` | `CUSTOMER_VIEW_ENABLED` | false |
//! | `browser_path` | `BROWSER_PATH` | none |
//! | `drawer_device` | `DRAWER_DEVICE` | none (drawer disabled) |
//! | `sumatra_path` | `SUMATRA_PATH` | `SumatraPDF.exe` next to the executable |
//! | `print_timeout_ms` | `PRINT_TIMEOUT_MS` | 60000, `0` disables |
//! | `http_timeout_ms` | `HTTP_TIMEOUT_MS` | 30000, `0` disables |
//! | `cleanup_delay_ms` | `CLEANUP_DELAY_MS` | 0 (immediate) |
//! | `temp_dir` | `TEMP_DIR` | system temp dir |
//!
//! ## Failure Policy
//!
//! Nothing here aborts startup. Numbers may be JSON numbers or numeric
//! strings. A missing file, malformed JSON or a bad value logs a warning and
//! either falls back to the default or switches the feature off.

use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{BridgeError, Result};

/// Name of the configuration file looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default HTTP port, shared with the legacy bridge so POS front-ends keep working.
pub const DEFAULT_PORT: u16 = 9100;

const DEFAULT_POLLING_INTERVAL_MS: u64 = 5000;
const DEFAULT_VFD_BAUD_RATE: u32 = 9600;
const DEFAULT_PRINT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Backend polling settings. Only present when polling is enabled and valid.
#[derive(Debug, Clone, PartialEq)]
pub struct PollingConfig {
    /// Base URL of the backend, without a trailing slash
    pub backend_url: String,
    /// Fixed interval between poll cycles; also the retry interval
    pub interval: Duration,
}

/// Serial VFD settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VfdConfig {
    /// Serial port name (e.g., "COM3" or "/dev/ttyUSB0")
    pub port: String,
    pub baud_rate: u32,
}

/// Customer-facing browser screen settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerViewConfig {
    pub enabled: bool,
    /// Browser executable launched in kiosk mode
    pub browser_path: Option<PathBuf>,
}

/// Bridge configuration, constructed once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// `None` means the poll scheduler is not started
    pub polling: Option<PollingConfig>,
    /// HTTP listening port
    pub port: u16,
    pub alert_sound_enabled: bool,
    /// `None` means the VFD endpoint answers 400
    pub vfd: Option<VfdConfig>,
    pub customer_view: CustomerViewConfig,
    /// Device node the cash drawer kick is written to
    pub drawer_device: Option<PathBuf>,
    /// Explicit location of the Windows silent-print utility
    pub sumatra_path: Option<PathBuf>,
    /// Deadline for one print or enumeration subprocess
    pub print_timeout: Option<Duration>,
    /// Deadline for one backend request
    pub http_timeout: Option<Duration>,
    /// Grace period before a temp artifact is deleted
    pub cleanup_delay: Duration,
    /// Directory for temp artifacts, system temp dir if unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            polling: None,
            port: DEFAULT_PORT,
            alert_sound_enabled: false,
            vfd: None,
            customer_view: CustomerViewConfig::default(),
            drawer_device: None,
            sumatra_path: None,
            print_timeout: Some(Duration::from_millis(DEFAULT_PRINT_TIMEOUT_MS)),
            http_timeout: Some(Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS)),
            cleanup_delay: Duration::ZERO,
            temp_dir: None,
        }
    }
}

/// On-disk shape. Every value is kept loose so bad input degrades per key.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    #[serde(alias = "LARAVEL_API_URL", alias = "BACKEND_URL")]
    backend_url: Option<Value>,
    #[serde(alias = "POLLING_INTERVAL_MS")]
    polling_interval_ms: Option<Value>,
    #[serde(alias = "POLLING_ENABLED")]
    polling_enabled: Option<Value>,
    #[serde(alias = "PORT", alias = "APP_PORT")]
    port: Option<Value>,
    #[serde(alias = "ALERT_SOUND_ENABLED")]
    alert_sound_enabled: Option<Value>,
    #[serde(alias = "VFD_PORT")]
    vfd_port: Option<Value>,
    #[serde(alias = "VFD_BAUD_RATE")]
    vfd_baud_rate: Option<Value>,
    #[serde(alias = "CUSTOMER_VIEW_ENABLED")]
    customer_view_enabled: Option<Value>,
    #[serde(alias = "BROWSER_PATH")]
    browser_path: Option<Value>,
    #[serde(alias = "DRAWER_DEVICE")]
    drawer_device: Option<Value>,
    #[serde(alias = "SUMATRA_PATH")]
    sumatra_path: Option<Value>,
    #[serde(alias = "PRINT_TIMEOUT_MS")]
    print_timeout_ms: Option<Value>,
    #[serde(alias = "HTTP_TIMEOUT_MS")]
    http_timeout_ms: Option<Value>,
    #[serde(alias = "CLEANUP_DELAY_MS")]
    cleanup_delay_ms: Option<Value>,
    #[serde(alias = "TEMP_DIR")]
    temp_dir: Option<Value>,
}

/// Result of reading a numeric key.
#[derive(Debug, PartialEq)]
enum Number {
    Absent,
    Valid(u64),
    Invalid,
}

fn number(value: Option<&Value>) -> Number {
    match value {
        None | Some(Value::Null) => Number::Absent,
        Some(Value::Number(n)) => n.as_u64().map(Number::Valid).unwrap_or(Number::Invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Number::Absent,
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Number::Valid)
            .unwrap_or(Number::Invalid),
        Some(_) => Number::Invalid,
    }
}

fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Read a millisecond timeout where `0` disables the deadline.
fn timeout(key: &str, value: Option<&Value>, default_ms: u64) -> Option<Duration> {
    match number(value) {
        Number::Absent => Some(Duration::from_millis(default_ms)),
        Number::Valid(0) => None,
        Number::Valid(ms) => Some(Duration::from_millis(ms)),
        Number::Invalid => {
            warn!(key, default_ms, "invalid timeout, using default");
            Some(Duration::from_millis(default_ms))
        }
    }
}

impl BridgeConfig {
    /// Parse configuration from JSON text.
    ///
    /// Only a syntactically broken document is an error; bad individual
    /// values are resolved per key (see module docs).
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(contents)
            .map_err(|e| BridgeError::Config(format!("Invalid config JSON: {}", e)))?;
        Ok(Self::from_raw(raw))
    }

    /// Load configuration from a file, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "could not read config file, using defaults"
                );
                return Self::default();
            }
        };

        match Self::from_json_str(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "loaded configuration");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using defaults");
                Self::default()
            }
        }
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();

        let polling = resolve_polling(&raw);

        let port = match number(raw.port.as_ref()) {
            Number::Absent => DEFAULT_PORT,
            Number::Valid(p) if (1..=u16::MAX as u64).contains(&p) => p as u16,
            _ => {
                warn!(default = DEFAULT_PORT, "invalid port, using default");
                DEFAULT_PORT
            }
        };

        let vfd = text(raw.vfd_port.as_ref()).and_then(|port| {
            match number(raw.vfd_baud_rate.as_ref()) {
                Number::Absent => Some(VfdConfig {
                    port,
                    baud_rate: DEFAULT_VFD_BAUD_RATE,
                }),
                Number::Valid(baud) if baud > 0 && baud <= u32::MAX as u64 => Some(VfdConfig {
                    port,
                    baud_rate: baud as u32,
                }),
                _ => {
                    warn!(port = %port, "invalid VFD baud rate, VFD disabled");
                    None
                }
            }
        });

        let cleanup_delay = match number(raw.cleanup_delay_ms.as_ref()) {
            Number::Valid(ms) => Duration::from_millis(ms),
            Number::Absent => defaults.cleanup_delay,
            Number::Invalid => {
                warn!("invalid cleanup delay, deleting artifacts immediately");
                defaults.cleanup_delay
            }
        };

        Self {
            polling,
            port,
            alert_sound_enabled: flag(raw.alert_sound_enabled.as_ref()).unwrap_or(false),
            vfd,
            customer_view: CustomerViewConfig {
                enabled: flag(raw.customer_view_enabled.as_ref()).unwrap_or(false),
                browser_path: text(raw.browser_path.as_ref()).map(PathBuf::from),
            },
            drawer_device: text(raw.drawer_device.as_ref()).map(PathBuf::from),
            sumatra_path: text(raw.sumatra_path.as_ref()).map(PathBuf::from),
            print_timeout: timeout(
                "print_timeout_ms",
                raw.print_timeout_ms.as_ref(),
                DEFAULT_PRINT_TIMEOUT_MS,
            ),
            http_timeout: timeout(
                "http_timeout_ms",
                raw.http_timeout_ms.as_ref(),
                DEFAULT_HTTP_TIMEOUT_MS,
            ),
            cleanup_delay,
            temp_dir: text(raw.temp_dir.as_ref()).map(PathBuf::from),
        }
    }

    /// Address the HTTP server binds to.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn resolve_polling(raw: &RawConfig) -> Option<PollingConfig> {
    if flag(raw.polling_enabled.as_ref()) == Some(false) {
        info!("backend polling disabled by configuration");
        return None;
    }

    let Some(backend_url) = text(raw.backend_url.as_ref()) else {
        warn!("no backend URL configured, backend polling disabled");
        return None;
    };

    let interval_ms = match number(raw.polling_interval_ms.as_ref()) {
        Number::Absent => DEFAULT_POLLING_INTERVAL_MS,
        Number::Valid(ms) if ms > 0 => ms,
        _ => {
            warn!("invalid polling interval, backend polling disabled");
            return None;
        }
    };

    Some(PollingConfig {
        backend_url: backend_url.trim_end_matches('/').to_string(),
        interval: Duration::from_millis(interval_ms),
    })
}

/// Directory holding the running executable, falling back to the working directory.
pub fn app_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `config.json` next to the executable.
pub fn default_config_path() -> PathBuf {
    app_root().join(CONFIG_FILE_NAME)
}
