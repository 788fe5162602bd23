use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::{DEFAULT_PID_FILE, DEFAULT_WATCH_DIR};

/// Images smaller than 550×550 pixels are upscaled before recognition.
pub const DEFAULT_AREA_LOWER_BOUND: u64 = 550 * 550;
/// Fraction of the exact area-matching scale factor that is actually applied.
pub const DEFAULT_SCALE_DAMPING: f64 = 0.5;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SINK_TIMEOUT_SECS: u64 = 5;

/// Root configuration structure. Deserialized from `~/.config/abyssa/config.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub sinks: SinkConfig,
}

/// Process-level settings shared by the daemon and the control client.
#[derive(Debug, Deserialize)]
pub struct DaemonConfig {
    /// Directory watched for new screenshots.
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,
    /// File holding the daemon's pid as decimal text.
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,
    /// Delay between directory scans.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl DaemonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            pid_file: default_pid_file(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Recognition and pre-processing policy.
#[derive(Debug, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code.
    #[serde(default = "default_language")]
    pub language: String,
    /// Minimum pixel area below which images are rescaled.
    #[serde(default = "default_area_lower_bound")]
    pub area_lower_bound: u64,
    #[serde(default = "default_scale_damping")]
    pub scale_damping: f64,
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            area_lower_bound: DEFAULT_AREA_LOWER_BOUND,
            scale_damping: DEFAULT_SCALE_DAMPING,
            timeout_secs: DEFAULT_OCR_TIMEOUT_SECS,
        }
    }
}

/// External utilities used to deliver text. The first element is the program,
/// the rest are leading arguments.
#[derive(Debug, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_clipboard_command")]
    pub clipboard_command: Vec<String>,
    #[serde(default = "default_notify_command")]
    pub notify_command: Vec<String>,
    #[serde(default = "default_sink_timeout_secs")]
    pub timeout_secs: u64,
}

impl SinkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            clipboard_command: default_clipboard_command(),
            notify_command: default_notify_command(),
            timeout_secs: DEFAULT_SINK_TIMEOUT_SECS,
        }
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn default_watch_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WATCH_DIR)
}

fn default_pid_file() -> PathBuf {
    PathBuf::from(DEFAULT_PID_FILE)
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_language() -> String {
    DEFAULT_OCR_LANGUAGE.to_string()
}

fn default_area_lower_bound() -> u64 {
    DEFAULT_AREA_LOWER_BOUND
}

fn default_scale_damping() -> f64 {
    DEFAULT_SCALE_DAMPING
}

fn default_ocr_timeout_secs() -> u64 {
    DEFAULT_OCR_TIMEOUT_SECS
}

fn default_clipboard_command() -> Vec<String> {
    vec!["xclip".into(), "-selection".into(), "clipboard".into()]
}

fn default_notify_command() -> Vec<String> {
    vec!["notify-send".into(), "--icon=none".into()]
}

fn default_sink_timeout_secs() -> u64 {
    DEFAULT_SINK_TIMEOUT_SECS
}
