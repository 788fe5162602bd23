/// Canonical file locations.
///
/// The config file lives under the user's config directory:
///   - `$XDG_CONFIG_HOME/abyssa/config.toml` (usually `~/.config/abyssa/`)
///
/// The watched directory and the pid record default to fixed locations under
/// `/tmp`; both can be overridden in the config file.
use std::path::PathBuf;

const APP_DIR_NAME: &str = "abyssa";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory the screenshot tool drops its images into.
pub const DEFAULT_WATCH_DIR: &str = "/tmp/greenclip/";
/// Where the daemon records its process id.
pub const DEFAULT_PID_FILE: &str = "/tmp/abyssa";

/// Returns the abyssa config directory, falling back to the working directory
/// when the platform reports none.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Returns the full path to the default config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}
