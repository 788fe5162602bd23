/// The daemon's process id, persisted as decimal text at a well-known path.
///
/// Written once at daemon startup and never removed. A record left behind by
/// a dead daemon is not detected here; signalling it fails at delivery time.
use std::path::Path;

use nix::unistd::Pid;

use crate::error::ControlError;

/// Records `pid` at `path`, replacing any previous record.
pub fn write(path: &Path, pid: u32) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, pid.to_string())
}

/// Reads the recorded pid. A missing, unreadable or non-positive record is
/// reported as [`ControlError::NoDaemon`]; pid 0 and negative values would
/// address whole process groups.
pub fn read(path: &Path) -> Result<Pid, ControlError> {
    let no_daemon = |reason: String| ControlError::NoDaemon {
        path: path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| no_daemon(e.to_string()))?;
    let raw = content.trim();
    match raw.parse::<i32>() {
        Ok(pid) if pid > 0 => Ok(Pid::from_raw(pid)),
        Ok(pid) => Err(no_daemon(format!("invalid pid {pid}"))),
        Err(_) => Err(no_daemon(format!("invalid pid record {raw:?}"))),
    }
}
