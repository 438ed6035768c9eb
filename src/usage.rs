use serde::Serialize;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome recorded for one CLI invocation.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageResult {
    Success,
    Mismatch,
    Error,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct UsageEvent<'a> {
    pub command: &'a str,
    pub result: UsageResult,
    pub emit_updated: bool,
    pub used_input_file: bool,
}

#[derive(Serialize)]
struct UsageRecord<'a> {
    ts: u64,
    #[serde(flatten)]
    event: UsageEvent<'a>,
}

/// Append the event to the local usage log as one JSON line.
///
/// Logging is best-effort and opt-out: a write failure is reported to the
/// caller (who ignores it), and no log is written at all when disabled or
/// when no state directory can be resolved.
pub fn log_event(event: UsageEvent<'_>) -> io::Result<()> {
    let Some(path) = usage_log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let line = serde_json::to_string(&UsageRecord { ts, event }).map_err(io::Error::other)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}

/// Resolution order: opt-out, explicit override, platform state directory.
/// `None` means logging is disabled for this invocation.
fn usage_log_path() -> Option<PathBuf> {
    if std::env::var_os("HASHEDIT_DISABLE_USAGE_LOG").is_some() {
        return None;
    }
    if let Some(custom) = std::env::var_os("HASHEDIT_USAGE_LOG") {
        return Some(PathBuf::from(custom));
    }
    state_dir().map(|dir| dir.join("hashedit").join("usage.jsonl"))
}

#[cfg(windows)]
fn state_dir() -> Option<PathBuf> {
    std::env::var_os("APPDATA").map(PathBuf::from)
}

#[cfg(not(windows))]
fn state_dir() -> Option<PathBuf> {
    if let Some(xdg_state) = std::env::var_os("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg_state));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Mutex, OnceLock};
    use tempfile::NamedTempFile;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    /// Serializes env-var access across tests and restores a clean slate.
    fn with_clean_env<F: FnOnce()>(f: F) {
        let _guard = env_lock().lock().unwrap();
        std::env::remove_var("HASHEDIT_USAGE_LOG");
        std::env::remove_var("HASHEDIT_DISABLE_USAGE_LOG");
        f();
        std::env::remove_var("HASHEDIT_USAGE_LOG");
        std::env::remove_var("HASHEDIT_DISABLE_USAGE_LOG");
    }

    #[test]
    fn events_append_as_json_lines() {
        with_clean_env(|| {
            let temp = NamedTempFile::new().unwrap();
            std::env::set_var("HASHEDIT_USAGE_LOG", temp.path());

            log_event(UsageEvent {
                command: "apply",
                result: UsageResult::Success,
                emit_updated: true,
                used_input_file: false,
            })
            .unwrap();
            log_event(UsageEvent {
                command: "replace",
                result: UsageResult::Mismatch,
                emit_updated: false,
                used_input_file: true,
            })
            .unwrap();

            let content = fs::read_to_string(temp.path()).unwrap();
            let records: Vec<serde_json::Value> = content
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0]["command"], "apply");
            assert_eq!(records[0]["result"], "success");
            assert_eq!(records[0]["emit_updated"], true);
            assert_eq!(records[1]["command"], "replace");
            assert_eq!(records[1]["result"], "mismatch");
            assert!(records[1]["ts"].is_u64());
        });
    }

    #[test]
    fn opt_out_suppresses_writes() {
        with_clean_env(|| {
            let temp = NamedTempFile::new().unwrap();
            std::env::set_var("HASHEDIT_USAGE_LOG", temp.path());
            std::env::set_var("HASHEDIT_DISABLE_USAGE_LOG", "1");

            log_event(UsageEvent {
                command: "apply",
                result: UsageResult::Error,
                emit_updated: false,
                used_input_file: false,
            })
            .unwrap();

            assert_eq!(fs::metadata(temp.path()).unwrap().len(), 0);
        });
    }
}
