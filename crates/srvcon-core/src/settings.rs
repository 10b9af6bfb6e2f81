//! Console settings and validation.
//!
//! These are pure configuration types. The CLI fills them from flags,
//! environment and an optional JSON file; the runtime reads the effective
//! values when it builds a logger.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default flush cadence of the ingest scheduler.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 250;

/// Default time a fragment may wait for another source's line to finish.
pub const DEFAULT_HOLDOFF_MS: u64 = 2500;

/// Default capacity of the live-view recent buffer.
pub const DEFAULT_RECENT_BUFFER_BYTES: usize = 256 * 1024;

/// Default slice removed from the front of the recent buffer when over cap.
pub const DEFAULT_RECENT_TRIM_BYTES: usize = 32 * 1024;

const DEFAULT_LOG_FILE_PREFIX: &str = "console";
const DEFAULT_MAX_LOG_FILES: usize = 7;

/// How often the console log file rotates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

/// Console settings.
///
/// All fields are optional to support partial files and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Flush cadence in milliseconds (10-5000).
    pub flush_interval_ms: Option<u64>,

    /// Holdoff before a waiting fragment forces a line break (100-60000).
    pub holdoff_ms: Option<u64>,

    /// Recent buffer capacity in bytes.
    pub recent_buffer_bytes: Option<usize>,

    /// Bytes removed from the recent buffer head per trim.
    pub recent_trim_bytes: Option<usize>,

    /// Suppress the terminal sink.
    pub quiet: Option<bool>,

    /// Directory for the rotating console log. No file sink when unset.
    pub log_dir: Option<PathBuf>,

    /// File name prefix for the console log.
    pub log_file_prefix: Option<String>,

    /// Number of rotated log files to keep.
    pub max_log_files: Option<usize>,

    /// Rotation period for the console log.
    pub rotation: Option<LogRotation>,
}

impl ConsoleSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            flush_interval_ms: Some(DEFAULT_FLUSH_INTERVAL_MS),
            holdoff_ms: Some(DEFAULT_HOLDOFF_MS),
            recent_buffer_bytes: Some(DEFAULT_RECENT_BUFFER_BYTES),
            recent_trim_bytes: Some(DEFAULT_RECENT_TRIM_BYTES),
            quiet: Some(false),
            log_dir: None,
            log_file_prefix: Some(DEFAULT_LOG_FILE_PREFIX.to_string()),
            max_log_files: Some(DEFAULT_MAX_LOG_FILES),
            rotation: Some(LogRotation::Daily),
        }
    }

    /// Load settings from a JSON file. Missing fields stay `None`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings: Self = serde_json::from_str(&raw).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded console settings");
        Ok(settings)
    }

    pub fn effective_flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.unwrap_or(DEFAULT_FLUSH_INTERVAL_MS))
    }

    pub fn effective_holdoff(&self) -> Duration {
        Duration::from_millis(self.holdoff_ms.unwrap_or(DEFAULT_HOLDOFF_MS))
    }

    pub fn effective_recent_buffer_bytes(&self) -> usize {
        self.recent_buffer_bytes
            .unwrap_or(DEFAULT_RECENT_BUFFER_BYTES)
    }

    pub fn effective_recent_trim_bytes(&self) -> usize {
        self.recent_trim_bytes.unwrap_or(DEFAULT_RECENT_TRIM_BYTES)
    }

    pub fn effective_quiet(&self) -> bool {
        self.quiet.unwrap_or(false)
    }

    pub fn effective_log_file_prefix(&self) -> &str {
        self.log_file_prefix
            .as_deref()
            .unwrap_or(DEFAULT_LOG_FILE_PREFIX)
    }

    pub fn effective_max_log_files(&self) -> usize {
        self.max_log_files.unwrap_or(DEFAULT_MAX_LOG_FILES)
    }

    pub fn effective_rotation(&self) -> LogRotation {
        self.rotation.unwrap_or_default()
    }

    /// Merge an update into these settings, only touching fields that are Some.
    pub fn merge(&mut self, other: &ConsoleSettingsUpdate) {
        if let Some(ref v) = other.flush_interval_ms {
            self.flush_interval_ms = *v;
        }
        if let Some(ref v) = other.holdoff_ms {
            self.holdoff_ms = *v;
        }
        if let Some(ref v) = other.recent_buffer_bytes {
            self.recent_buffer_bytes = *v;
        }
        if let Some(ref v) = other.recent_trim_bytes {
            self.recent_trim_bytes = *v;
        }
        if let Some(ref v) = other.quiet {
            self.quiet = *v;
        }
        if let Some(ref v) = other.log_dir {
            self.log_dir.clone_from(v);
        }
        if let Some(ref v) = other.log_file_prefix {
            self.log_file_prefix.clone_from(v);
        }
        if let Some(ref v) = other.max_log_files {
            self.max_log_files = *v;
        }
        if let Some(ref v) = other.rotation {
            self.rotation = *v;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset the field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleSettingsUpdate {
    pub flush_interval_ms: Option<Option<u64>>,
    pub holdoff_ms: Option<Option<u64>>,
    pub recent_buffer_bytes: Option<Option<usize>>,
    pub recent_trim_bytes: Option<Option<usize>>,
    pub quiet: Option<Option<bool>>,
    pub log_dir: Option<Option<PathBuf>>,
    pub log_file_prefix: Option<Option<String>>,
    pub max_log_files: Option<Option<usize>>,
    pub rotation: Option<Option<LogRotation>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Flush interval must be between 10 and 5000 ms, got {0}")]
    InvalidFlushInterval(u64),

    #[error("Holdoff must be between 100 and 60000 ms, got {0}")]
    InvalidHoldoff(u64),

    #[error("Holdoff ({holdoff_ms} ms) must exceed the flush interval ({flush_interval_ms} ms)")]
    HoldoffTooShort {
        holdoff_ms: u64,
        flush_interval_ms: u64,
    },

    #[error("Recent buffer trim slice must be non-zero and below the capacity ({capacity}), got {trim}")]
    InvalidRecentTrim { capacity: usize, trim: usize },

    #[error("Log file prefix cannot be empty")]
    EmptyLogFilePrefix,

    #[error("At least one log file must be retained")]
    InvalidMaxLogFiles,

    #[error("Failed to read settings file {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse settings file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &ConsoleSettings) -> Result<(), SettingsError> {
    if let Some(interval) = settings.flush_interval_ms {
        if !(10..=5000).contains(&interval) {
            return Err(SettingsError::InvalidFlushInterval(interval));
        }
    }

    if let Some(holdoff) = settings.holdoff_ms {
        if !(100..=60_000).contains(&holdoff) {
            return Err(SettingsError::InvalidHoldoff(holdoff));
        }
    }

    let holdoff_ms = settings.holdoff_ms.unwrap_or(DEFAULT_HOLDOFF_MS);
    let flush_interval_ms = settings
        .flush_interval_ms
        .unwrap_or(DEFAULT_FLUSH_INTERVAL_MS);
    if holdoff_ms <= flush_interval_ms {
        return Err(SettingsError::HoldoffTooShort {
            holdoff_ms,
            flush_interval_ms,
        });
    }

    let capacity = settings.effective_recent_buffer_bytes();
    let trim = settings.effective_recent_trim_bytes();
    if trim == 0 || trim >= capacity {
        return Err(SettingsError::InvalidRecentTrim { capacity, trim });
    }

    if settings
        .log_file_prefix
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyLogFilePrefix);
    }

    if settings.max_log_files == Some(0) {
        return Err(SettingsError::InvalidMaxLogFiles);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = ConsoleSettings::with_defaults();
        assert!(validate_settings(&settings).is_ok());
        assert_eq!(settings.effective_flush_interval(), Duration::from_millis(250));
        assert_eq!(settings.effective_holdoff(), Duration::from_millis(2500));
    }

    #[test]
    fn test_empty_settings_fall_back_to_defaults() {
        let settings = ConsoleSettings::default();
        assert!(validate_settings(&settings).is_ok());
        assert_eq!(settings.effective_recent_buffer_bytes(), 256 * 1024);
        assert_eq!(settings.effective_recent_trim_bytes(), 32 * 1024);
        assert_eq!(settings.effective_log_file_prefix(), "console");
        assert_eq!(settings.effective_rotation(), LogRotation::Daily);
        assert!(!settings.effective_quiet());
    }

    #[test]
    fn test_invalid_flush_interval() {
        let settings = ConsoleSettings {
            flush_interval_ms: Some(5),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidFlushInterval(5))
        );
    }

    #[test]
    fn test_holdoff_must_exceed_flush_interval() {
        let settings = ConsoleSettings {
            flush_interval_ms: Some(1000),
            holdoff_ms: Some(500),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::HoldoffTooShort { .. })
        ));
    }

    #[test]
    fn test_trim_must_be_below_capacity() {
        let settings = ConsoleSettings {
            recent_buffer_bytes: Some(1024),
            recent_trim_bytes: Some(1024),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidRecentTrim {
                capacity: 1024,
                trim: 1024
            })
        );
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let settings = ConsoleSettings {
            log_file_prefix: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::EmptyLogFilePrefix)
        );
    }

    #[test]
    fn test_merge_partial_update() {
        let mut settings = ConsoleSettings::with_defaults();
        let update = ConsoleSettingsUpdate {
            quiet: Some(Some(true)),
            log_dir: Some(Some(PathBuf::from("/var/log/srvcon"))),
            holdoff_ms: Some(None),
            ..Default::default()
        };

        settings.merge(&update);

        assert_eq!(settings.quiet, Some(true));
        assert_eq!(settings.log_dir, Some(PathBuf::from("/var/log/srvcon")));
        assert_eq!(settings.holdoff_ms, None);
        assert_eq!(settings.effective_holdoff(), Duration::from_millis(2500));
        // Untouched
        assert_eq!(settings.flush_interval_ms, Some(250));
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        std::fs::write(&path, r#"{ "quiet": true, "rotation": "hourly" }"#).unwrap();

        let settings = ConsoleSettings::load(&path).unwrap();

        assert_eq!(settings.quiet, Some(true));
        assert_eq!(settings.rotation, Some(LogRotation::Hourly));
        assert_eq!(settings.flush_interval_ms, None);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ConsoleSettings::load(&path),
            Err(SettingsError::Parse { .. })
        ));
    }
}
