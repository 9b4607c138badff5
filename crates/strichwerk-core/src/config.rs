// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration and data directory resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, StrichwerkError};
use crate::types::{DEFAULT_FORMAT, DEFAULT_QUANTITY, MAX_QUANTITY, RenderDefaults};

/// File name of the persisted config inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fragment-rendering endpoint queried once per batch slot.
    pub fragment_endpoint: String,
    /// Format used when the host markup does not name one.
    pub default_format: String,
    /// Quantity used when the host markup omits or garbles it.
    pub default_quantity: u32,
    /// Largest quantity a render may request (at most `MAX_QUANTITY`).
    pub max_quantity: u32,
    /// Per-request timeout for fragment fetches, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Upper bound on waiting for print-surface images. `None` waits forever.
    pub settle_timeout_ms: Option<u64>,
    /// Command receiving the print document on stdin (e.g. `["lp", "-"]`).
    /// `None` spools the document to `spool_dir` instead.
    pub print_command: Option<Vec<String>>,
    /// Where spooled print documents go. `None` uses `<data dir>/spool`.
    pub spool_dir: Option<PathBuf>,
    /// Base URL for the dashboard's JSON envelope endpoints.
    pub dashboard_base: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fragment_endpoint: "http://127.0.0.1:8080/barcode/render".into(),
            default_format: DEFAULT_FORMAT.into(),
            default_quantity: DEFAULT_QUANTITY,
            max_quantity: MAX_QUANTITY,
            fetch_timeout_ms: 10_000,
            settle_timeout_ms: None,
            print_command: None,
            spool_dir: None,
            dashboard_base: None,
        }
    }
}

impl AppConfig {
    pub fn render_defaults(&self) -> RenderDefaults {
        RenderDefaults {
            format: self.default_format.clone(),
            quantity: self.default_quantity,
            max_quantity: self.max_quantity,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn settle_timeout(&self) -> Option<Duration> {
        self.settle_timeout_ms.map(Duration::from_millis)
    }

    /// Spool directory, defaulting to `spool/` under `data_dir`.
    pub fn spool_dir(&self, data_dir: &Path) -> PathBuf {
        self.spool_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("spool"))
    }

    /// Reject values that would make every fetch or print fail.
    pub fn validate(&self) -> Result<()> {
        if self.fragment_endpoint.trim().is_empty() {
            return Err(StrichwerkError::Config("fragment_endpoint is empty".into()));
        }
        if self.max_quantity > MAX_QUANTITY {
            return Err(StrichwerkError::Config(format!(
                "max_quantity must not exceed {MAX_QUANTITY}"
            )));
        }
        if self.default_quantity > self.max_quantity {
            return Err(StrichwerkError::Config(
                "default_quantity exceeds max_quantity".into(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(StrichwerkError::Config("fetch_timeout_ms must be positive".into()));
        }
        if let Some(cmd) = &self.print_command
            && cmd.first().is_none_or(|program| program.trim().is_empty())
        {
            return Err(StrichwerkError::Config("print_command has no program".into()));
        }
        Ok(())
    }

    /// Load the config stored in `dir`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_or_default(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Write the config as pretty JSON into `dir`.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> PathBuf {
    let dir = dirs_fallback().join("strichwerk");
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn dirs_fallback() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            fragment_endpoint: "https://admin.example/barcode".into(),
            settle_timeout_ms: Some(5_000),
            print_command: Some(vec!["lp".into(), "-".into()]),
            ..Default::default()
        };
        config.persist(dir.path()).unwrap();

        let loaded = AppConfig::load_or_default(dir.path());
        assert_eq!(loaded, config);
        assert_eq!(loaded.settle_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AppConfig::load_or_default(dir.path()), AppConfig::default());
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(AppConfig::load_or_default(dir.path()), AppConfig::default());
    }

    #[test]
    fn partial_file_fills_remaining_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"default_format":"svg"}"#).unwrap();
        let loaded = AppConfig::load_or_default(dir.path());
        assert_eq!(loaded.default_format, "svg");
        assert_eq!(loaded.fetch_timeout_ms, 10_000);
    }

    #[test]
    fn spool_dir_defaults_under_data_dir() {
        let data = Path::new("/srv/strichwerk");
        assert_eq!(AppConfig::default().spool_dir(data), data.join("spool"));

        let config = AppConfig {
            spool_dir: Some(PathBuf::from("/var/spool/labels")),
            ..Default::default()
        };
        assert_eq!(config.spool_dir(data), Path::new("/var/spool/labels"));
    }

    #[test]
    fn validate_bounds_quantities() {
        let too_high = AppConfig {
            max_quantity: MAX_QUANTITY + 1,
            ..Default::default()
        };
        assert!(too_high.validate().is_err());

        let inverted = AppConfig {
            default_quantity: 20,
            max_quantity: 10,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
        assert_eq!(AppConfig::default().render_defaults().max_quantity, MAX_QUANTITY);
    }

    #[test]
    fn validate_rejects_empty_print_command() {
        let config = AppConfig {
            print_command: Some(Vec::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(AppConfig::default().validate().is_ok());
    }
}
