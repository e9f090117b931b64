// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Configuration folder.
//!
//! A deliberately small I/O wrapper: `config.json` under a per-user directory,
//! plus the log file location. Missing config means defaults; a present but
//! malformed config is an error (silently ignoring it would hide typos).

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::lister::DEFAULT_REFRESH_INTERVAL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seconds between automatic refresh cycles.
    pub refresh_secs: u64,
    /// Resource key selected at startup; first catalog entry when unset.
    pub initial_resource: Option<String>,
    /// Log filter directive, overridden by the `CIRRUS_LOG` env var.
    pub log_filter: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
            initial_resource: None,
            log_filter: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigFolder {
    dir: PathBuf,
}

impl ConfigFolder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$CIRRUS_CONFIG_DIR`, else `$HOME/.config/cirrus`, else the current
    /// directory.
    pub fn default_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("CIRRUS_CONFIG_DIR") {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        match std::env::var("HOME") {
            Ok(home) if !home.is_empty() => {
                Path::new(&home).join(".config").join("cirrus")
            }
            _ => PathBuf::from("."),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join("cirrus.log")
    }

    /// Loads the config, falling back to defaults (and writing them out) when
    /// no file exists yet.
    pub fn load_or_init(&self) -> Result<AppConfig, StoreError> {
        let path = self.config_path();
        match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path,
                source,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let config = AppConfig::default();
                self.save(&config)?;
                Ok(config)
            }
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.config_path();
        let raw = serde_json::to_string_pretty(config).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, raw).map_err(|source| StoreError::Io { path, source })
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use rstest::{fixture, rstest};

    use super::{AppConfig, ConfigFolder, StoreError};

    static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: std::path::PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = std::env::temp_dir();
            path.push(format!("cirrus-{prefix}-{}-{nanos}-{counter}", std::process::id()));
            std::fs::create_dir_all(&path).unwrap();
            Self { path }
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    #[fixture]
    fn tmp() -> TempDir {
        TempDir::new("config-folder")
    }

    #[rstest]
    fn load_or_init_writes_defaults(tmp: TempDir) {
        let folder = ConfigFolder::new(tmp.path.join("cfg"));
        let config = folder.load_or_init().unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(folder.config_path().is_file());
    }

    #[test]
    fn default_refresh_matches_the_engine_interval() {
        let config = AppConfig::default();
        assert_eq!(
            config.refresh_secs,
            crate::lister::DEFAULT_REFRESH_INTERVAL.as_secs()
        );
    }

    #[rstest]
    fn save_and_load_round_trip(tmp: TempDir) {
        let folder = ConfigFolder::new(tmp.path.join("cfg"));
        let config = AppConfig {
            refresh_secs: 30,
            initial_resource: Some("s3-buckets".to_owned()),
            log_filter: Some("cirrus=debug".to_owned()),
        };
        folder.save(&config).unwrap();
        assert_eq!(folder.load_or_init().unwrap(), config);
    }

    #[rstest]
    fn partial_config_fills_defaults(tmp: TempDir) {
        let folder = ConfigFolder::new(tmp.path.join("cfg"));
        std::fs::create_dir_all(folder.dir()).unwrap();
        std::fs::write(folder.config_path(), r#"{"refresh_secs": 3}"#).unwrap();

        let config = folder.load_or_init().unwrap();
        assert_eq!(config.refresh_secs, 3);
        assert_eq!(config.initial_resource, None);
    }

    #[rstest]
    fn malformed_config_is_an_error(tmp: TempDir) {
        let folder = ConfigFolder::new(tmp.path.join("cfg"));
        std::fs::create_dir_all(folder.dir()).unwrap();
        std::fs::write(folder.config_path(), "not json").unwrap();

        let err = folder.load_or_init().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}
