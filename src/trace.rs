// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! File-backed logging.
//!
//! The TUI owns the terminal, so diagnostics go to a log file instead of
//! stderr. The returned guard must stay alive for the duration of the program
//! or buffered log lines are lost.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter precedence: `CIRRUS_LOG` env var, then the config file's directive,
/// then `info`.
pub fn init_file_logging(log_path: &Path, config_filter: Option<&str>) -> Option<WorkerGuard> {
    if let Some(dir) = log_path.parent() {
        if let Err(err) = std::fs::create_dir_all(dir) {
            eprintln!("cirrus: cannot create log directory {dir:?}: {err}");
            return None;
        }
    }

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("cirrus: cannot open log file {log_path:?}: {err}");
            return None;
        }
    };

    let filter = EnvFilter::try_from_env("CIRRUS_LOG")
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = tracing_appender::non_blocking(log_file);
    let layer = fmt::layer().with_writer(writer).with_ansi(false);

    match tracing_subscriber::registry().with(filter).with(layer).try_init() {
        Ok(()) => Some(guard),
        // Already initialized (tests, embedding); keep the guard anyway so
        // nothing panics, but the existing subscriber wins.
        Err(_) => Some(guard),
    }
}
