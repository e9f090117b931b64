// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cirrus CLI entrypoint.
//!
//! Runs the interactive resource browser against the built-in demo API.
//! Configuration is read from (and initialized in) the config folder; logs go
//! to a file there so the TUI stays in control of the terminal.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use cirrus::api::DemoClient;
use cirrus::store::ConfigFolder;
use cirrus::tui::AppContext;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<config-dir>] [--resource <key>] [--refresh-secs <n>]\n  {program} [--config <dir>] [--resource <key>] [--refresh-secs <n>]\n\nIf config-dir/--config is omitted, $CIRRUS_CONFIG_DIR or ~/.config/cirrus is used.\n--resource selects the resource shown at startup (default: the config file's\ninitial_resource, else the first catalog entry).\n--refresh-secs overrides the automatic refresh interval from the config file."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    config_dir: Option<String>,
    resource: Option<String>,
    refresh_secs: Option<u64>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                if options.config_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.config_dir = Some(dir);
            }
            "--resource" => {
                if options.resource.is_some() {
                    return Err(());
                }
                let key = args.next().ok_or(())?;
                options.resource = Some(key);
            }
            "--refresh-secs" => {
                if options.refresh_secs.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let secs: u64 = raw.parse().map_err(|_| ())?;
                if secs == 0 {
                    return Err(());
                }
                options.refresh_secs = Some(secs);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.config_dir.is_some() {
                    return Err(());
                }
                options.config_dir = Some(arg);
            }
        }
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "cirrus".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let folder = match options.config_dir {
            Some(dir) => ConfigFolder::new(dir),
            None => ConfigFolder::new(ConfigFolder::default_dir()),
        };
        let config = folder.load_or_init()?;

        // Guard must outlive the TUI so buffered log lines get flushed.
        let _log_guard =
            cirrus::trace::init_file_logging(&folder.log_path(), config.log_filter.as_deref());

        let catalog = cirrus::resources::builtin()?;
        let wanted = options
            .resource
            .as_deref()
            .or(config.initial_resource.as_deref());
        let initial_resource = match wanted {
            Some(key) => catalog
                .iter()
                .position(|entry| entry.resource_key() == key)
                .ok_or_else(|| {
                    let known: Vec<&str> =
                        catalog.iter().map(|entry| entry.resource_key()).collect();
                    format!("unknown resource {key:?} (known: {})", known.join(", "))
                })?,
            None => 0,
        };

        let refresh_secs = options.refresh_secs.unwrap_or(config.refresh_secs).max(1);

        cirrus::tui::run(AppContext {
            client: Arc::new(DemoClient::new()),
            catalog,
            initial_resource,
            refresh_interval: Duration::from_secs(refresh_secs),
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("cirrus: {err}");
        std::process::exit(1);
    }
}
