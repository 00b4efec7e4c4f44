// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging initialization for the exchange engine
//!
//! File output with optional console output, configured through
//! environment variables:
//!
//! - `RUST_LOG`: log level filter (default: `info`)
//! - `LOG_DIR`: root directory for log files (default:
//!   `{project_root}/logs`); files land in `{LOG_DIR}/exchange/`
//! - `LOG_TO_CONSOLE`: set to `true`, `1`, or `yes` to mirror logs to
//!   stderr with ANSI colors
//!
//! Files rotate daily (UTC) via `tracing_appender`, named
//! `exchange.{date}.log`.

use std::{
    env,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::{
    non_blocking,
    rolling::{self, Rotation},
};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt,
};

use crate::config::{DEFAULT_LOG_LEVEL, DEFAULT_LOG_TO_CONSOLE, LOG_COMPONENT_NAME};

// Store log guard to prevent log loss on program exit
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

/// Find the workspace root by walking up from the crate directory (or
/// the current directory when Cargo did not set `CARGO_MANIFEST_DIR`).
fn find_project_root() -> PathBuf {
    let start = env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .or_else(|_| env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."));

    let mut current = start.clone();
    loop {
        let cargo_toml = current.join("Cargo.toml");
        if cargo_toml.exists()
            && let Ok(content) = std::fs::read_to_string(&cargo_toml)
            && content.contains("[workspace]")
        {
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return start,
        }
    }
}

fn get_log_root() -> String {
    env::var("LOG_DIR").unwrap_or_else(|_| {
        find_project_root().join("logs").to_string_lossy().to_string()
    })
}

/// Setup the daily-rolling file layer writer.
///
/// `tracing-appender` handles the rotation, so long-running processes
/// switch files automatically when the date changes.
fn setup_file_logging(log_dir: &Path) -> Result<non_blocking::NonBlocking> {
    let file_appender = rolling::RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_COMPONENT_NAME.to_string())
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| {
            format!(
                "Failed to create rolling file appender in {}",
                log_dir.display()
            )
        })?;

    let (file_writer, guard) = non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    Ok(file_writer)
}

/// Initialize logging with file output and optional console output.
///
/// Must be called at most once per process; a second call fails when
/// installing the global subscriber.
pub fn init_logging() -> Result<()> {
    dotenv::dotenv().ok();

    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let log_root = get_log_root();

    let log_dir = Path::new(&log_root).join(LOG_COMPONENT_NAME);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_writer = setup_file_logging(&log_dir)?;

    let log_to_console = env::var("LOG_TO_CONSOLE")
        .map(|v| v == "true" || v == "1" || v == "yes")
        .unwrap_or(DEFAULT_LOG_TO_CONSOLE);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_thread_ids(true)
        .with_target(true)
        .with_thread_names(false)
        .with_ansi(false);

    let console_layer = log_to_console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_thread_ids(true)
            .with_target(true)
            .with_thread_names(false)
            .with_ansi(true)
    });

    Registry::default()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    info!(target: "exchange", "Log level: {}", log_level);
    info!(target: "exchange", "Log directory: {}", log_dir.display());
    info!(
        target: "exchange",
        "Log file base name: {}.YYYY-MM-DD.log (daily rolling)",
        LOG_COMPONENT_NAME
    );
    if log_to_console {
        info!(target: "exchange", "Console output: enabled");
    }

    Ok(())
}
