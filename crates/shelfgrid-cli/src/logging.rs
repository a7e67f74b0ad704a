// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "SHELFGRID_LOG";

/// Filter from `--log-level` when given, else `SHELFGRID_LOG`, else `warn`.
pub fn env_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid --log-level {level:?}; try warn, info or debug")),
        None => Ok(EnvFilter::builder()
            .with_default_directive(tracing::Level::WARN.into())
            .with_env_var(LOG_ENV)
            .from_env_lossy()),
    }
}

/// Routes tracing output to `path`; stdout belongs to the terminal UI.
pub fn init(path: &Path, level: Option<&str>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter(level)?);

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|error| anyhow!("initialize logging: {error}"))
}
