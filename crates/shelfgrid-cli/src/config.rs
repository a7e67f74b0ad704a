// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use shelfgrid_core::paginate::{DEFAULT_PAGE_SIZE, PAGE_SIZES};
use shelfgrid_core::sort::DEFAULT_DEFER_THRESHOLD;
use shelfgrid_core::{MIN_COLUMN_WIDTH, StoreOptions};
use shelfgrid_view::GridOptions;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "shelfgrid";
const CONFIG_VERSION: i64 = 1;
const MAX_ROW_HEIGHT: u32 = 10;
const DEFAULT_ROW_HEIGHT: u32 = 1;
const DEFAULT_BUFFER_ROWS: usize = 5;
const DEFAULT_FILTER_DEBOUNCE: &str = "300ms";
const DEFAULT_SCROLL_END: &str = "150ms";
const DEFAULT_HEIGHT_SYNC: &str = "100ms";
const LAYOUT_FILE: &str = "layout.json";
const LOG_FILE: &str = "shelfgrid.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub sort: Sort,
    #[serde(default)]
    pub storage: Storage,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            grid: Grid::default(),
            timing: Timing::default(),
            sort: Sort::default(),
            storage: Storage::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Grid {
    /// Terminal lines per record.
    pub row_height: Option<u32>,
    pub buffer_rows: Option<usize>,
    pub page_size: Option<usize>,
    pub min_column_width: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timing {
    pub filter_debounce: Option<String>,
    pub scroll_end: Option<String>,
    pub height_sync: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sort {
    pub defer_threshold: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub layout_path: Option<String>,
    pub log_path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("SHELFGRID_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set SHELFGRID_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` at the top",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(row_height) = self.grid.row_height
            && !(1..=MAX_ROW_HEIGHT).contains(&row_height)
        {
            bail!(
                "grid.row_height in {} must be between 1 and {MAX_ROW_HEIGHT}, got {row_height}",
                path.display()
            );
        }

        if let Some(page_size) = self.grid.page_size
            && !PAGE_SIZES.contains(&page_size)
        {
            bail!(
                "grid.page_size in {} must be one of {:?}, got {page_size}",
                path.display(),
                PAGE_SIZES
            );
        }

        if let Some(min_width) = self.grid.min_column_width
            && min_width < MIN_COLUMN_WIDTH
        {
            bail!(
                "grid.min_column_width in {} must be at least {MIN_COLUMN_WIDTH}, got {min_width}",
                path.display()
            );
        }

        for (name, raw) in [
            ("timing.filter_debounce", &self.timing.filter_debounce),
            ("timing.scroll_end", &self.timing.scroll_end),
            ("timing.height_sync", &self.timing.height_sync),
        ] {
            if let Some(raw) = raw {
                let parsed = parse_duration(raw)
                    .with_context(|| format!("{name} in {}", path.display()))?;
                if parsed <= Duration::ZERO {
                    bail!("{name} in {} must be positive, got {raw}", path.display());
                }
            }
        }

        Ok(())
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            page_size: self.grid.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            defer_threshold: self.sort.defer_threshold.unwrap_or(DEFAULT_DEFER_THRESHOLD),
        }
    }

    pub fn grid_options(&self) -> Result<GridOptions> {
        Ok(GridOptions {
            row_height: self.grid.row_height.unwrap_or(DEFAULT_ROW_HEIGHT),
            buffer_rows: self.grid.buffer_rows.unwrap_or(DEFAULT_BUFFER_ROWS),
            min_column_width: self.grid.min_column_width.unwrap_or(MIN_COLUMN_WIDTH),
            filter_debounce: self.filter_debounce()?,
            scroll_end: self.scroll_end()?,
            height_sync: self.height_sync()?,
        })
    }

    pub fn filter_debounce(&self) -> Result<Duration> {
        parse_duration(
            self.timing
                .filter_debounce
                .as_deref()
                .unwrap_or(DEFAULT_FILTER_DEBOUNCE),
        )
    }

    pub fn scroll_end(&self) -> Result<Duration> {
        parse_duration(self.timing.scroll_end.as_deref().unwrap_or(DEFAULT_SCROLL_END))
    }

    pub fn height_sync(&self) -> Result<Duration> {
        parse_duration(self.timing.height_sync.as_deref().unwrap_or(DEFAULT_HEIGHT_SYNC))
    }

    pub fn layout_path(&self) -> Result<PathBuf> {
        match &self.storage.layout_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join(LAYOUT_FILE)),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.storage.log_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join(LOG_FILE)),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# shelfgrid config\n# Place this file at: {}\n\nversion = 1\n\n[grid]\n# Terminal lines per record.\nrow_height = {DEFAULT_ROW_HEIGHT}\n# Rows formatted above and below the visible window.\nbuffer_rows = {DEFAULT_BUFFER_ROWS}\n# One of {:?}.\npage_size = {DEFAULT_PAGE_SIZE}\nmin_column_width = {MIN_COLUMN_WIDTH}\n\n[timing]\nfilter_debounce = \"{DEFAULT_FILTER_DEBOUNCE}\"\nscroll_end = \"{DEFAULT_SCROLL_END}\"\nheight_sync = \"{DEFAULT_HEIGHT_SYNC}\"\n\n[sort]\n# Larger filtered views sort after the next frame is drawn.\ndefer_threshold = {DEFAULT_DEFER_THRESHOLD}\n\n[storage]\n# Optional. Defaults live in the platform data dir (for example ~/.local/share/shelfgrid/)\n# layout_path = \"/absolute/path/to/layout.json\"\n# log_path = \"/absolute/path/to/shelfgrid.log\"\n",
            path.display(),
            PAGE_SIZES,
        )
    }
}

/// Platform data directory for shelfgrid files; `SHELFGRID_DATA_DIR` wins.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(path) = env::var_os("SHELFGRID_DATA_DIR") {
        return Ok(PathBuf::from(path));
    }
    let data_root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set SHELFGRID_DATA_DIR or [storage] paths")
    })?;
    Ok(data_root.join(APP_NAME))
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 300ms or 1s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.store_options().page_size, 50);
        assert_eq!(config.store_options().defer_threshold, 5_000);
        let grid = config.grid_options()?;
        assert_eq!(grid.row_height, 1);
        assert_eq!(grid.filter_debounce, Duration::from_millis(300));
        assert_eq!(grid.scroll_end, Duration::from_millis(150));
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[grid]\npage_size = 20\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        assert!(error.to_string().contains("version = 1"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[grid]\nrow_height = 2\nbuffer_rows = 8\npage_size = 100\nmin_column_width = 40\n[timing]\nfilter_debounce = \"250ms\"\nscroll_end = \"1s\"\n[sort]\ndefer_threshold = 1000\n[storage]\nlayout_path = \"/tmp/grid-layout.json\"\n",
        )?;
        let config = Config::load(&path)?;
        let grid = config.grid_options()?;
        assert_eq!(grid.row_height, 2);
        assert_eq!(grid.buffer_rows, 8);
        assert_eq!(grid.min_column_width, 40);
        assert_eq!(grid.filter_debounce, Duration::from_millis(250));
        assert_eq!(grid.scroll_end, Duration::from_secs(1));
        assert_eq!(config.store_options().page_size, 100);
        assert_eq!(config.store_options().defer_threshold, 1000);
        assert_eq!(config.layout_path()?, PathBuf::from("/tmp/grid-layout.json"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 3\n")?;
        let error = Config::load(&path).expect_err("v3 config should fail");
        assert!(error.to_string().contains("unsupported config version 3"));
        Ok(())
    }

    #[test]
    fn page_size_outside_the_offered_sizes_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[grid]\npage_size = 25\n")?;
        let error = Config::load(&path).expect_err("page size 25 should fail");
        assert!(error.to_string().contains("grid.page_size"));
        Ok(())
    }

    #[test]
    fn min_column_width_below_the_floor_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[grid]\nmin_column_width = 12\n")?;
        let error = Config::load(&path).expect_err("width 12 should fail");
        let message = error.to_string();
        assert!(message.contains("grid.min_column_width"));
        assert!(message.contains("at least 30, got 12"));

        let (_temp, path) = write_config("version = 1\n[grid]\nmin_column_width = 30\n")?;
        assert_eq!(Config::load(&path)?.grid_options()?.min_column_width, 30);
        Ok(())
    }

    #[test]
    fn row_height_bounds_are_validated() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[grid]\nrow_height = 0\n")?;
        let error = Config::load(&path).expect_err("zero row height should fail");
        assert!(error.to_string().contains("grid.row_height"));
        Ok(())
    }

    #[test]
    fn timing_rejects_zero_and_invalid_durations() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[timing]\nscroll_end = \"0ms\"\n")?;
        let error = Config::load(&path).expect_err("zero scroll end should fail");
        assert!(error.to_string().contains("must be positive"));

        let (_temp, path) = write_config("version = 1\n[timing]\nfilter_debounce = \"soon\"\n")?;
        let error = Config::load(&path).expect_err("invalid debounce should fail");
        assert!(format!("{error:#}").contains("invalid duration"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("SHELFGRID_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("SHELFGRID_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn layout_path_defaults_under_data_dir_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("SHELFGRID_DATA_DIR", temp.path());
        }
        let config = Config::default();
        let layout = config.layout_path()?;
        let log = config.log_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("SHELFGRID_DATA_DIR");
        }
        assert_eq!(layout, temp.path().join("layout.json"));
        assert_eq!(log, temp.path().join("shelfgrid.log"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("300ms")?, Duration::from_millis(300));
        assert_eq!(parse_duration(" 2s ")?, Duration::from_secs(2));
        assert_eq!(parse_duration("1m")?, Duration::from_secs(60));
        assert!(parse_duration("later").is_err());
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("[grid]"));
        assert!(example.contains("[timing]"));
        assert!(example.contains("[sort]"));
        assert!(example.contains("[storage]"));
        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.store_options().page_size, 50);
        Ok(())
    }
}
