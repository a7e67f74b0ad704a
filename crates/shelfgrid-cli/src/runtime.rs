// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use shelfgrid_core::{ColumnDescriptor, RowId};
use shelfgrid_view::GridRuntime;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Layout persistence on disk plus an in-process downstream view.
#[derive(Debug)]
pub struct FileRuntime {
    layout_path: PathBuf,
    downstream: BTreeSet<RowId>,
}

impl FileRuntime {
    pub fn new(layout_path: PathBuf) -> Self {
        Self {
            layout_path,
            downstream: BTreeSet::new(),
        }
    }

    pub fn layout_path(&self) -> &Path {
        &self.layout_path
    }

    /// Stored column layout, if one exists and parses.
    ///
    /// A corrupt file is logged and ignored so the grid still opens with
    /// its default columns.
    pub fn load_layout(&self) -> Result<Option<Vec<ColumnDescriptor>>> {
        if !self.layout_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.layout_path)
            .with_context(|| format!("read column layout {}", self.layout_path.display()))?;
        match serde_json::from_str::<Vec<ColumnDescriptor>>(&raw) {
            Ok(columns) => Ok(Some(columns)),
            Err(error) => {
                warn!(path = %self.layout_path.display(), %error, "stored column layout ignored");
                Ok(None)
            }
        }
    }

    pub fn downstream(&self) -> impl Iterator<Item = RowId> + '_ {
        self.downstream.iter().copied()
    }
}

impl GridRuntime for FileRuntime {
    fn save_layout(&mut self, columns: &[ColumnDescriptor]) -> Result<()> {
        if let Some(parent) = self.layout_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create layout directory {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(columns).context("encode column layout")?;
        let staging = self.layout_path.with_extension("json.tmp");
        fs::write(&staging, body)
            .with_context(|| format!("write column layout {}", staging.display()))?;
        fs::rename(&staging, &self.layout_path)
            .with_context(|| format!("replace column layout {}", self.layout_path.display()))?;
        debug!(columns = columns.len(), "column layout saved");
        Ok(())
    }

    fn push_rows(&mut self, ids: &[RowId]) -> Result<Vec<RowId>> {
        self.downstream.extend(ids.iter().copied());
        Ok(self.downstream().collect())
    }

    fn remove_rows(&mut self, ids: &[RowId]) -> Result<Vec<RowId>> {
        for id in ids {
            self.downstream.remove(id);
        }
        Ok(self.downstream().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::FileRuntime;
    use anyhow::Result;
    use shelfgrid_core::{RowId, RowStore, default_columns};
    use shelfgrid_testkit::sample_products;
    use shelfgrid_view::GridRuntime;

    #[test]
    fn layout_survives_a_restart() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("layout.json");
        let mut runtime = FileRuntime::new(path.clone());
        assert_eq!(runtime.load_layout()?, None);

        let mut store = RowStore::default();
        store.set_all_data(sample_products(20));
        store.resize_column("price", 180);
        store.reorder_column("badge", "prp");
        runtime.save_layout(store.columns().columns())?;
        assert!(path.exists());

        let reopened = FileRuntime::new(path);
        let stored = reopened.load_layout()?.unwrap_or_default();
        let mut fresh = RowStore::default();
        fresh.set_all_data(sample_products(20));
        fresh.restore_layout(stored);
        assert_eq!(fresh.columns().get("price").map(|column| column.width), Some(180));
        assert_eq!(fresh.columns().position("badge"), store.columns().position("badge"));
        Ok(())
    }

    #[test]
    fn corrupt_layout_is_ignored() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("layout.json");
        std::fs::write(&path, "{ not a layout")?;
        assert_eq!(FileRuntime::new(path).load_layout()?, None);
        Ok(())
    }

    #[test]
    fn layout_json_is_a_flat_descriptor_array() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("layout.json");
        let mut runtime = FileRuntime::new(path.clone());
        runtime.save_layout(&default_columns())?;
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        let first = &value[0];
        assert_eq!(first["key"], "select");
        assert_eq!(first["frozen"], true);
        assert_eq!(first["width"], 50);
        Ok(())
    }

    #[test]
    fn downstream_tracks_pushes_and_removals() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut runtime = FileRuntime::new(temp.path().join("layout.json"));
        let present = runtime.push_rows(&[RowId::new(3), RowId::new(1)])?;
        assert_eq!(present, vec![RowId::new(1), RowId::new(3)]);
        let present = runtime.remove_rows(&[RowId::new(3)])?;
        assert_eq!(present, vec![RowId::new(1)]);
        Ok(())
    }
}
