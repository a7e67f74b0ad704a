// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use serde_json::Value;
use shelfgrid_core::Record;
use std::fs;
use std::path::Path;
use tracing::info;

/// Reads an import batch: a JSON array of flat objects, in file order.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read data file {}", path.display()))?;
    let records = parse_records(&raw).with_context(|| format!("load data file {}", path.display()))?;
    info!(rows = records.len(), path = %path.display(), "data file loaded");
    Ok(records)
}

pub fn parse_records(raw: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(raw).context("parse JSON")?;
    let Value::Array(items) = value else {
        bail!("expected a JSON array of objects at the top level");
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            other => bail!(
                "record {index} is {}, expected an object of column -> value",
                kind_name(&other)
            ),
        })
        .collect()
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{load_records, parse_records};
    use anyhow::Result;

    #[test]
    fn keeps_header_order_of_each_record() -> Result<()> {
        let records = parse_records(r#"[{"产品标题": "Blender", "前端价格": "54,93 Lei", "PNK码": "D01"}]"#)?;
        let headers: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(headers, vec!["产品标题", "前端价格", "PNK码"]);
        Ok(())
    }

    #[test]
    fn rejects_non_array_and_non_object_rows() {
        let error = parse_records(r#"{"rows": []}"#).expect_err("object root should fail");
        assert!(error.to_string().contains("JSON array"));

        let error = parse_records(r#"[{"a": 1}, 7]"#).expect_err("number row should fail");
        assert!(error.to_string().contains("record 1 is a number"));
    }

    #[test]
    fn load_reports_the_file_on_failure() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("rows.json");
        std::fs::write(&path, "[not json")?;
        let error = load_records(&path).expect_err("invalid JSON should fail");
        assert!(error.to_string().contains("rows.json"));

        std::fs::write(&path, "[]")?;
        assert!(load_records(&path)?.is_empty());
        Ok(())
    }
}
