use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::extract::ExtractionResult;

/// Columns every table carries. Missing ones are appended to the header on load.
pub const REQUIRED_COLUMNS: [&str; 5] = ["url", "title", "author", "content", "platform"];

/// One CSV record keyed by column name. Columns beyond [`REQUIRED_COLUMNS`]
/// pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    /// Field value, empty when the column is absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Title, author and content all blank.
    pub fn is_pending(&self) -> bool {
        ["title", "author", "content"]
            .iter()
            .all(|k| self.get(k).trim().is_empty())
    }

    /// Overwrite the extracted columns with `result`.
    pub fn apply(&mut self, result: &ExtractionResult) {
        self.set("platform", result.platform.as_str());
        self.set("title", result.title.as_str());
        self.set("author", result.author.as_str());
        self.set("content", result.content.as_str());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Load a CSV table, appending any missing [`REQUIRED_COLUMNS`] to the header.
/// Short records read as blank trailing fields; records longer than the
/// header are rejected.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows: Vec<Row> = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Malformed record in {}", path.display()))?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            bail!(
                "Record on line {} of {} has {} fields but the header has {}",
                line,
                path.display(),
                record.len(),
                headers.len()
            );
        }
        rows.push(headers.iter().cloned().zip(record.iter().map(str::to_string)).collect());
    }

    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            headers.push(col.to_string());
        }
    }
    Ok(Table { headers, rows })
}

/// Replace `path` with `headers` followed by `rows`. The file is written to a
/// sibling temp file first and renamed over the target.
pub fn write_table<'a>(
    path: &Path,
    headers: &[String],
    rows: impl IntoIterator<Item = &'a Row>,
) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(headers.iter().map(|h| row.get(h)))?;
        }
        writer.flush()?;
    }
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
