use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::platform::Platform;
use crate::table::{self, Row};

pub fn archive_path(dir: &Path, platform: Platform) -> PathBuf {
    dir.join(format!("{}.csv", platform))
}

/// Prepend `new_rows` to the platform's archive table, keeping every existing
/// row below them in its original order. Nothing is deduplicated.
///
/// The archive is written with `field_order` followed by any column only the
/// existing archive has, so older rows keep every value they were stored with.
pub fn archive(
    dir: &Path,
    platform: Platform,
    new_rows: &[Row],
    field_order: &[String],
) -> Result<usize> {
    if new_rows.is_empty() {
        return Ok(0);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create archive dir {}", dir.display()))?;
    let path = archive_path(dir, platform);
    let mut headers = field_order.to_vec();
    let existing = if path.exists() {
        let table = table::read_table(&path)?;
        for h in table.headers {
            if !headers.contains(&h) {
                headers.push(h);
            }
        }
        table.rows
    } else {
        Vec::new()
    };

    table::write_table(&path, &headers, new_rows.iter().chain(existing.iter()))?;
    info!(
        platform = %platform,
        moved = new_rows.len(),
        kept = existing.len(),
        "Archived rows to {}",
        path.display()
    );
    Ok(new_rows.len())
}
