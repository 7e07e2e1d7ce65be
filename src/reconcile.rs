use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};

use crate::archive;
use crate::extract::{ExtractionResult, Extractor};
use crate::platform::{self, Platform};
use crate::table::{self, Row};

/// Anything that can turn a URL into an extraction result. The facade never
/// fails, but the reconciler still guards against implementations that do.
#[async_trait]
pub trait RowExtractor: Send + Sync {
    async fn extract_row(&self, url: &str) -> Result<ExtractionResult>;
}

#[async_trait]
impl RowExtractor for Extractor {
    async fn extract_row(&self, url: &str) -> Result<ExtractionResult> {
        Ok(self.extract(url).await)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Only rows classified as this platform are processed.
    pub platform: Option<Platform>,
    /// Process populated rows too.
    pub force_all: bool,
    /// Route completed rows into per-platform archives.
    pub move_completed: bool,
    /// Treat rows left as `platform=error` by an earlier pass as pending.
    pub retry_errors: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub moved: usize,
}

/// Rows split into those that stay in the source table and those that move
/// to an archive. Relative input order is kept within each partition.
#[derive(Debug, Default)]
pub struct Reconciliation {
    pub remaining: Vec<Row>,
    pub completed: BTreeMap<Platform, Vec<Row>>,
    pub stats: ReconcileStats,
}

impl ReconcileOptions {
    fn wants(&self, row: &Row) -> bool {
        self.force_all
            || row.is_pending()
            || (self.retry_errors && row.get("platform") == Platform::Error.as_str())
    }
}

pub async fn reconcile<E: RowExtractor + ?Sized>(
    rows: Vec<Row>,
    opts: &ReconcileOptions,
    extractor: &E,
) -> Reconciliation {
    let total = rows.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut out = Reconciliation::default();

    for (idx, mut row) in rows.into_iter().enumerate() {
        pb.inc(1);
        let n = idx + 1;
        let url = row.get("url").trim().to_string();

        if url.is_empty() {
            debug!(row = n, "Skipping empty URL");
            out.stats.skipped += 1;
            out.remaining.push(row);
            continue;
        }

        if let Some(filter) = opts.platform {
            let platform = platform::classify(&url);
            if platform != filter {
                debug!(row = n, %platform, %filter, "Skipping row outside platform filter");
                out.stats.skipped += 1;
                out.remaining.push(row);
                continue;
            }
        }

        if !opts.wants(&row) {
            debug!(row = n, "Skipping populated row (use --force to process)");
            out.stats.skipped += 1;
            out.remaining.push(row);
            continue;
        }

        info!("Processing row {}/{}: {}", n, total, url);
        out.stats.processed += 1;
        match extractor.extract_row(&url).await {
            Ok(result) => {
                row.apply(&result);
                if result.is_error() {
                    out.stats.failed += 1;
                } else {
                    info!(title = %truncate(&result.title, 50), "Extracted");
                }

                if opts.move_completed && result.platform.is_archived() {
                    out.completed.entry(result.platform).or_default().push(row);
                } else {
                    out.remaining.push(row);
                }
            }
            Err(e) => {
                error!(row = n, error = %e, "Failed to process row");
                row.set("platform", Platform::Error.as_str());
                row.set("title", "");
                row.set("author", "");
                row.set("content", format!("Error: {}", e));
                out.stats.failed += 1;
                out.remaining.push(row);
            }
        }
    }

    pb.finish_and_clear();
    out.stats.moved = out.completed.values().map(Vec::len).sum();
    out
}

/// Where a table pass reads from and writes to.
#[derive(Debug, Clone)]
pub struct TablePaths {
    pub input: PathBuf,
    /// Remainder table; the input file when `None`.
    pub output: Option<PathBuf>,
    pub archive_dir: PathBuf,
}

/// Load the table, reconcile it, write archives, then write the remainder.
/// Archives go first so an interrupted pass can duplicate a row but never
/// drop one.
pub async fn process_table<E: RowExtractor + ?Sized>(
    paths: &TablePaths,
    opts: &ReconcileOptions,
    extractor: &E,
) -> Result<ReconcileStats> {
    info!("Reading CSV file: {}", paths.input.display());
    let table = table::read_table(&paths.input)?;
    info!("Loaded {} rows from CSV", table.rows.len());

    let result = reconcile(table.rows, opts, extractor).await;

    if opts.move_completed {
        for (platform, rows) in &result.completed {
            archive::archive(&paths.archive_dir, *platform, rows, &table.headers)?;
        }
    }

    let output = paths.output.as_deref().unwrap_or(paths.input.as_path());
    info!("Writing remaining {} row(s) to: {}", result.remaining.len(), output.display());
    table::write_table(output, &table.headers, &result.remaining)?;

    let s = result.stats;
    info!(
        "Complete! Processed: {}, Skipped: {}, Failed: {}, Moved: {}",
        s.processed, s.skipped, s.failed, s.moved
    );
    Ok(s)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
