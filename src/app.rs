use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::export::excel::ExcelExporter;
use crate::export::presentation::PresentationPass;
use crate::export::{output_path, Exporter};
use crate::launcher::FileOpener;
use crate::models::{ColumnSchema, ResultTable};
use crate::scraper::{fetch_records, ChartPage, FetchOptions};
use crate::ui::console;

/// What a single run needs besides the browser page and the count.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub chart_url: String,
    pub wait_timeout: Duration,
    pub output_dir: Option<PathBuf>,
    pub schema: ColumnSchema,
}

impl RunSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chart_url: config.chart_url.clone(),
            wait_timeout: config.wait_timeout(),
            output_dir: config.output_dir.clone(),
            schema: ColumnSchema::with_links(config.include_links),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub path: PathBuf,
    pub rows: usize,
    pub unavailable_rows: usize,
    pub formatted: bool,
    pub opened: bool,
    pub extraction_date: chrono::DateTime<chrono::Local>,
}

/// Scrape, export, format, open. Fetch and export failures end the run;
/// formatting and opening failures are reported and the run still succeeds.
pub async fn run<P: ChartPage>(
    page: P,
    count: usize,
    settings: &RunSettings,
    opener: Option<&dyn FileOpener>,
) -> Result<RunReport> {
    let options = FetchOptions {
        url: settings.chart_url.clone(),
        timeout: settings.wait_timeout,
        limit: count,
    };

    console::print_table_header();
    let records = fetch_records(page, &options, console::print_table_row)
        .await
        .context("Failed to fetch the chart")?;

    let table = ResultTable::new(records, settings.schema.clone());
    let path = output_path(settings.output_dir.as_deref(), count);

    ExcelExporter.export(&table, &path)?;
    info!(rows = table.records.len(), path = %path.display(), "workbook written");

    let formatted = format_workbook(&path);
    println!("{}", console::completion_line(table.records.len(), &path));

    let opened = match opener {
        Some(opener) => open_workbook(opener, &path),
        None => false,
    };

    Ok(RunReport {
        rows: table.records.len(),
        unavailable_rows: table.unavailable_count(),
        formatted,
        opened,
        extraction_date: table.extraction_date,
        path,
    })
}

fn format_workbook(path: &Path) -> bool {
    match PresentationPass.apply(path) {
        Ok(_) => true,
        Err(e) => {
            warn!("formatting {} failed, leaving it unformatted: {:#}", path.display(), e);
            false
        }
    }
}

fn open_workbook(opener: &dyn FileOpener, path: &Path) -> bool {
    match opener.open(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("could not open {}: {:#}", path.display(), e);
            println!("{}", console::OPEN_FAILED_LINE);
            false
        }
    }
}
