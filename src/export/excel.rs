use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use std::path::Path;

use super::Exporter;
use crate::models::{CellText, ResultTable};

pub const SHEET_NAME: &str = "IMDb Top Movies";

/// Writes the plain table: one header row, then one row per record in chart
/// order. Any existing file at the path is replaced.
pub struct ExcelExporter;

impl Exporter for ExcelExporter {
    fn export(&self, table: &ResultTable, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, header) in table.schema.headers().into_iter().enumerate() {
            worksheet.write_string(0, col as u16, header)?;
        }

        for (row_num, record) in table.records.iter().enumerate() {
            let row = (row_num + 1) as u32;

            for (col, column) in table.schema.columns().iter().enumerate() {
                match record.value(*column) {
                    CellText::Number(n) => worksheet.write_number(row, col as u16, n)?,
                    CellText::Text(s) => worksheet.write_string(row, col as u16, s)?,
                };
            }
        }

        workbook
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}
