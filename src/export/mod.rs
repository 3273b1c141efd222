pub mod excel;
pub mod presentation;

use anyhow::Result;
use std::path::{Path, PathBuf};
use crate::models::ResultTable;

pub trait Exporter {
    fn export(&self, table: &ResultTable, path: &Path) -> Result<()>;
}

/// `IMDb_Top_<n>.xlsx`, where `n` is the requested count.
pub fn output_file_name(count: usize) -> String {
    format!("IMDb_Top_{}.xlsx", count)
}

pub fn output_path(dir: Option<&Path>, count: usize) -> PathBuf {
    let name = output_file_name(count);
    match dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
