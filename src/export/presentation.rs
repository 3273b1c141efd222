//! Second pass over a written workbook: header styling, centered and wrapped
//! cells, content-based column widths and live links in the movie URL column.
//!
//! The layout is derived from cell values alone, so running the pass again on
//! its own output reproduces the same file.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatUnderline, Url, Workbook};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::models::{MOVIE_URL_HEADER, SENTINEL};

/// Extra characters added to the widest cell of each column.
pub const WIDTH_PADDING: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(f) => Self::Number(*f),
            Data::String(s) => Self::Text(s.clone()),
            Data::Bool(b) => Self::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
            other => Self::Text(other.to_string()),
        }
    }

    /// The text a reader sees; whole numbers have no fractional part.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    fn as_link(&self) -> Option<&str> {
        match self {
            Self::Text(s) if is_linkable(s) => Some(s),
            _ => None,
        }
    }
}

/// Non-sentinel values become links only if they are http(s) URLs, since
/// `rust_xlsxwriter` rejects any other text as a hyperlink target and would fail
/// the whole pass.
fn is_linkable(value: &str) -> bool {
    value != SENTINEL && (value.starts_with("http://") || value.starts_with("https://"))
}

/// A worksheet's values, row-major, with the header in row 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub sheet_name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn read(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("{} has no worksheets", path.display()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // Ranges start at the first used cell; pad back to A1.
        let (first_row, first_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); first_row as usize];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; first_col as usize];
            cells.extend(row.iter().map(Cell::from_data));
            rows.push(cells);
        }

        Ok(Self { sheet_name, rows })
    }

    fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Visual attributes computed for a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub column_widths: Vec<usize>,
    pub url_column: Option<usize>,
    /// (row, column) of every cell that becomes a hyperlink.
    pub links: Vec<(usize, usize)>,
}

impl SheetLayout {
    pub fn compute(grid: &Grid) -> Self {
        let column_widths = (0..grid.width())
            .map(|col| {
                let widest = grid
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.display().chars().count())
                    .max()
                    .unwrap_or(0);
                widest + WIDTH_PADDING
            })
            .collect();

        let url_column = grid.rows.first().and_then(|header| {
            header
                .iter()
                .position(|cell| matches!(cell, Cell::Text(s) if s == MOVIE_URL_HEADER))
        });

        let links = match url_column {
            Some(col) => grid
                .rows
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(_, row)| row.get(col).and_then(Cell::as_link).is_some())
                .map(|(row, _)| (row, col))
                .collect(),
            None => Vec::new(),
        };

        Self {
            column_widths,
            url_column,
            links,
        }
    }
}

pub struct PresentationPass;

impl PresentationPass {
    /// Re-opens the workbook at `path`, styles it and saves it back in place.
    pub fn apply(&self, path: &Path) -> Result<SheetLayout> {
        let grid = Grid::read(path)?;
        let layout = SheetLayout::compute(&grid);
        debug!(
            columns = layout.column_widths.len(),
            links = layout.links.len(),
            "applying presentation pass"
        );

        let bytes = render_formatted(&grid, &layout)?;
        replace_file(path, &bytes)?;
        Ok(layout)
    }
}

fn render_formatted(grid: &Grid, layout: &SheetLayout) -> Result<Vec<u8>> {
    let cell_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap();
    let header_format = cell_format.clone().set_bold();
    let link_format = cell_format
        .clone()
        .set_font_color(Color::Blue)
        .set_underline(FormatUnderline::Single);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&grid.sheet_name)?;

    for (r, row) in grid.rows.iter().enumerate() {
        let row_num = r as u32;
        let format = if r == 0 { &header_format } else { &cell_format };

        for (c, cell) in row.iter().enumerate() {
            let col_num = c as u16;
            let is_link = r > 0 && layout.url_column == Some(c);

            match cell {
                Cell::Text(s) if is_link && is_linkable(s) => {
                    worksheet.write_url_with_format(row_num, col_num, Url::new(s.as_str()), &link_format)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string_with_format(row_num, col_num, s, format)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number_with_format(row_num, col_num, *n, format)?;
                }
                Cell::Empty => {
                    worksheet.write_blank(row_num, col_num, format)?;
                }
            }
        }
    }

    for (c, width) in layout.column_widths.iter().enumerate() {
        worksheet.set_column_width(c as u16, *width as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Writes `bytes` to a temporary sibling of `path` and renames it into place,
/// so the existing file stays intact until the new content is fully on disk.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let context = || format!("Failed to save formatted workbook {}", path.display());

    let mut staged = NamedTempFile::new_in(dir).with_context(context)?;
    staged.write_all(bytes).with_context(context)?;
    staged.as_file().sync_all().with_context(context)?;
    staged.persist(path).map_err(|e| e.error).with_context(context)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::excel::ExcelExporter;
    use crate::export::Exporter;
    use crate::models::{ColumnSchema, MovieRecord, ResultTable};
    use std::io::Read;

    fn record(rank: usize, title: &str) -> MovieRecord {
        MovieRecord {
            rank,
            title: title.to_string(),
            year: "1957".to_string(),
            rating: "9.0".to_string(),
            movie_url: format!("https://www.imdb.com/title/tt{:07}/", rank),
            poster_url: format!("https://m.media-amazon.com/images/M/{}.jpg", rank),
        }
    }

    fn written(schema: ColumnSchema, records: Vec<MovieRecord>) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMDb_Top_3.xlsx");
        ExcelExporter
            .export(&ResultTable::new(records, schema), &path)
            .unwrap();
        (dir, path)
    }

    fn zip_part(path: &Path, name: &str) -> String {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    fn sample() -> Vec<MovieRecord> {
        vec![
            record(1, "12 Angry Men"),
            MovieRecord::unavailable(2),
            record(3, "The Lord of the Rings: The Return of the King"),
        ]
    }

    #[test]
    fn test_display_of_numbers() {
        assert_eq!(Cell::Number(3.0).display(), "3");
        assert_eq!(Cell::Number(9.5).display(), "9.5");
        assert_eq!(Cell::Empty.display(), "");
    }

    #[test]
    fn test_widths_are_max_content_plus_padding() {
        let (_dir, path) = written(ColumnSchema::full(), sample());
        let layout = SheetLayout::compute(&Grid::read(&path).unwrap());

        // "Rank" is wider than any rank number.
        assert_eq!(layout.column_widths[0], 4 + WIDTH_PADDING);
        assert_eq!(
            layout.column_widths[1],
            "The Lord of the Rings: The Return of the King".len() + WIDTH_PADDING
        );
        // "IMDb Rating" header beats "9.0" and "N/A".
        assert_eq!(layout.column_widths[3], 11 + WIDTH_PADDING);
        assert_eq!(layout.column_widths.len(), 6);
    }

    #[test]
    fn test_url_column_found_by_header() {
        let (_dir, path) = written(ColumnSchema::full(), sample());
        let layout = SheetLayout::compute(&Grid::read(&path).unwrap());

        assert_eq!(layout.url_column, Some(4));
        // Row 2 is the sentinel record.
        assert_eq!(layout.links, vec![(1, 4), (3, 4)]);
    }

    #[test]
    fn test_url_column_located_by_text_not_position() {
        let grid = Grid {
            sheet_name: "Sheet1".to_string(),
            rows: vec![
                vec![Cell::Text(MOVIE_URL_HEADER.to_string()), Cell::Text("Rank".to_string())],
                vec![Cell::Text("https://www.imdb.com/title/tt0050083/".to_string()), Cell::Number(1.0)],
            ],
        };
        let layout = SheetLayout::compute(&grid);
        assert_eq!(layout.url_column, Some(0));
        assert_eq!(layout.links, vec![(1, 0)]);
    }

    #[test]
    fn test_only_http_urls_become_links() {
        let grid = Grid {
            sheet_name: "Sheet1".to_string(),
            rows: vec![
                vec![Cell::Text(MOVIE_URL_HEADER.to_string())],
                vec![Cell::Text("https://www.imdb.com/title/tt0050083/".to_string())],
                vec![Cell::Text("/title/tt0111161/".to_string())],
                vec![Cell::Text(SENTINEL.to_string())],
                vec![Cell::Text("http://www.imdb.com/title/tt0068646/".to_string())],
            ],
        };
        let layout = SheetLayout::compute(&grid);
        assert_eq!(layout.links, vec![(1, 0), (4, 0)]);
        assert!(render_formatted(&grid, &layout).is_ok());
    }

    #[test]
    fn test_minimal_schema_gets_no_links() {
        let (_dir, path) = written(ColumnSchema::minimal(), sample());
        let layout = PresentationPass.apply(&path).unwrap();

        assert_eq!(layout.url_column, None);
        assert!(layout.links.is_empty());
        assert!(!zip_part(&path, "xl/worksheets/sheet1.xml").contains("<hyperlink "));
    }

    #[test]
    fn test_hyperlinks_skip_sentinel_cells() {
        let (_dir, path) = written(ColumnSchema::full(), sample());
        PresentationPass.apply(&path).unwrap();

        let sheet = zip_part(&path, "xl/worksheets/sheet1.xml");
        assert_eq!(sheet.matches("<hyperlink ").count(), 2);
        assert!(sheet.contains(r#"ref="E2""#));
        assert!(sheet.contains(r#"ref="E4""#));
        assert!(!sheet.contains(r#"ref="E3""#));
    }

    #[test]
    fn test_pass_preserves_values() {
        let (_dir, path) = written(ColumnSchema::full(), sample());
        let before = Grid::read(&path).unwrap();
        PresentationPass.apply(&path).unwrap();
        let after = Grid::read(&path).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_pass_is_idempotent() {
        let (_dir, path) = written(ColumnSchema::full(), sample());

        let first = PresentationPass.apply(&path).unwrap();
        let sheet_once = zip_part(&path, "xl/worksheets/sheet1.xml");
        let styles_once = zip_part(&path, "xl/styles.xml");

        let second = PresentationPass.apply(&path).unwrap();
        let sheet_twice = zip_part(&path, "xl/worksheets/sheet1.xml");
        let styles_twice = zip_part(&path, "xl/styles.xml");

        assert_eq!(first, second);
        assert_eq!(sheet_once, sheet_twice);
        assert_eq!(styles_once, styles_twice);
        assert_eq!(sheet_twice.matches("<hyperlink ").count(), 2);
    }

    #[test]
    fn test_failed_render_leaves_workbook_untouched() {
        let (_dir, path) = written(ColumnSchema::full(), sample());
        let original = std::fs::read(&path).unwrap();

        let mut grid = Grid::read(&path).unwrap();
        let layout = SheetLayout::compute(&grid);
        grid.sheet_name = "bad[name]".to_string();
        assert!(render_formatted(&grid, &layout).is_err());

        assert_eq!(std::fs::read(&path).unwrap(), original);
        assert_eq!(Grid::read(&path).unwrap().rows.len(), 4);
    }

    #[test]
    fn test_failed_replace_keeps_previous_file() {
        let (dir, path) = written(ColumnSchema::full(), sample());
        let original = std::fs::read(&path).unwrap();

        // Renaming a file over a directory fails after the new bytes are staged.
        let blocked = dir.path().join("blocked.xlsx");
        std::fs::create_dir(&blocked).unwrap();
        assert!(replace_file(&blocked, b"new content").is_err());
        assert!(blocked.is_dir());

        assert_eq!(std::fs::read(&path).unwrap(), original);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 2, "staged file not cleaned up: {:?}", leftovers);
    }

    #[test]
    fn test_replace_swaps_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMDb_Top_1.xlsx");
        std::fs::write(&path, b"old").unwrap();

        replace_file(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PresentationPass.apply(&dir.path().join("nope.xlsx")).is_err());
    }
}
