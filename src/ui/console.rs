use std::path::Path;

use crate::models::MovieRecord;

/// Titles longer than this are cut in console output only.
pub const TITLE_DISPLAY_WIDTH: usize = 45;
const RULE_WIDTH: usize = 130;

pub fn table_header() -> String {
    format!(
        "{:<6} {:<width$} {:<6} {:<8} {}\n{}",
        "Rank",
        "Title",
        "Year",
        "Rating",
        "Movie URL",
        "-".repeat(RULE_WIDTH),
        width = TITLE_DISPLAY_WIDTH
    )
}

pub fn table_row(record: &MovieRecord) -> String {
    format!(
        "{:<6} {:<width$} {:<6} {:<8} {}",
        record.rank,
        truncate(&record.title, TITLE_DISPLAY_WIDTH),
        record.year,
        record.rating,
        record.movie_url,
        width = TITLE_DISPLAY_WIDTH
    )
}

pub fn print_table_header() {
    println!("{}", table_header());
}

pub fn print_table_row(record: &MovieRecord) {
    println!("{}", table_row(record));
}

pub fn completion_line(rows: usize, path: &Path) -> String {
    format!("\n✅ Scraping Completed! Saved {} movies to {}", rows, path.display())
}

pub const OPEN_FAILED_LINE: &str = "⚠ Unable to auto-open Excel. Please open the file manually.";

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> MovieRecord {
        MovieRecord {
            rank: 7,
            title: title.to_string(),
            year: "2003".to_string(),
            rating: "9.0".to_string(),
            movie_url: "https://www.imdb.com/title/tt0167260/".to_string(),
            poster_url: "https://m.media-amazon.com/images/M/rotk.jpg".to_string(),
        }
    }

    #[test]
    fn test_long_title_truncated_for_display() {
        let long = "The Lord of the Rings: The Return of the King (Extended Edition)";
        let rec = record(long);
        let row = table_row(&rec);

        assert!(row.contains(&long[..45]));
        assert!(!row.contains("(Extended"));
        // The record keeps the full title.
        assert_eq!(rec.title, long);
    }

    #[test]
    fn test_truncation_counts_chars() {
        let title = "Amélie ".repeat(10);
        assert_eq!(truncate(&title, TITLE_DISPLAY_WIDTH).chars().count(), 45);
    }

    #[test]
    fn test_row_columns_are_aligned() {
        let row = table_row(&record("Se7en"));
        assert!(row.starts_with(&format!("{:<6} Se7en", 7)));
        assert!(row.ends_with("https://www.imdb.com/title/tt0167260/"));
        assert_eq!(row.find("2003"), Some(6 + 1 + TITLE_DISPLAY_WIDTH + 1));
    }

    #[test]
    fn test_header_has_rule() {
        let header = table_header();
        assert!(header.starts_with("Rank"));
        assert!(header.ends_with(&"-".repeat(130)));
    }
}
