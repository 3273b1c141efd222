/// Literal written into every field that could not be extracted.
pub const SENTINEL: &str = "N/A";

/// One chart entry. Rank comes from the entry's position on the page, never
/// from site data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    pub rank: usize,
    pub title: String,
    pub year: String,
    pub rating: String,
    pub movie_url: String,
    pub poster_url: String,
}

impl MovieRecord {
    /// A record for an item whose extraction failed: every field is the sentinel.
    pub fn unavailable(rank: usize) -> Self {
        Self {
            rank,
            title: SENTINEL.to_string(),
            year: SENTINEL.to_string(),
            rating: SENTINEL.to_string(),
            movie_url: SENTINEL.to_string(),
            poster_url: SENTINEL.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        [
            &self.title,
            &self.year,
            &self.rating,
            &self.movie_url,
            &self.poster_url,
        ]
        .iter()
        .all(|field| field.as_str() == SENTINEL)
    }

    pub fn value(&self, column: Column) -> CellText<'_> {
        match column {
            Column::Rank => CellText::Number(self.rank as f64),
            Column::Title => CellText::Text(&self.title),
            Column::Year => CellText::Text(&self.year),
            Column::Rating => CellText::Text(&self.rating),
            Column::MovieUrl => CellText::Text(&self.movie_url),
            Column::PosterUrl => CellText::Text(&self.poster_url),
        }
    }
}

/// A cell value as the sink writes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellText<'a> {
    Number(f64),
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Rank,
    Title,
    Year,
    Rating,
    MovieUrl,
    PosterUrl,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Self::Rank => "Rank",
            Self::Title => "Title",
            Self::Year => "Year",
            Self::Rating => "IMDb Rating",
            Self::MovieUrl => MOVIE_URL_HEADER,
            Self::PosterUrl => "Poster URL",
        }
    }
}

/// Header text the presentation pass looks up to find the link column.
pub const MOVIE_URL_HEADER: &str = "Movie URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<Column>,
}

impl ColumnSchema {
    pub fn full() -> Self {
        Self {
            columns: vec![
                Column::Rank,
                Column::Title,
                Column::Year,
                Column::Rating,
                Column::MovieUrl,
                Column::PosterUrl,
            ],
        }
    }

    /// Rank, title, year and rating only.
    pub fn minimal() -> Self {
        Self {
            columns: vec![Column::Rank, Column::Title, Column::Year, Column::Rating],
        }
    }

    pub fn with_links(include_links: bool) -> Self {
        if include_links {
            Self::full()
        } else {
            Self::minimal()
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::header).collect()
    }
}

/// Extracted records in chart order plus the schema they are exported with.
#[derive(Debug, Clone)]
pub struct ResultTable {
    pub records: Vec<MovieRecord>,
    pub schema: ColumnSchema,
    pub extraction_date: chrono::DateTime<chrono::Local>,
}

impl ResultTable {
    pub fn new(records: Vec<MovieRecord>, schema: ColumnSchema) -> Self {
        Self {
            records,
            schema,
            extraction_date: chrono::Local::now(),
        }
    }

    pub fn unavailable_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_unavailable()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rank: usize) -> MovieRecord {
        MovieRecord {
            rank,
            title: "The Godfather".to_string(),
            year: "1972".to_string(),
            rating: "9.2".to_string(),
            movie_url: "https://www.imdb.com/title/tt0068646/".to_string(),
            poster_url: "https://m.media-amazon.com/images/M/godfather.jpg".to_string(),
        }
    }

    #[test]
    fn test_unavailable_record_is_all_sentinel() {
        let record = MovieRecord::unavailable(3);
        assert_eq!(record.rank, 3);
        assert!(record.is_unavailable());
        assert_eq!(record.title, SENTINEL);
        assert_eq!(record.poster_url, SENTINEL);
    }

    #[test]
    fn test_partial_sentinel_is_not_unavailable() {
        let mut record = sample(1);
        record.year = SENTINEL.to_string();
        assert!(!record.is_unavailable());
    }

    #[test]
    fn test_schema_headers() {
        assert_eq!(
            ColumnSchema::full().headers(),
            vec!["Rank", "Title", "Year", "IMDb Rating", "Movie URL", "Poster URL"]
        );
        assert!(!ColumnSchema::minimal().headers().contains(&MOVIE_URL_HEADER));
    }

    #[test]
    fn test_rank_is_numeric_cell() {
        let record = sample(7);
        assert_eq!(record.value(Column::Rank), CellText::Number(7.0));
        assert_eq!(record.value(Column::Year), CellText::Text("1972"));
    }

    #[test]
    fn test_unavailable_count() {
        let table = ResultTable::new(
            vec![sample(1), MovieRecord::unavailable(2), sample(3)],
            ColumnSchema::full(),
        );
        assert_eq!(table.unavailable_count(), 1);
    }
}
