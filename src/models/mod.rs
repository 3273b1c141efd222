pub mod movie;

pub use movie::{CellText, ColumnSchema, MovieRecord, ResultTable, MOVIE_URL_HEADER, SENTINEL};
