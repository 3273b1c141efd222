use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;
use thirtyfour::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::MovieRecord;

pub const TITLE_SELECTOR: &str = "h3.ipc-title__text";
pub const YEAR_SELECTOR: &str = "span.cli-title-metadata-item";
pub const RATING_SELECTOR: &str = "span.ipc-rating-star--rating";
pub const LINK_SELECTOR: &str = "a.ipc-title-link-wrapper";
pub const POSTER_SELECTOR: &str = "img";

/// Poster attributes in lookup order: the lazy-load source wins over `src`,
/// which may still hold a placeholder when the image has not loaded.
pub const POSTER_ATTRIBUTES: [&str; 2] = ["loadlate", "src"];

static RANK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+").expect("rank prefix pattern is valid"));

/// Why a single field of a chart item could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no element matches '{0}'")]
    MissingElement(String),

    #[error("'{selector}' has none of the attributes {attributes:?}")]
    MissingAttribute {
        selector: String,
        attributes: Vec<String>,
    },

    #[error("query for '{selector}' failed: {message}")]
    Query { selector: String, message: String },

    #[error("'{value}' cannot be resolved to an absolute URL")]
    InvalidUrl { value: String },
}

/// One chart entry as the extractor sees it: a DOM subtree that can be queried
/// by CSS selector.
#[allow(async_fn_in_trait)]
pub trait ChartItem {
    /// Text of the first descendant matching `selector`.
    async fn child_text(&self, selector: &str) -> Result<String, ExtractionError>;

    /// Attribute `name` of the first descendant matching `selector`.
    /// `Ok(None)` means the element exists but lacks the attribute.
    async fn child_attr(&self, selector: &str, name: &str)
        -> Result<Option<String>, ExtractionError>;
}

impl ChartItem for WebElement {
    async fn child_text(&self, selector: &str) -> Result<String, ExtractionError> {
        let element = self
            .find(By::Css(selector))
            .await
            .map_err(|_| ExtractionError::MissingElement(selector.to_string()))?;

        element.text().await.map_err(|e| ExtractionError::Query {
            selector: selector.to_string(),
            message: e.to_string(),
        })
    }

    async fn child_attr(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, ExtractionError> {
        let element = self
            .find(By::Css(selector))
            .await
            .map_err(|_| ExtractionError::MissingElement(selector.to_string()))?;

        element.attr(name).await.map_err(|e| ExtractionError::Query {
            selector: selector.to_string(),
            message: e.to_string(),
        })
    }
}

/// Reads every field of one chart item. Any failing field fails the whole
/// item; callers substitute `MovieRecord::unavailable`.
pub async fn extract_fields<I: ChartItem>(
    item: &I,
    rank: usize,
    base_url: &str,
) -> Result<MovieRecord, ExtractionError> {
    let title = clean_title(&item.child_text(TITLE_SELECTOR).await?);
    let year = item.child_text(YEAR_SELECTOR).await?.trim().to_string();
    let rating = item.child_text(RATING_SELECTOR).await?.trim().to_string();

    let href = item
        .child_attr(LINK_SELECTOR, "href")
        .await?
        .ok_or_else(|| ExtractionError::MissingAttribute {
            selector: LINK_SELECTOR.to_string(),
            attributes: vec!["href".to_string()],
        })?;
    let movie_url = absolute_url(base_url, &href)?;

    let poster = poster_source(item).await?;
    let poster_url = absolute_url(base_url, &poster)?;

    Ok(MovieRecord {
        rank,
        title,
        year,
        rating,
        movie_url,
        poster_url,
    })
}

async fn poster_source<I: ChartItem>(item: &I) -> Result<String, ExtractionError> {
    for attribute in POSTER_ATTRIBUTES {
        if let Some(value) = item.child_attr(POSTER_SELECTOR, attribute).await? {
            if !value.trim().is_empty() {
                return Ok(value);
            }
        }
    }

    Err(ExtractionError::MissingAttribute {
        selector: POSTER_SELECTOR.to_string(),
        attributes: POSTER_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
    })
}

/// Extracts the first `limit` items in document order. Ranks are 1-based
/// positions; a failed item still occupies its rank.
pub async fn extract_records<I, F>(
    items: &[I],
    limit: usize,
    base_url: &str,
    mut on_record: F,
) -> Vec<MovieRecord>
where
    I: ChartItem,
    F: FnMut(&MovieRecord),
{
    let mut records = Vec::with_capacity(limit.min(items.len()));

    for (index, item) in items.iter().take(limit).enumerate() {
        let rank = index + 1;
        let record = match extract_fields(item, rank, base_url).await {
            Ok(record) => {
                debug!(rank, title = %record.title, "extracted chart item");
                record
            }
            Err(e) => {
                warn!(rank, "chart item unreadable, using N/A: {}", e);
                MovieRecord::unavailable(rank)
            }
        };
        on_record(&record);
        records.push(record);
    }

    records
}

/// Drops the "<n>. " ranking prefix the chart puts in front of every title.
pub fn clean_title(raw: &str) -> String {
    RANK_PREFIX.replace(raw, "").trim().to_string()
}

/// Resolves `value` against `base`, so relative links become absolute.
pub fn absolute_url(base: &str, value: &str) -> Result<String, ExtractionError> {
    let invalid = || ExtractionError::InvalidUrl {
        value: value.to_string(),
    };
    let base = Url::parse(base).map_err(|_| invalid())?;
    let resolved = base.join(value.trim()).map_err(|_| invalid())?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved.to_string()),
        _ => Err(invalid()),
    }
}
