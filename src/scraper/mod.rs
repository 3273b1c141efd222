pub mod browser;
pub mod extractor;

use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::MovieRecord;
pub use extractor::ChartItem;

pub const CHART_URL: &str = "https://www.imdb.com/chart/top/";

/// Container selector the fetcher waits for; each match is one chart item.
pub const CHART_ITEM_SELECTOR: &str =
    "ul.ipc-metadata-list li.ipc-metadata-list-summary-item";

/// Infrastructure failures while talking to the browser. All of them end the run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to start browser session: {0}")]
    Launch(String),

    #[error("failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("timed out after {secs}s waiting for '{selector}'", secs = .timeout.as_secs())]
    Timeout { selector: String, timeout: Duration },

    #[error("browser session error: {0}")]
    Session(String),
}

/// A page that can be loaded and queried for chart items.
#[allow(async_fn_in_trait)]
pub trait ChartPage {
    type Item: ChartItem;

    /// Navigates to `url` and waits until `selector` matches at least one element.
    async fn open_chart(
        &mut self,
        url: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Self::Item>, ScrapeError>;

    /// Ends the session and releases the browser process.
    async fn close(self) -> Result<(), ScrapeError>;
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub url: String,
    pub timeout: Duration,
    pub limit: usize,
}

/// Loads the chart, extracts up to `limit` records and closes the page on
/// every path, including a failed load. A failed close is only logged: the
/// driver process is killed by `ChromeDriverManager` regardless.
pub async fn fetch_records<P, F>(
    mut page: P,
    options: &FetchOptions,
    on_record: F,
) -> Result<Vec<MovieRecord>, ScrapeError>
where
    P: ChartPage,
    F: FnMut(&MovieRecord),
{
    let result = load_and_extract(&mut page, options, on_record).await;

    match page.close().await {
        Ok(()) => info!("browser session closed"),
        Err(e) => warn!("failed to close browser session: {}", e),
    }

    result
}

async fn load_and_extract<P, F>(
    page: &mut P,
    options: &FetchOptions,
    on_record: F,
) -> Result<Vec<MovieRecord>, ScrapeError>
where
    P: ChartPage,
    F: FnMut(&MovieRecord),
{
    info!("loading {}", options.url);
    let items = page
        .open_chart(&options.url, CHART_ITEM_SELECTOR, options.timeout)
        .await?;
    info!(found = items.len(), requested = options.limit, "chart items located");

    Ok(extractor::extract_records(&items, options.limit, &options.url, on_record).await)
}
