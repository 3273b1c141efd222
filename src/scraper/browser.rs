use std::time::{Duration, Instant};
use thirtyfour::prelude::*;
use tokio::time::sleep;
use tracing::{debug, info};

use super::{ChartPage, ScrapeError};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Chrome arguments applied to every session.
pub fn chrome_args(headless: bool) -> Vec<&'static str> {
    let mut args = vec![
        "--no-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--window-size=1920,1080",
    ];

    if headless {
        args.push("--headless");
    }

    args
}

pub struct BrowserDriver {
    driver: WebDriver,
}

impl BrowserDriver {
    /// Opens a Chrome session through the chromedriver listening at `server_url`.
    pub async fn new(server_url: &str, headless: bool) -> Result<Self, ScrapeError> {
        debug!(headless, server_url, "creating browser session");

        let mut caps = DesiredCapabilities::chrome();
        for arg in chrome_args(headless) {
            caps.add_arg(arg)
                .map_err(|e| ScrapeError::Launch(format!("invalid Chrome argument {}: {}", arg, e)))?;
        }

        let driver = WebDriver::new(server_url, caps).await.map_err(|e| {
            ScrapeError::Launch(format!("could not connect to chromedriver at {}: {}", server_url, e))
        })?;

        info!("browser session started");
        Ok(Self { driver })
    }

    pub async fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        self.driver
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// Polls until `selector` matches at least one element or `timeout` elapses.
    pub async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<WebElement>, ScrapeError> {
        let start = Instant::now();

        loop {
            match self.driver.find_all(By::Css(selector)).await {
                Ok(elements) if !elements.is_empty() => return Ok(elements),
                Ok(_) => {}
                Err(e) => debug!("lookup of '{}' failed: {}", selector, e),
            }

            if start.elapsed() >= timeout {
                return Err(ScrapeError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }

            sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn quit(self) -> Result<(), ScrapeError> {
        self.driver
            .quit()
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))
    }
}

impl ChartPage for BrowserDriver {
    type Item = WebElement;

    async fn open_chart(
        &mut self,
        url: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<WebElement>, ScrapeError> {
        self.navigate(url).await?;
        self.wait_for_elements(selector, timeout).await
    }

    async fn close(self) -> Result<(), ScrapeError> {
        self.quit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_args_disable_gpu_and_sandbox() {
        let args = chrome_args(false);
        assert!(args.contains(&"--disable-gpu"));
        assert!(args.contains(&"--no-sandbox"));
        assert!(!args.contains(&"--headless"));
    }

    #[test]
    fn test_chrome_args_headless() {
        assert!(chrome_args(true).contains(&"--headless"));
    }

    #[tokio::test]
    async fn test_unreachable_driver_fails_on_first_attempt() {
        let started = Instant::now();
        let result = BrowserDriver::new("http://127.0.0.1:1", true).await;

        assert!(matches!(result, Err(ScrapeError::Launch(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
