use anyhow::{bail, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod chromedriver_manager;
mod config;
mod export;
mod input;
mod launcher;
mod models;
mod platform;
mod scraper;
mod ui;

use app::RunSettings;
use chromedriver_manager::ChromeDriverManager;
use config::AppConfig;
use platform::Platform;
use scraper::browser::BrowserDriver;

/// Scrape the IMDb Top chart into a formatted Excel workbook.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Number of movies (1-250); prompts when omitted
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    count: Option<String>,

    /// Run Chrome without a window
    #[arg(long)]
    headless: bool,

    /// Do not open the workbook when done
    #[arg(long)]
    no_open: bool,

    /// Leave out the movie and poster URL columns
    #[arg(long)]
    minimal: bool,

    /// Seconds to wait for the chart to appear
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory for the workbook (default: current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Port for the local chromedriver
    #[arg(long)]
    port: Option<u16>,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut AppConfig) {
        if self.headless {
            config.headless = true;
        }
        if self.no_open {
            config.auto_open = false;
        }
        if self.minimal {
            config.include_links = false;
        }
        if let Some(timeout) = self.timeout {
            config.wait_timeout_secs = timeout;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(port) = self.port {
            config.driver_port = port;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("\n❌ Scraping failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load()?;
    cli.apply_to(&mut config);

    let errors = config.validate();
    if !errors.is_empty() {
        bail!("invalid configuration: {}", errors.join("; "));
    }

    if cli.save_config {
        let path = config.save()?;
        info!("settings saved to {}", path.display());
    }

    let count = match &cli.count {
        Some(raw) => input::resolve_and_report(raw, &mut io::stdout()),
        None => input::prompt_count(&mut io::stdin().lock(), &mut io::stdout()),
    };

    let manager = ChromeDriverManager::new(&config)?;
    manager.start_driver().await?;

    let browser = match BrowserDriver::new(&manager.server_url(), config.headless).await {
        Ok(browser) => browser,
        Err(e) => {
            manager.stop_driver().await;
            return Err(e.into());
        }
    };

    let opener = config.auto_open.then(|| launcher::opener_for(Platform::detect()));
    let settings = RunSettings::from_config(&config);

    let result = app::run(browser, count, &settings, opener.as_deref()).await;
    manager.stop_driver().await;

    let report = result?;
    info!(
        rows = report.rows,
        unavailable = report.unavailable_rows,
        formatted = report.formatted,
        opened = report.opened,
        at = %report.extraction_date.format("%Y-%m-%d %H:%M:%S"),
        "run finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "imdb_top_scraper",
            "--count",
            "25",
            "--headless",
            "--no-open",
            "--minimal",
            "--timeout",
            "30",
            "--port",
            "9600",
        ]);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(cli.count.as_deref(), Some("25"));
        assert!(config.headless);
        assert!(!config.auto_open);
        assert!(!config.include_links);
        assert_eq!(config.wait_timeout_secs, 30);
        assert_eq!(config.driver_port, 9600);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["imdb_top_scraper"]);
        let mut config = AppConfig {
            headless: true,
            ..AppConfig::default()
        };
        cli.apply_to(&mut config);

        assert!(cli.count.is_none());
        assert!(config.headless);
        assert!(config.auto_open);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
