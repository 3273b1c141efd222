use anyhow::Result;
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scraper::CHART_URL;

pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 20;
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_DRIVER_PORT: u16 = 9515;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub chart_url: String,
    pub headless: bool,
    pub wait_timeout_secs: u64,
    pub driver_port: u16,
    pub chromedriver_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub include_links: bool,
    pub auto_open: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chart_url: CHART_URL.to_string(),
            headless: false,
            wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            driver_port: DEFAULT_DRIVER_PORT,
            chromedriver_path: None,
            output_dir: None,
            include_links: true,
            auto_open: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "imdb", "imdb-top-scraper")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.json"))
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match Url::parse(&self.chart_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => errors.push(format!("Chart URL '{}' is not an http(s) URL", self.chart_url)),
        }

        if !(1..=MAX_WAIT_TIMEOUT_SECS).contains(&self.wait_timeout_secs) {
            errors.push(format!(
                "Wait timeout must be between 1 and {} seconds",
                MAX_WAIT_TIMEOUT_SECS
            ));
        }

        if self.driver_port == 0 {
            errors.push("Driver port must not be 0".to_string());
        }

        if let Some(dir) = &self.output_dir {
            if !dir.is_dir() {
                errors.push(format!("Output directory {} does not exist", dir.display()));
            }
        }

        errors
    }
}
