use anyhow::{Context, Result};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::platform::Platform;

const LATEST_RELEASE_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/LATEST_RELEASE_STABLE";
const READINESS_TIMEOUT_SECS: u64 = 15;

/// Finds or downloads chromedriver and owns the running driver process.
/// The process is killed on `stop_driver` and, failing that, on drop.
pub struct ChromeDriverManager {
    driver_path: PathBuf,
    port: u16,
    process: Mutex<Option<Child>>,
}

pub fn download_url(version: &str, artifact: &str) -> String {
    format!(
        "https://storage.googleapis.com/chrome-for-testing-public/{}/{}/chromedriver-{}.zip",
        version, artifact, artifact
    )
}

impl ChromeDriverManager {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let platform = Platform::detect();
        let binary = platform.driver_binary_name();

        let driver_path = match &config.chromedriver_path {
            Some(path) => path.clone(),
            None => match which::which(binary) {
                Ok(path) => path,
                Err(_) => AppConfig::project_dirs()?.cache_dir().join(binary),
            },
        };
        debug!(path = %driver_path.display(), "chromedriver location");

        Ok(Self {
            driver_path,
            port: config.driver_port,
            process: Mutex::new(None),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    pub async fn ensure_driver_available(&self) -> Result<()> {
        if !self.driver_path.exists() {
            info!("ChromeDriver not found at {:?}, downloading...", self.driver_path);
            self.download_chromedriver().await
                .context("Failed to download ChromeDriver. Please check your internet connection.")?;
        } else {
            debug!("ChromeDriver found at {:?}", self.driver_path);
        }
        Ok(())
    }

    pub async fn start_driver(&self) -> Result<()> {
        self.ensure_driver_available().await?;

        let mut process_guard = self.process.lock().await;
        if process_guard.is_some() {
            debug!("ChromeDriver is already running on port {}", self.port);
            return Ok(());
        }

        info!("Starting ChromeDriver on port {}...", self.port);
        let child = Command::new(&self.driver_path)
            .arg(format!("--port={}", self.port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start ChromeDriver from {:?}. Make sure Chrome is installed.", self.driver_path))?;

        *process_guard = Some(child);
        drop(process_guard);

        if !self.wait_for_readiness(READINESS_TIMEOUT_SECS).await {
            self.stop_driver().await;
            return Err(anyhow::anyhow!(
                "ChromeDriver failed to become ready within {} seconds. This might indicate a Chrome installation problem.",
                READINESS_TIMEOUT_SECS
            ));
        }

        info!("ChromeDriver started on port {}", self.port);
        Ok(())
    }

    pub async fn stop_driver(&self) {
        let mut process_guard = self.process.lock().await;
        if let Some(mut child) = process_guard.take() {
            let _ = child.kill();
            let _ = child.wait();
            info!("ChromeDriver stopped");
        }
    }

    async fn download_chromedriver(&self) -> Result<()> {
        let version = self.get_latest_version().await?;
        let platform = Platform::detect();
        let artifact = platform.driver_artifact(std::env::consts::ARCH);
        let url = download_url(&version, artifact);
        info!("Downloading ChromeDriver {} ({})", version, artifact);

        let response = reqwest::get(&url).await?.error_for_status()?;
        let zip_data = response.bytes().await?;

        let mut archive = zip::ZipArchive::new(Cursor::new(zip_data))?;
        let binary = platform.driver_binary_name();

        if let Some(parent) = self.driver_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut extracted = false;
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            // Archives nest the binary, e.g. chromedriver-linux64/chromedriver
            if is_driver_entry(file.name(), binary) {
                debug!("Extracting: {}", file.name());
                let mut outfile = fs::File::create(&self.driver_path)?;
                std::io::copy(&mut file, &mut outfile)?;
                extracted = true;
                break;
            }
        }

        if !extracted {
            return Err(anyhow::anyhow!("{} not found in {}", binary, url));
        }

        make_executable(&self.driver_path)?;
        info!("ChromeDriver downloaded to {:?}", self.driver_path);
        Ok(())
    }

    async fn wait_for_readiness(&self, timeout_secs: u64) -> bool {
        let client = reqwest::Client::new();
        let url = format!("{}/status", self.server_url());
        let timeout = tokio::time::Duration::from_secs(timeout_secs);
        let start = tokio::time::Instant::now();

        while start.elapsed() < timeout {
            if let Ok(response) = client.get(&url).send().await {
                if response.status().is_success() {
                    return true;
                }
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        }

        false
    }

    async fn get_latest_version(&self) -> Result<String> {
        let response = reqwest::get(LATEST_RELEASE_URL).await?.error_for_status()?;
        let version = response.text().await?.trim().to_string();
        debug!("Latest ChromeDriver version: {}", version);
        Ok(version)
    }
}

impl Drop for ChromeDriverManager {
    fn drop(&mut self) {
        if let Ok(mut process_guard) = self.process.try_lock() {
            if let Some(mut child) = process_guard.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }
}

fn is_driver_entry(name: &str, binary: &str) -> bool {
    !name.ends_with('/') && (name == binary || name.ends_with(&format!("/{}", binary)))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
