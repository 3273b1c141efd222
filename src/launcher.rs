use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

use crate::platform::Platform;

/// Opens a finished file in the host's default viewer.
pub trait FileOpener {
    fn open(&self, path: &Path) -> Result<()>;
}

/// Windows: hand the file to the shell, which picks the registered application.
pub struct ShellStartOpener;

/// macOS: `open <file>`.
pub struct MacOpenOpener;

/// Everything else: `xdg-open <file>`.
pub struct XdgOpenOpener;

impl ShellStartOpener {
    pub fn command(path: &Path) -> Command {
        let mut cmd = Command::new("cmd");
        // The empty string is the window title `start` expects before a quoted path.
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    }
}

impl MacOpenOpener {
    pub fn command(path: &Path) -> Command {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    }
}

impl XdgOpenOpener {
    pub fn command(path: &Path) -> Command {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

fn run(mut cmd: Command) -> Result<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let status = cmd
        .status()
        .with_context(|| format!("failed to run {}", program))?;

    if !status.success() {
        bail!("{} exited with {}", program, status);
    }
    Ok(())
}

impl FileOpener for ShellStartOpener {
    fn open(&self, path: &Path) -> Result<()> {
        run(Self::command(path))
    }
}

impl FileOpener for MacOpenOpener {
    fn open(&self, path: &Path) -> Result<()> {
        run(Self::command(path))
    }
}

impl FileOpener for XdgOpenOpener {
    fn open(&self, path: &Path) -> Result<()> {
        run(Self::command(path))
    }
}

pub fn opener_for(platform: Platform) -> Box<dyn FileOpener> {
    match platform {
        Platform::Windows => Box::new(ShellStartOpener),
        Platform::MacOs => Box::new(MacOpenOpener),
        Platform::Posix => Box::new(XdgOpenOpener),
    }
}
