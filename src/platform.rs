/// Host operating system family, as far as opening files and picking a
/// chromedriver build are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    /// Linux, the BSDs and anything unrecognized.
    Posix,
}

impl Platform {
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` value to a family.
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            _ => Self::Posix,
        }
    }

    /// Chrome-for-Testing artifact name for chromedriver on this platform.
    pub fn driver_artifact(&self, arch: &str) -> &'static str {
        match (self, arch) {
            (Self::Windows, _) => "win64",
            (Self::MacOs, "aarch64") => "mac-arm64",
            (Self::MacOs, _) => "mac-x64",
            (Self::Posix, _) => "linux64",
        }
    }

    pub fn driver_binary_name(&self) -> &'static str {
        match self {
            Self::Windows => "chromedriver.exe",
            _ => "chromedriver",
        }
    }
}
