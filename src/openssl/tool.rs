//! Locating the openssl executable
//!
//! Unix-like hosts use the system `openssl` from PATH. Windows hosts use a
//! portable build cached under `{base}/lib/openssl`, downloaded on first use.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::download::{download_archive, extract_archive};
use crate::error::{CertError, Result};
use crate::output::GenerationOptions;

/// Command name of the system-installed tool
pub const OPENSSL_COMMAND: &str = "openssl";

/// Portable Windows build fetched when no cached copy exists
pub const DEFAULT_ARCHIVE_URL: &str = "https://indy.fulgan.com/SSL/openssl-1.0.2n-x64_86-win64.zip";

const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

const ARCHIVE_FILE: &str = "openssl.zip";
const EXECUTABLE_FILE: &str = "openssl.exe";

/// Read the archive URL from `SELF_SIGNED_CERT_OPENSSL_URL` or use the default
pub fn archive_url() -> String {
    std::env::var("SELF_SIGNED_CERT_OPENSSL_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string())
}

/// Read the download inactivity timeout from `SELF_SIGNED_CERT_DOWNLOAD_TIMEOUT`
/// (seconds). Falls back to 300 seconds when unset, unparsable or zero.
pub fn download_timeout() -> Duration {
    parse_timeout(std::env::var("SELF_SIGNED_CERT_DOWNLOAD_TIMEOUT").ok().as_deref())
}

fn parse_timeout(raw: Option<&str>) -> Duration {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT)
}

/// Directory holding the running executable, the default base of the tool cache
pub fn default_tool_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(CertError::CurrentExe)?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// How the tool is obtained on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPlatform {
    /// `openssl` is assumed to be on PATH
    System,
    /// A portable build is downloaded and cached
    Portable,
}

impl ToolPlatform {
    pub fn detect() -> Self {
        if cfg!(windows) {
            ToolPlatform::Portable
        } else {
            ToolPlatform::System
        }
    }
}

/// How to invoke the certificate tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolLocation {
    /// Bare command name resolved through PATH
    Command(String),
    /// Path to a specific executable
    Path(PathBuf),
}

impl ToolLocation {
    pub fn program(&self) -> &OsStr {
        match self {
            ToolLocation::Command(name) => OsStr::new(name),
            ToolLocation::Path(path) => path.as_os_str(),
        }
    }
}

impl fmt::Display for ToolLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolLocation::Command(name) => f.write_str(name),
            ToolLocation::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolves the [`ToolLocation`] for one generation call.
///
/// The cache check and download are not guarded by a lock; two processes
/// doing first-time setup in the same directory can race.
#[derive(Debug, Clone)]
pub struct ToolResolver {
    platform: ToolPlatform,
    archive_url: String,
    inactivity_timeout: Duration,
}

impl Default for ToolResolver {
    fn default() -> Self {
        Self::new(ToolPlatform::detect())
    }
}

impl ToolResolver {
    pub fn new(platform: ToolPlatform) -> Self {
        Self {
            platform,
            archive_url: archive_url(),
            inactivity_timeout: download_timeout(),
        }
    }

    pub fn archive_url(mut self, url: impl Into<String>) -> Self {
        self.archive_url = url.into();
        self
    }

    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn platform(&self) -> ToolPlatform {
        self.platform
    }

    /// `{base}/lib/openssl`
    pub fn cache_dir(base_dir: &Path) -> PathBuf {
        base_dir.join("lib").join("openssl")
    }

    /// `{base}/lib/openssl/openssl.exe`
    pub fn cached_executable(base_dir: &Path) -> PathBuf {
        Self::cache_dir(base_dir).join(EXECUTABLE_FILE)
    }

    pub async fn resolve(&self, base_dir: &Path, options: &GenerationOptions) -> Result<ToolLocation> {
        match self.platform {
            ToolPlatform::System => {
                if let Err(e) = which::which(OPENSSL_COMMAND) {
                    options.debug(&format!("{OPENSSL_COMMAND} not found on PATH: {e}"));
                }
                Ok(ToolLocation::Command(OPENSSL_COMMAND.to_string()))
            }
            ToolPlatform::Portable => self.resolve_portable(base_dir, options).await,
        }
    }

    async fn resolve_portable(
        &self,
        base_dir: &Path,
        options: &GenerationOptions,
    ) -> Result<ToolLocation> {
        let exe_path = Self::cached_executable(base_dir);

        if tokio::fs::try_exists(&exe_path)
            .await
            .map_err(|e| CertError::io(&exe_path, e))?
        {
            options.debug(&format!("Using cached openssl at {}", exe_path.display()));
            return Ok(ToolLocation::Path(exe_path));
        }

        options.step("\tDownloading openssl...");

        let zip_path = base_dir.join(ARCHIVE_FILE);
        let bytes = download_archive(&self.archive_url, &zip_path, self.inactivity_timeout, options).await?;
        options.debug(&format!(
            "Downloaded {} bytes from {} to {}",
            bytes,
            self.archive_url,
            zip_path.display()
        ));

        let files = extract_archive(&zip_path, &Self::cache_dir(base_dir)).await?;
        options.debug(&format!("Extracted {files} files"));

        tokio::fs::remove_file(&zip_path)
            .await
            .map_err(|e| CertError::io(&zip_path, e))?;

        if !tokio::fs::try_exists(&exe_path)
            .await
            .map_err(|e| CertError::io(&exe_path, e))?
        {
            return Err(CertError::MissingExecutable { path: exe_path });
        }

        Ok(ToolLocation::Path(exe_path))
    }
}
