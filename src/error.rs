//! Error types for certificate generation

use std::path::PathBuf;
use std::process::ExitStatus;

/// Fatal errors raised while generating a certificate.
///
/// Missing metadata is never an error; it degrades the distinguished name and
/// produces warnings instead.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse project metadata {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("project metadata {} is not a JSON object", path.display())]
    MetadataRoot { path: PathBuf },

    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} failed: HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("download timeout: no data received for {seconds} seconds from {url}")]
    DownloadStalled { url: String, seconds: u64 },

    #[error("failed to extract {}: {source}", archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{} not found after extracting the openssl archive", path.display())]
    MissingExecutable { path: PathBuf },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl CertError {
    /// Attach the offending path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = CertError> = std::result::Result<T, E>;
