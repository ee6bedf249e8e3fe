//! Portable openssl download and extraction

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::error::{CertError, Result};
use crate::output::GenerationOptions;

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const PROGRESS_THRESHOLD: u64 = 256 * 1024;

/// Stream `url` into `dest`, failing if no data arrives for `inactivity`.
///
/// Returns the number of bytes written.
pub async fn download_archive(
    url: &str,
    dest: &Path,
    inactivity: Duration,
    options: &GenerationOptions,
) -> Result<u64> {
    let download_err = |source| CertError::Download {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
        .user_agent(concat!("self-signed-cert/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(download_err)?;

    let response = client.get(url).send().await.map_err(download_err)?;
    if !response.status().is_success() {
        return Err(CertError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }
    let total_bytes = response.content_length();

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CertError::io(parent, e))?;
    }
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| CertError::io(dest, e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_progress_bytes = 0u64;

    loop {
        let chunk = match timeout(inactivity, stream.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => return Err(download_err(e)),
            Ok(None) => break,
            Err(_) => {
                return Err(CertError::DownloadStalled {
                    url: url.to_string(),
                    seconds: inactivity.as_secs(),
                });
            }
        };

        file.write_all(&chunk)
            .await
            .map_err(|e| CertError::io(dest, e))?;
        downloaded += chunk.len() as u64;

        if downloaded - last_progress_bytes >= PROGRESS_THRESHOLD {
            options.debug(&progress_message(downloaded, total_bytes));
            last_progress_bytes = downloaded;
        }
    }

    file.flush().await.map_err(|e| CertError::io(dest, e))?;
    options.debug(&progress_message(downloaded, total_bytes));

    Ok(downloaded)
}

fn progress_message(downloaded: u64, total_bytes: Option<u64>) -> String {
    let mb_downloaded = downloaded as f64 / 1_048_576.0;
    match total_bytes {
        Some(total) if total > 0 => format!(
            "\t\tDownloaded {:.1} MB / {:.1} MB ({}%)",
            mb_downloaded,
            total as f64 / 1_048_576.0,
            downloaded * 100 / total
        ),
        _ => format!("\t\tDownloaded {mb_downloaded:.1} MB"),
    }
}

/// Extract every entry of a ZIP archive into `dest_dir`.
///
/// Entries whose names would escape `dest_dir` are skipped. Returns the
/// number of files written.
pub async fn extract_archive(archive: &Path, dest_dir: &Path) -> Result<usize> {
    let archive = archive.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();

    tokio::task::spawn_blocking(move || extract_blocking(&archive, &dest_dir)).await?
}

fn extract_blocking(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    use zip::ZipArchive;

    let zip_err = |source| CertError::Extract {
        archive: archive_path.to_path_buf(),
        source,
    };

    let zip_file = std::fs::File::open(archive_path).map_err(|e| CertError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(zip_file).map_err(zip_err)?;

    std::fs::create_dir_all(dest_dir).map_err(|e| CertError::io(dest_dir, e))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_err)?;

        let Some(relative) = entry.enclosed_name() else {
            log::warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        let out_path: PathBuf = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| CertError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CertError::io(parent, e))?;
        }
        let mut outfile =
            std::fs::File::create(&out_path).map_err(|e| CertError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| CertError::io(&out_path, e))?;
        written += 1;
    }

    Ok(written)
}
