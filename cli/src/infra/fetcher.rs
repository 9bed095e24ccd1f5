//! `ArtifactFetcher` over HTTPS: release download, checksum, extraction.
//!
//! Downloads run on the blocking pool (`ureq` is synchronous). The archive and
//! the extracted executable share one temporary directory owned by the
//! returned [`Artifact`].

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use deploy_common::Product;
use indicatif::ProgressBar;
use sha2::{Digest, Sha256};

use crate::application::ports::{Artifact, ArtifactFetcher};
use crate::domain::checksum::{find_digest, hex_encode};
use crate::domain::{DownloadError, ExtractError};

/// Public release mirror.
pub const DEFAULT_RELEASES_URL: &str = "https://releases.hashicorp.com";

/// Release archive name, e.g. `consul_1.10.0_linux_amd64.zip`.
#[must_use]
pub fn archive_name(product: Product, version: &str) -> String {
    format!("{}_{version}_linux_amd64.zip", product.binary())
}

/// Checksum document name, e.g. `consul_1.10.0_SHA256SUMS`.
#[must_use]
pub fn sums_name(product: Product, version: &str) -> String {
    format!("{}_{version}_SHA256SUMS", product.binary())
}

/// `<base>/<product>/<version>/<file>`
#[must_use]
pub fn release_url(base: &str, product: Product, version: &str, file: &str) -> String {
    format!(
        "{}/{}/{version}/{file}",
        base.trim_end_matches('/'),
        product.binary()
    )
}

/// Production fetcher.
#[derive(Clone)]
pub struct HttpArtifactFetcher {
    base_url: String,
    verify_checksum: bool,
    progress: ProgressBar,
}

impl HttpArtifactFetcher {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            verify_checksum: true,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report download progress on `bar`; its length is set once known.
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    /// Skip the `SHA256SUMS` check (mirrors that do not publish one).
    #[must_use]
    pub fn without_checksum(mut self) -> Self {
        self.verify_checksum = false;
        self
    }

    fn fetch_blocking(&self, product: Product, version: &str) -> Result<Artifact> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-{version}-", product.binary()))
            .tempdir()
            .context("creating download directory")?;

        let archive = archive_name(product, version);
        let url = release_url(&self.base_url, product, version, &archive);
        let archive_path = dir.path().join(&archive);
        let actual = download(&url, &archive_path, &self.progress)?;

        if self.verify_checksum {
            let sums_url = release_url(&self.base_url, product, version, &sums_name(product, version));
            let sums = download_text(&sums_url)?;
            let expected = find_digest(&sums, &archive).ok_or_else(|| DownloadError::ChecksumMissing {
                url: sums_url.clone(),
                file: archive.clone(),
            })?;
            if expected != actual {
                return Err(DownloadError::ChecksumMismatch {
                    file: archive,
                    expected,
                    actual,
                }
                .into());
            }
            tracing::debug!(%archive, "checksum verified");
        }

        let bin_dir = dir.path().join("bin");
        std::fs::create_dir(&bin_dir).with_context(|| format!("creating {}", bin_dir.display()))?;
        let path = extract_binary(&archive_path, product.binary(), &bin_dir)?;
        Ok(Artifact::new(path, product, Some(Box::new(dir))))
    }
}

impl ArtifactFetcher for HttpArtifactFetcher {
    async fn fetch(&self, product: Product, version: &str) -> Result<Artifact> {
        let fetcher = self.clone();
        let version = version.to_string();
        tokio::task::spawn_blocking(move || fetcher.fetch_blocking(product, &version))
            .await
            .context("download task failed")?
    }
}

fn request(url: &str) -> Result<ureq::Response, DownloadError> {
    ureq::get(url).call().map_err(|e| DownloadError::Request {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Stream `url` into `dest`, returning the hex SHA-256 of the body.
fn download(url: &str, dest: &Path, progress: &ProgressBar) -> Result<String> {
    tracing::info!(url, "downloading");
    let response = request(url)?;
    if let Some(len) = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok())
    {
        progress.set_length(len);
    }

    let io_err = |e: io::Error| DownloadError::Io(e.to_string());
    let mut reader = response.into_reader();
    let mut file = File::create(dest).map_err(io_err)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(|e| DownloadError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n]).map_err(io_err)?;
        progress.inc(n as u64);
    }
    file.flush().map_err(io_err)?;
    progress.finish_and_clear();
    Ok(hex_encode(&hasher.finalize()))
}

fn download_text(url: &str) -> Result<String> {
    request(url)?
        .into_string()
        .map_err(|e| {
            DownloadError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}

/// Copy the archive entry named exactly `entry` into `dir` and mark it
/// executable.
///
/// # Errors
///
/// Returns [`ExtractError`] if the archive cannot be read or has no such
/// entry; no output file is left behind in that case.
pub fn extract_binary(archive: &Path, entry: &str, dir: &Path) -> Result<std::path::PathBuf> {
    let archive_err = |reason: String| ExtractError::Archive {
        archive: archive.display().to_string(),
        reason,
    };
    let file = File::open(archive).map_err(|e| archive_err(e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;
    let mut source = match zip.by_name(entry) {
        Ok(source) => source,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ExtractError::EntryMissing {
                archive: archive.display().to_string(),
                entry: entry.to_string(),
            }
            .into());
        }
        Err(e) => return Err(archive_err(e.to_string()).into()),
    };

    let dest = dir.join(entry);
    let mut out = File::create(&dest).with_context(|| format!("creating {}", dest.display()))?;
    io::copy(&mut source, &mut out).map_err(|e| archive_err(e.to_string()))?;
    set_executable(&dest)?;
    Ok(dest)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        ExtractError::Permissions {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
