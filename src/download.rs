//! Media byte fetching.
//!
//! One GET under a bounded timeout; the destination file only ever holds a
//! complete success body. Bytes land in a temporary sibling first and are
//! renamed into place, so an interrupted transfer cannot corrupt a previously
//! good file. Failures are reported, never raised to the caller.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch `url` into `destination`. `false` covers every failure mode:
    /// network error, non-success status, write failure.
    async fn fetch(&self, url: &str, destination: &Path) -> bool;
}

pub struct MediaDownloader {
    client: reqwest::Client,
}

impl MediaDownloader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn try_fetch(&self, url: &str, destination: &Path) -> Result<()> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Download(format!("{} returned {}", url, status)));
        }
        let bytes = response.bytes().await?;
        persist_bytes(destination, &bytes)
    }
}

#[async_trait]
impl MediaFetcher for MediaDownloader {
    async fn fetch(&self, url: &str, destination: &Path) -> bool {
        match self.try_fetch(url, destination).await {
            Ok(()) => {
                debug!(%url, path = %destination.display(), "media saved");
                true
            }
            Err(e) => {
                warn!(%url, error = %e, "media fetch failed");
                false
            }
        }
    }
}

/// Write `bytes` to `destination` atomically: temporary sibling, then rename.
pub fn persist_bytes(destination: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = part_path(destination);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, destination)?;
    Ok(())
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    destination.with_file_name(name)
}
