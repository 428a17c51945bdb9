//! End-to-end download jobs.
//!
//! A job walks a fixed sequence: resolve the user's cookies, run the
//! downloader through the worker pool, verify the file it reported, hand
//! it to the chat sink, then delete the local copy. Each job produces
//! exactly one terminal outcome and failures are never retried.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::download::YtDlp;
use crate::error::DownloadError;
use crate::pool::WorkerPool;
use crate::store::{SharedCookieStore, UserId};

/// Caption attached to every delivered video.
pub const VIDEO_CAPTION: &str = "Here is your video!";

/// Where finished downloads are handed off to. The Telegram adapter
/// implements this bound to the requesting chat; tests use doubles.
#[async_trait]
pub trait MediaSink: Send + Sync {
    async fn send_video(&self, path: &Path, caption: &str) -> anyhow::Result<()>;
}

pub struct Orchestrator {
    store: SharedCookieStore,
    ytdlp: YtDlp,
    pool: WorkerPool,
    downloads_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        store: SharedCookieStore,
        ytdlp: YtDlp,
        pool: WorkerPool,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            ytdlp,
            pool,
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Run one download job for `user`. The cookie check happens before
    /// anything is spawned, so a user without cookies never costs a
    /// subprocess.
    pub async fn run(
        &self,
        user: UserId,
        url: &str,
        sink: &dyn MediaSink,
    ) -> Result<(), DownloadError> {
        let cookies = self
            .store
            .lookup(user)
            .filter(|path| path.exists())
            .ok_or(DownloadError::NoCredentials)?;

        let template = self
            .downloads_dir
            .join("%(title)s_%(id)s.%(ext)s")
            .to_string_lossy()
            .into_owned();

        let tool = self.ytdlp.clone();
        let job_url = url.to_string();
        let handle = self
            .pool
            .spawn(async move { tool.run(&cookies, &template, &job_url).await });
        let path = handle.await??;

        if !path.exists() {
            warn!(
                "yt-dlp reported {} but the file does not exist",
                path.display()
            );
            return Err(DownloadError::MissingOutput);
        }

        let sent = sink.send_video(&path, VIDEO_CAPTION).await;

        // The local copy goes away whether or not the upload worked; a
        // failed delete is logged and swallowed.
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Deleted file: {}", path.display()),
            Err(e) => warn!("Error deleting file {}: {}", path.display(), e),
        }

        sent.map_err(DownloadError::Transmit)
    }
}
