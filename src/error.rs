//! Download job failures.
//!
//! Every variant is terminal for the job that raised it and never fatal to
//! the process. `Display` renders the text sent back to the requesting chat,
//! so the wording here is user-facing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The user never uploaded cookies, or the stored file is gone.
    #[error("No cookies file found. Please use /setcookies first.")]
    NoCredentials,

    /// The downloader exited with a non-zero status. `stderr` carries the
    /// tool's own diagnostics verbatim.
    #[error("Download failed: {stderr}")]
    Tool { stderr: String },

    /// The downloader exited cleanly but the reported file is not on disk.
    #[error("Download completed, but the file was not found.")]
    MissingOutput,

    /// The downloader binary could not be spawned at all.
    #[error("yt-dlp not found. Install with: pip install yt-dlp")]
    ToolNotFound,

    #[error("Could not run the downloader: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Could not send the video: {0}")]
    Transmit(anyhow::Error),
}
