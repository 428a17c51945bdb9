//! yt-dlp subprocess contract.
//!
//! One invocation shape: cookies file and output template in, final file
//! path out on stdout. The tool resolves the template placeholders and
//! picks the container; this module only interprets exit status and the
//! captured streams. No timeout and no retries.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command as TokioCommand;
use tracing::{info, warn};

use crate::error::DownloadError;

/// Handle to the external downloader binary.
#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: PathBuf,
}

impl YtDlp {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Check that the binary runs, returning its version string.
    pub fn probe(&self) -> Option<String> {
        let output = std::process::Command::new(&self.bin)
            .arg("--version")
            .output()
            .ok()?;
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            None
        }
    }

    /// Download `url` authenticating with `cookies`, letting the tool place
    /// the file per `output_template`. Returns the final path the tool
    /// printed after moving the file into place.
    pub async fn run(
        &self,
        cookies: &Path,
        output_template: &str,
        url: &str,
    ) -> Result<PathBuf, DownloadError> {
        info!("Downloading {} with cookies {}", url, cookies.display());

        let result = TokioCommand::new(&self.bin)
            .arg("--cookies")
            .arg(cookies)
            .args(["-o", output_template, "--print", "after_move:filepath", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                // Trailing blank lines do not count as output.
                let final_path = stdout
                    .lines()
                    .rev()
                    .find(|line| !line.trim().is_empty())
                    .map(str::trim)
                    .unwrap_or("");

                if final_path.is_empty() {
                    warn!("yt-dlp exited cleanly but printed no output path");
                    return Err(DownloadError::MissingOutput);
                }

                info!("Download complete: {}", final_path);
                Ok(PathBuf::from(final_path))
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                warn!("yt-dlp failed: {}", stderr);
                Err(DownloadError::Tool { stderr })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DownloadError::ToolNotFound)
            }
            Err(e) => Err(DownloadError::Io(e)),
        }
    }
}
