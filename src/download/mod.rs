//! External downloader integration.

mod ytdlp;

pub use ytdlp::YtDlp;
