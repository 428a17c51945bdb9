//! Telegram front-end.
//!
//! Wires the bot commands to the cookie store and the download
//! orchestrator. Commands usually arrive as message text, but an upload
//! carries its command in the document's caption, so dispatching branches
//! on both. A command that mentions a different bot is ignored.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Me};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::error::DownloadError;
use crate::orchestrator::{MediaSink, Orchestrator};
use crate::store::{CookieStore, SharedCookieStore, UserId};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

const WELCOME: &str = "Welcome to the video downloader bot!\n\n\
    1. Upload your cookies file with /setcookies (attach the file).\n\
    2. Send /download <video URL> and the video comes back here.";

const COOKIES_SAVED: &str =
    "Cookies file saved successfully. You can now use /download <video URL>.";

const COOKIES_NUDGE: &str =
    "Please attach your cookies file (plain text) with the /setcookies command.";

const DOWNLOAD_USAGE: &str = "Usage: /download <video URL>";

const DOWNLOAD_STARTED: &str = "Starting download... This may take a few minutes.";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    #[command(description = "show how to use the bot")]
    Start,
    #[command(description = "store the attached cookies file")]
    SetCookies,
    #[command(description = "download a video")]
    Download(String),
}

/// Transport credentials, passed in explicitly by the caller.
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
}

/// Media sink bound to the chat that asked for the download.
struct ChatSink {
    bot: Bot,
    chat: ChatId,
}

#[async_trait]
impl MediaSink for ChatSink {
    async fn send_video(&self, path: &Path, caption: &str) -> anyhow::Result<()> {
        self.bot
            .send_video(self.chat, InputFile::file(path.to_path_buf()))
            .caption(caption.to_string())
            .await?;
        Ok(())
    }
}

/// Run the bot until shutdown. This is the only transport entry point.
pub async fn run(config: BotConfig, store: SharedCookieStore, orchestrator: Arc<Orchestrator>) {
    let bot = Bot::new(config.token);

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(on_command),
        )
        .branch(
            dptree::filter(|msg: Message, me: Me| {
                msg.document().is_some()
                    && msg
                        .caption()
                        .map_or(false, |c| command_token(c, me.username()) == Some("/setcookies"))
            })
            .endpoint(on_cookies_upload),
        )
        .branch(
            dptree::filter(|msg: Message, me: Me| {
                msg.text()
                    .map_or(false, |t| command_token(t, me.username()) == Some("/download"))
            })
            .endpoint(on_download_usage),
        );

    info!("Bot dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![store, orchestrator])
        .default_handler(|update| async move {
            debug!("Unhandled update: {:?}", update);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in the update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// First whitespace-separated token with any `@BotName` suffix stripped.
/// A mention naming a different bot means the command is not ours.
fn command_token<'a>(text: &'a str, bot_username: &str) -> Option<&'a str> {
    let first = text.split_whitespace().next()?;
    match first.split_once('@') {
        Some((cmd, mention)) if mention.eq_ignore_ascii_case(bot_username) => Some(cmd),
        Some(_) => None,
        None => Some(first),
    }
}

/// First reply to a well-formed /download request. A user without a usable
/// cookies file gets the refusal alone, never a started notice first.
fn opening_reply(store: &CookieStore, user: UserId) -> Result<&'static str, DownloadError> {
    store
        .lookup(user)
        .filter(|path| path.exists())
        .map(|_| DOWNLOAD_STARTED)
        .ok_or(DownloadError::NoCredentials)
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    store: SharedCookieStore,
    orchestrator: Arc<Orchestrator>,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, WELCOME).await?;
        }
        Command::SetCookies => {
            // A text command cannot carry an attachment; the upload itself
            // arrives as a document with the command in the caption.
            bot.send_message(msg.chat.id, COOKIES_NUDGE).await?;
        }
        Command::Download(url) => {
            let url = url.trim();
            if url.is_empty() {
                bot.send_message(msg.chat.id, DOWNLOAD_USAGE).await?;
            } else {
                run_download(&bot, &msg, &store, &orchestrator, url).await?;
            }
        }
    }
    Ok(())
}

/// Document upload whose caption is /setcookies.
async fn on_cookies_upload(bot: Bot, msg: Message, store: SharedCookieStore) -> HandlerResult {
    let user = match msg.from() {
        Some(user) => UserId(user.id.0),
        None => return Ok(()),
    };
    let doc = match msg.document() {
        Some(doc) => doc,
        None => return Ok(()),
    };

    let file = bot.get_file(doc.file.id.clone()).await?;
    let mut buf: Vec<u8> = Vec::new();
    bot.download_file(&file.path, &mut buf).await?;

    store.save(user, &buf).await?;
    bot.send_message(msg.chat.id, COOKIES_SAVED).await?;
    Ok(())
}

/// Text `/download` lines the command parser rejected.
async fn on_download_usage(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, DOWNLOAD_USAGE).await?;
    Ok(())
}

async fn run_download(
    bot: &Bot,
    msg: &Message,
    store: &CookieStore,
    orchestrator: &Orchestrator,
    url: &str,
) -> HandlerResult {
    let user = match msg.from() {
        Some(user) => UserId(user.id.0),
        None => return Ok(()),
    };

    // The job re-resolves credentials when it runs; this early check only
    // decides the first reply.
    let notice = match opening_reply(store, user) {
        Ok(notice) => notice,
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            return Ok(());
        }
    };
    bot.send_message(msg.chat.id, notice).await?;

    let sink = ChatSink {
        bot: bot.clone(),
        chat: msg.chat.id,
    };
    match orchestrator.run(user, url, &sink).await {
        Ok(()) => info!("Delivered video to user {}", user),
        Err(err) => {
            warn!("Download for user {} failed: {}", user, err);
            bot.send_message(msg.chat.id, err.to_string()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_with_url() {
        let cmd = Command::parse("/download https://example.com/watch?v=1", "testbot").unwrap();
        match cmd {
            Command::Download(url) => assert_eq!(url, "https://example.com/watch?v=1"),
            _ => panic!("expected Download"),
        }
    }

    #[test]
    fn test_parse_setcookies() {
        let cmd = Command::parse("/setcookies", "testbot").unwrap();
        assert!(matches!(cmd, Command::SetCookies));
    }

    #[test]
    fn test_parse_start() {
        let cmd = Command::parse("/start", "testbot").unwrap();
        assert!(matches!(cmd, Command::Start));
    }

    #[test]
    fn test_command_token_strips_mention_and_args() {
        assert_eq!(command_token("/setcookies", "testbot"), Some("/setcookies"));
        assert_eq!(command_token("/setcookies@testbot", "testbot"), Some("/setcookies"));
        assert_eq!(command_token("/setcookies@TestBot", "testbot"), Some("/setcookies"));
        assert_eq!(command_token("/setcookies please", "testbot"), Some("/setcookies"));
        assert_eq!(
            command_token("/download https://example.com", "testbot"),
            Some("/download")
        );
        assert_eq!(command_token("  ", "testbot"), None);
    }

    #[test]
    fn test_command_token_ignores_other_bots() {
        assert_eq!(command_token("/setcookies@otherbot", "testbot"), None);
        assert_eq!(
            command_token("/download@otherbot https://example.com", "testbot"),
            None
        );
    }

    #[test]
    fn test_opening_reply_refuses_without_cookies() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CookieStore::new(tmp.path());
        let first = opening_reply(&store, UserId(9));
        assert!(matches!(first, Err(DownloadError::NoCredentials)));
    }

    #[tokio::test]
    async fn test_opening_reply_starts_once_cookies_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CookieStore::new(tmp.path());
        store.save(UserId(9), b"# Netscape HTTP Cookie File").await.unwrap();
        assert_eq!(opening_reply(&store, UserId(9)).unwrap(), DOWNLOAD_STARTED);
    }

    #[tokio::test]
    async fn test_opening_reply_refuses_when_cookie_file_is_gone() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CookieStore::new(tmp.path());
        let path = store.save(UserId(9), b"stale").await.unwrap();
        std::fs::remove_file(&path).unwrap();
        let first = opening_reply(&store, UserId(9));
        assert!(matches!(first, Err(DownloadError::NoCredentials)));
    }
}
