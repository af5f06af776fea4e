use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{info, warn};

use common::{Error, Notifier, Result, ScanResult, ScanStrategy};

/// Sends scan summaries to a single Telegram chat.
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        match self.bot.send_message(self.chat_id, text).await {
            Ok(_) => {
                info!(chat_id = ?self.chat_id, "Telegram report sent");
                Ok(())
            }
            Err(e) => {
                warn!(chat_id = ?self.chat_id, error = %e, "Failed to send Telegram report");
                Err(Error::Notify(e.to_string()))
            }
        }
    }
}

/// Plain-text summary of a scan: headline, match count and the top row.
/// `None` for an empty result; there is nothing to report.
pub fn report_message(result: &ScanResult) -> Option<String> {
    let top = result.top()?;
    let headline = match result.strategy {
        ScanStrategy::Golden => "🚀 Golden Stocks Report",
        ScanStrategy::Bottom => "⚓ Bottom Fish Report",
    };
    Some(format!(
        "{headline}\nFound {} Stocks.\nTop: {}",
        result.len(),
        top.symbol
    ))
}
