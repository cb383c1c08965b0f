//! Telegram adapter (teloxide).
//!
//! This crate implements the `sleepbot-core` Notifier over the Telegram Bot API
//! and turns Telegram updates into inbound tracker actions.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use sleepbot_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::Notifier,
        types::{InlineKeyboard, Menu, ReplyContext},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    /// Forum topic for new messages; `None` posts to the main chat.
    topic_id: Option<i32>,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, topic_id: Option<i32>) -> Self {
        Self { bot, topic_id }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        tracing::debug!("telegram asked to retry after {d:?}");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }

    async fn send_new(&self, chat_id: ChatId, text: &str, menu: Option<Menu>) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_message(Self::tg_chat(chat_id), text.to_string());
                if let Some(thread) = self.topic_id {
                    req = req.message_thread_id(thread);
                }
                if let Some(menu) = menu {
                    req = req.reply_markup(markup(menu.keyboard()));
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}

/// One button per row.
pub fn markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .buttons
        .into_iter()
        .map(|b| vec![InlineKeyboardButton::callback(b.label, b.callback_data)])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn reply(&self, ctx: ReplyContext, text: &str, menu: Option<Menu>) -> Result<()> {
        let Some(msg) = ctx.message else {
            self.send_new(ctx.chat_id, text, menu).await?;
            return Ok(());
        };

        self.with_retry(|| {
            let req = self.bot.edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                text.to_string(),
            );
            // Editing without markup drops the buttons.
            match menu {
                Some(menu) => req.reply_markup(markup(menu.keyboard())),
                None => req,
            }
        })
        .await?;
        Ok(())
    }

    async fn announce(&self, chat_id: ChatId, text: &str, menu: Menu) -> Result<MessageRef> {
        self.send_new(chat_id, text, Some(menu)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_menu_is_one_button_per_row() {
        let m = markup(Menu::Sleep.keyboard());
        assert_eq!(m.inline_keyboard.len(), 2);
        assert!(m.inline_keyboard.iter().all(|row| row.len() == 1));
        assert_eq!(m.inline_keyboard[0][0].text, "🛑 Stop sleep");
    }
}
