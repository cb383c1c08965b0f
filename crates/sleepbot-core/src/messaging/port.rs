use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{Menu, ReplyContext},
    Result,
};

/// Outbound side of the bot.
///
/// The tracker only ever needs these two operations. Failures are reported but
/// the tracker treats them as best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Replace the message the user interacted with (or send a new one when
    /// there is nothing to edit). `None` leaves the message without buttons.
    async fn reply(&self, ctx: ReplyContext, text: &str, menu: Option<Menu>) -> Result<()>;

    /// Send a fresh message into the chat's destination thread.
    async fn announce(&self, chat_id: ChatId, text: &str, menu: Menu) -> Result<MessageRef>;
}
