//! Telegram update handlers.
//!
//! Each handler decodes a Telegram update into a transport-agnostic
//! [`InboundAction`](sleepbot_core::messaging::types::InboundAction) and hands
//! it to the tracker. Nothing here touches session state directly.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, User},
};

use sleepbot_core::domain::{Actor, UserId};

use crate::router::AppState;

mod callback;
mod commands;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
    }
    Ok(())
}

/// Display name for logs: full name, plus `@username` when set.
pub(crate) fn actor_from(user: &User) -> Actor {
    let id = UserId(user.id.0 as i64);
    let name = match &user.username {
        Some(username) => format!("{} (@{username})", user.full_name()),
        None => user.full_name(),
    };
    Actor::new(id, name)
}
