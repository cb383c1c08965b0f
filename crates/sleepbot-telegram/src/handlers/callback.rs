use std::sync::Arc;

use teloxide::prelude::*;

use sleepbot_core::{
    domain::{Actor, ChatId, MessageId, MessageRef},
    messaging::types::{Action, InboundAction, ReplyContext},
};

use crate::{handlers::actor_from, router::AppState};

/// Decode a button press. `None` for foreign callback data.
fn inbound_from_callback(
    actor: Actor,
    data: &str,
    chat_id: i64,
    message_id: i32,
) -> Option<InboundAction> {
    let action = Action::from_callback_data(data)?;
    let chat_id = ChatId(chat_id);
    Some(InboundAction {
        actor,
        action,
        reply: ReplyContext {
            chat_id,
            message: Some(MessageRef {
                chat_id,
                message_id: MessageId(message_id),
            }),
        },
    })
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    // Always answer so the client stops its spinner; duplicates are harmless.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        tracing::debug!("answer_callback_query failed: {e}");
    }

    let data = q.data.as_deref().unwrap_or_default();
    let Some(msg) = q.message.as_ref() else {
        return Ok(());
    };

    let actor = actor_from(&q.from);
    let Some(event) = inbound_from_callback(actor, data, msg.chat.id.0, msg.id.0) else {
        tracing::debug!(user_id = q.from.id.0, "ignoring callback data {data:?}");
        return Ok(());
    };

    state.tracker.handle(event).await;
    Ok(())
}
