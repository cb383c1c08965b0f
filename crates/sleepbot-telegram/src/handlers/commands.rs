use std::sync::Arc;

use teloxide::prelude::*;

use sleepbot_core::{
    domain::{Actor, ChatId},
    messaging::types::{Action, InboundAction, ReplyContext},
};

use crate::{handlers::actor_from, router::AppState};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

#[derive(Debug, PartialEq, Eq)]
enum Routed {
    Welcome,
    Action(Action),
    Ignored,
}

fn route(cmd: &str) -> Routed {
    if cmd == "start" {
        return Routed::Welcome;
    }
    match Action::from_command(cmd) {
        Some(action) => Routed::Action(action),
        None => Routed::Ignored,
    }
}

fn inbound_from_command(actor: Actor, action: Action, chat_id: i64) -> InboundAction {
    InboundAction {
        actor,
        action,
        // Nothing to edit: the reply is posted as a new message.
        reply: ReplyContext {
            chat_id: ChatId(chat_id),
            message: None,
        },
    }
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let (cmd, _args) = parse_command(text);
    let actor = actor_from(user);
    let chat_id = msg.chat.id.0;

    match route(&cmd) {
        Routed::Welcome => state.tracker.welcome(&actor, ChatId(chat_id)).await,
        Routed::Action(action) => {
            state
                .tracker
                .handle(inbound_from_command(actor, action, chat_id))
                .await;
        }
        Routed::Ignored => {
            tracing::debug!(user_id = %actor.id, "ignoring command /{cmd}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use sleepbot_core::domain::UserId;

    use super::*;

    #[test]
    fn parses_bot_suffix_and_args() {
        assert_eq!(
            parse_command("/Sleep@sleep_tracker_bot now"),
            ("sleep".to_string(), "now".to_string())
        );
        assert_eq!(parse_command("/start"), ("start".to_string(), String::new()));
    }

    #[test]
    fn routes_commands() {
        assert_eq!(route("start"), Routed::Welcome);
        assert_eq!(route("sleep"), Routed::Action(Action::Start));
        assert_eq!(route("wake"), Routed::Action(Action::Stop));
        assert_eq!(route("cancel"), Routed::Action(Action::Cancel));
        assert_eq!(route("usage"), Routed::Ignored);
    }

    #[test]
    fn command_replies_are_new_messages() {
        let ev = inbound_from_command(Actor::new(UserId(1), "Ann"), Action::Start, -5);
        assert_eq!(ev.reply.chat_id, ChatId(-5));
        assert!(ev.reply.message.is_none());
    }
}
