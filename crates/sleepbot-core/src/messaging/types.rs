use std::fmt;

use crate::domain::{Actor, ChatId, MessageRef};

/// What the user asked the tracker to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    Stop,
    Cancel,
}

impl Action {
    /// Callback data carried by the inline buttons.
    pub fn callback_data(self) -> &'static str {
        match self {
            Action::Start => "start_sleep",
            Action::Stop => "stop_sleep",
            Action::Cancel => "cancel_sleep",
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data.trim() {
            "start_sleep" => Some(Action::Start),
            "stop_sleep" => Some(Action::Stop),
            "cancel_sleep" => Some(Action::Cancel),
            _ => None,
        }
    }

    /// Slash-command aliases (`/sleep`, `/wake`, `/cancel`).
    pub fn from_command(name: &str) -> Option<Self> {
        match name {
            "sleep" => Some(Action::Start),
            "wake" => Some(Action::Stop),
            "cancel" => Some(Action::Cancel),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// The two fixed button layouts the bot offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Menu {
    /// Single "start sleep" button.
    Main,
    /// "Stop sleep" and "Cancel".
    Sleep,
}

impl Menu {
    pub fn keyboard(self) -> InlineKeyboard {
        let buttons = match self {
            Menu::Main => vec![InlineButton::new("😴 Start sleep", Action::Start)],
            Menu::Sleep => vec![
                InlineButton::new("🛑 Stop sleep", Action::Stop),
                InlineButton::new("❌ Cancel", Action::Cancel),
            ],
        };
        InlineKeyboard::new(buttons)
    }
}

/// Inline keyboard, one button per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: &str, action: Action) -> Self {
        Self {
            label: label.to_string(),
            callback_data: action.callback_data().to_string(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }
}

/// Where a reply to an inbound action should land.
///
/// `message` is the bot message the user pressed a button on. Commands have
/// none, in which case the reply is sent as a new message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyContext {
    pub chat_id: ChatId,
    pub message: Option<MessageRef>,
}

/// Transport-agnostic inbound event. Delivered at least once.
#[derive(Clone, Debug)]
pub struct InboundAction {
    pub actor: Actor,
    pub action: Action,
    pub reply: ReplyContext,
}
