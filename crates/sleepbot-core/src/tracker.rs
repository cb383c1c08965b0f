//! Per-user sleep tracking state machine.
//!
//! ```text
//! Idle --start--> Tracking --stop/cancel--> Idle
//!                 Tracking --start--> Tracking (start time overwritten)
//! Idle --stop/cancel--> Idle
//! ```
//!
//! [`apply`] is the transition table and knows nothing about transports.
//! [`SleepTracker`] wraps it with the per-user lock, logging and notifications.

use std::{fmt, sync::Arc};

use chrono::DateTime;
use chrono_tz::Tz;

use crate::{
    clock::Clock,
    domain::{Actor, ChatId},
    formatting,
    messaging::{
        port::Notifier,
        types::{Action, InboundAction, Menu, ReplyContext},
    },
    session::{SleepSession, SleepSummary},
    store::{SessionGuard, SessionStore},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    Idle,
    Tracking,
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackState::Idle => f.write_str("idle"),
            TrackState::Tracking => f.write_str("tracking"),
        }
    }
}

/// Result of one transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Tracking (re)started. `displaced` is a prior session that was overwritten.
    Started {
        start_time: DateTime<Tz>,
        displaced: Option<SleepSession>,
    },
    /// `stop` while idle.
    NotTracking,
    Finished(SleepSummary),
    /// `cancel`, whether or not anything was being tracked.
    Canceled { discarded: Option<SleepSession> },
}

impl Outcome {
    pub fn state(&self) -> TrackState {
        match self {
            Outcome::Started { .. } => TrackState::Tracking,
            Outcome::NotTracking | Outcome::Finished(_) | Outcome::Canceled { .. } => {
                TrackState::Idle
            }
        }
    }
}

/// A message the tracker wants delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Reply { text: String, menu: Option<Menu> },
    Announce { text: String, menu: Menu },
}

/// Transition table. Mutates the guarded slot and returns what happened.
pub fn apply(guard: &mut SessionGuard, action: Action, now: DateTime<Tz>) -> Outcome {
    match action {
        Action::Start => Outcome::Started {
            start_time: now,
            displaced: guard.begin(now),
        },
        Action::Stop => match guard.end() {
            Some(session) => Outcome::Finished(session.finish(now)),
            None => Outcome::NotTracking,
        },
        Action::Cancel => Outcome::Canceled {
            discarded: guard.cancel(),
        },
    }
}

/// Messages to send for an outcome, in order.
pub fn notices(outcome: &Outcome) -> Vec<Notice> {
    match outcome {
        Outcome::Started { start_time, .. } => vec![Notice::Reply {
            text: formatting::started(start_time),
            menu: Some(Menu::Sleep),
        }],
        Outcome::NotTracking => vec![Notice::Reply {
            text: formatting::NOT_STARTED.to_string(),
            menu: Some(Menu::Main),
        }],
        Outcome::Finished(summary) => vec![
            Notice::Reply {
                text: formatting::summary(summary),
                menu: None,
            },
            Notice::Announce {
                text: formatting::NEXT_NAP.to_string(),
                menu: Menu::Main,
            },
        ],
        Outcome::Canceled { .. } => vec![Notice::Reply {
            text: formatting::CANCELED.to_string(),
            menu: Some(Menu::Main),
        }],
    }
}

/// Drives the state machine for inbound actions.
pub struct SleepTracker {
    store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl SleepTracker {
    pub fn new(store: Arc<SessionStore>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Handle one inbound action.
    ///
    /// The user's slot stays locked until every notice has been attempted, so
    /// duplicate deliveries for the same user are processed one after another.
    /// Notification failures are logged and never undo the store change.
    pub async fn handle(&self, event: InboundAction) -> Outcome {
        let InboundAction {
            actor,
            action,
            reply,
        } = event;

        let mut guard = self.store.lock_user(actor.id).await;
        let now = self.clock.now();
        let outcome = apply(&mut guard, action, now);
        log_transition(&actor, action, &outcome);

        for notice in notices(&outcome) {
            self.deliver(&actor, reply, notice).await;
        }
        drop(guard);

        outcome
    }

    /// `/start`: greet and offer the start button. Does not touch the store.
    pub async fn welcome(&self, actor: &Actor, chat_id: ChatId) {
        tracing::info!(user_id = %actor.id, user = %actor.display_name, "welcome");
        let notice = Notice::Announce {
            text: formatting::WELCOME.to_string(),
            menu: Menu::Main,
        };
        self.deliver(
            actor,
            ReplyContext {
                chat_id,
                message: None,
            },
            notice,
        )
        .await;
    }

    async fn deliver(&self, actor: &Actor, ctx: ReplyContext, notice: Notice) {
        let res = match notice {
            Notice::Reply { text, menu } => self.notifier.reply(ctx, &text, menu).await,
            Notice::Announce { text, menu } => self
                .notifier
                .announce(ctx.chat_id, &text, menu)
                .await
                .map(|_| ()),
        };
        if let Err(e) = res {
            tracing::warn!(user_id = %actor.id, user = %actor.display_name, "notification failed: {e}");
        }
    }
}

fn log_transition(actor: &Actor, action: Action, outcome: &Outcome) {
    let state = outcome.state();
    match outcome {
        Outcome::Started {
            start_time,
            displaced: Some(prev),
        } => tracing::info!(
            user_id = %actor.id,
            user = %actor.display_name,
            %action,
            %state,
            start = %start_time,
            replaced_start = %prev.start_time,
            "tracking restarted; previous session discarded"
        ),
        Outcome::Started { start_time, .. } => tracing::info!(
            user_id = %actor.id,
            user = %actor.display_name,
            %action,
            %state,
            start = %start_time,
            "tracking started"
        ),
        Outcome::Finished(summary) => {
            if summary.duration.clock_skew {
                tracing::warn!(
                    user_id = %actor.id,
                    start = %summary.start_time,
                    end = %summary.end_time,
                    "end time before start time; duration clamped to zero"
                );
            }
            tracing::info!(
                user_id = %actor.id,
                user = %actor.display_name,
                %action,
                %state,
                category = summary.category.label(),
                hours = summary.duration.hours,
                minutes = summary.duration.minutes,
                "tracking finished"
            )
        }
        Outcome::NotTracking => tracing::info!(
            user_id = %actor.id,
            user = %actor.display_name,
            %action,
            %state,
            "stop while idle"
        ),
        Outcome::Canceled { discarded } => tracing::info!(
            user_id = %actor.id,
            user = %actor.display_name,
            %action,
            %state,
            discarded = discarded.is_some(),
            "tracking canceled"
        ),
    }
}
