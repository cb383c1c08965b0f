use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use sleepbot_core::{
    clock::SystemClock,
    config::Config,
    messaging::{port::Notifier, throttled::ThrottledNotifier},
    store::SessionStore,
    tracker::SleepTracker,
};

use crate::handlers;
use crate::TelegramNotifier;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<SleepTracker>,
}

/// Wire the Telegram notifier into a tracker.
///
/// Outbound calls go through a throttling decorator to reduce 429s; the
/// adapter still retries once on `RetryAfter`.
pub fn build_tracker(cfg: &Config, bot: Bot, store: Arc<SessionStore>) -> Arc<SleepTracker> {
    let raw: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(bot, cfg.topic_id));
    let notifier: Arc<dyn Notifier> = Arc::new(ThrottledNotifier::new(raw, cfg.throttle));
    let clock = Arc::new(SystemClock::new(cfg.timezone));
    Arc::new(SleepTracker::new(store, clock, notifier))
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!("sleepbot started: @{}", me.username()),
        Err(e) => tracing::warn!("get_me failed: {e}"),
    }
    tracing::info!(
        timezone = %cfg.timezone,
        topic_id = ?cfg.topic_id,
        "sleep tracker ready"
    );

    let tracker = build_tracker(&cfg, bot.clone(), Arc::new(SessionStore::new()));
    let state = Arc::new(AppState { tracker });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
