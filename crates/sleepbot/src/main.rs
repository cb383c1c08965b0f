use std::sync::Arc;

use sleepbot_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), sleepbot_core::Error> {
    sleepbot_core::logging::init("sleepbot")?;

    let cfg = Arc::new(Config::load()?);

    sleepbot_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| sleepbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    tracing::info!("sleepbot stopped");
    Ok(())
}
