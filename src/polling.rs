//! Long-polling transport. teloxide's `Polling` listener feeds updates
//! through the same router the webhook uses.

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use teloxide::update_listeners::Polling;
use tracing::{info, warn};

use crate::router::{Ack, UpdateRouter};

const POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Run one update through the router. Failures are logged; polling mode has
/// no redelivery.
async fn handle_update(update: Update, router: Arc<UpdateRouter>) -> ResponseResult<()> {
    if router.dispatch(&update).await == Ack::Failed {
        warn!("Update {} failed; not redelivered in polling mode", update.id.0);
    }
    Ok(())
}

pub async fn run(bot: Bot, router: Arc<UpdateRouter>) -> anyhow::Result<()> {
    info!("Polling for updates...");

    let listener = Polling::builder(bot.clone())
        .timeout(POLL_TIMEOUT)
        .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
        .build();

    Dispatcher::builder(bot, dptree::endpoint(handle_update))
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    info!("Stopped polling");
    Ok(())
}
