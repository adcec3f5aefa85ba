use teloxide::types::Update;
use tracing::{debug, error, warn};

use crate::flows::{self, FlowContext};
use crate::update::{self, Inbound};

/// Terminal acknowledgement for one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Ok,
    Failed,
}

/// Classifies updates and runs exactly one flow per update.
pub struct UpdateRouter {
    ctx: FlowContext,
}

impl UpdateRouter {
    pub fn new(ctx: FlowContext) -> Self {
        Self { ctx }
    }

    pub async fn dispatch(&self, update: &Update) -> Ack {
        let inbound = update::classify(update);
        debug!("Update {} classified as {:?}", update.id.0, inbound);

        let result = match inbound {
            Inbound::Start { sender, argument } => {
                flows::access::run(&self.ctx, sender, argument.as_deref()).await
            }
            Inbound::Callback {
                query_id,
                sender,
                data,
                prompt,
            } => {
                let result = flows::retry::run(&self.ctx, sender, &data, prompt).await;
                if let Err(e) = self.ctx.gateway.answer_callback(&query_id).await {
                    warn!("Failed to answer callback {}: {:#}", query_id, e);
                }
                result
            }
            Inbound::Media {
                sender,
                chat_id,
                message_id,
            } => flows::upload::run(&self.ctx, sender, chat_id, message_id).await,
            Inbound::Ignored => Ok(()),
        };

        match result {
            Ok(()) => Ack::Ok,
            Err(e) => {
                error!("Error handling update {}: {:#}", update.id.0, e);
                Ack::Failed
            }
        }
    }
}
