use anyhow::Result;
use tracing::{debug, info, warn};

use super::{FlowContext, FILE_NOT_FOUND, JOIN_PROMPT, STILL_NOT_JOINED, VERIFIED};
use crate::gateway::ChatRef;
use crate::links::{self, PayloadError};
use crate::update::PromptRef;

/// Retry button: re-check membership and either re-challenge in place or
/// deliver the file.
pub async fn run(
    ctx: &FlowContext,
    sender: i64,
    data: &str,
    prompt: Option<PromptRef>,
) -> Result<()> {
    let user_chat = ChatRef::Id(sender);

    let file = match links::parse_retry_payload(data) {
        Ok(file) => file,
        Err(PayloadError::NotRetry) => {
            debug!("Ignoring callback payload {:?} from user {}", data, sender);
            return Ok(());
        }
        Err(e) => {
            warn!("User {} sent a bad retry payload: {}", sender, e);
            ctx.gateway
                .send_message(&user_chat, FILE_NOT_FOUND, None)
                .await?;
            return Ok(());
        }
    };

    if !ctx.is_member(sender).await {
        info!("User {} still has not joined (file {})", sender, file);
        let keyboard = ctx.challenge_keyboard(file);
        match prompt {
            Some(prompt) => {
                // A second click on an unchanged prompt is rejected as "not modified".
                if let Err(e) = ctx
                    .gateway
                    .edit_message(
                        &ChatRef::Id(prompt.chat_id),
                        prompt.message_id,
                        STILL_NOT_JOINED,
                        Some(&keyboard),
                    )
                    .await
                {
                    warn!("Could not update join prompt for user {}: {:#}", sender, e);
                }
            }
            None => {
                ctx.gateway
                    .send_message(&user_chat, JOIN_PROMPT, Some(&keyboard))
                    .await?;
            }
        }
        return Ok(());
    }

    if let Some(prompt) = prompt {
        if let Err(e) = ctx
            .gateway
            .edit_message(
                &ChatRef::Id(prompt.chat_id),
                prompt.message_id,
                VERIFIED,
                None,
            )
            .await
        {
            warn!("Could not mark prompt verified for user {}: {:#}", sender, e);
        }
    }

    ctx.deliver(sender, file).await
}
