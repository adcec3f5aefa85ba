use anyhow::Result;
use tracing::{info, warn};

use super::{FlowContext, FILE_NOT_FOUND, GREETING, JOIN_PROMPT};
use crate::gateway::ChatRef;
use crate::links::FileRef;

/// `/start [<file>]`: greet, challenge a non-member, or deliver the file.
pub async fn run(ctx: &FlowContext, sender: i64, argument: Option<&str>) -> Result<()> {
    let user_chat = ChatRef::Id(sender);

    let Some(argument) = argument else {
        ctx.gateway.send_message(&user_chat, GREETING, None).await?;
        return Ok(());
    };

    let file: FileRef = match argument.parse() {
        Ok(file) => file,
        Err(e) => {
            warn!("User {} sent a bad start argument: {}", sender, e);
            ctx.gateway
                .send_message(&user_chat, FILE_NOT_FOUND, None)
                .await?;
            return Ok(());
        }
    };

    if !ctx.is_member(sender).await {
        info!("User {} has not joined, sending challenge for file {}", sender, file);
        let keyboard = ctx.challenge_keyboard(file);
        ctx.gateway
            .send_message(&user_chat, JOIN_PROMPT, Some(&keyboard))
            .await?;
        return Ok(());
    }

    ctx.deliver(sender, file).await
}
