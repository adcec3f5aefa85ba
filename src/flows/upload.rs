use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{FlowContext, ADMINS_ONLY, UPLOAD_ERROR};
use crate::gateway::ChatRef;
use crate::links::{self, FileRef};

/// Media from an administrator: store it and reply with a share link.
pub async fn run(
    ctx: &FlowContext,
    sender: i64,
    chat_id: i64,
    message_id: i32,
) -> Result<()> {
    let user_chat = ChatRef::Id(sender);

    if !ctx.admins.contains(&sender) {
        info!("Rejected upload from non-admin user {}", sender);
        ctx.gateway
            .send_message(&user_chat, ADMINS_ONLY, None)
            .await?;
        return Ok(());
    }

    match store(ctx, chat_id, message_id).await {
        Ok(link) => {
            info!("User {} uploaded a file: {}", sender, link);
            let text = format!("📥 <b>Shareable Link:</b>\n{}", link);
            ctx.gateway.send_message(&user_chat, &text, None).await?;
        }
        Err(e) => {
            warn!("Upload from user {} failed: {:#}", sender, e);
            ctx.gateway
                .send_message(&user_chat, UPLOAD_ERROR, None)
                .await?;
        }
    }

    Ok(())
}

/// Copy into the storage channel and mint the share link for the copy.
async fn store(ctx: &FlowContext, chat_id: i64, message_id: i32) -> Result<String> {
    let stored = ctx
        .gateway
        .copy_message(&ChatRef::Id(chat_id), message_id, &ctx.storage_channel)
        .await
        .context("Failed to copy into the storage channel")?;

    let me = ctx.gateway.get_me().await.context("Failed to fetch bot identity")?;
    let username = me.username.context("Bot has no username")?;

    Ok(links::share_link(&ctx.link_base, &username, FileRef(stored)))
}
