pub mod access;
pub mod retry;
pub mod upload;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

use crate::config::Config;
use crate::gateway::{ChatRef, Gateway};
use crate::links::{self, FileRef};

pub const GREETING: &str = "🟢 Bot Online!\nSend any media to generate a shareable link.";
pub const JOIN_PROMPT: &str =
    "You must join our channel to access this file.\n\nJoin the channel and click Retry.";
pub const STILL_NOT_JOINED: &str =
    "You still haven't joined the channel. Please join first and then click Retry.";
pub const VERIFIED: &str = "✅ Verification successful! Sending file...";
pub const FILE_NOT_FOUND: &str = "❌ File not found!";
pub const ADMINS_ONLY: &str = "❌ Sorry! Only admins can upload files.";
pub const UPLOAD_ERROR: &str = "❌ Error uploading file!";

/// Everything a flow needs. Built once at startup, read-only afterwards.
pub struct FlowContext {
    pub gateway: Arc<dyn Gateway>,
    pub storage_channel: ChatRef,
    pub gate_channel: ChatRef,
    pub join_url: reqwest::Url,
    pub link_base: String,
    pub admins: HashSet<i64>,
}

impl FlowContext {
    pub fn new(config: &Config, gateway: Arc<dyn Gateway>) -> Result<Self> {
        Ok(Self {
            gateway,
            storage_channel: config.channels.storage.clone(),
            gate_channel: config.channels.gate.clone(),
            join_url: config.join_url()?,
            link_base: config.telegram.link_base.clone(),
            admins: config.admin_set(),
        })
    }

    pub async fn is_member(&self, user_id: i64) -> bool {
        let membership = self
            .gateway
            .get_membership_status(&self.gate_channel, user_id)
            .await;
        info!(
            "User {} membership in {}: {}",
            user_id, self.gate_channel, membership.status
        );
        membership.is_member
    }

    /// Join / Retry challenge keyboard for a file.
    pub fn challenge_keyboard(&self, file: FileRef) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::url("✅ Join Now", self.join_url.clone())],
            vec![InlineKeyboardButton::callback(
                "♻️ Retry",
                links::retry_payload(file),
            )],
        ])
    }

    /// Copy a stored file into the user's private chat. Any failure is
    /// reported to the user as a missing file.
    pub async fn deliver(&self, user_id: i64, file: FileRef) -> Result<()> {
        let user_chat = ChatRef::Id(user_id);
        match self
            .gateway
            .copy_message(&self.storage_channel, file.0, &user_chat)
            .await
        {
            Ok(_) => {
                info!("Delivered file {} to user {}", file, user_id);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to deliver file {} to user {}: {:#}", file, user_id, e);
                self.gateway
                    .send_message(&user_chat, FILE_NOT_FOUND, None)
                    .await?;
                Ok(())
            }
        }
    }
}
