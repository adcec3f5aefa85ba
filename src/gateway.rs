use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, ChatMemberStatus, InlineKeyboardMarkup, MessageId, ParseMode, Recipient,
};
use tracing::{debug, warn};

/// Chat member statuses that count as "joined".
pub const GRANTED_STATUSES: [&str; 3] = ["member", "administrator", "creator"];

/// A chat addressed by numeric id or by `@username`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ChatRef {
    Id(i64),
    Username(String),
}

impl ChatRef {
    fn recipient(&self) -> Recipient {
        match self {
            ChatRef::Id(id) => Recipient::Id(ChatId(*id)),
            ChatRef::Username(name) => Recipient::ChannelUsername(name.clone()),
        }
    }
}

impl FromStr for ChatRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<i64>() {
            Ok(id) => ChatRef::Id(id),
            Err(_) => ChatRef::Username(s.to_string()),
        })
    }
}

impl From<i64> for ChatRef {
    fn from(id: i64) -> Self {
        ChatRef::Id(id)
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{}", id),
            ChatRef::Username(name) => write!(f, "{}", name),
        }
    }
}

/// Result of a membership lookup. Derived fresh on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub is_member: bool,
    pub status: String,
}

impl Membership {
    pub fn from_status(status: &str) -> Self {
        Self {
            is_member: GRANTED_STATUSES.contains(&status),
            status: status.to_string(),
        }
    }

    /// Outcome used when the platform could not answer.
    pub fn unknown() -> Self {
        Self {
            is_member: false,
            status: "unknown".to_string(),
        }
    }
}

/// Bot API wire name of a member status.
fn status_name(status: ChatMemberStatus) -> &'static str {
    match status {
        ChatMemberStatus::Owner => "creator",
        ChatMemberStatus::Administrator => "administrator",
        ChatMemberStatus::Member => "member",
        ChatMemberStatus::Restricted => "restricted",
        ChatMemberStatus::Left => "left",
        ChatMemberStatus::Banned => "kicked",
    }
}

#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub username: Option<String>,
}

/// Outbound operations against the messaging platform.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fail-closed: any error is reported as "not a member".
    async fn get_membership_status(&self, channel: &ChatRef, user_id: i64) -> Membership;

    async fn send_message(
        &self,
        chat: &ChatRef,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<i32>;

    async fn edit_message(
        &self,
        chat: &ChatRef,
        message_id: i32,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<()>;

    /// Copy a message and return its id in the destination chat.
    async fn copy_message(
        &self,
        from_chat: &ChatRef,
        message_id: i32,
        to_chat: &ChatRef,
    ) -> Result<i32>;

    async fn get_me(&self) -> Result<BotIdentity>;

    /// Stop the client-side loading indicator of a button click.
    async fn answer_callback(&self, query_id: &str) -> Result<()>;
}

/// Bot API client backed by `teloxide::Bot`. One request per call, no
/// retries.
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(api_url: &str, bot_token: &str) -> Result<Self> {
        let api_url = reqwest::Url::parse(api_url)
            .with_context(|| format!("Invalid Bot API URL: {}", api_url))?;
        Ok(Self {
            bot: Bot::new(bot_token).set_api_url(api_url),
        })
    }

    /// The underlying client, for the polling listener.
    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn get_membership_status(&self, channel: &ChatRef, user_id: i64) -> Membership {
        let Ok(user) = u64::try_from(user_id) else {
            warn!("Membership lookup for invalid user id {}", user_id);
            return Membership::unknown();
        };

        debug!("Checking membership of user {} in {}", user_id, channel);
        match self
            .bot
            .get_chat_member(channel.recipient(), UserId(user))
            .await
        {
            Ok(member) => Membership::from_status(status_name(member.kind.status())),
            Err(e) => {
                // teloxide redacts the token from network errors.
                warn!(
                    "Membership lookup for user {} in {} failed: {}",
                    user_id, channel, e
                );
                Membership::unknown()
            }
        }
    }

    async fn send_message(
        &self,
        chat: &ChatRef,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<i32> {
        let mut request = self
            .bot
            .send_message(chat.recipient(), text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(markup.clone());
        }

        let sent = request
            .await
            .with_context(|| format!("sendMessage to {} failed", chat))?;
        Ok(sent.id.0)
    }

    async fn edit_message(
        &self,
        chat: &ChatRef,
        message_id: i32,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut request = self
            .bot
            .edit_message_text(chat.recipient(), MessageId(message_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup {
            request = request.reply_markup(markup.clone());
        }

        request
            .await
            .with_context(|| format!("editMessageText of {} in {} failed", message_id, chat))?;
        Ok(())
    }

    async fn copy_message(
        &self,
        from_chat: &ChatRef,
        message_id: i32,
        to_chat: &ChatRef,
    ) -> Result<i32> {
        let copied = self
            .bot
            .copy_message(
                to_chat.recipient(),
                from_chat.recipient(),
                MessageId(message_id),
            )
            .await
            .with_context(|| {
                format!(
                    "copyMessage of {} from {} to {} failed",
                    message_id, from_chat, to_chat
                )
            })?;
        Ok(copied.0)
    }

    async fn get_me(&self) -> Result<BotIdentity> {
        let me = self.bot.get_me().await.context("getMe failed")?;
        Ok(BotIdentity {
            username: me.user.username,
        })
    }

    async fn answer_callback(&self, query_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(CallbackQueryId(query_id.to_string()))
            .await
            .context("answerCallbackQuery failed")?;
        Ok(())
    }
}
