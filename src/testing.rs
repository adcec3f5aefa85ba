//! In-memory `Gateway` that records every outbound call.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::types::InlineKeyboardMarkup;

use crate::gateway::{BotIdentity, ChatRef, Gateway, Membership};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Membership {
        channel: ChatRef,
        user_id: i64,
    },
    Send {
        chat: ChatRef,
        text: String,
        markup: Option<serde_json::Value>,
    },
    Edit {
        chat: ChatRef,
        message_id: i32,
        text: String,
        markup: Option<serde_json::Value>,
    },
    Copy {
        from_chat: ChatRef,
        message_id: i32,
        to_chat: ChatRef,
    },
    GetMe,
    Answer {
        query_id: String,
    },
}

pub struct RecordingGateway {
    calls: Mutex<Vec<Call>>,
    member_status: Mutex<String>,
    /// `None` makes every copy fail.
    copy_result: Option<i32>,
    username: Option<String>,
    fail_sends: bool,
    fail_edits: bool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            member_status: Mutex::new("left".to_string()),
            copy_result: Some(1000),
            username: Some("relay_bot".to_string()),
            fail_sends: false,
            fail_edits: false,
        }
    }

    pub fn with_status(self, status: &str) -> Self {
        self.set_status(status);
        self
    }

    pub fn with_copy_result(mut self, result: Option<i32>) -> Self {
        self.copy_result = result;
        self
    }

    pub fn with_username(mut self, username: Option<&str>) -> Self {
        self.username = username.map(str::to_string);
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Every edit fails the way Telegram rejects an unchanged message.
    pub fn failing_edits(mut self) -> Self {
        self.fail_edits = true;
        self
    }

    /// Change the membership status between invocations.
    pub fn set_status(&self, status: &str) {
        *self.member_status.lock().unwrap() = status.to_string();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub fn copies(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Copy { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn markup_json(markup: Option<&InlineKeyboardMarkup>) -> Option<serde_json::Value> {
    markup.map(|m| serde_json::to_value(m).unwrap())
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn get_membership_status(&self, channel: &ChatRef, user_id: i64) -> Membership {
        self.record(Call::Membership {
            channel: channel.clone(),
            user_id,
        });
        Membership::from_status(&self.member_status.lock().unwrap())
    }

    async fn send_message(
        &self,
        chat: &ChatRef,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<i32> {
        self.record(Call::Send {
            chat: chat.clone(),
            text: text.to_string(),
            markup: markup_json(markup),
        });
        if self.fail_sends {
            anyhow::bail!("sendMessage failed (403): Forbidden: bot was blocked by the user");
        }
        Ok(500)
    }

    async fn edit_message(
        &self,
        chat: &ChatRef,
        message_id: i32,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        self.record(Call::Edit {
            chat: chat.clone(),
            message_id,
            text: text.to_string(),
            markup: markup_json(markup),
        });
        if self.fail_edits {
            anyhow::bail!("editMessageText failed: Bad Request: message is not modified");
        }
        Ok(())
    }

    async fn copy_message(
        &self,
        from_chat: &ChatRef,
        message_id: i32,
        to_chat: &ChatRef,
    ) -> Result<i32> {
        self.record(Call::Copy {
            from_chat: from_chat.clone(),
            message_id,
            to_chat: to_chat.clone(),
        });
        self.copy_result
            .ok_or_else(|| anyhow::anyhow!("copyMessage failed (400): message to copy not found"))
    }

    async fn get_me(&self) -> Result<BotIdentity> {
        self.record(Call::GetMe);
        Ok(BotIdentity {
            username: self.username.clone(),
        })
    }

    async fn answer_callback(&self, query_id: &str) -> Result<()> {
        self.record(Call::Answer {
            query_id: query_id.to_string(),
        });
        Ok(())
    }
}

/// Bot API update payloads in the shape Telegram delivers them.
pub mod fixtures {
    use serde_json::{json, Value};
    use teloxide::types::Update;

    pub fn update(value: Value) -> Update {
        serde_json::from_str(&value.to_string()).unwrap()
    }

    fn private_message(user: i64, message_id: i32) -> Value {
        json!({
            "message_id": message_id,
            "date": 1700000000,
            "chat": {"id": user, "type": "private", "first_name": "U"},
            "from": {"id": user, "is_bot": false, "first_name": "U"}
        })
    }

    pub fn text_update(user: i64, text: &str) -> Update {
        let mut message = private_message(user, 10);
        message["text"] = json!(text);
        update(json!({"update_id": 1, "message": message}))
    }

    /// A media message with id 3 of the given kind.
    pub fn media_update(user: i64, kind: &str) -> Update {
        let file = json!({"file_id": "f", "file_unique_id": "u"});
        let media = match kind {
            "photo" => json!([{"file_id": "f", "file_unique_id": "u", "width": 90, "height": 90}]),
            "video" | "animation" => json!({
                "file_id": "f", "file_unique_id": "u",
                "width": 640, "height": 360, "duration": 5, "mime_type": "video/mp4"
            }),
            "audio" => json!({
                "file_id": "f", "file_unique_id": "u", "duration": 5, "mime_type": "audio/mpeg"
            }),
            "voice" => json!({
                "file_id": "f", "file_unique_id": "u", "duration": 5, "mime_type": "audio/ogg"
            }),
            "video_note" => json!({
                "file_id": "f", "file_unique_id": "u", "length": 240, "duration": 5
            }),
            _ => file,
        };

        let mut message = private_message(user, 3);
        message[kind] = media;
        update(json!({"update_id": 2, "message": message}))
    }

    /// A button click on prompt message 55 in the user's chat.
    pub fn callback_update(user: i64, data: &str) -> Update {
        update(json!({
            "update_id": 3,
            "callback_query": {
                "id": format!("cb-{}", user),
                "from": {"id": user, "is_bot": false, "first_name": "U"},
                "chat_instance": "ci",
                "data": data,
                "message": {
                    "message_id": 55,
                    "date": 1700000000,
                    "chat": {"id": user, "type": "private", "first_name": "U"},
                    "text": "prompt"
                }
            }
        }))
    }
}
