use teloxide::types::{CallbackQuery, Message, Update, UpdateKind, User};

use crate::links;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// What the router should do with an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start {
        sender: i64,
        argument: Option<String>,
    },
    Callback {
        query_id: String,
        sender: i64,
        data: String,
        prompt: Option<PromptRef>,
    },
    Media {
        sender: i64,
        chat_id: i64,
        message_id: i32,
    },
    Ignored,
}

fn user_id(user: &User) -> i64 {
    user.id.0 as i64
}

fn has_media(msg: &Message) -> bool {
    msg.photo().is_some()
        || msg.video().is_some()
        || msg.document().is_some()
        || msg.audio().is_some()
        || msg.voice().is_some()
        || msg.animation().is_some()
        || msg.video_note().is_some()
}

/// Classify an update. A start command wins over media; button clicks
/// arrive as their own update kind. Messages without a sender, edits and
/// every other kind are ignored.
pub fn classify(update: &Update) -> Inbound {
    match &update.kind {
        UpdateKind::Message(msg) => classify_message(msg),
        UpdateKind::CallbackQuery(query) => classify_callback(query),
        _ => Inbound::Ignored,
    }
}

fn classify_message(msg: &Message) -> Inbound {
    let Some(from) = msg.from.as_ref() else {
        return Inbound::Ignored;
    };

    if let Some(argument) = msg.text().and_then(links::start_argument) {
        return Inbound::Start {
            sender: user_id(from),
            argument: argument.map(str::to_string),
        };
    }

    if has_media(msg) {
        return Inbound::Media {
            sender: user_id(from),
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
        };
    }

    Inbound::Ignored
}

fn classify_callback(query: &CallbackQuery) -> Inbound {
    let Some(data) = query.data.as_ref() else {
        return Inbound::Ignored;
    };

    Inbound::Callback {
        query_id: query.id.0.clone(),
        sender: user_id(&query.from),
        data: data.clone(),
        prompt: query.message.as_ref().map(|m| PromptRef {
            chat_id: m.chat().id.0,
            message_id: m.id().0,
        }),
    }
}
