//! Encodings that carry a file reference through the platform: the share
//! deep link (`?start=<id>`) and the retry button payload (`retry_<id>`).

use std::fmt;
use std::str::FromStr;

pub const START_COMMAND: &str = "/start";
pub const RETRY_PREFIX: &str = "retry_";

/// Position of a relayed file inside the storage channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileRef(pub i32);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is not a retry request")]
    NotRetry,
    #[error("invalid file reference {0:?}")]
    InvalidReference(String),
}

impl FromStr for FileRef {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i32>() {
            Ok(id) if id > 0 => Ok(FileRef(id)),
            _ => Err(PayloadError::InvalidReference(s.to_string())),
        }
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `https://t.me/<bot>?start=<id>`
pub fn share_link(link_base: &str, bot_username: &str, file: FileRef) -> String {
    format!(
        "{}/{}?start={}",
        link_base.trim_end_matches('/'),
        bot_username.trim_start_matches('@'),
        file
    )
}

pub fn retry_payload(file: FileRef) -> String {
    format!("{}{}", RETRY_PREFIX, file)
}

pub fn parse_retry_payload(data: &str) -> Result<FileRef, PayloadError> {
    data.strip_prefix(RETRY_PREFIX)
        .ok_or(PayloadError::NotRetry)?
        .parse()
}

/// Split a `/start` command into its optional argument.
///
/// Returns `None` when the text is not a start command at all, and
/// `Some(None)` for a bare `/start`.
pub fn start_argument(text: &str) -> Option<Option<&str>> {
    if !text.starts_with(START_COMMAND) {
        return None;
    }
    Some(text.split_whitespace().nth(1))
}
