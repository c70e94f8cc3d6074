use serde::Deserialize;

/// A message received from the messaging platform.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: Option<String>,
    pub has_attachment: bool,
}

/// An email notification forwarded by the mailbox watcher.
///
/// Only `body` is inspected; `title` is carried for logging.
#[derive(Clone, Debug, Deserialize)]
pub struct InboundEmail {
    pub title: String,
    pub body: String,
}
