use serde::Deserialize;

use pnb_core::events::InboundMessage;

/// Messenger webhook body: a batch of entries, each with a batch of
/// messaging events. Fields the bot does not use are left unmodeled.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: Sender,
    pub message: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
pub struct Sender {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageContent {
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
}

/// Flatten a webhook payload into core message events. Delivery receipts and
/// other message-less events are skipped.
pub fn inbound_messages(payload: WebhookPayload) -> Vec<InboundMessage> {
    payload
        .entry
        .into_iter()
        .flat_map(|entry| entry.messaging)
        .filter_map(|event| {
            let message = event.message?;
            Some(InboundMessage {
                sender_id: event.sender.id,
                text: message.text,
                has_attachment: !message.attachments.is_empty(),
            })
        })
        .collect()
}
