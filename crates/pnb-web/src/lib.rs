//! Inbound HTTP transport: the Messenger webhook and the email-forwarder
//! endpoint.

pub mod payload;
pub mod router;
