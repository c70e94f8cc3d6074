use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use pnb_core::{config::Config, dispatch::Dispatcher, events::InboundEmail, Result};

use crate::payload::{inbound_messages, WebhookPayload};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(verify_webhook).post(receive_webhook))
        .route("/email", post(receive_email))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(cfg: Arc<Config>, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let bind_addr = cfg.bind_addr.clone();
    let state = AppState { cfg, dispatcher };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Platform subscription handshake: echo the challenge iff the verify token
/// matches ours.
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> std::result::Result<String, StatusCode> {
    verification_challenge(&state.cfg.verify_token, &params).ok_or(StatusCode::FORBIDDEN)
}

fn verification_challenge(expected_token: &str, params: &VerifyParams) -> Option<String> {
    if params.verify_token.as_deref() != Some(expected_token) {
        return None;
    }
    Some(params.challenge.clone().unwrap_or_default())
}

/// Inbound Messenger events. Handler errors are logged and the event dropped
/// (this covers the accepted duplicate-registration race); the platform
/// always gets a 200 so it does not redeliver.
async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> &'static str {
    for msg in inbound_messages(payload) {
        if let Err(e) = state.dispatcher.handle_message(&msg).await {
            tracing::error!(sender = %msg.sender_id, error = %e, "dropping message event");
        }
    }
    "EVENT_RECEIVED"
}

/// Email notifications posted by the mailbox forwarder.
async fn receive_email(
    State(state): State<AppState>,
    Json(email): Json<InboundEmail>,
) -> StatusCode {
    if let Err(e) = state.dispatcher.handle_email(&email).await {
        tracing::error!(title = %email.title, error = %e, "failed to process email event");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_verify_token_echoes_the_challenge() {
        let params = VerifyParams {
            verify_token: Some("sesame".to_string()),
            challenge: Some("12345".to_string()),
        };
        assert_eq!(
            verification_challenge("sesame", &params).as_deref(),
            Some("12345")
        );
    }

    #[test]
    fn wrong_or_missing_verify_token_is_rejected() {
        let wrong = VerifyParams {
            verify_token: Some("guess".to_string()),
            challenge: Some("12345".to_string()),
        };
        assert_eq!(verification_challenge("sesame", &wrong), None);

        let missing = VerifyParams {
            verify_token: None,
            challenge: Some("12345".to_string()),
        };
        assert_eq!(verification_challenge("sesame", &missing), None);
    }
}
