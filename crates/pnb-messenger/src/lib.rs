//! Facebook Graph API adapter: outbound Send API messages plus profile
//! (display name) lookup.

use async_trait::async_trait;
use serde::Deserialize;

use pnb_core::{
    domain::UserId,
    ports::{NotifierPort, ProfilePort},
    Error, Result,
};

#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn send_url(&self) -> String {
        format!("{}/me/messages?access_token={}", self.base, self.access_token)
    }

    fn profile_url(&self, id: &UserId) -> String {
        format!(
            "{}/{}?fields=first_name,last_name&access_token={}",
            self.base, id.0, self.access_token
        )
    }
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    first_name: Option<String>,
    last_name: Option<String>,
}

impl ProfileResponse {
    fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[async_trait]
impl NotifierPort for GraphClient {
    async fn send(&self, recipient: &UserId, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "recipient": { "id": recipient.0 },
            "message": { "text": text },
        });

        self.http
            .post(self.send_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Delivery(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ProfilePort for GraphClient {
    async fn resolve_display_name(&self, id: &UserId) -> Result<String> {
        let profile: ProfileResponse = self
            .http
            .get(self.profile_url(id))
            .send()
            .await
            .map_err(|e| Error::Profile(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Profile(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Profile(e.to_string()))?;

        profile
            .display_name()
            .ok_or_else(|| Error::Profile(format!("no name fields for {id}")))
    }
}
